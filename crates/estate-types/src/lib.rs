pub mod api;
pub mod status;
pub mod summary;
