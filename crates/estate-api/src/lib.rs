pub mod comments;
pub mod dashboard;
pub mod images;
pub mod reports;
pub mod state;
