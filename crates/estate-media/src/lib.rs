pub mod compress;
pub mod storage;

pub use compress::{CompressedImage, MediaError, compress_image};
pub use storage::Storage;
