pub mod error;
pub mod field;
pub mod format;
pub mod recorder;
pub mod seek;

pub use error::{Error, Result};
pub use format::{Header, HEADER_SIZE, MAGIC, VERSION};
pub use recorder::Recorder;
pub use seek::Whence;
