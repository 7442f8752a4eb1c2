//! Small shared utilities: error types and RAII temp files.

pub mod error;
pub mod tempfile;

pub use error::UtilError;

pub type Result<T> = std::result::Result<T, UtilError>;
