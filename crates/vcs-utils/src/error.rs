/// Base error type for shared utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
