/// Failures at the document store boundary. Cloneable because one failed
/// read may have to be delivered to several watches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid store path {0:?}")]
    InvalidPath(String),

    #[error("corrupt document at {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}
