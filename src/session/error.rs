//! Session error types.

use crate::db::StorageError;
use crate::persist::ImportError;
use crate::service::ServiceError;
use crate::tree::TreeError;
use derive_more::Display;

/// Errors surfaced by session operations.
///
/// Whenever one of these is returned the session is left exactly as it was
/// before the call, except where an operation documents otherwise.
#[derive(Debug, Display)]
pub enum SessionError {
    /// The move service failed or rejected the request.
    #[display("{}", _0)]
    Service(ServiceError),
    /// The move tree refused an operation.
    #[display("{}", _0)]
    Tree(TreeError),
    /// An analysis file could not be loaded.
    #[display("{}", _0)]
    Import(ImportError),
    /// The save database failed.
    #[display("{}", _0)]
    Storage(StorageError),
    /// The operation needs a started game.
    #[display("No game in progress")]
    NoGame,
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Service(err) => Some(err),
            SessionError::Tree(err) => Some(err),
            SessionError::Import(err) => Some(err),
            SessionError::Storage(err) => Some(err),
            SessionError::NoGame => None,
        }
    }
}

impl From<ServiceError> for SessionError {
    fn from(err: ServiceError) -> Self {
        SessionError::Service(err)
    }
}

impl From<TreeError> for SessionError {
    fn from(err: TreeError) -> Self {
        SessionError::Tree(err)
    }
}

impl From<ImportError> for SessionError {
    fn from(err: ImportError) -> Self {
        SessionError::Import(err)
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::Storage(err)
    }
}
