//! Translation of store failures into domain errors.

use tracing::error;

use crate::domain::Error;
use crate::domain::ports::ReleaseRepositoryError;

pub(crate) fn map_repository_error(err: ReleaseRepositoryError) -> Error {
    match err {
        ReleaseRepositoryError::NotInitialized => {
            Error::service_unavailable("release store is not initialised")
        }
        ReleaseRepositoryError::DuplicateId { id } => {
            error!(release_id = %id, "generated release id collided with an existing record");
            Error::internal(format!("release {id} already exists"))
        }
        ReleaseRepositoryError::Io { message } => {
            Error::internal(format!("release store I/O failed: {message}"))
        }
        ReleaseRepositoryError::Corrupt { message } => {
            Error::internal(format!("release store is corrupt: {message}"))
        }
    }
}
