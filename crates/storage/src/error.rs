use thiserror::Error;

use crate::models::IdentityId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Identity {0} is not registered")]
    UnknownIdentity(IdentityId),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    /// Snapshot writes race with unregistration; a dangling foreign key means
    /// the identity was removed in between.
    pub(crate) fn for_snapshot_write(self, identity_id: IdentityId) -> Self {
        if self.is_foreign_key_violation() {
            StorageError::UnknownIdentity(identity_id)
        } else {
            self
        }
    }
}
