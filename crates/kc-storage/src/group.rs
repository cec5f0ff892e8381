//! Group storage provider trait.

use async_trait::async_trait;
use kc_model::Group;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for group hierarchy and group membership operations.
///
/// Implementations must be thread-safe. Join and leave are expected to be
/// idempotent: joining a group the user is already in, or leaving one the
/// user is not in, succeeds without effect.
#[async_trait]
pub trait GroupProvider: Send + Sync {
    /// Lists every group in a realm as a flat list (parents referenced by id).
    async fn list_all(&self, realm_id: Uuid) -> StorageResult<Vec<Group>>;

    /// Lists the groups a user is a direct member of.
    async fn get_user_groups(&self, realm_id: Uuid, user_id: Uuid) -> StorageResult<Vec<Group>>;

    /// Adds a user to a group.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the group doesn't exist.
    async fn join_group(&self, realm_id: Uuid, user_id: Uuid, group_id: Uuid)
        -> StorageResult<()>;

    /// Removes a user from a group.
    async fn leave_group(
        &self,
        realm_id: Uuid,
        user_id: Uuid,
        group_id: Uuid,
    ) -> StorageResult<()>;
}
