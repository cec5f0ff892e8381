//! In-memory group provider.
//!
//! Keeps the group hierarchy and memberships in process memory. Useful as
//! a reference backend and in tests; nothing is persisted.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use kc_model::Group;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::group::GroupProvider;

/// A membership change recorded by [`InMemoryGroupProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    /// User joined a group.
    Joined {
        /// User ID.
        user_id: Uuid,
        /// Group ID.
        group_id: Uuid,
    },
    /// User left a group.
    Left {
        /// User ID.
        user_id: Uuid,
        /// Group ID.
        group_id: Uuid,
    },
}

#[derive(Debug, Default)]
struct State {
    groups: HashMap<Uuid, Group>,
    memberships: HashMap<Uuid, BTreeSet<Uuid>>,
    changes: Vec<MembershipChange>,
}

/// Group provider backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryGroupProvider {
    state: RwLock<State>,
}

impl InMemoryGroupProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group to the hierarchy.
    pub fn insert_group(&self, group: Group) {
        self.state.write().groups.insert(group.id, group);
    }

    /// Records a membership without logging it as a change.
    pub fn seed_membership(&self, user_id: Uuid, group_id: Uuid) {
        self.state
            .write()
            .memberships
            .entry(user_id)
            .or_default()
            .insert(group_id);
    }

    /// Returns the IDs of the groups a user belongs to.
    #[must_use]
    pub fn member_group_ids(&self, user_id: Uuid) -> BTreeSet<Uuid> {
        self.state
            .read()
            .memberships
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every join/leave applied through the provider, in order.
    #[must_use]
    pub fn changes(&self) -> Vec<MembershipChange> {
        self.state.read().changes.clone()
    }

    /// Forgets the recorded changes.
    pub fn clear_changes(&self) {
        self.state.write().changes.clear();
    }
}

#[async_trait]
impl GroupProvider for InMemoryGroupProvider {
    async fn list_all(&self, realm_id: Uuid) -> StorageResult<Vec<Group>> {
        let state = self.state.read();
        let mut groups: Vec<Group> = state
            .groups
            .values()
            .filter(|g| g.realm_id == realm_id)
            .cloned()
            .collect();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    async fn get_user_groups(&self, realm_id: Uuid, user_id: Uuid) -> StorageResult<Vec<Group>> {
        let state = self.state.read();
        let Some(ids) = state.memberships.get(&user_id) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| state.groups.get(id))
            .filter(|g| g.realm_id == realm_id)
            .cloned()
            .collect())
    }

    async fn join_group(
        &self,
        realm_id: Uuid,
        user_id: Uuid,
        group_id: Uuid,
    ) -> StorageResult<()> {
        let mut state = self.state.write();
        if !state
            .groups
            .get(&group_id)
            .is_some_and(|g| g.realm_id == realm_id)
        {
            return Err(StorageError::not_found("Group", group_id));
        }

        if state.memberships.entry(user_id).or_default().insert(group_id) {
            state.changes.push(MembershipChange::Joined { user_id, group_id });
        }
        Ok(())
    }

    async fn leave_group(
        &self,
        _realm_id: Uuid,
        user_id: Uuid,
        group_id: Uuid,
    ) -> StorageResult<()> {
        let mut state = self.state.write();
        let removed = state
            .memberships
            .get_mut(&user_id)
            .is_some_and(|ids| ids.remove(&group_id));
        if removed {
            state.changes.push(MembershipChange::Left { user_id, group_id });
        }
        Ok(())
    }
}
