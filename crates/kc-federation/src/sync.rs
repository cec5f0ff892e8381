//! Group membership synchronization.
//!
//! Reconciles a user's local group memberships against the group names an
//! external directory reports for them. Only groups named as targets in a
//! [`ManagedGroupMapping`] are ever touched; every other membership the
//! user holds is left alone.
//!
//! A [`GroupReconciler`] works in two phases:
//!
//! 1. [`GroupReconciler::plan`] is pure: it computes which managed groups
//!    to join and which to leave.
//! 2. [`GroupReconciler::apply`] performs joins before leaves through a
//!    [`GroupProvider`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use kc_model::{Group, GroupPath};
use kc_storage::GroupProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FederationError, FederationResult};
use crate::normalize::GroupNameNormalizer;

// ============================================================================
// Managed Group Mapping
// ============================================================================

/// Mapping from normalised remote group names to local group paths.
///
/// The union of all target paths is the set of *managed* local groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedGroupMapping {
    entries: BTreeMap<String, Vec<String>>,
}

impl ManagedGroupMapping {
    /// Builds a mapping from raw configuration entries.
    ///
    /// Keys are normalised with [`GroupNameNormalizer`] so they compare
    /// equal to normalised remote names. Target paths are canonicalised
    /// (leading slash dropped, empty segments removed). Keys or targets
    /// that end up empty are skipped.
    #[must_use]
    pub fn from_config_map(raw: HashMap<String, Vec<String>>) -> Self {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (key, targets) in raw {
            let Some(key) = GroupNameNormalizer::normalize(Some(key.as_str())) else {
                warn!("Ignoring group mapping entry with an empty remote group name");
                continue;
            };

            let paths = entries.entry(key).or_default();
            for target in targets {
                let path = GroupPath::parse(&target);
                if path.is_empty() {
                    warn!(target = %target, "Ignoring empty target group path");
                    continue;
                }
                let path = path.to_path_string();
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }

        entries.retain(|_, paths| !paths.is_empty());
        Self { entries }
    }

    /// Returns the target paths for a normalised remote group name.
    #[must_use]
    pub fn targets(&self, remote_name: &str) -> Option<&[String]> {
        self.entries.get(remote_name).map(Vec::as_slice)
    }

    /// Returns every managed local group path.
    #[must_use]
    pub fn managed_paths(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Returns true if the mapping has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of remote group names mapped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ============================================================================
// Group Tree
// ============================================================================

/// Index of a realm's local groups by id, used to compute full paths.
#[derive(Debug, Clone, Default)]
pub struct GroupTree {
    groups: HashMap<Uuid, Group>,
}

impl GroupTree {
    /// Builds a tree from a flat list of groups.
    #[must_use]
    pub fn new(groups: impl IntoIterator<Item = Group>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id, g)).collect(),
        }
    }

    /// Gets a group by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Iterates over all groups.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Computes the full path of a group.
    ///
    /// Walks parent links iteratively; a group visited twice means the
    /// hierarchy loops.
    ///
    /// ## Errors
    ///
    /// - [`FederationError::GroupNotFound`] if the group or one of its
    ///   ancestors is missing
    /// - [`FederationError::GroupCycle`] if the parent chain loops
    pub fn path_of(&self, id: Uuid) -> FederationResult<GroupPath> {
        let mut segments = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);

        while let Some(group_id) = current {
            if !visited.insert(group_id) {
                return Err(FederationError::GroupCycle(group_id));
            }
            let group = self
                .groups
                .get(&group_id)
                .ok_or(FederationError::GroupNotFound(group_id))?;
            segments.push(group.name.as_str());
            current = group.parent_id;
        }

        segments.reverse();
        Ok(GroupPath::from_segments(segments))
    }
}

// ============================================================================
// Reconciliation Plan
// ============================================================================

/// A local group selected for a membership change.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ManagedGroup {
    /// Full group path.
    pub path: String,

    /// Group ID.
    pub id: Uuid,
}

/// Membership changes computed for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    /// Managed groups to join.
    pub join: BTreeSet<ManagedGroup>,

    /// Managed groups to leave.
    pub leave: BTreeSet<ManagedGroup>,
}

impl ReconciliationPlan {
    /// Returns true if nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.join.is_empty() && self.leave.is_empty()
    }

    /// Paths to join, sorted.
    #[must_use]
    pub fn join_paths(&self) -> Vec<&str> {
        self.join.iter().map(|g| g.path.as_str()).collect()
    }

    /// Paths to leave, sorted.
    #[must_use]
    pub fn leave_paths(&self) -> Vec<&str> {
        self.leave.iter().map(|g| g.path.as_str()).collect()
    }
}

// ============================================================================
// Group Reconciler
// ============================================================================

/// Reconciles managed group memberships for one mapping.
#[derive(Debug, Clone, Default)]
pub struct GroupReconciler {
    mapping: ManagedGroupMapping,
}

impl GroupReconciler {
    /// Creates a reconciler for a mapping.
    #[must_use]
    pub const fn new(mapping: ManagedGroupMapping) -> Self {
        Self { mapping }
    }

    /// Returns the mapping this reconciler works from.
    #[must_use]
    pub const fn mapping(&self) -> &ManagedGroupMapping {
        &self.mapping
    }

    /// Computes the membership changes for one user.
    ///
    /// - `tree` holds every local group of the realm
    /// - `current` holds the user's current local groups
    /// - `remote_names` holds the normalised remote group names
    ///
    /// A managed group the user already holds is kept as long as any remote
    /// group still maps to it; it is never re-joined. Groups whose path cannot
    /// be computed are logged and excluded.
    #[must_use]
    pub fn plan(
        &self,
        tree: &GroupTree,
        current: &[Group],
        remote_names: &[String],
    ) -> ReconciliationPlan {
        let managed_paths = self.mapping.managed_paths();

        let managed_groups: BTreeMap<String, ManagedGroup> = tree
            .iter()
            .filter_map(|group| managed_group(tree, group.id, &managed_paths))
            .map(|g| (g.path.clone(), g))
            .collect();

        // Checked against this snapshot, not the shrinking leave set, so a
        // group targeted by several remote groups is never re-joined.
        let current_managed: BTreeMap<String, ManagedGroup> = current
            .iter()
            .filter_map(|group| managed_group(tree, group.id, &managed_paths))
            .map(|g| (g.path.clone(), g))
            .collect();

        let mut leave = current_managed.clone();
        let mut join = BTreeSet::new();

        for name in remote_names {
            let Some(targets) = self.mapping.targets(name) else {
                debug!(group = %name, "Remote group has no mapping");
                continue;
            };

            for target in targets {
                if current_managed.contains_key(target) {
                    leave.remove(target);
                } else if let Some(group) = managed_groups.get(target) {
                    join.insert(group.clone());
                } else {
                    warn!(group = %name, target = %target, "Mapped local group does not exist");
                }
            }
        }

        ReconciliationPlan {
            join,
            leave: leave.into_values().collect(),
        }
    }

    /// Applies a plan: all joins first, then all leaves.
    ///
    /// A failing change is recorded and logged; the remaining changes still run.
    pub async fn apply(
        &self,
        plan: &ReconciliationPlan,
        groups: &dyn GroupProvider,
        realm_id: Uuid,
        user_id: Uuid,
    ) -> SyncResult {
        let mut result = SyncResult::new(Utc::now());

        for group in &plan.join {
            match groups.join_group(realm_id, user_id, group.id).await {
                Ok(()) => {
                    debug!(user_id = %user_id, group = %group.path, "Joined group");
                    result.joined += 1;
                }
                Err(e) => {
                    warn!(user_id = %user_id, group = %group.path, error = %e, "Failed to join group");
                    result.record_failure(SyncError::new(&group.path, e.to_string()));
                }
            }
        }

        for group in &plan.leave {
            match groups.leave_group(realm_id, user_id, group.id).await {
                Ok(()) => {
                    debug!(user_id = %user_id, group = %group.path, "Left group");
                    result.left += 1;
                }
                Err(e) => {
                    warn!(user_id = %user_id, group = %group.path, error = %e, "Failed to leave group");
                    result.record_failure(SyncError::new(&group.path, e.to_string()));
                }
            }
        }

        result.complete()
    }

    /// Loads local state, plans and applies a reconciliation for one user.
    ///
    /// ## Errors
    ///
    /// Returns an error if the realm's groups or the user's memberships
    /// cannot be read; nothing is changed in that case.
    pub async fn reconcile(
        &self,
        groups: &dyn GroupProvider,
        realm_id: Uuid,
        user_id: Uuid,
        remote_names: &[String],
    ) -> FederationResult<SyncResult> {
        let tree = GroupTree::new(groups.list_all(realm_id).await?);
        let current = groups.get_user_groups(realm_id, user_id).await?;

        let plan = self.plan(&tree, &current, remote_names);
        debug!(
            user_id = %user_id,
            join = ?plan.join_paths(),
            leave = ?plan.leave_paths(),
            "Computed group reconciliation"
        );

        Ok(self.apply(&plan, groups, realm_id, user_id).await)
    }
}

fn managed_group(
    tree: &GroupTree,
    id: Uuid,
    managed_paths: &BTreeSet<&str>,
) -> Option<ManagedGroup> {
    match tree.path_of(id) {
        Ok(path) => {
            let path = path.to_path_string();
            managed_paths
                .contains(path.as_str())
                .then_some(ManagedGroup { path, id })
        }
        Err(e) => {
            warn!(group_id = %id, error = %e, "Skipping group with unresolvable path");
            None
        }
    }
}

// ============================================================================
// Sync Results
// ============================================================================

/// Outcome of applying a [`ReconciliationPlan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    /// Number of groups joined.
    pub joined: usize,

    /// Number of groups left.
    pub left: usize,

    /// Number of changes that failed.
    pub failed: usize,

    /// When applying started.
    pub started_at: DateTime<Utc>,

    /// When applying completed.
    pub completed_at: DateTime<Utc>,

    /// Errors encountered (if any).
    pub errors: Vec<SyncError>,
}

impl SyncResult {
    /// Creates a new sync result.
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            joined: 0,
            left: 0,
            failed: 0,
            started_at,
            completed_at: started_at,
            errors: Vec::new(),
        }
    }

    /// Marks the sync as complete.
    #[must_use]
    pub fn complete(mut self) -> Self {
        self.completed_at = Utc::now();
        self
    }

    /// Records a membership failure.
    pub fn record_failure(&mut self, error: SyncError) {
        self.failed += 1;
        self.errors.push(error);
    }

    /// Returns the total number of changes attempted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.joined + self.left + self.failed
    }

    /// Returns true if any change failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A membership change that could not be applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncError {
    /// Path of the group involved.
    pub group_path: String,

    /// Error message.
    pub message: String,
}

impl SyncError {
    /// Creates a new sync error.
    #[must_use]
    pub fn new(group_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            group_path: group_path.into(),
            message: message.into(),
        }
    }
}
