use std::collections::{HashMap, HashSet};

use tracing::info;
use uuid::Uuid;

use crate::{error::Result, store::GroupStore};

use super::{Group, GroupInfo};

/// What one reconciliation changed in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Groups the user had no row for.
    pub added: Vec<GroupInfo>,
    /// Active groups no longer derived; now inactive.
    pub removed: Vec<GroupInfo>,
    /// Groups switched off by an earlier crawl and derived again.
    pub restored: Vec<GroupInfo>,
}

impl Reconciliation {
    /// Groups the user should now be a chat member of.
    pub fn to_join(&self) -> Vec<GroupInfo> {
        self.added.iter().chain(&self.restored).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.restored.is_empty()
    }
}

/// First occurrence of each group name wins.
pub fn dedup_by_name(groups: Vec<GroupInfo>) -> Vec<GroupInfo> {
    let mut seen = HashSet::new();
    groups
        .into_iter()
        .filter(|g| seen.insert(g.group.clone()))
        .collect()
}

/// `a \ b` by group name, keeping `a`'s order.
pub fn difference(a: &[GroupInfo], b: &[GroupInfo]) -> Vec<GroupInfo> {
    let in_b: HashSet<&Group> = b.iter().map(|g| &g.group).collect();
    a.iter().filter(|g| !in_b.contains(&g.group)).cloned().collect()
}

pub async fn reconcile_groups(
    store: &dyn GroupStore,
    user_id: Uuid,
    derived: Vec<GroupInfo>,
) -> Result<Reconciliation> {
    let existing = store.get_groups_with_status(user_id).await?;
    let derived = dedup_by_name(derived);

    let existing_info: Vec<GroupInfo> = existing.iter().map(|g| g.info()).collect();
    let added = difference(&derived, &existing_info);
    if !added.is_empty() {
        store.add_groups_to_user(user_id, &added).await?;
    }

    let derived_names: HashSet<&Group> = derived.iter().map(|g| &g.group).collect();
    let mut removed = Vec::new();
    let mut restored = Vec::new();
    for row in &existing {
        match (row.status, derived_names.contains(&row.group)) {
            (true, false) => {
                store.set_group_status(user_id, &row.group, false).await?;
                removed.push(row.info());
            }
            (false, true) if !row.opted_out => {
                store.set_group_status(user_id, &row.group, true).await?;
                restored.push(row.info());
            }
            _ => {}
        }
    }

    // keep derived order for restored groups
    let order: HashMap<&Group, usize> =
        derived.iter().enumerate().map(|(i, g)| (&g.group, i)).collect();
    restored.sort_by_key(|g| order.get(&g.group).copied().unwrap_or(usize::MAX));

    info!(
        %user_id,
        added = added.len(),
        removed = removed.len(),
        restored = restored.len(),
        "reconciled groups"
    );

    Ok(Reconciliation { added, removed, restored })
}
