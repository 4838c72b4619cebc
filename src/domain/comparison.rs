//! Snapshot comparison: classify records as added, removed or moved and
//! annotate the target tree.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::arena::{ChangeType, OrgTree};
use crate::domain::ordering::reorder_children;
use crate::domain::record::EmployeeRecord;

/// Manager name used when a baseline manager id resolves to nobody.
pub const UNKNOWN_MANAGER: &str = "Unknown";

/// A record tagged with its change classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedRecord {
    #[serde(flatten)]
    pub record: EmployeeRecord,
    pub change_type: ChangeType,
    /// Baseline manager id, moved records only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_manager: Option<String>,
    /// Baseline manager name, moved records only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_manager_name: Option<String>,
}

impl ChangedRecord {
    fn new(record: &EmployeeRecord, change_type: ChangeType) -> Self {
        Self {
            record: record.clone(),
            change_type,
            previous_manager: None,
            previous_manager_name: None,
        }
    }

    pub fn key(&self) -> String {
        self.record.key()
    }

    pub fn name(&self) -> String {
        self.record.display_name()
    }
}

/// Flat classification of two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAnalysis {
    pub added: Vec<ChangedRecord>,
    pub removed: Vec<ChangedRecord>,
    pub moved: Vec<ChangedRecord>,
    pub total_direct_changes: usize,
}

impl ChangeAnalysis {
    /// Changes that apply to live tree nodes, keyed by identity.
    /// Added takes precedence over moved.
    pub fn live_changes(&self) -> HashMap<String, &ChangedRecord> {
        let mut changes: HashMap<String, &ChangedRecord> = self.moved.iter().map(|c| (c.key(), c)).collect();
        changes.extend(self.added.iter().map(|c| (c.key(), c)));
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.total_direct_changes == 0
    }
}

/// Identity-keyed view of a batch; first occurrence of a key wins and
/// records without an id are ignored.
fn index_batch(records: &[EmployeeRecord]) -> (Vec<(String, &EmployeeRecord)>, HashMap<String, &EmployeeRecord>) {
    let mut ordered = Vec::with_capacity(records.len());
    let mut by_key = HashMap::with_capacity(records.len());
    for record in records {
        let key = record.key();
        if key.is_empty() || by_key.contains_key(&key) {
            continue;
        }
        by_key.insert(key.clone(), record);
        ordered.push((key, record));
    }
    (ordered, by_key)
}

/// Classify every record of two snapshots keyed by normalized identity.
#[instrument(level = "debug", skip_all, fields(baseline = baseline.len(), target = target.len()))]
pub fn classify(baseline: &[EmployeeRecord], target: &[EmployeeRecord]) -> ChangeAnalysis {
    let (baseline_order, baseline_map) = index_batch(baseline);
    let (target_order, target_map) = index_batch(target);

    let mut added = Vec::new();
    let mut moved = Vec::new();
    for (key, record) in &target_order {
        match baseline_map.get(key) {
            None => added.push(ChangedRecord::new(record, ChangeType::Added)),
            Some(before) if before.manager_key() != record.manager_key() => {
                let previous_manager = before.manager_ref();
                let previous_manager_name = previous_manager
                    .as_ref()
                    .and_then(|m| baseline_map.get(m))
                    .map(|m| m.display_name())
                    .unwrap_or_else(|| UNKNOWN_MANAGER.to_string());
                moved.push(ChangedRecord {
                    previous_manager,
                    previous_manager_name: Some(previous_manager_name),
                    ..ChangedRecord::new(record, ChangeType::Moved)
                });
            }
            Some(_) => {}
        }
    }

    let removed: Vec<ChangedRecord> = baseline_order
        .iter()
        .filter(|(key, _)| !target_map.contains_key(key))
        .map(|(_, record)| ChangedRecord::new(record, ChangeType::Removed))
        .collect();

    let total_direct_changes = added.len() + removed.len() + moved.len();
    info!(
        "classify: {} added, {} removed, {} moved",
        added.len(),
        removed.len(),
        moved.len()
    );

    ChangeAnalysis {
        added,
        removed,
        moved,
        total_direct_changes,
    }
}

/// Annotate the target tree with change metadata, then surface changed
/// children first under every node.
#[instrument(level = "debug", skip_all)]
pub fn annotate(tree: &mut OrgTree, analysis: &ChangeAnalysis) {
    let changes = analysis.live_changes();

    let indices: Vec<_> = tree.iter().map(|(idx, _)| idx).collect();
    for &idx in &indices {
        let Some(node) = tree.get_node_mut(idx) else {
            continue;
        };
        match changes.get(&node.key) {
            Some(change) => {
                node.change = change.change_type;
                node.previous_manager_name = change.previous_manager_name.clone();
            }
            None => {
                node.change = ChangeType::None;
                node.previous_manager_name = None;
            }
        }
    }

    for &idx in &indices {
        let Some(children) = tree.get_node(idx).map(|n| n.children.clone()) else {
            continue;
        };
        let ordered = reorder_children(tree, &children);
        if let Some(node) = tree.get_node_mut(idx) {
            node.children = ordered;
        }
    }
    debug!("annotate: {} nodes", indices.len());
}

/// Baseline lookups needed to compute net changes on the target tree.
///
/// Rebuild whenever the baseline batch changes; read-only otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMaps {
    /// employee id -> baseline manager's name
    pub previous_manager: HashMap<String, String>,
    /// employee id -> baseline direct-report ids, in baseline order
    pub direct_reports: HashMap<String, Vec<String>>,
    /// employee id -> baseline descendant count
    pub total_reports: HashMap<String, usize>,
    /// employee id -> baseline name
    pub names: HashMap<String, String>,
}

impl ComparisonMaps {
    pub fn baseline_name(&self, key: &str) -> String {
        self.names.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
}

/// Precompute baseline lookups from the baseline batch and its tree.
#[instrument(level = "debug", skip_all)]
pub fn build_comparison_maps(baseline: &[EmployeeRecord], baseline_tree: Option<&OrgTree>) -> ComparisonMaps {
    let (ordered, by_key) = index_batch(baseline);

    let mut maps = ComparisonMaps::default();
    for (key, record) in &ordered {
        maps.names.insert(key.clone(), record.display_name());
        maps.direct_reports.entry(key.clone()).or_default();
        if let Some(manager) = record.manager_ref().filter(|m| m != key) {
            if let Some(manager_record) = by_key.get(&manager) {
                maps.previous_manager.insert(key.clone(), manager_record.display_name());
            }
            maps.direct_reports.entry(manager).or_default().push(key.clone());
        }
    }
    // Only ids that exist in the baseline keep a report list
    maps.direct_reports.retain(|key, _| by_key.contains_key(key));

    if let Some(tree) = baseline_tree {
        let mut totals: HashMap<_, usize> = HashMap::with_capacity(tree.len());
        for (idx, node) in tree.iter_postorder() {
            let total = node
                .children
                .iter()
                .map(|c| 1 + totals.get(c).copied().unwrap_or(0))
                .sum::<usize>();
            totals.insert(idx, total);
            maps.total_reports.insert(node.key.clone(), total);
        }
    }
    debug!(
        "build_comparison_maps: {} ids, {} with totals",
        maps.names.len(),
        maps.total_reports.len()
    );
    maps
}
