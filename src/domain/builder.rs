//! Hierarchy builder: turns flat employee records into a single-rooted tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::arena::OrgTree;
use crate::domain::record::{ColumnMapping, EmployeeRecord};

/// Which root candidate becomes the tree root.
///
/// `LastCandidate` reproduces the historical behavior of the org chart
/// viewer; `FirstCandidate` is an explicit opt-in.
///
/// Candidates are collected in input order and include the record that
/// closes each cycle. With `LastCandidate`, a small cycle listed after the
/// real top of the org wins: `[r, x -> r, a -> b, b -> a]` keeps only `b`
/// with `a` under it, and `r` and `x` are dropped. Validate first, or use
/// `FirstCandidate`, when uploads may contain cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootSelection {
    #[default]
    LastCandidate,
    FirstCandidate,
}

/// Constructs org trees from flat record batches.
///
/// Never fails on dirty data: unknown managers, self-references and cycles
/// turn records into root candidates, and everything outside the chosen
/// root's subtree is dropped.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    root_selection: RootSelection,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_selection(mut self, root_selection: RootSelection) -> Self {
        self.root_selection = root_selection;
        self
    }

    /// Build from a JSON value. Non-array input yields `None`.
    pub fn build_value(&self, value: &Value, mapping: &ColumnMapping) -> Option<OrgTree> {
        let records = mapping.decode(value).ok()?;
        self.build(&records)
    }

    /// Build a tree. Returns `None` only when no record carries an id.
    pub fn build(&self, records: &[EmployeeRecord]) -> Option<OrgTree> {
        let mut tree = OrgTree::new();

        // Wrap every identifiable record; first occurrence of a key wins
        let mut order = Vec::with_capacity(records.len());
        for (row, record) in records.iter().enumerate() {
            let key = record.key();
            if key.is_empty() {
                debug!("build: skipping row {} without id", row + 1);
                continue;
            }
            match tree.insert(key.clone(), record.clone()) {
                Some(idx) => order.push(idx),
                None => debug!("build: skipping duplicate id '{}' at row {}", key, row + 1),
            }
        }
        if order.is_empty() {
            return None;
        }

        // Single pass in input order: attach to manager or become a root candidate
        let mut candidates = Vec::new();
        for &idx in &order {
            let Some(node) = tree.get_node(idx) else {
                continue;
            };
            let key = node.key.clone();
            let manager_key = node.record.manager_key();

            let manager = if manager_key.is_empty() || manager_key == key {
                None
            } else {
                tree.find(&manager_key)
            };

            match manager {
                Some(manager_idx) if tree.is_ancestor_or_self(idx, manager_idx) => {
                    debug!("build: '{}' -> '{}' closes a cycle, treating as root candidate", key, manager_key);
                    candidates.push(idx);
                }
                Some(manager_idx) => tree.attach(idx, manager_idx),
                None => candidates.push(idx),
            }
        }

        let root = match self.root_selection {
            RootSelection::LastCandidate => candidates.last().copied(),
            RootSelection::FirstCandidate => candidates.first().copied(),
        };
        let root = match root {
            Some(root) => root,
            None => {
                // Unreachable with cycle breaking in place; keep a deterministic answer anyway
                let first = order[0];
                debug!("build: no root candidate, falling back to first record");
                tree.detach(first);
                first
            }
        };
        tree.set_root(root);

        if candidates.len() > 1 {
            debug!("build: {} root candidates, keeping one", candidates.len());
        }
        let dropped = tree.retain_reachable();
        if !dropped.is_empty() {
            debug!("build: dropped {} records outside the root subtree: {:?}", dropped.len(), dropped);
        }
        info!("build: {} nodes, depth {}", tree.len(), tree.depth());

        Some(tree)
    }
}
