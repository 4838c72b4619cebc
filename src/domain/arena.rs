use std::collections::{HashMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use serde::Serialize;
use tracing::instrument;

use crate::domain::error::DomainError;
use crate::domain::record::EmployeeRecord;

/// Default depth limit for nested and rendered views.
pub const MAX_VIEW_DEPTH: usize = 500;

/// Change classification of a node relative to a baseline snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    #[default]
    None,
    Added,
    Moved,
    /// Only appears in classification lists, never on a live tree node.
    Removed,
}

impl ChangeType {
    /// Added and moved nodes are surfaced ahead of unchanged siblings.
    pub fn is_surfaced(self) -> bool {
        matches!(self, ChangeType::Added | ChangeType::Moved)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeType::None => "none",
            ChangeType::Added => "added",
            ChangeType::Moved => "moved",
            ChangeType::Removed => "removed",
        };
        write!(f, "{}", s)
    }
}

/// Net changes of a node's reporting line against the baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDelta {
    pub direct_reports_added: Vec<String>,
    pub direct_reports_removed: Vec<String>,
    pub direct_reports_net_change: i64,
    pub total_reports_net_change: i64,
}

/// Rolled-up statistics attached to every node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    pub direct_reports: usize,
    pub total_reports: usize,
    pub total_fte: f64,
    /// `None` when no baseline entry exists for the node.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub delta: Option<StatsDelta>,
}

/// Tree node in the arena-based org hierarchy.
#[derive(Debug)]
pub struct OrgNode {
    /// Normalized identity key
    pub key: String,
    /// Source record for this employee
    pub record: EmployeeRecord,
    /// Index of the manager node, None for the root
    pub parent: Option<Index>,
    /// Direct reports, in display order
    pub children: Vec<Index>,
    pub change: ChangeType,
    /// Set only on moved nodes
    pub previous_manager_name: Option<String>,
    pub stats: NodeStats,
}

impl OrgNode {
    pub fn new(key: String, record: EmployeeRecord) -> Self {
        Self {
            key,
            record,
            parent: None,
            children: Vec::new(),
            change: ChangeType::None,
            previous_manager_name: None,
            stats: NodeStats::default(),
        }
    }

    pub fn name(&self) -> String {
        self.record.display_name()
    }
}

impl fmt::Display for OrgNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.key)
    }
}

/// Nested, owned view of a tree for serialization to the rendering layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedNode {
    pub key: String,
    #[serde(flatten)]
    pub record: EmployeeRecord,
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_manager_name: Option<String>,
    pub stats: NodeStats,
    pub children: Vec<NestedNode>,
}

/// Arena-based org tree with a single root.
///
/// Uses a generational arena for memory-safe node references and a key
/// index for O(1) lookups by employee id.
#[derive(Debug, Default)]
pub struct OrgTree {
    arena: Arena<OrgNode>,
    root: Option<Index>,
    by_key: HashMap<String, Index>,
}

impl OrgTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detached node. Keys already present are rejected.
    #[instrument(level = "trace", skip(self, record))]
    pub fn insert(&mut self, key: String, record: EmployeeRecord) -> Option<Index> {
        if self.by_key.contains_key(&key) {
            return None;
        }
        let idx = self.arena.insert(OrgNode::new(key.clone(), record));
        self.by_key.insert(key, idx);
        Some(idx)
    }

    /// Attach `child` as the last direct report of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, child: Index, parent: Index) {
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Detach `child` from its manager, if any.
    pub fn detach(&mut self, child: Index) {
        let parent = self.arena.get_mut(child).and_then(|n| n.parent.take());
        if let Some(parent) = parent.and_then(|p| self.arena.get_mut(p)) {
            parent.children.retain(|&c| c != child);
        }
    }

    /// True when `candidate` is `node` or lies on the manager chain above it.
    pub fn is_ancestor_or_self(&self, candidate: Index, node: Index) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(idx) = current {
            if idx == candidate {
                return true;
            }
            steps += 1;
            if steps > self.arena.len() {
                return false;
            }
            current = self.arena.get(idx).and_then(|n| n.parent);
        }
        false
    }

    pub fn set_root(&mut self, root: Index) {
        self.root = Some(root);
    }

    /// Remove every node not reachable from the root. Returns removed keys.
    pub fn retain_reachable(&mut self) -> Vec<String> {
        let reachable: HashSet<Index> = self.iter().map(|(idx, _)| idx).collect();
        let dropped: Vec<Index> = self
            .arena
            .iter()
            .map(|(idx, _)| idx)
            .filter(|idx| !reachable.contains(idx))
            .collect();
        let mut keys = Vec::with_capacity(dropped.len());
        for idx in dropped {
            if let Some(node) = self.arena.remove(idx) {
                self.by_key.remove(&node.key);
                keys.push(node.key);
            }
        }
        keys
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&OrgNode> {
        self.arena.get(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut OrgNode> {
        self.arena.get_mut(idx)
    }

    pub fn find(&self, key: &str) -> Option<Index> {
        self.by_key.get(key).copied()
    }

    pub fn node_by_key(&self, key: &str) -> Option<&OrgNode> {
        self.find(key).and_then(|idx| self.arena.get(idx))
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_node(&self) -> Option<&OrgNode> {
        self.root.and_then(|idx| self.arena.get(idx))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal, children left to right.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Post-order traversal: every node is yielded after all its descendants.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Number of levels from the root down to the deepest node.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(Index, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(node) = self.get_node(idx) {
                stack.extend(node.children.iter().map(|&c| (c, depth + 1)));
            }
        }
        max_depth
    }

    /// Keys of all employees without direct reports.
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.key.clone())
            .collect()
    }

    /// Managers from the direct manager up to the root.
    pub fn chain_of_command(&self, idx: Index) -> Vec<&OrgNode> {
        let mut chain = Vec::new();
        let mut current = self.get_node(idx).and_then(|n| n.parent);
        while let Some(parent) = current {
            match self.get_node(parent) {
                Some(node) => {
                    chain.push(node);
                    current = node.parent;
                }
                None => break,
            }
            if chain.len() > self.arena.len() {
                break;
            }
        }
        chain
    }

    /// Fails when the tree is deeper than `limit` levels.
    pub fn ensure_depth(&self, limit: usize) -> Result<(), DomainError> {
        let depth = self.depth();
        if depth > limit {
            return Err(DomainError::TooDeep { depth, limit });
        }
        Ok(())
    }

    /// Bottom-up fold: `f` receives each node with the already folded values
    /// of its children, in display order. Returns the root's value.
    pub fn fold<T>(&self, mut f: impl FnMut(&OrgNode, Vec<T>) -> T) -> Option<T> {
        let mut done: HashMap<Index, T> = HashMap::with_capacity(self.len());
        for (idx, node) in self.iter_postorder() {
            let children = node.children.iter().filter_map(|c| done.remove(c)).collect();
            let value = f(node, children);
            done.insert(idx, value);
        }
        self.root.and_then(|root| done.remove(&root))
    }

    /// Owned nested copy of the tree, for serialization.
    ///
    /// Nested values are recursive structures, so trees deeper than
    /// `max_depth` are refused.
    pub fn to_nested(&self, max_depth: usize) -> Result<Option<NestedNode>, DomainError> {
        self.ensure_depth(max_depth)?;
        Ok(self.fold(|node, children| NestedNode {
            key: node.key.clone(),
            record: node.record.clone(),
            change_type: node.change,
            previous_manager_name: node.previous_manager_name.clone(),
            stats: node.stats.clone(),
            children,
        }))
    }
}

pub struct TreeIterator<'a> {
    tree: &'a OrgTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a OrgTree) -> Self {
        Self {
            tree,
            stack: tree.root().into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a OrgNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a OrgTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a OrgTree) -> Self {
        Self {
            tree,
            stack: tree.root().map(|r| (r, false)).into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a OrgNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
