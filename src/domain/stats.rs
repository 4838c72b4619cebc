//! Statistics aggregation over an org tree.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeStats, OrgTree, StatsDelta};
use crate::domain::comparison::ComparisonMaps;
use crate::domain::record::DEFAULT_FTE;

/// Round to two decimals for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Subtree totals carried up the post-order walk.
#[derive(Debug, Clone, Copy, Default)]
struct Subtree {
    descendants: usize,
    fte: f64,
}

/// Computes per-node statistics in one post-order pass.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    max_fte: f64,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self { max_fte: 2.0 }
    }
}

impl StatsAggregator {
    pub fn new(max_fte: f64) -> Self {
        Self { max_fte }
    }

    /// Attach statistics to every node. With `maps`, nodes that exist in the
    /// baseline also receive net-change deltas.
    #[instrument(level = "debug", skip_all, fields(nodes = tree.len(), baseline = maps.is_some()))]
    pub fn compute(&self, tree: &mut OrgTree, maps: Option<&ComparisonMaps>) {
        let computed = self.collect(tree, maps);
        let with_delta = computed.iter().filter(|(_, s)| s.delta.is_some()).count();
        for (idx, stats) in computed {
            if let Some(node) = tree.get_node_mut(idx) {
                node.stats = stats;
            }
        }
        debug!("compute: {} nodes with baseline deltas", with_delta);
    }

    fn collect(&self, tree: &OrgTree, maps: Option<&ComparisonMaps>) -> Vec<(Index, NodeStats)> {
        let mut subtrees: HashMap<Index, Subtree> = HashMap::with_capacity(tree.len());
        let mut out = Vec::with_capacity(tree.len());

        for (idx, node) in tree.iter_postorder() {
            let own_fte = node.record.effective_fte(self.max_fte);
            let subtree = node.children.iter().fold(
                Subtree {
                    descendants: 0,
                    fte: own_fte,
                },
                |acc, child| {
                    let c = subtrees.get(child).copied().unwrap_or(Subtree {
                        descendants: 0,
                        fte: DEFAULT_FTE,
                    });
                    Subtree {
                        descendants: acc.descendants + 1 + c.descendants,
                        fte: acc.fte + c.fte,
                    }
                },
            );
            subtrees.insert(idx, subtree);

            let delta = maps.and_then(|m| self.delta(tree, idx, subtree.descendants, m));
            out.push((
                idx,
                NodeStats {
                    direct_reports: node.children.len(),
                    total_reports: subtree.descendants,
                    total_fte: round2(subtree.fte),
                    delta,
                },
            ));
        }
        out
    }

    fn delta(&self, tree: &OrgTree, idx: Index, total_reports: usize, maps: &ComparisonMaps) -> Option<StatsDelta> {
        let node = tree.get_node(idx)?;
        let baseline_direct = maps.direct_reports.get(&node.key)?;
        let baseline_total = *maps.total_reports.get(&node.key)?;

        let children: Vec<(&str, String)> = node
            .children
            .iter()
            .filter_map(|&c| tree.get_node(c))
            .map(|c| (c.key.as_str(), c.name()))
            .collect();
        let current: HashSet<&str> = children.iter().map(|(key, _)| *key).collect();
        let before: HashSet<&str> = baseline_direct.iter().map(String::as_str).collect();

        let added: Vec<String> = children
            .iter()
            .filter(|(key, _)| !before.contains(key))
            .map(|(_, name)| name.clone())
            .collect();
        let removed: Vec<String> = baseline_direct
            .iter()
            .filter(|key| !current.contains(key.as_str()))
            .map(|key| maps.baseline_name(key))
            .collect();

        Some(StatsDelta {
            direct_reports_net_change: added.len() as i64 - removed.len() as i64,
            total_reports_net_change: total_reports as i64 - baseline_total as i64,
            direct_reports_added: added,
            direct_reports_removed: removed,
        })
    }
}

/// Statistics of one employee, for the node inspector.
pub fn stats_for<'a>(tree: &'a OrgTree, key: &str) -> Option<&'a NodeStats> {
    tree.node_by_key(key).map(|n| &n.stats)
}
