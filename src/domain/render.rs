/*
Conversion of the arena tree into a termtree::Tree for terminal display.
termtree owns its nodes, so leaves are assembled bottom-up from a post-order walk.
 */
use termtree::Tree;

use crate::domain::arena::{ChangeType, OrgNode, OrgTree, MAX_VIEW_DEPTH};
use crate::domain::error::DomainError;

/// What to show next to each employee.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub show_stats: bool,
    pub show_changes: bool,
    /// Deeper trees are refused
    pub max_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_stats: true,
            show_changes: true,
            max_depth: MAX_VIEW_DEPTH,
        }
    }
}

pub trait OrgTreeConvert {
    fn to_display_tree(&self, opts: RenderOptions) -> Result<Tree<String>, DomainError>;
}

impl OrgTreeConvert for OrgTree {
    fn to_display_tree(&self, opts: RenderOptions) -> Result<Tree<String>, DomainError> {
        self.ensure_depth(opts.max_depth)?;
        let tree = self
            .fold(|node, leaves| Tree::new(node_label(node, opts)).with_leaves(leaves))
            .unwrap_or_else(|| Tree::new("Empty org chart".to_string()));
        Ok(tree)
    }
}

/// One-line description of a node.
pub fn node_label(node: &OrgNode, opts: RenderOptions) -> String {
    let mut label = format!("{} ({})", node.name(), node.key);
    if let Some(title) = &node.record.title {
        label.push_str(&format!(" - {}", title));
    }
    if opts.show_changes {
        match node.change {
            ChangeType::Added => label.push_str(" [+]"),
            ChangeType::Moved => {
                let from = node.previous_manager_name.as_deref().unwrap_or("?");
                label.push_str(&format!(" [~ from {}]", from));
            }
            ChangeType::None | ChangeType::Removed => {}
        }
    }
    if opts.show_stats {
        let stats = &node.stats;
        label.push_str(&format!(
            " | reports: {}/{}, fte: {}",
            stats.direct_reports, stats.total_reports, stats.total_fte
        ));
        if let Some(delta) = &stats.delta {
            if delta.direct_reports_net_change != 0
                || delta.total_reports_net_change != 0
                || !delta.direct_reports_added.is_empty()
                || !delta.direct_reports_removed.is_empty()
            {
                label.push_str(&format!(
                    " (+{}/-{}, total {:+})",
                    delta.direct_reports_added.len(),
                    delta.direct_reports_removed.len(),
                    delta.total_reports_net_change
                ));
            }
        }
    }
    label
}
