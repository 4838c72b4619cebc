//! Child ordering: changed subtrees first.

use generational_arena::Index;

use crate::domain::arena::{ChangeType, OrgTree};

/// Stable partition: items whose change is added or moved come first.
/// Relative order inside each group is preserved.
pub fn surface_changes<T: Clone>(items: &[T], change_of: impl Fn(&T) -> ChangeType) -> Vec<T> {
    let (mut changed, unchanged): (Vec<T>, Vec<T>) = items
        .iter()
        .cloned()
        .partition(|item| change_of(item).is_surfaced());
    changed.extend(unchanged);
    changed
}

/// Apply [`surface_changes`] to arena children using each node's annotation.
pub fn reorder_children(tree: &OrgTree, children: &[Index]) -> Vec<Index> {
    surface_changes(children, |&idx| {
        tree.get_node(idx).map(|n| n.change).unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_mixed_changes_when_reordering_then_changed_first_and_stable() {
        let items = vec![
            ("a", ChangeType::None),
            ("b", ChangeType::Moved),
            ("c", ChangeType::None),
            ("d", ChangeType::Added),
            ("e", ChangeType::Moved),
        ];

        let ordered = surface_changes(&items, |(_, change)| *change);
        let names: Vec<&str> = ordered.iter().map(|(name, _)| *name).collect();

        assert_eq!(names, vec!["b", "d", "e", "a", "c"]);
    }

    #[test]
    fn given_no_changes_when_reordering_then_input_order_kept() {
        let items = vec![1, 2, 3];
        assert_eq!(surface_changes(&items, |_| ChangeType::None), vec![1, 2, 3]);
    }

    #[test]
    fn given_input_when_reordering_then_input_untouched() {
        let items = vec![("x", ChangeType::None), ("y", ChangeType::Added)];
        let _ = surface_changes(&items, |(_, c)| *c);
        assert_eq!(items[0].0, "x");
    }
}
