use rstest::rstest;
use serde_json::json;

use orgtree::domain::{ColumnMapping, EmployeeRecord, HierarchyBuilder, OrgTree, RootSelection, StatsAggregator};
use orgtree::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn rec(id: &str, name: &str, manager: Option<&str>) -> EmployeeRecord {
    let record = EmployeeRecord::new(id, name);
    match manager {
        Some(m) => record.with_manager(m),
        None => record,
    }
}

fn keys(tree: &OrgTree) -> Vec<String> {
    tree.iter().map(|(_, n)| n.key.clone()).collect()
}

fn parent_key(tree: &OrgTree, key: &str) -> Option<String> {
    let node = tree.node_by_key(key)?;
    node.parent
        .and_then(|p| tree.get_node(p))
        .map(|p| p.key.clone())
}

fn sample() -> Vec<EmployeeRecord> {
    vec![
        rec("1", "Alice", None),
        rec("2", "Bob", Some("1")),
        rec("3", "Cara", Some("1")),
        rec("4", "Dan", Some("2")),
        rec("5", "Eve", Some("2")),
        rec("6", "Finn", Some("3")),
    ]
}

#[test]
fn given_well_formed_batch_when_building_then_all_nodes_under_single_root() {
    // Arrange
    let records = sample();

    // Act
    let mut tree = HierarchyBuilder::new().build(&records).expect("tree");
    StatsAggregator::default().compute(&mut tree, None);

    // Assert
    assert_eq!(tree.len(), records.len());
    let root = tree.root_node().expect("root");
    assert_eq!(root.key, "1");
    assert_eq!(root.stats.total_reports, records.len() - 1);
    assert_eq!(tree.depth(), 3);
    assert_eq!(keys(&tree), vec!["1", "2", "4", "5", "3", "6"]);
}

#[test]
fn given_records_when_building_then_children_keep_input_order() {
    let records = vec![
        rec("1", "Root", None),
        rec("c", "C", Some("1")),
        rec("a", "A", Some("1")),
        rec("b", "B", Some("1")),
    ];

    let tree = HierarchyBuilder::new().build(&records).unwrap();

    let root = tree.root_node().unwrap();
    let children: Vec<&str> = root
        .children
        .iter()
        .filter_map(|&c| tree.get_node(c))
        .map(|n| n.key.as_str())
        .collect();
    assert_eq!(children, vec!["c", "a", "b"]);
}

#[test]
fn given_report_listed_before_manager_when_building_then_still_attached() {
    let records = vec![rec("2", "Bob", Some("1")), rec("1", "Alice", None)];

    let tree = HierarchyBuilder::new().build(&records).unwrap();

    assert_eq!(tree.len(), 2);
    assert_eq!(tree.root_node().unwrap().key, "1");
    assert_eq!(parent_key(&tree, "2").as_deref(), Some("1"));
}

#[test]
fn given_same_input_when_building_twice_then_identical_trees() {
    let records = sample();

    let first = HierarchyBuilder::new().build(&records).unwrap();
    let second = HierarchyBuilder::new().build(&records).unwrap();

    assert_eq!(keys(&first), keys(&second));
    for key in keys(&first) {
        assert_eq!(parent_key(&first, &key), parent_key(&second, &key));
    }
}

#[test]
fn given_two_node_cycle_when_building_then_terminates_with_single_root() {
    // Arrange: A reports to B, B reports to A
    let records = vec![rec("a", "A", Some("b")), rec("b", "B", Some("a"))];

    // Act
    let tree = HierarchyBuilder::new().build(&records).expect("tree");

    // Assert
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.root_node().unwrap().key, "b");
    assert_eq!(parent_key(&tree, "a").as_deref(), Some("b"));
    assert_eq!(parent_key(&tree, "b"), None);
}

#[test]
fn given_longer_cycle_when_building_then_every_node_visited_once() {
    let records = vec![
        rec("a", "A", Some("c")),
        rec("b", "B", Some("a")),
        rec("c", "C", Some("b")),
        rec("d", "D", Some("a")),
    ];

    let tree = HierarchyBuilder::new().build(&records).unwrap();

    let visited = keys(&tree);
    assert_eq!(visited.len(), tree.len());
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.root_node().unwrap().key, "c");
}

#[test]
fn given_self_managed_employee_when_building_then_it_is_root() {
    let records = vec![rec("1", "Alice", Some("1")), rec("2", "Bob", Some("1"))];

    let tree = HierarchyBuilder::new().build(&records).unwrap();

    assert_eq!(tree.root_node().unwrap().key, "1");
    assert_eq!(tree.len(), 2);
}

#[rstest]
#[case(RootSelection::LastCandidate, "3", vec!["3", "4"])]
#[case(RootSelection::FirstCandidate, "1", vec!["1", "2"])]
fn given_multiple_roots_when_building_then_selection_picks_one_and_drops_rest(
    #[case] selection: RootSelection,
    #[case] expected_root: &str,
    #[case] expected_keys: Vec<&str>,
) {
    // Arrange
    let records = vec![
        rec("1", "Alice", None),
        rec("2", "Bob", Some("1")),
        rec("3", "Cara", None),
        rec("4", "Dan", Some("3")),
    ];

    // Act
    let tree = HierarchyBuilder::new()
        .with_root_selection(selection)
        .build(&records)
        .unwrap();

    // Assert
    assert_eq!(tree.root_node().unwrap().key, expected_root);
    assert_eq!(keys(&tree), expected_keys);
}

#[test]
fn given_unknown_manager_when_building_then_record_is_root_candidate() {
    let records = vec![rec("1", "Alice", None), rec("2", "Bob", Some("99"))];

    let tree = HierarchyBuilder::new().build(&records).unwrap();

    // last candidate wins, Alice is outside the chosen subtree
    assert_eq!(tree.root_node().unwrap().key, "2");
    assert_eq!(tree.len(), 1);
    assert!(tree.node_by_key("1").is_none());
}

#[test]
fn given_duplicate_ids_when_building_then_first_record_is_used() {
    let records = vec![
        rec("1", "Root", None),
        rec("5", "First", Some("1")),
        rec("5", "Second", Some("1")),
    ];

    let tree = HierarchyBuilder::new().build(&records).unwrap();

    assert_eq!(tree.len(), 2);
    assert_eq!(tree.node_by_key("5").unwrap().name(), "First");
    assert_eq!(tree.root_node().unwrap().children.len(), 1);
}

#[test]
fn given_mixed_id_types_when_building_then_matched_by_normalized_identity() {
    // Arrange
    let rows = json!([
        {"id": 1, "name": "Alice"},
        {"id": "2", "name": "Bob", "managerId": "1"},
        {"id": 3.0, "name": "Cara", "manager": " 2 "},
    ]);

    // Act
    let tree = HierarchyBuilder::new()
        .build_value(&rows, &ColumnMapping::default())
        .unwrap();

    // Assert
    assert_eq!(tree.len(), 3);
    assert_eq!(parent_key(&tree, "2").as_deref(), Some("1"));
    assert_eq!(parent_key(&tree, "3").as_deref(), Some("2"));
}

#[test]
fn given_empty_batch_when_building_then_none() {
    assert!(HierarchyBuilder::new().build(&[]).is_none());
}

#[test]
fn given_records_without_ids_when_building_then_none() {
    let records = vec![EmployeeRecord::default(), EmployeeRecord::default()];

    assert!(HierarchyBuilder::new().build(&records).is_none());
}

#[test]
fn given_non_array_value_when_building_then_none() {
    let result = HierarchyBuilder::new().build_value(&json!({"id": 1}), &ColumnMapping::default());

    assert!(result.is_none());
}

#[test]
fn given_tree_when_querying_then_chain_of_command_and_leaves() {
    let tree = HierarchyBuilder::new().build(&sample()).unwrap();

    let dan = tree.find("4").unwrap();
    let chain: Vec<String> = tree.chain_of_command(dan).iter().map(|n| n.name()).collect();
    assert_eq!(chain, vec!["Bob", "Alice"]);

    let root = tree.root().unwrap();
    assert!(tree.chain_of_command(root).is_empty());
    assert_eq!(tree.leaf_nodes(), vec!["4", "5", "6"]);
}

#[test]
fn given_tree_when_walking_postorder_then_children_before_parents() {
    let tree = HierarchyBuilder::new().build(&sample()).unwrap();

    let order: Vec<String> = tree.iter_postorder().map(|(_, n)| n.key.clone()).collect();

    assert_eq!(order, vec!["4", "5", "2", "6", "3", "1"]);
}

#[rstest]
#[case(RootSelection::LastCandidate, "b", vec!["b", "a"])]
#[case(RootSelection::FirstCandidate, "r", vec!["r", "x"])]
fn given_cycle_listed_after_real_root_when_building_then_selection_decides_root(
    #[case] selection: RootSelection,
    #[case] expected_root: &str,
    #[case] expected_keys: Vec<&str>,
) {
    // Arrange
    let records = vec![
        rec("r", "Root", None),
        rec("x", "X", Some("r")),
        rec("a", "A", Some("b")),
        rec("b", "B", Some("a")),
    ];

    // Act
    let tree = HierarchyBuilder::new()
        .with_root_selection(selection)
        .build(&records)
        .unwrap();

    // Assert
    assert_eq!(tree.root_node().unwrap().key, expected_root);
    assert_eq!(keys(&tree), expected_keys);
}
