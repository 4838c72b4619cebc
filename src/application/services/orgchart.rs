//! Org chart service
//!
//! Orchestrates loading, validation, hierarchy construction, snapshot
//! comparison and statistics for the CLI and library callers.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    annotate, build_comparison_maps, classify, ChangeAnalysis, ChangeType, ComparisonMaps, DomainError,
    EmployeeRecord, HierarchyBuilder, NodeStats, OrgTree, RecordValidator, StatsAggregator, ValidationReport,
};
use crate::infrastructure::traits::FileSystem;

/// A single batch, validated and built.
#[derive(Debug)]
pub struct Preview {
    pub report: ValidationReport,
    /// `None` when the batch holds no identifiable record
    pub tree: Option<OrgTree>,
}

/// A baseline/target comparison session.
#[derive(Debug)]
pub struct Comparison {
    pub baseline_report: ValidationReport,
    pub target_report: ValidationReport,
    pub analysis: ChangeAnalysis,
    pub maps: ComparisonMaps,
    /// Annotated target tree with baseline deltas
    pub tree: Option<OrgTree>,
}

/// Everything the node inspector shows about one employee.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInspection {
    pub key: String,
    pub record: EmployeeRecord,
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_manager_name: Option<String>,
    pub stats: NodeStats,
    /// Manager names from the direct manager up to the root
    pub chain_of_command: Vec<String>,
    /// Direct report names in display order
    pub direct_reports: Vec<String>,
}

/// Service for building and comparing org charts.
pub struct OrgChartService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl OrgChartService {
    /// Create a new org chart service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    fn builder(&self) -> HierarchyBuilder {
        HierarchyBuilder::new().with_root_selection(self.settings.hierarchy.root_selection)
    }

    fn validator(&self) -> RecordValidator {
        RecordValidator::new(self.settings.validation.clone())
    }

    fn aggregator(&self) -> StatsAggregator {
        StatsAggregator::new(self.settings.validation.max_fte)
    }

    /// Read and parse a JSON upload without interpreting its shape.
    pub fn load_value(&self, path: &Path) -> ApplicationResult<Value> {
        debug!("load_value: {}", path.display());
        if !self.fs.exists(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("file not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }
        let content = self.fs.read_to_string(path).with_path_context("read records", path)?;
        serde_json::from_str(&content).map_err(|source| ApplicationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load records through the configured column mapping.
    pub fn load_records(&self, path: &Path) -> ApplicationResult<Vec<EmployeeRecord>> {
        let value = self.load_value(path)?;
        let records = self.settings.columns.decode(&value)?;
        info!("load_records: {} rows from {}", records.len(), path.display());
        Ok(records)
    }

    /// Validate a JSON upload. Shape problems end up in the report.
    pub fn validate(&self, path: &Path) -> ApplicationResult<ValidationReport> {
        let value = self.load_value(path)?;
        Ok(self.validator().validate_value(&value, &self.settings.columns))
    }

    /// Validate, build and aggregate one batch.
    pub fn preview_records(&self, records: &[EmployeeRecord]) -> Preview {
        let report = self.validator().validate(records);
        let mut tree = self.builder().build(records);
        if let Some(tree) = tree.as_mut() {
            self.aggregator().compute(tree, None);
        }
        Preview { report, tree }
    }

    pub fn preview(&self, path: &Path) -> ApplicationResult<Preview> {
        let value = self.load_value(path)?;
        match self.settings.columns.decode(&value) {
            Ok(records) => Ok(self.preview_records(&records)),
            Err(e) => Ok(Preview {
                report: ValidationReport::shape_error(&e),
                tree: None,
            }),
        }
    }

    /// Full comparison: classify, annotate the target tree and attach
    /// statistics with baseline deltas.
    pub fn compare_records(&self, baseline: &[EmployeeRecord], target: &[EmployeeRecord]) -> Comparison {
        let validator = self.validator();
        let baseline_report = validator.validate(baseline);
        let target_report = validator.validate(target);

        let baseline_tree = self.builder().build(baseline);
        let maps = build_comparison_maps(baseline, baseline_tree.as_ref());
        let analysis = classify(baseline, target);

        let mut tree = self.builder().build(target);
        if let Some(tree) = tree.as_mut() {
            annotate(tree, &analysis);
            self.aggregator().compute(tree, Some(&maps));
        }
        info!("compare: {} direct changes", analysis.total_direct_changes);

        Comparison {
            baseline_report,
            target_report,
            analysis,
            maps,
            tree,
        }
    }

    pub fn compare(&self, baseline: &Path, target: &Path) -> ApplicationResult<Comparison> {
        let baseline = self.load_records(baseline)?;
        let target = self.load_records(target)?;
        Ok(self.compare_records(&baseline, &target))
    }

    /// Inspect one employee of a built tree.
    pub fn inspect_tree(&self, tree: &OrgTree, id: &str) -> ApplicationResult<NodeInspection> {
        let key = id.trim();
        let idx = tree
            .find(key)
            .ok_or_else(|| DomainError::UnknownEmployee(key.to_string()))?;
        let node = tree
            .get_node(idx)
            .ok_or_else(|| DomainError::UnknownEmployee(key.to_string()))?;

        Ok(NodeInspection {
            key: node.key.clone(),
            record: node.record.clone(),
            change_type: node.change,
            previous_manager_name: node.previous_manager_name.clone(),
            stats: node.stats.clone(),
            chain_of_command: tree.chain_of_command(idx).iter().map(|n| n.name()).collect(),
            direct_reports: node
                .children
                .iter()
                .filter_map(|&c| tree.get_node(c))
                .map(|c| c.name())
                .collect(),
        })
    }

    pub fn inspect_records(&self, records: &[EmployeeRecord], id: &str) -> ApplicationResult<NodeInspection> {
        let preview = self.preview_records(records);
        let tree = preview.tree.ok_or(DomainError::EmptyDataset)?;
        self.inspect_tree(&tree, id)
    }

    pub fn inspect(&self, path: &Path, id: &str) -> ApplicationResult<NodeInspection> {
        let records = self.load_records(path)?;
        self.inspect_records(&records, id)
    }
}
