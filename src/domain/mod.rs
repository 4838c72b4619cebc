//! Domain layer: org hierarchy construction, validation and comparison
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod comparison;
pub mod error;
pub mod identity;
pub mod ordering;
pub mod record;
pub mod render;
pub mod stats;
pub mod validator;

pub use arena::{ChangeType, NestedNode, NodeStats, OrgNode, OrgTree, StatsDelta, MAX_VIEW_DEPTH};
pub use builder::{HierarchyBuilder, RootSelection};
pub use comparison::{annotate, build_comparison_maps, classify, ChangeAnalysis, ChangedRecord, ComparisonMaps};
pub use error::DomainError;
pub use identity::{normalize, RawValue};
pub use ordering::{reorder_children, surface_changes};
pub use record::{ColumnMapping, EmployeeRecord, FteReading, DEFAULT_FTE};
pub use render::{OrgTreeConvert, RenderOptions};
pub use stats::{round2, stats_for, StatsAggregator};
pub use validator::{RecordValidator, ValidationReport, ValidationRules, ValidationStats};
