//! Record validation: blocking errors and non-blocking warnings for a batch.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::record::{ColumnMapping, EmployeeRecord, FteReading};

/// Tunable validation limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationRules {
    /// Upper bound of the accepted FTE range (inclusive)
    pub max_fte: f64,
    /// How many orphaned manager ids the aggregated warning lists
    pub orphan_preview: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_fte: 2.0,
            orphan_preview: 5,
        }
    }
}

/// Aggregate figures about a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total_employees: usize,
    pub unique_managers: usize,
    pub hierarchy_levels: usize,
    pub orphaned_managers: usize,
    pub average_team_size: f64,
}

/// Result of validating a batch. Always produced, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    /// Report for input that is not a list of rows.
    pub fn shape_error(error: &DomainError) -> Self {
        Self {
            errors: vec![error.to_string()],
            ..Self::default()
        }
    }

    /// Any error blocks finalization.
    pub fn is_blocking(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Warnings never block finalization.
    pub fn can_finalize(&self) -> bool {
        !self.is_blocking()
    }
}

/// Validates flat record batches.
#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    rules: ValidationRules,
}

impl RecordValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    /// Validate raw JSON. Non-array input yields a single shape error.
    pub fn validate_value(&self, value: &Value, mapping: &ColumnMapping) -> ValidationReport {
        match mapping.decode(value) {
            Ok(records) => self.validate(&records),
            Err(e) => ValidationReport::shape_error(&e),
        }
    }

    #[instrument(level = "debug", skip_all, fields(rows = records.len()))]
    pub fn validate(&self, records: &[EmployeeRecord]) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut valid_rows = 0;

        // key -> first row (1-based) it appeared on
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut known: HashMap<String, &EmployeeRecord> = HashMap::new();

        for (i, record) in records.iter().enumerate() {
            let row = i + 1;
            let key = record.key();
            let manager_key = record.manager_key();

            if key.is_empty() {
                errors.push(format!("Row {}: missing employee ID", row));
            }
            if !record.has_name() {
                errors.push(format!("Row {}: missing employee name", row));
            }
            if !key.is_empty() && record.has_name() {
                valid_rows += 1;
            }
            if !key.is_empty() {
                match first_seen.get(&key) {
                    Some(first) => errors.push(format!(
                        "Row {}: duplicate employee ID '{}' (first seen at row {})",
                        row, key, first
                    )),
                    None => {
                        first_seen.insert(key.clone(), row);
                        known.insert(key.clone(), record);
                    }
                }
            }
            if !manager_key.is_empty() && manager_key == key {
                errors.push(format!(
                    "Row {}: employee '{}' cannot report to themselves",
                    row, key
                ));
            }
            if record.fte_reading(self.rules.max_fte) == FteReading::Invalid {
                let raw = record.fte.as_ref().map(|v| v.to_string()).unwrap_or_default();
                warnings.push(format!(
                    "Row {}: Invalid FTE value '{}' for employee '{}' (expected 0-{})",
                    row, raw, key, self.rules.max_fte
                ));
            }
        }

        // Manager references in first-reference order, self references excluded
        let referenced: Vec<String> = records
            .iter()
            .filter_map(|r| r.manager_ref().filter(|m| *m != r.key()))
            .unique()
            .collect();
        let orphans: Vec<&String> = referenced.iter().filter(|m| !known.contains_key(*m)).collect();
        if !orphans.is_empty() {
            warnings.push(orphan_warning(&orphans, self.rules.orphan_preview));
        }

        let stats = ValidationStats {
            total_employees: known.len(),
            unique_managers: referenced.len(),
            hierarchy_levels: hierarchy_levels(&known),
            orphaned_managers: orphans.len(),
            average_team_size: average_team_size(&known),
        };
        debug!(
            "validate: {} errors, {} warnings, {} levels",
            errors.len(),
            warnings.len(),
            stats.hierarchy_levels
        );

        ValidationReport {
            total_rows: records.len(),
            valid_rows,
            errors,
            warnings,
            stats,
        }
    }
}

fn orphan_warning(orphans: &[&String], preview: usize) -> String {
    let listed = orphans.iter().take(preview).join(", ");
    let mut message = format!(
        "{} manager ID(s) referenced but not defined as employees: {}",
        orphans.len(),
        listed
    );
    if orphans.len() > preview {
        message.push_str(&format!(" and {} more", orphans.len() - preview));
    }
    message
}

/// Longest manager chain, counted in people. A chain that loops counts as 0.
fn hierarchy_levels(known: &HashMap<String, &EmployeeRecord>) -> usize {
    known
        .keys()
        .map(|start| chain_length(start, known))
        .max()
        .unwrap_or(0)
}

fn chain_length(start: &str, known: &HashMap<String, &EmployeeRecord>) -> usize {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = start.to_string();
    let mut depth = 0;
    while let Some((key, record)) = known.get_key_value(current.as_str()) {
        if !visited.insert(key.as_str()) {
            return 0;
        }
        depth += 1;
        current = record.manager_key();
    }
    depth
}

/// Mean direct-report count over managers with at least one report, 1 decimal.
fn average_team_size(known: &HashMap<String, &EmployeeRecord>) -> f64 {
    let teams = known
        .iter()
        .filter_map(|(key, record)| record.manager_ref().filter(|m| m != key))
        .counts();
    if teams.is_empty() {
        return 0.0;
    }
    let members: usize = teams.values().sum();
    let mean = members as f64 / teams.len() as f64;
    (mean * 10.0).round() / 10.0
}
