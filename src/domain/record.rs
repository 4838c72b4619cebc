//! Employee records and the column mapping used to decode uploaded rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::error::DomainError;
use crate::domain::identity::{normalize, RawValue};

/// FTE assumed for records without a usable value.
pub const DEFAULT_FTE: f64 = 1.0;

/// Flat employee record as supplied by the import layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "manager", alias = "manager_id", skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(alias = "job_family", skip_serializing_if = "Option::is_none")]
    pub job_family: Option<String>,
    #[serde(alias = "management_level", skip_serializing_if = "Option::is_none")]
    pub management_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fte: Option<RawValue>,
}

/// Outcome of reading a record's FTE cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FteReading {
    Absent,
    Valid(f64),
    Invalid,
}

impl EmployeeRecord {
    pub fn new(id: impl Into<RawValue>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_manager(mut self, manager_id: impl Into<RawValue>) -> Self {
        self.manager_id = Some(manager_id.into());
        self
    }

    pub fn with_fte(mut self, fte: impl Into<RawValue>) -> Self {
        self.fte = Some(fte.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Normalized identity key of this record.
    pub fn key(&self) -> String {
        normalize(self.id.as_ref())
    }

    /// Normalized identity key of this record's manager, `""` when absent.
    pub fn manager_key(&self) -> String {
        normalize(self.manager_id.as_ref())
    }

    /// Raw manager reference, trimmed, when present and non-blank.
    pub fn manager_ref(&self) -> Option<String> {
        let key = self.manager_key();
        (!key.is_empty()).then_some(key)
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Trimmed name, or the identity key for nameless records.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.key(),
        }
    }

    /// Reads the FTE cell against the accepted `[0, max_fte]` range.
    pub fn fte_reading(&self, max_fte: f64) -> FteReading {
        match &self.fte {
            None => FteReading::Absent,
            Some(raw) if raw.is_blank() => FteReading::Absent,
            Some(raw) => match raw.as_f64() {
                Some(v) if (0.0..=max_fte).contains(&v) => FteReading::Valid(v),
                _ => FteReading::Invalid,
            },
        }
    }

    /// FTE used for aggregation: absent or invalid values count as [`DEFAULT_FTE`].
    pub fn effective_fte(&self, max_fte: f64) -> f64 {
        match self.fte_reading(max_fte) {
            FteReading::Valid(v) => v,
            FteReading::Absent | FteReading::Invalid => DEFAULT_FTE,
        }
    }
}

/// Source keys for each record field in an uploaded row object.
///
/// Each field lists candidate keys; the first one present with a non-null
/// value wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnMapping {
    pub id: Vec<String>,
    pub name: Vec<String>,
    pub manager_id: Vec<String>,
    pub title: Vec<String>,
    pub location: Vec<String>,
    pub job_family: Vec<String>,
    pub management_level: Vec<String>,
    pub fte: Vec<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        fn keys(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }
        Self {
            id: keys(&["id"]),
            name: keys(&["name"]),
            manager_id: keys(&["managerId", "manager", "manager_id"]),
            title: keys(&["title"]),
            location: keys(&["location"]),
            job_family: keys(&["jobFamily", "job_family"]),
            management_level: keys(&["managementLevel", "management_level"]),
            fte: keys(&["fte"]),
        }
    }
}

impl ColumnMapping {
    /// Decode one row. Rows that are not objects decode to an empty record,
    /// which the validator then reports as missing id and name.
    pub fn decode_row(&self, row: &Value) -> EmployeeRecord {
        let Some(obj) = row.as_object() else {
            return EmployeeRecord::default();
        };
        let raw = |candidates: &[String]| -> Option<RawValue> {
            candidates
                .iter()
                .filter_map(|key| obj.get(key))
                .find(|v| !v.is_null())
                .and_then(RawValue::from_json)
        };
        let text = |candidates: &[String]| -> Option<String> {
            raw(candidates)
                .map(|v| v.to_string())
                .filter(|s| !s.trim().is_empty())
        };

        EmployeeRecord {
            id: raw(&self.id),
            name: raw(&self.name).map(|v| v.to_string()),
            manager_id: raw(&self.manager_id),
            title: text(&self.title),
            location: text(&self.location),
            job_family: text(&self.job_family),
            management_level: text(&self.management_level),
            fte: raw(&self.fte),
        }
    }

    /// Decode a batch. Only array-shaped input is accepted.
    pub fn decode(&self, value: &Value) -> Result<Vec<EmployeeRecord>, DomainError> {
        let rows = value.as_array().ok_or(DomainError::NotAnArray)?;
        debug!("decode: {} rows", rows.len());
        Ok(rows.iter().map(|row| self.decode_row(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_default_mapping_when_decoding_then_reads_manager_aliases() {
        let mapping = ColumnMapping::default();
        let records = mapping
            .decode(&json!([
                {"id": 1, "name": "Alice", "manager": null},
                {"id": "2", "name": "Bob", "manager_id": 1, "fte": "0.5"},
            ]))
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].manager_key(), "");
        assert_eq!(records[1].manager_key(), "1");
        assert_eq!(records[1].effective_fte(2.0), 0.5);
    }

    #[test]
    fn given_custom_mapping_when_decoding_then_uses_configured_keys() {
        let mapping = ColumnMapping {
            id: vec!["Employee ID".into()],
            name: vec!["Full Name".into()],
            manager_id: vec!["Reports To".into()],
            ..ColumnMapping::default()
        };
        let records = mapping
            .decode(&json!([{"Employee ID": "E1", "Full Name": "Ann", "Reports To": "E0"}]))
            .unwrap();

        assert_eq!(records[0].key(), "E1");
        assert_eq!(records[0].name.as_deref(), Some("Ann"));
        assert_eq!(records[0].manager_key(), "E0");
    }

    #[test]
    fn given_object_instead_of_array_when_decoding_then_not_an_array() {
        let result = ColumnMapping::default().decode(&json!({"id": 1}));
        assert_eq!(result, Err(DomainError::NotAnArray));
    }

    #[test]
    fn given_invalid_fte_when_reading_then_defaults_to_one() {
        let record = EmployeeRecord::new("1", "A").with_fte("abc");
        assert_eq!(record.fte_reading(2.0), FteReading::Invalid);
        assert_eq!(record.effective_fte(2.0), DEFAULT_FTE);

        let over = EmployeeRecord::new("2", "B").with_fte(2.5);
        assert_eq!(over.fte_reading(2.0), FteReading::Invalid);

        let blank = EmployeeRecord::new("3", "C").with_fte("  ");
        assert_eq!(blank.fte_reading(2.0), FteReading::Absent);
    }
}
