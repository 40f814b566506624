//! # Test Records
//!
//! The persisted unit of the repository: one rebound test series at one
//! project location.
//!
//! ## Identity
//!
//! `id` is a v4 UUID generated at creation and stable across edits; a
//! conflict-resolution overwrite replaces every other field but keeps the id.
//! `(project, location)` is a *soft* uniqueness key used for duplicate
//! detection - two records may legally coexist with the same pair under
//! [`ConflictPolicy::AllowDuplicates`](crate::repository::ConflictPolicy).
//!
//! ## Wire format
//!
//! Stored and transferred as camelCase JSON:
//!
//! ```json
//! {
//!   "id": "5f8f8d2e-...",
//!   "displayName": "Plant A - Column C3",
//!   "project": "Plant A",
//!   "location": "Column C3",
//!   "testType": "Horizontal",
//!   "rValues": [30.0, 31.5, 29.0],
//!   "timestamp": "2025-04-02T09:30:00Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::calculations::strength::MAX_READINGS;
use crate::curves::Orientation;
use crate::errors::{CoreError, CoreResult};

/// A persisted rebound test series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    /// Opaque unique identity, stable across edits
    pub id: String,

    /// Derived human-readable name ("project - location")
    pub display_name: String,

    /// Project the test belongs to
    pub project: String,

    /// Location within the project; may be empty, never null
    #[serde(default)]
    pub location: String,

    /// Hammer orientation the readings were taken with
    pub test_type: Orientation,

    /// Raw rebound readings (0..=20 entries)
    pub r_values: Vec<f64>,

    /// When the record was created
    pub timestamp: DateTime<Utc>,
}

/// Derive the display name from the soft key.
fn display_name_for(project: &str, location: &str) -> String {
    if location.is_empty() {
        project.to_string()
    } else {
        format!("{project} - {location}")
    }
}

impl TestRecord {
    /// Create a new record with a fresh id and timestamp.
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        test_type: Orientation,
        r_values: Vec<f64>,
    ) -> Self {
        let project = project.into();
        let location = location.into();
        TestRecord {
            id: Uuid::new_v4().to_string(),
            display_name: display_name_for(&project, &location),
            project,
            location,
            test_type,
            r_values,
            timestamp: Utc::now(),
        }
    }

    /// Validate the record for saving.
    ///
    /// Saves require both halves of the soft key and a plausible reading
    /// series; a series too short for the statistical reduction is still
    /// saveable (partial series are legitimate), but an empty one is not.
    pub fn validate_for_save(&self) -> CoreResult<()> {
        if self.project.trim().is_empty() {
            return Err(CoreError::missing_field("project"));
        }
        if self.location.trim().is_empty() {
            return Err(CoreError::missing_field("location"));
        }
        if self.r_values.is_empty() {
            return Err(CoreError::missing_field("rValues"));
        }
        if self.r_values.len() > MAX_READINGS {
            return Err(CoreError::invalid_input(
                "rValues",
                self.r_values.len().to_string(),
                format!("A test series holds at most {MAX_READINGS} readings"),
            ));
        }
        Ok(())
    }

    /// Whether this record occupies the given soft key.
    pub fn matches_key(&self, project: &str, location: &str) -> bool {
        self.project == project && self.location == location
    }

    /// Whether two records describe the same measurement: equal project,
    /// location, orientation, and reading sequence. Used for import
    /// duplicate suppression; id and timestamp are deliberately ignored.
    pub fn same_measurement(&self, other: &TestRecord) -> bool {
        self.project == other.project
            && self.location == other.location
            && self.test_type == other.test_type
            && self.r_values == other.r_values
    }

    /// Reissue provenance: fresh id, fresh timestamp, rederived display
    /// name. Imports never preserve source identity.
    pub fn reissue(mut self) -> TestRecord {
        self.id = Uuid::new_v4().to_string();
        self.timestamp = Utc::now();
        self.display_name = display_name_for(&self.project, &self.location);
        self
    }

    /// Replace the soft key, rederiving the display name.
    pub fn relocate(&mut self, project: impl Into<String>, location: impl Into<String>) {
        self.project = project.into();
        self.location = location.into();
        self.display_name = display_name_for(&self.project, &self.location);
    }

    /// Schema-tolerant deserialization of one stored entry.
    ///
    /// The store is not trusted blindly: entries missing a project or a
    /// readings list are unusable and dropped (`None`); everything else is
    /// coerced - missing location becomes the empty string, a missing or
    /// unknown test type falls back to the default orientation, missing id
    /// or timestamp are regenerated, and the display name is rederived when
    /// absent.
    pub fn from_stored(value: &Value) -> Option<TestRecord> {
        let obj = value.as_object()?;

        let project = obj.get("project")?.as_str()?.to_string();
        if project.is_empty() {
            return None;
        }
        let r_values: Vec<f64> = obj
            .get("rValues")?
            .as_array()?
            .iter()
            .filter_map(Value::as_f64)
            .collect();

        let location = obj
            .get("location")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let test_type = obj
            .get("testType")
            .and_then(Value::as_str)
            .and_then(Orientation::from_label)
            .unwrap_or_default();
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let timestamp = obj
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let display_name = obj
            .get("displayName")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| display_name_for(&project, &location));

        Some(TestRecord {
            id,
            display_name,
            project,
            location,
            test_type,
            r_values,
            timestamp,
        })
    }
}
