//! # Import / Export
//!
//! Bulk JSON transfer of a project's records. Exports are self-contained:
//! each record whose readings reduce successfully carries a pre-computed
//! results block, so the artifact is meaningful without re-running the
//! engine. Imports regenerate provenance (id, timestamp) and suppress exact
//! duplicates.
//!
//! ## Document shape
//!
//! ```json
//! {
//!   "projectName": "Plant A",
//!   "exportDate": "2025-04-02T09:30:00Z",
//!   "testCount": 1,
//!   "tests": [
//!     {
//!       "id": "...",
//!       "displayName": "Plant A - Column C3",
//!       "project": "Plant A",
//!       "location": "Column C3",
//!       "testType": "Horizontal",
//!       "rValues": [30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0],
//!       "timestamp": "2025-04-01T14:00:00Z",
//!       "calculatedResults": {
//!         "fckCube": [25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0],
//!         "fckCylinder": [20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0],
//!         "statistics": {
//!           "n": 9, "k1": 1.67, "mean": 20.0, "stdDev": 0.0, "min": 20.0,
//!           "fckIs1": 20.0, "fckIs2": 24.0, "finalFckIs": 20.0
//!         }
//!       }
//!     }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calculations::strength::{calculate, StrengthInput, StrengthResult};
use crate::errors::{CoreError, CoreResult};
use crate::record::TestRecord;

/// Statistics block embedded in an exported record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub n: usize,
    pub k1: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub fck_is1: f64,
    pub fck_is2: f64,
    pub final_fck_is: f64,
}

/// Pre-computed results embedded in an exported record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedResults {
    pub fck_cube: Vec<f64>,
    pub fck_cylinder: Vec<f64>,
    pub statistics: StatisticsSummary,
}

impl From<StrengthResult> for CalculatedResults {
    fn from(result: StrengthResult) -> Self {
        CalculatedResults {
            fck_cube: result.fck_cube,
            fck_cylinder: result.fck_cylinder,
            statistics: StatisticsSummary {
                n: result.n,
                k1: result.k1,
                mean: result.mean,
                std_dev: result.std_dev,
                min: result.min,
                fck_is1: result.fck_is1,
                fck_is2: result.fck_is2,
                final_fck_is: result.fck_is,
            },
        }
    }
}

/// One record of an export document, optionally with computed results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedTest {
    #[serde(flatten)]
    pub record: TestRecord,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_results: Option<CalculatedResults>,
}

/// A project export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub project_name: String,
    pub export_date: DateTime<Utc>,
    pub test_count: usize,
    pub tests: Vec<ExportedTest>,
}

/// Outcome of an import: admitted records and the count of entries skipped
/// (unusable or duplicate).
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub imported: Vec<TestRecord>,
    pub skipped: usize,
}

/// Build an export document for a project's records.
///
/// Records whose readings reduce successfully (at least 9 valid values)
/// carry an embedded [`CalculatedResults`]; the rest are exported as bare
/// records.
pub fn export(project_name: impl Into<String>, records: &[TestRecord]) -> ExportDocument {
    let tests: Vec<ExportedTest> = records
        .iter()
        .map(|record| {
            let input = StrengthInput {
                label: record.display_name.clone(),
                orientation: record.test_type,
                r_values: record.r_values.clone(),
            };
            ExportedTest {
                record: record.clone(),
                calculated_results: calculate(&input).ok().map(CalculatedResults::from),
            }
        })
        .collect();

    ExportDocument {
        project_name: project_name.into(),
        export_date: Utc::now(),
        test_count: tests.len(),
        tests,
    }
}

/// Raw import document: top level validated, per-record entries left as
/// values for tolerant per-record admission.
#[derive(Debug, Clone)]
pub struct ImportDocument {
    pub project_name: Option<String>,
    pub tests: Vec<Value>,
}

/// Parse an import document from JSON text.
///
/// A top level that is not an object or lacks a `tests` list fails the whole
/// import; per-record problems are deferred to [`import`].
pub fn parse_document(json: &str) -> CoreResult<ImportDocument> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| CoreError::import_parse(e.to_string()))?;

    let obj = value
        .as_object()
        .ok_or_else(|| CoreError::import_parse("document is not an object"))?;

    let tests = obj
        .get("tests")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::import_parse("document has no tests list"))?
        .clone();

    let project_name = obj
        .get("projectName")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ImportDocument { project_name, tests })
}

/// Admit a document's records against the existing set.
///
/// Per entry: skip when it lacks a project or a readings list; skip as
/// duplicate when an existing record - or one admitted earlier in this same
/// import - matches on (project, location, testType, rValues); otherwise
/// admit with fresh id and timestamp. A bad entry never aborts the rest.
pub fn import(document: &ImportDocument, existing: &[TestRecord]) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for value in &document.tests {
        let Some(candidate) = TestRecord::from_stored(value) else {
            summary.skipped += 1;
            continue;
        };

        let duplicate = existing
            .iter()
            .chain(summary.imported.iter())
            .any(|r| r.same_measurement(&candidate));
        if duplicate {
            summary.skipped += 1;
            continue;
        }

        summary.imported.push(candidate.reissue());
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::Orientation;
    use serde_json::json;

    fn record(location: &str, r_values: Vec<f64>) -> TestRecord {
        TestRecord::new("Plant A", location, Orientation::Horizontal, r_values)
    }

    #[test]
    fn test_export_embeds_results_when_reducible() {
        let full = record("Column C3", vec![30.0; 9]);
        let partial = record("Column C4", vec![30.0; 5]);

        let doc = export("Plant A", &[full, partial]);
        assert_eq!(doc.project_name, "Plant A");
        assert_eq!(doc.test_count, 2);

        let results = doc.tests[0].calculated_results.as_ref().unwrap();
        assert_eq!(results.statistics.n, 9);
        assert_eq!(results.statistics.k1, 1.67);
        assert_eq!(results.statistics.final_fck_is, 20.0);
        assert!(doc.tests[1].calculated_results.is_none());
    }

    #[test]
    fn test_export_document_wire_names() {
        let doc = export("Plant A", &[record("Column C3", vec![30.0; 9])]);
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"projectName\""));
        assert!(json.contains("\"exportDate\""));
        assert!(json.contains("\"testCount\""));
        assert!(json.contains("\"calculatedResults\""));
        assert!(json.contains("\"finalFckIs\""));

        let roundtrip: ExportDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, doc);
    }

    #[test]
    fn test_import_roundtrip_and_idempotency() {
        let records = vec![
            record("Column C3", vec![30.0; 9]),
            record("Column C4", vec![35.0; 9]),
        ];
        let doc_json = serde_json::to_string(&export("Plant A", &records)).unwrap();
        let doc = parse_document(&doc_json).unwrap();

        // First import into an empty set admits everything
        let first = import(&doc, &[]);
        assert_eq!(first.imported.len(), 2);
        assert_eq!(first.skipped, 0);
        // Provenance regenerated
        assert!(first.imported.iter().all(|r| r.id != records[0].id));
        assert!(first.imported.iter().all(|r| r.id != records[1].id));

        // Importing the same document again skips everything
        let second = import(&doc, &first.imported);
        assert!(second.imported.is_empty());
        assert_eq!(second.skipped, 2);
    }

    #[test]
    fn test_import_skips_unusable_entries_without_aborting() {
        let doc = ImportDocument {
            project_name: Some("Plant A".to_string()),
            tests: vec![
                json!({"location": "no project", "rValues": [30.0]}),
                json!({"project": "Plant A", "location": "no readings"}),
                json!({"project": "Plant A", "location": "ok", "testType": "Horizontal", "rValues": [30.0, 31.0]}),
                json!(17),
            ],
        };

        let summary = import(&doc, &[]);
        assert_eq!(summary.imported.len(), 1);
        assert_eq!(summary.imported[0].location, "ok");
        assert_eq!(summary.skipped, 3);
    }

    #[test]
    fn test_import_suppresses_duplicates_within_document() {
        let entry = json!({
            "project": "Plant A",
            "location": "Column C3",
            "testType": "Horizontal",
            "rValues": [30.0, 31.0]
        });
        let doc = ImportDocument {
            project_name: None,
            tests: vec![entry.clone(), entry],
        };

        let summary = import(&doc, &[]);
        assert_eq!(summary.imported.len(), 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_parse_document_top_level_failures() {
        assert_eq!(
            parse_document("not json").unwrap_err().error_code(),
            "IMPORT_PARSE"
        );
        assert_eq!(
            parse_document("[1, 2, 3]").unwrap_err().error_code(),
            "IMPORT_PARSE"
        );
        assert_eq!(
            parse_document("{\"projectName\": \"Plant A\"}")
                .unwrap_err()
                .error_code(),
            "IMPORT_PARSE"
        );
    }

    #[test]
    fn test_parse_document_accepts_minimal_shape() {
        let doc = parse_document("{\"tests\": []}").unwrap();
        assert!(doc.tests.is_empty());
        assert_eq!(doc.project_name, None);

        let summary = import(&doc, &[]);
        assert!(summary.imported.is_empty());
        assert_eq!(summary.skipped, 0);
    }
}
