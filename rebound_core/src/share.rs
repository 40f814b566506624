//! # Share Codec
//!
//! Encodes a single test or a project's tests into one opaque, URL-safe
//! token and back. The codec is a pure transform over plain data: it never
//! consults the repository.
//!
//! ## Token format
//!
//! Canonical JSON payload, then URL-safe no-pad base64 - ASCII with no
//! whitespace and no URL-reserved characters, so the token rides as a query
//! parameter without escaping:
//!
//! ```text
//! https://rebound-tests.app/?share=<token>
//! ```
//!
//! Absence of the parameter is the normal no-op case. A token that does not
//! decode cleanly is reported as corrupt share data, never a panic.
//!
//! ## Example
//!
//! ```rust
//! use rebound_core::curves::Orientation;
//! use rebound_core::record::TestRecord;
//! use rebound_core::share::{decode, encode, SharePayload, TestShare};
//!
//! let record = TestRecord::new("Plant A", "Column C3", Orientation::Horizontal, vec![30.0; 9]);
//! let token = encode(&SharePayload::Test(TestShare::from_record(&record))).unwrap();
//!
//! let payload = decode(&token).unwrap();
//! assert_eq!(payload.into_records().len(), 1);
//! ```

use base64::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::curves::Orientation;
use crate::errors::{CoreError, CoreResult};
use crate::record::TestRecord;

/// Fixed base address share links are built on
pub const SHARE_BASE_URL: &str = "https://rebound-tests.app/";

/// Query parameter carrying the token
pub const SHARE_PARAM: &str = "share";

/// Discriminator tag of a single-test payload.
///
/// A project payload carries no tag; the untagged decode falls through to it
/// when the `type`/`location`/`rValues` trio is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareKind {
    #[serde(rename = "test")]
    Test,
}

/// Payload of a single-test share token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestShare {
    #[serde(rename = "type")]
    pub kind: ShareKind,
    pub project_name: String,
    pub location: String,
    pub test_type: Orientation,
    pub r_values: Vec<f64>,
    pub share_date: DateTime<Utc>,
}

impl TestShare {
    /// Build a share payload from a record.
    pub fn from_record(record: &TestRecord) -> Self {
        TestShare {
            kind: ShareKind::Test,
            project_name: record.project.clone(),
            location: record.location.clone(),
            test_type: record.test_type,
            r_values: record.r_values.clone(),
            share_date: Utc::now(),
        }
    }
}

/// One embedded test of a whole-project share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTest {
    pub location: String,
    pub test_type: Orientation,
    pub r_values: Vec<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Payload of a whole-project share token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectShare {
    pub project_name: String,
    pub share_date: DateTime<Utc>,
    pub tests: Vec<SharedTest>,
}

impl ProjectShare {
    /// Build a whole-project share from a project's records.
    pub fn from_records(project_name: impl Into<String>, records: &[TestRecord]) -> Self {
        ProjectShare {
            project_name: project_name.into(),
            share_date: Utc::now(),
            tests: records
                .iter()
                .map(|r| SharedTest {
                    location: r.location.clone(),
                    test_type: r.test_type,
                    r_values: r.r_values.clone(),
                    timestamp: r.timestamp,
                })
                .collect(),
        }
    }
}

/// A decoded share token: either one test or a whole project slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SharePayload {
    Test(TestShare),
    Project(ProjectShare),
}

impl SharePayload {
    /// Materialize the embedded tests as records with fresh identity.
    ///
    /// A test token yields exactly one record; a project token yields zero
    /// or more.
    pub fn into_records(self) -> Vec<TestRecord> {
        match self {
            SharePayload::Test(share) => vec![TestRecord::new(
                share.project_name,
                share.location,
                share.test_type,
                share.r_values,
            )],
            SharePayload::Project(share) => {
                let project = share.project_name;
                share
                    .tests
                    .into_iter()
                    .map(|t| TestRecord::new(project.clone(), t.location, t.test_type, t.r_values))
                    .collect()
            }
        }
    }
}

/// Encode a payload into an opaque URL-safe token.
pub fn encode(payload: &SharePayload) -> CoreResult<String> {
    let json = serde_json::to_vec(payload).map_err(|e| CoreError::SerializationError {
        reason: e.to_string(),
    })?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token back into its payload. Exact inverse of [`encode`].
pub fn decode(token: &str) -> CoreResult<SharePayload> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| CoreError::share_decode(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| CoreError::share_decode(e.to_string()))
}

/// Build the shareable link carrying a token.
pub fn share_url(token: &str) -> String {
    format!("{SHARE_BASE_URL}?{SHARE_PARAM}={token}")
}

/// Extract the share token from a link, if the parameter is present.
///
/// `None` is the normal no-op case, not an error.
pub fn token_from_url(url: &str) -> Option<&str> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location: &str) -> TestRecord {
        TestRecord::new("Plant A", location, Orientation::Horizontal, vec![30.0; 9])
    }

    #[test]
    fn test_single_test_roundtrip() {
        let payload = SharePayload::Test(TestShare::from_record(&record("Column C3")));
        let token = encode(&payload).unwrap();
        let decoded = decode(&token).unwrap();
        assert_eq!(decoded, payload);

        let records = decoded.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].project, "Plant A");
        assert_eq!(records[0].location, "Column C3");
    }

    #[test]
    fn test_project_roundtrip() {
        let records = vec![record("Column C3"), record("Slab S1")];
        let payload = SharePayload::Project(ProjectShare::from_records("Plant A", &records));
        let token = encode(&payload).unwrap();
        let decoded = decode(&token).unwrap();
        assert_eq!(decoded, payload);

        let materialized = decoded.into_records();
        assert_eq!(materialized.len(), 2);
        assert!(materialized.iter().all(|r| r.project == "Plant A"));
        // Fresh identity on materialization
        assert_ne!(materialized[0].id, records[0].id);
    }

    #[test]
    fn test_empty_project_share_yields_no_records() {
        let payload = SharePayload::Project(ProjectShare::from_records("Plant A", &[]));
        let token = encode(&payload).unwrap();
        assert_eq!(decode(&token).unwrap().into_records().len(), 0);
    }

    #[test]
    fn test_token_is_url_safe() {
        let records: Vec<TestRecord> = (0..12)
            .map(|i| record(&format!("Location {i} & more?")))
            .collect();
        let payload = SharePayload::Project(ProjectShare::from_records("Plant A", &records));
        let token = encode(&payload).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_corrupt_tokens_rejected() {
        assert_eq!(decode("!!!not base64!!!").unwrap_err().error_code(), "SHARE_DECODE");

        // Valid base64, invalid payload
        let garbage = BASE64_URL_SAFE_NO_PAD.encode(b"{\"neither\": \"kind\"}");
        assert_eq!(decode(&garbage).unwrap_err().error_code(), "SHARE_DECODE");

        let not_json = BASE64_URL_SAFE_NO_PAD.encode(b"\xff\xfe binary");
        assert!(decode(&not_json).is_err());
    }

    #[test]
    fn test_share_url_roundtrip() {
        let token = encode(&SharePayload::Test(TestShare::from_record(&record("C3")))).unwrap();
        let url = share_url(&token);
        assert_eq!(token_from_url(&url), Some(token.as_str()));
    }

    #[test]
    fn test_token_from_url_absent_is_none() {
        assert_eq!(token_from_url(SHARE_BASE_URL), None);
        assert_eq!(token_from_url("https://rebound-tests.app/?other=x"), None);
        assert_eq!(token_from_url("https://rebound-tests.app/?share="), None);
    }

    #[test]
    fn test_token_from_url_among_other_params() {
        let url = "https://rebound-tests.app/?utm=1&share=abc123&x=2#frag";
        assert_eq!(token_from_url(url), Some("abc123"));
    }
}
