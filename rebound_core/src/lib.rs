//! # rebound_core - Rebound Hammer Strength Engine
//!
//! `rebound_core` converts rebound-hammer ("R") readings into estimated
//! concrete characteristic strength against tabulated reference curves,
//! reduces repeated readings into the governing in-situ statistic, and keeps
//! a repository of persisted test records with duplicate handling, portable
//! share tokens, and bulk import/export.
//!
//! ## Design Philosophy
//!
//! - **Stateless engine**: pure functions take readings and return results
//! - **JSON-First**: all persisted and transferred types are serde types
//! - **Rich Errors**: structured error variants, not just strings
//! - **UI-agnostic**: form rendering, charts, and clipboard live in the
//!   caller; the core only ever sees raw numbers and records
//!
//! ## Quick Start
//!
//! ```rust
//! use rebound_core::calculations::strength::{calculate, StrengthInput};
//! use rebound_core::curves::Orientation;
//!
//! let input = StrengthInput {
//!     label: "Column C3".to_string(),
//!     orientation: Orientation::Horizontal,
//!     r_values: vec![30.0; 9],
//! };
//!
//! let result = calculate(&input).unwrap();
//! println!("{}", result.format_report());
//! ```
//!
//! ## Modules
//!
//! - [`curves`] - Reference curves per orientation and interpolation
//! - [`calculations`] - Strength reduction (input/result/calculate)
//! - [`record`] - The persisted TestRecord model
//! - [`store`] - Key-value persistence (memory, atomic single-file)
//! - [`repository`] - Record CRUD with conflict policy
//! - [`share`] - URL-safe share token codec
//! - [`transfer`] - Bulk JSON import/export
//! - [`session`] - Explicit front-end session state
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod curves;
pub mod errors;
pub mod record;
pub mod repository;
pub mod session;
pub mod share;
pub mod store;
pub mod transfer;

// Re-export commonly used types at crate root for convenience
pub use calculations::{calculate, StrengthInput, StrengthResult};
pub use curves::{interpolate, Orientation, ReferenceCurve};
pub use errors::{CoreError, CoreResult};
pub use record::TestRecord;
pub use repository::{ConflictPolicy, SaveOutcome, TestRepository, STORAGE_KEY};
pub use session::Session;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use transfer::{export, import, parse_document, ExportDocument, ImportSummary};
