//! # Strength Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(input) -> CoreResult<*Result>` - Pure calculation function
//!
//! Results are ephemeral: they are produced fresh on every calculation and
//! never stored by the repository (exports may embed a read-only copy).
//!
//! ## Available Calculations
//!
//! - [`strength`] - Characteristic in-situ strength from rebound readings

pub mod strength;

pub use strength::{calculate, StrengthInput, StrengthResult};
