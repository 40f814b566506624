//! # Characteristic Strength Calculation
//!
//! Reduces a series of rebound readings into the characteristic in-situ
//! strength of the tested concrete.
//!
//! ## Procedure
//!
//! 1. Interpolate each reading against the orientation's reference curve to
//!    an equivalent 150 mm cube strength; readings outside the curve range
//!    are excluded, not errors.
//! 2. Convert each cube strength to cylinder strength (divide by 1.25).
//! 3. With fewer than 9 valid values the series is rejected.
//! 4. Compute mean, Bessel-corrected sample standard deviation, and minimum.
//! 5. Look up the count-dependent multiplier k1 and evaluate both candidate
//!    formulas; the lower one governs:
//!
//! ```text
//! fck_is1 = mean - k1 * stddev
//! fck_is2 = min + 4
//! fck_is  = min(fck_is1, fck_is2)
//! ```
//!
//! ## Example
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
//! assert_eq!(result.n, 9);
//! assert_eq!(result.fck_is, 20.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::curves::Orientation;
use crate::errors::{CoreError, CoreResult};

/// Fixed cube-to-cylinder strength conversion factor
pub const CUBE_TO_CYLINDER: f64 = 1.25;

/// Minimum number of valid readings for a statistical reduction
pub const MIN_READINGS: usize = 9;

/// Maximum number of readings in a test series
pub const MAX_READINGS: usize = 20;

/// Margin added to the minimum cylinder strength for the second candidate
/// formula (fck_is2 = min + 4)
const MIN_PLUS_MARGIN: f64 = 4.0;

/// Standard-deviation multiplier k1 for a given count of valid readings.
///
/// Fixed table for n = 9..=15; flat 1.48 for any larger n. `None` below 9 -
/// the reduction has already rejected such a series.
pub fn k1_factor(n: usize) -> Option<f64> {
    match n {
        0..=8 => None,
        9 => Some(1.67),
        10 => Some(1.62),
        11 => Some(1.58),
        12 => Some(1.55),
        13 => Some(1.52),
        14 => Some(1.50),
        15 => Some(1.48),
        _ => Some(1.48),
    }
}

/// Input parameters for a strength calculation.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Column C3",
///   "orientation": "Horizontal",
///   "rValues": [30.0, 31.5, 29.0, 32.0, 30.5, 28.5, 31.0, 30.0, 29.5]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthInput {
    /// User label for this test series (e.g., "Column C3")
    pub label: String,

    /// Hammer orientation, selecting the reference curve
    pub orientation: Orientation,

    /// Raw rebound readings as entered by the operator
    pub r_values: Vec<f64>,
}

impl StrengthInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CoreResult<()> {
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
}

/// Results from a strength calculation.
///
/// All values are carried at full precision; rounding to two decimals happens
/// only in [`StrengthResult::format_report`].
///
/// ## JSON Example
///
/// ```json
/// {
///   "readings": [30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0],
///   "fckCube": [25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0],
///   "fckCylinder": [20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0],
///   "n": 9,
///   "k1": 1.67,
///   "mean": 20.0,
///   "stdDev": 0.0,
///   "min": 20.0,
///   "fckIs1": 20.0,
///   "fckIs2": 24.0,
///   "fckIs": 20.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthResult {
    /// Readings that interpolated successfully, in input order
    pub readings: Vec<f64>,

    /// Equivalent 150 mm cube strength per reading (MPa)
    pub fck_cube: Vec<f64>,

    /// Cylinder-equivalent strength per reading (MPa)
    pub fck_cylinder: Vec<f64>,

    /// Count of valid readings
    pub n: usize,

    /// Standard-deviation multiplier from the fixed lookup table
    pub k1: f64,

    /// Mean cylinder strength (MPa)
    pub mean: f64,

    /// Sample standard deviation of cylinder strength (MPa)
    pub std_dev: f64,

    /// Minimum cylinder strength (MPa)
    pub min: f64,

    /// First candidate: mean - k1 * stddev (MPa)
    pub fck_is1: f64,

    /// Second candidate: min + 4 (MPa)
    pub fck_is2: f64,

    /// Governing characteristic strength, the lower candidate (MPa)
    pub fck_is: f64,
}

impl StrengthResult {
    /// Format as the classic fixed-width results text.
    ///
    /// Two-decimal presentation precision; the struct keeps full precision.
    pub fn format_report(&self) -> String {
        let mut out = format!("{:>8} {:>12} {:>14}\n", "R", "fck_cube150", "fck_cylinder");
        for i in 0..self.n {
            out.push_str(&format!(
                "{:>8.2} {:>12.2} {:>14.2}\n",
                self.readings[i], self.fck_cube[i], self.fck_cylinder[i]
            ));
        }
        out.push('\n');
        out.push_str(&format!("n = {}\n", self.n));
        out.push_str(&format!("k1 = {}\n", self.k1));
        out.push_str(&format!("mean = {:.2}\n", self.mean));
        out.push_str(&format!("std dev = {:.2}\n", self.std_dev));
        out.push_str(&format!("fck_is1 = {:.2}\n", self.fck_is1));
        out.push_str(&format!("fck_is2 = {:.2}\n", self.fck_is2));
        out.push_str(&format!("-> Final fck_is = {:.2}\n", self.fck_is));
        out
    }
}

/// Reduce a series of rebound readings to a characteristic strength.
///
/// Readings outside the reference curve range are silently excluded; the
/// remaining count must reach [`MIN_READINGS`] or the series is rejected
/// with [`CoreError::InsufficientReadings`].
pub fn calculate(input: &StrengthInput) -> CoreResult<StrengthResult> {
    input.validate()?;

    let curve = input.orientation.curve();

    let mut readings = Vec::with_capacity(input.r_values.len());
    let mut fck_cube = Vec::with_capacity(input.r_values.len());
    let mut fck_cylinder = Vec::with_capacity(input.r_values.len());

    for &r in &input.r_values {
        if let Some(cube) = curve.fck_cube(r) {
            readings.push(r);
            fck_cube.push(cube);
            fck_cylinder.push(cube / CUBE_TO_CYLINDER);
        }
    }

    let n = fck_cylinder.len();
    if n < MIN_READINGS {
        return Err(CoreError::InsufficientReadings {
            valid: n,
            required: MIN_READINGS,
        });
    }

    let mean = fck_cylinder.iter().sum::<f64>() / n as f64;
    let variance = fck_cylinder
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    let std_dev = variance.sqrt();
    let min = fck_cylinder.iter().copied().fold(f64::INFINITY, f64::min);

    // n >= MIN_READINGS here, so the table always resolves
    let k1 = k1_factor(n)
        .ok_or_else(|| CoreError::internal(format!("k1 undefined for n = {n}")))?;

    let fck_is1 = mean - k1 * std_dev;
    let fck_is2 = min + MIN_PLUS_MARGIN;
    let fck_is = fck_is1.min(fck_is2);

    Ok(StrengthResult {
        readings,
        fck_cube,
        fck_cylinder,
        n,
        k1,
        mean,
        std_dev,
        min,
        fck_is1,
        fck_is2,
        fck_is,
    })
}
