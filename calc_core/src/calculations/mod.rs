//! # Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(leaf, input) -> Result<*Result, CalcError>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`weight`] - Total weight and cost of stock cut from a catalog leaf

pub mod weight;

pub use weight::{calculate, calculate_raw, RawWeightInput, WeightInput, WeightResult};
