//! Execution engine for xmlconverge
//!
//! The engine orchestrates:
//! 1. Diffing - Compare each file against its declared transforms
//! 2. Executing - Converge files in parallel, one writer per file

pub mod differ;
pub mod executor;

pub use executor::{ExecuteOptions, execute};
