//! Commission Engine
//!
//! Multi-bonus commission pipeline: base tier, loyalty, retention,
//! network, coach tier, seasonal and weekend terms, composed by sum.

pub mod calculator;
pub mod season;

pub use calculator::{CommissionCalculator, CommissionInput};
