//! Core domain types and logic.

pub mod error;
pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod estimates;
pub mod optimizer;
pub mod risk;
pub mod fundamentals;
pub mod macro_outlook;
pub mod recommendation;
pub mod contribution;
pub mod config_validation;
