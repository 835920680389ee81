pub mod unit_conversion;
pub mod error_metrics;
pub mod correlation;
pub mod max_correlation;
pub mod report;
pub mod plots;
