pub mod analysis;
pub mod location;
pub mod metric;
pub mod regression_result;
pub mod sample;
