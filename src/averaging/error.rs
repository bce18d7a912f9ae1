use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AveragingError {
    #[error("Averaging window must be at least one unit long, got {0}")]
    InvalidWindowSize(i64),

    #[error("Year {0} is outside the supported date range")]
    YearOutOfRange(i32),
}
