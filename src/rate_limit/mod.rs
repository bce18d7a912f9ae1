pub mod clock;
pub mod limiter;
