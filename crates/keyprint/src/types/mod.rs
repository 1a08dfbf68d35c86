pub mod date;
pub mod datetime;

pub use date::Date;
pub use datetime::{DateTime, MAX_FRACTIONAL_DIGITS};
