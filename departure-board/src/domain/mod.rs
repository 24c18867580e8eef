//! Domain types for the departure board.
//!
//! Everything here is a plain value type built fresh on every refresh.
//! Upstream data quality problems are resolved before these types are
//! constructed, so code that receives them can trust their fields.

mod departure;
mod line_type;
mod stop;
mod time;

pub use departure::Departure;
pub use line_type::LineType;
pub use stop::{DEFAULT_TIME_TO, Stop, StopConfig};
pub use time::{delay_minutes, format_hhmm, minutes_until};
