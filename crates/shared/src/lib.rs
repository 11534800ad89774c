mod error;
pub use error::{AppError, ErrorPhase};

mod env;
pub use env::APP_ENV;

mod time;
pub use time::{clamp_to_range, naive_to_utc, parse_datetime_lenient};
