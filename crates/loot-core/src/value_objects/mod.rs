//! Value objects - immutable types that represent domain concepts

mod record_id;
mod snowflake;

pub use record_id::RecordId;
pub use snowflake::{Snowflake, SnowflakeParseError};
