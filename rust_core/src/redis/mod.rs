pub mod bus;

pub use bus::{RedisBus, COMMAND_CHANNEL, OUTCOME_CHANNEL, RESOLVED_CHANNEL};
