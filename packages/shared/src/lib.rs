//! Utilities shared by the Beehive relay server and the CLI client.

pub mod logger;
pub mod time;
