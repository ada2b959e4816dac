//! Port traits the domain depends on; adapters implement them.

pub mod config_port;
pub mod order_port;
pub mod price_feed;
pub mod report_port;
