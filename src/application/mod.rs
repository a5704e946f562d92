// Application layer - Use cases and ports
pub mod alert_factory;
pub mod alert_query;
pub mod alert_store;
pub mod key_value_store;
pub mod monitor_service;
pub mod reading_source;
pub mod scheduler;
