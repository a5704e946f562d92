// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_store;
pub mod http_reading_source;
pub mod http_response;
pub mod memory_store;
