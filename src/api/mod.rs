pub mod server;
pub mod server_config;
pub mod types;
