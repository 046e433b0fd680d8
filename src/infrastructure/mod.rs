// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod flux_csv;
pub mod influx_client;
