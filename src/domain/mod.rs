// Domain layer - Request-scoped value objects
pub mod cycle;
pub mod error;
pub mod node;
pub mod query;
pub mod request;
pub mod telemetry;
