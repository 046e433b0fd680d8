// Collaborator trait for executing queries against the time-series store
use crate::domain::error::ConnectionError;
use crate::domain::telemetry::Table;
use async_trait::async_trait;

#[async_trait]
pub trait TimeSeriesClient: Send + Sync {
    /// Run a Flux query. An empty vector means the query matched nothing.
    async fn execute(&self, query: &str) -> Result<Vec<Table>, ConnectionError>;
}
