// InfluxDB v2 client implementation
use crate::application::time_series_client::TimeSeriesClient;
use crate::domain::error::ConnectionError;
use crate::domain::telemetry::Table;
use crate::infrastructure::config::{InfluxSettings, RetryConfig};
use crate::infrastructure::flux_csv::decode_tables;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct InfluxClient {
    http: reqwest::Client,
    host: String,
    token: String,
    org: String,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
struct FluxQueryBody<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    dialect: Dialect,
}

#[derive(Debug, Serialize)]
struct Dialect {
    header: bool,
    annotations: [&'static str; 3],
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

impl InfluxClient {
    pub fn new(settings: &InfluxSettings, retry: RetryConfig) -> Result<Self, ConnectionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            host: settings.host.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            org: settings.org.clone(),
            retry,
        })
    }

    fn build_query_url(&self) -> String {
        format!(
            "{}/api/v2/query?org={}",
            self.host,
            urlencoding::encode(&self.org)
        )
    }

    /// Polls `/health` with exponential backoff, giving up after `max_attempts`.
    async fn wait_until_healthy(&self) -> Result<(), ConnectionError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last = String::new();

        for attempt in 0..attempts {
            match self.check_health().await {
                Ok(()) => return Ok(()),
                Err(reason) => {
                    last = reason;
                    if attempt + 1 < attempts {
                        let delay_ms = self.retry.backoff_ms(attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            delay_ms,
                            "InfluxDB not healthy: {}",
                            last
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
            }
        }

        Err(ConnectionError::Unhealthy { attempts, last })
    }

    async fn check_health(&self) -> Result<(), String> {
        let response = self
            .http
            .get(format!("{}/health", self.host))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("health endpoint returned {}", response.status()));
        }

        let health = response
            .json::<HealthResponse>()
            .await
            .map_err(|e| e.to_string())?;

        if health.status == "pass" {
            Ok(())
        } else {
            Err(health
                .message
                .unwrap_or_else(|| format!("status {}", health.status)))
        }
    }

    async fn post_query(&self, query: &str) -> Result<String, ConnectionError> {
        let body = FluxQueryBody {
            query,
            kind: "flux",
            dialect: Dialect {
                header: true,
                annotations: ["datatype", "group", "default"],
            },
        };

        let response = self
            .http
            .post(self.build_query_url())
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/csv")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Status { status, body });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TimeSeriesClient for InfluxClient {
    async fn execute(&self, query: &str) -> Result<Vec<Table>, ConnectionError> {
        self.wait_until_healthy().await?;

        tracing::debug!("Executing Flux query against {}", self.host);
        let body = self.post_query(query).await?;
        let tables = decode_tables(&body)?;

        tracing::debug!("Query returned {} tables", tables.len());
        Ok(tables)
    }
}
