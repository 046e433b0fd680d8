use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    pub influx: InfluxSettings,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub org: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Store layout and query limits handed to the query builder.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub raw_bucket: String,
    pub summary_bucket: String,
    pub valid_properties: Vec<String>,
    pub valid_aggregates: Vec<String>,
    pub valid_nodes: Vec<String>,
    pub interval_ladder: Vec<u32>,
    pub max_points: u32,
    pub cycle_measurement: String,
    pub cycle_node_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            raw_bucket: "Machines".to_string(),
            summary_bucket: "Machines_Summary".to_string(),
            valid_properties: strings(&["Min", "Max", "Mean", "STD", "value"]),
            valid_aggregates: strings(&["min", "max", "mean"]),
            valid_nodes: strings(&["A", "C", "T", "1"]),
            interval_ladder: vec![1, 2, 5, 10, 20, 30, 60],
            max_points: 3000,
            cycle_measurement: "BFC".to_string(),
            cycle_node_prefix: "B1-".to_string(),
        }
    }
}

/// Bounded health-check retry before each query.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (zero based), doubling up to the cap.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        self.initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Reads `config/bridge.toml`, then `BRIDGE__<SECTION>__<KEY>` environment overrides.
pub fn load_bridge_config() -> anyhow::Result<BridgeConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/bridge"))
        .add_source(
            config::Environment::with_prefix("BRIDGE")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
