// Machine data service - Validates, queries and shapes sensor data and cycles
use crate::application::flux_builder::FluxQueryBuilder;
use crate::application::result_shaper::{to_record_list, to_wide_table};
use crate::application::time_series_client::TimeSeriesClient;
use crate::application::validation::{cycle_node_name, validate_data_request};
use crate::domain::cycle::{segment_cycles, CounterSample, Cycle};
use crate::domain::error::{QueryError, Result, ValidationError};
use crate::domain::node::NodeCode;
use crate::domain::query::TimeRange;
use crate::domain::request::{CycleRequest, MachineDataRequest, OutputFormat};
use crate::domain::telemetry::{MachineData, Table};
use crate::infrastructure::config::StoreConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct MachineDataService {
    client: Arc<dyn TimeSeriesClient>,
    store: StoreConfig,
    builder: FluxQueryBuilder,
}

impl MachineDataService {
    pub fn new(client: Arc<dyn TimeSeriesClient>, store: StoreConfig) -> Self {
        let builder = FluxQueryBuilder::new(store.clone());
        Self {
            client,
            store,
            builder,
        }
    }

    pub async fn get_machine_data(&self, request: MachineDataRequest) -> Result<MachineData> {
        tracing::debug!("Validating data request for {:?}", request.nodes);
        let query = validate_data_request(&request, &self.store)?;
        let resolved = query.nodes[0].resolve()?;

        let flux = self.builder.build(&query)?;
        let tables = self.run(&flux).await?;

        match request.format {
            OutputFormat::Records => Ok(MachineData::Records {
                records: to_record_list(resolved.tag_name, &tables),
            }),
            OutputFormat::Wide => {
                let tags = if query.tags.is_empty() {
                    self.enumerate_tags(&query.nodes, query.use_summary_bucket)
                        .await?
                } else {
                    query.tags.values().to_vec()
                };
                Ok(MachineData::Wide(to_wide_table(&query.nodes, &tags, &tables)?))
            }
        }
    }

    /// Cycles of a machine's counter variable, e.g. `Cincinnati` / `R20`.
    pub async fn get_cycle_starts(&self, request: CycleRequest) -> Result<Vec<Cycle>> {
        let node = cycle_node_name(&request.machine, &self.store)?;
        let variable = request.variable.trim();
        if variable.is_empty() {
            return Err(ValidationError::InvalidVariable.into());
        }
        let range = TimeRange::new(request.start, request.end)?;

        let flux = self.builder.build_cycle_query(&node, variable, &range);
        let tables = self.run(&flux).await?;

        // only the last table's samples are segmented
        let samples = counter_samples(tables.last());
        let cycles = segment_cycles(&samples);
        tracing::info!(
            "Found {} cycles in {} samples for {}",
            cycles.len(),
            samples.len(),
            node
        );
        Ok(cycles)
    }

    async fn enumerate_tags(
        &self,
        nodes: &[NodeCode],
        use_summary_bucket: bool,
    ) -> Result<Vec<String>> {
        let flux = self.builder.build_tag_query(nodes, use_summary_bucket)?;
        let tables = self.client.execute(&flux).await?;
        let tags: Vec<String> = tables
            .iter()
            .flat_map(|t| t.observations.iter())
            .map(|obs| obs.value.to_string())
            .collect();
        tracing::debug!("Enumerated tags: {:?}", tags);
        Ok(tags)
    }

    async fn run(&self, flux: &str) -> Result<Vec<Table>> {
        let tables = self.client.execute(flux).await?;
        if tables.is_empty() {
            return Err(QueryError::NoData.into());
        }
        Ok(tables)
    }
}

fn counter_samples(table: Option<&Table>) -> Vec<CounterSample> {
    table
        .map(|t| {
            t.observations
                .iter()
                .filter_map(|obs| match (obs.time, obs.value.as_f64()) {
                    (Some(time), Some(value)) => Some(CounterSample { time, value }),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
