// Request validation, run before any query is built
use crate::domain::error::ValidationError;
use crate::domain::node::{ensure_same_kind, NodeCode, Property};
use crate::domain::query::{AggregateFn, AggregationSpec, DataQuery, TagFilter, TimeRange};
use crate::domain::request::{MachineDataRequest, NodeSelection};
use crate::infrastructure::config::StoreConfig;

pub fn validate_data_request(
    request: &MachineDataRequest,
    store: &StoreConfig,
) -> Result<DataQuery, ValidationError> {
    let property = parse_property(&request.property, store)?;

    let (nodes, multi) = match &request.nodes {
        NodeSelection::Single(code) => (vec![NodeCode::new(code)], false),
        NodeSelection::Many(codes) => (
            codes.iter().map(|c| NodeCode::new(c)).collect::<Vec<_>>(),
            codes.len() > 1,
        ),
    };
    ensure_same_kind(&nodes)?;
    for node in &nodes {
        node.validate_compatibility(property, &store.valid_nodes)?;
    }

    if multi && (!request.aggregate || !request.summary) {
        if !request.allow_unsynchronized_multi_node {
            return Err(ValidationError::UnsynchronizedMultiNode);
        }
        tracing::warn!(
            "Requesting {} nodes without aggregation/summary, results will be desynchronised",
            nodes.len()
        );
    }

    let aggregation = if request.aggregate {
        AggregationSpec::with(parse_aggregate(&request.aggregate_fn, store)?)
    } else {
        AggregationSpec::disabled()
    };

    let range = TimeRange::new(request.start, request.end)?;

    let kind = nodes[0]
        .kind()
        .ok_or_else(|| ValidationError::InvalidNode(nodes[0].to_string()))?;

    Ok(DataQuery {
        nodes,
        kind,
        range,
        property,
        use_summary_bucket: request.summary,
        aggregation,
        tags: TagFilter::new(request.tags.clone()),
    })
}

fn parse_property(raw: &str, store: &StoreConfig) -> Result<Property, ValidationError> {
    let name = Property::normalize(raw);
    if !store.valid_properties.contains(&name) {
        return Err(ValidationError::InvalidProperty(raw.to_string()));
    }
    Property::from_field_name(&name).ok_or(ValidationError::InvalidProperty(name))
}

fn parse_aggregate(raw: &str, store: &StoreConfig) -> Result<AggregateFn, ValidationError> {
    let name = raw.trim().to_lowercase();
    if !store.valid_aggregates.contains(&name) {
        return Err(ValidationError::InvalidAggregate(raw.to_string()));
    }
    AggregateFn::from_name(&name).ok_or(ValidationError::InvalidAggregate(name))
}

/// `Cincinnati` -> `B1-CIN` with the default prefix.
pub fn cycle_node_name(machine: &str, store: &StoreConfig) -> Result<String, ValidationError> {
    let short: String = machine.trim().to_uppercase().chars().take(3).collect();
    if short.chars().count() < 3 {
        return Err(ValidationError::InvalidMachine(machine.to_string()));
    }
    Ok(format!("{}{}", store.cycle_node_prefix, short))
}
