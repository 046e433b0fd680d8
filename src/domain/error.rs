// Error taxonomy for the bridge
use thiserror::Error;

/// Raised before any network call. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid property")]
    InvalidProperty(String),

    #[error("node kind could not be determined from node code '{0}'")]
    UnknownNodeKind(String),

    #[error("{0} is not a valid node")]
    InvalidNode(String),

    #[error("property '{property}' can not be requested for node {node}: {reason}")]
    InvalidPropertyForNode {
        node: String,
        property: String,
        reason: &'static str,
    },

    #[error("node types can not be mixed in one request: {0:?}")]
    MixedNodeKinds(Vec<String>),

    #[error("no nodes were requested")]
    NoNodes,

    #[error(
        "multiple nodes without aggregation and summary data will be desynchronised; \
         set allow_unsynchronized_multi_node to request them anyway"
    )]
    UnsynchronizedMultiNode,

    #[error("'{0}' is not a valid aggregate function")]
    InvalidAggregate(String),

    #[error("end ({end}) can not be before the start ({start})")]
    EndBeforeStart { start: String, end: String },

    #[error("machine name '{0}' is too short to derive a node")]
    InvalidMachine(String),

    #[error("a cycle variable must be provided")]
    InvalidVariable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("no data was returned")]
    NoData,
}

/// Failures at the time-series store boundary.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("request to time-series store failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("time-series store responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("time-series store not healthy after {attempts} attempts: {last}")]
    Unhealthy { attempts: u32, last: String },

    #[error("could not decode time-series response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
