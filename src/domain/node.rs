// Node codes, node kinds and requested properties
use super::error::ValidationError;
use std::fmt;

/// Sensor family selected by the first character of a node code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Acceleration,
    Current,
    Temperature,
    Reserved,
}

impl NodeKind {
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'A' => Some(Self::Acceleration),
            'C' => Some(Self::Current),
            'T' => Some(Self::Temperature),
            '1' => Some(Self::Reserved),
            _ => None,
        }
    }

    /// Tag that distinguishes the series of one node (axis, phase, component name)
    pub fn tag_name(self) -> Option<&'static str> {
        match self {
            Self::Acceleration => Some("Axis"),
            Self::Current => Some("Phase"),
            Self::Temperature => Some("Name"),
            Self::Reserved => None,
        }
    }

    pub fn measurement(self) -> Option<&'static str> {
        match self {
            Self::Acceleration => Some("Acceleration"),
            Self::Current => Some("Current"),
            Self::Temperature => Some("Temperature"),
            Self::Reserved => None,
        }
    }
}

/// Tag and measurement a node code resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedNode {
    pub tag_name: &'static str,
    pub measurement: &'static str,
}

/// Upper-cased physical node identifier such as `A1-ROB` or `C1-CIN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeCode(String);

impl NodeCode {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> Option<char> {
        self.0.chars().next()
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.prefix().and_then(NodeKind::from_prefix)
    }

    pub fn resolve(&self) -> Result<ResolvedNode, ValidationError> {
        let kind = self.kind();
        match (
            kind.and_then(NodeKind::tag_name),
            kind.and_then(NodeKind::measurement),
        ) {
            (Some(tag_name), Some(measurement)) => Ok(ResolvedNode {
                tag_name,
                measurement,
            }),
            _ => Err(ValidationError::UnknownNodeKind(self.0.clone())),
        }
    }

    /// Temperature nodes only carry `value`; every other node never does.
    pub fn validate_compatibility(
        &self,
        property: Property,
        valid_prefixes: &[String],
    ) -> Result<(), ValidationError> {
        let is_temperature = self.kind() == Some(NodeKind::Temperature);

        if is_temperature && property != Property::Value {
            return Err(self.incompatible(property, "the only temperature property is 'value'"));
        }
        if !is_temperature && property == Property::Value {
            return Err(self.incompatible(property, "'value' is only used for temperature"));
        }

        let known = self
            .prefix()
            .map(|p| valid_prefixes.iter().any(|v| is_single_char(v, p)))
            .unwrap_or(false);
        if !known {
            return Err(ValidationError::InvalidNode(self.0.clone()));
        }

        Ok(())
    }

    fn incompatible(&self, property: Property, reason: &'static str) -> ValidationError {
        ValidationError::InvalidPropertyForNode {
            node: self.0.clone(),
            property: property.field_name().to_string(),
            reason,
        }
    }
}

impl fmt::Display for NodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_single_char(entry: &str, c: char) -> bool {
    let mut chars = entry.chars();
    chars.next() == Some(c) && chars.next().is_none()
}

/// All codes in one request must share their first character.
pub fn ensure_same_kind(nodes: &[NodeCode]) -> Result<(), ValidationError> {
    let Some(first) = nodes.first() else {
        return Err(ValidationError::NoNodes);
    };
    let prefix = first.prefix();
    if nodes.iter().all(|n| n.prefix() == prefix) {
        Ok(())
    } else {
        Err(ValidationError::MixedNodeKinds(
            nodes.iter().map(|n| n.0.clone()).collect(),
        ))
    }
}

/// Field stored per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Min,
    Max,
    Mean,
    Std,
    Value,
}

impl Property {
    /// Restores the capitalisation the store uses: `std` -> `STD`,
    /// `value` stays lower case, everything else is capitalised.
    pub fn normalize(raw: &str) -> String {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "std" => "STD".to_string(),
            "value" => "value".to_string(),
            _ => {
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "Min" => Some(Self::Min),
            "Max" => Some(Self::Max),
            "Mean" => Some(Self::Mean),
            "STD" => Some(Self::Std),
            "value" => Some(Self::Value),
            _ => None,
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            Self::Min => "Min",
            Self::Max => "Max",
            Self::Mean => "Mean",
            Self::Std => "STD",
            Self::Value => "value",
        }
    }
}
