use serde::{Deserialize, Serialize};

/// Wire values as the bridge pushes them, before any per-attribute typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    #[default]
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Textual rendering for text-ish attributes. Scalars are stringified
    /// because some firmwares report text fields as bare numbers.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(value) => Some(value.clone()),
            FieldValue::Number(value) => Some(value.to_string()),
            FieldValue::Bool(value) => Some(value.to_string()),
            FieldValue::Null => None,
        }
    }
}

/// One message on the shared push stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    pub id: String,
    #[serde(default)]
    pub value: FieldValue,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
}

impl StateEvent {
    pub fn new(id: impl Into<String>, value: FieldValue) -> Self {
        Self {
            id: id.into(),
            value,
            min_value: None,
            max_value: None,
        }
    }
}

/// Verb of an outbound device action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    TurnOn,
    TurnOff,
    Set(f64),
}

impl Action {
    /// Final URL segment. `Set` keeps its value in the segment itself,
    /// matching the endpoint's `set?value=<N>` form.
    pub fn path_segment(&self) -> String {
        match self {
            Action::TurnOn => "turn_on".to_string(),
            Action::TurnOff => "turn_off".to_string(),
            Action::Set(value) => format!("set?value={value}"),
        }
    }
}

/// A deferred device action bound to one entity identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub entity_id: String,
    pub action: Action,
}

impl ActionRequest {
    pub fn new(entity_id: impl Into<String>, action: Action) -> Self {
        Self {
            entity_id: entity_id.into(),
            action,
        }
    }
}
