//! Per-unit view state: the typed field bag the router mutates and the
//! presentation layer reads.

use serde::Serialize;
use tracing::warn;

use entity_router::Attribute;
use types::{Action, ActionRequest, StateEvent};

/// Which metadata field the info line currently shows. `Name` is only the
/// initial position; once left, the rotation re-enters at `Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InfoField {
    #[default]
    Name,
    Type,
    Id,
    Mac,
}

impl InfoField {
    pub fn advance(self) -> InfoField {
        match self {
            InfoField::Name => InfoField::Type,
            InfoField::Type => InfoField::Id,
            InfoField::Id => InfoField::Mac,
            InfoField::Mac => InfoField::Type,
        }
    }
}

/// Output selector for the two switchable channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    One,
    Two,
}

/// Bound toggle for one output channel. Holds only the captured entity
/// identifier; the verb is decided when the toggle is invoked, from whatever
/// the active flag reads at that moment.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputToggle {
    entity_id: String,
}

impl OutputToggle {
    fn new(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn request(&self, currently_active: bool) -> ActionRequest {
        let action = if currently_active {
            Action::TurnOff
        } else {
            Action::TurnOn
        };
        ActionRequest::new(&self.entity_id, action)
    }
}

/// Bound numeric setter for an editable threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSetter {
    entity_id: String,
}

impl ValueSetter {
    fn new(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn request(&self, value: f64) -> ActionRequest {
        ActionRequest::new(&self.entity_id, Action::Set(value))
    }
}

/// View state for one physical storage unit. Every data field stays `None`
/// until the first matching message arrives; the presentation layer renders
/// placeholders for unset fields and must never read a fabricated zero.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageView {
    slot: String,

    pub sunlight_status: Option<String>,
    pub pv1_active: Option<bool>,
    pub pv2_active: Option<bool>,
    pub pv1_power: Option<f64>,
    pub pv2_power: Option<f64>,

    pub output1_power: Option<f64>,
    pub output2_power: Option<f64>,
    pub output_total: Option<f64>,
    pub output1_active: Option<bool>,
    pub output2_active: Option<bool>,
    #[serde(skip)]
    pub toggle_output1: Option<OutputToggle>,
    #[serde(skip)]
    pub toggle_output2: Option<OutputToggle>,

    pub battery_percentage: Option<f64>,
    pub energy_stored: Option<f64>,

    pub dod: Option<f64>,
    pub dod_min: Option<f64>,
    pub dod_max: Option<f64>,
    pub dod_modal_open: bool,
    #[serde(skip)]
    pub set_dod: Option<ValueSetter>,

    pub discharge_threshold: Option<f64>,
    pub discharge_threshold_min: Option<f64>,
    pub discharge_threshold_max: Option<f64>,
    pub discharge_threshold_modal_open: bool,
    #[serde(skip)]
    pub set_discharge_threshold: Option<ValueSetter>,

    pub last_update: Option<String>,
    pub temperature1: Option<f64>,
    pub temperature2: Option<f64>,

    pub device_generation: Option<String>,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub device_id: Option<String>,
    pub mac: Option<String>,

    pub bluetooth: Option<bool>,
    pub wifi: Option<bool>,
    pub mqtt: Option<bool>,

    pub info_cursor: InfoField,
}

impl StorageView {
    pub fn new(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            ..Self::default()
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Resolve `attribute_id` against the dispatch table and apply the typed
    /// update. Unknown ids are a diagnostic, never a failure.
    pub fn apply_event(&mut self, attribute_id: &str, event: &StateEvent) {
        match Attribute::from_id(attribute_id) {
            Some(attribute) => self.apply(attribute, event),
            None => {
                warn!(slot = %self.slot, attribute = %attribute_id, "unknown attribute");
            }
        }
    }

    /// Typed per-attribute effect. Values are carried through as the wire
    /// typed them; min/max are display hints, not enforced bounds.
    pub fn apply(&mut self, attribute: Attribute, event: &StateEvent) {
        let value = &event.value;
        match attribute {
            Attribute::Pv1Active => self.pv1_active = value.as_bool(),
            Attribute::Pv2Active => self.pv2_active = value.as_bool(),
            Attribute::Pv1Power => self.pv1_power = value.as_f64(),
            Attribute::Pv2Power => self.pv2_power = value.as_f64(),
            Attribute::Scene => self.sunlight_status = value.to_text(),
            Attribute::Output1Power => {
                self.output1_power = value.as_f64();
                self.toggle_output1 = bound_toggle(event);
            }
            Attribute::Output2Power => {
                self.output2_power = value.as_f64();
                self.toggle_output2 = bound_toggle(event);
            }
            Attribute::Output1Active => self.output1_active = value.as_bool(),
            Attribute::Output2Active => self.output2_active = value.as_bool(),
            Attribute::TotalPowerOut => self.output_total = value.as_f64(),
            Attribute::BatteryLevel => self.battery_percentage = value.as_f64(),
            Attribute::BatteryCapacity => self.energy_stored = value.as_f64(),
            Attribute::LastResponse => self.last_update = value.to_text(),
            Attribute::Dod => {
                self.dod = value.as_f64();
                self.dod_min = event.min_value;
                self.dod_max = event.max_value;
                self.set_dod = bound_setter(event);
            }
            Attribute::DischargeThreshold => {
                self.discharge_threshold = value.as_f64();
                self.discharge_threshold_min = event.min_value;
                self.discharge_threshold_max = event.max_value;
                self.set_discharge_threshold = bound_setter(event);
            }
            Attribute::Temperature1 => self.temperature1 = value.as_f64(),
            Attribute::Temperature2 => self.temperature2 = value.as_f64(),
            Attribute::Generation => self.device_generation = value.to_text(),
            Attribute::Name => self.device_name = value.to_text(),
            Attribute::DeviceType => self.device_type = value.to_text(),
            Attribute::DeviceId => self.device_id = value.to_text(),
            Attribute::Mac => self.mac = value.to_text(),
            Attribute::BleConnected => self.bluetooth = value.as_bool(),
            Attribute::WifiConnected => self.wifi = value.as_bool(),
            Attribute::MqttConnected => self.mqtt = value.as_bool(),
        }
    }

    /// Toggle one output. Returns the action to issue, or `None` when no
    /// toggle is bound (or the channel's power reading went null); invoking
    /// an unbound control is a guarded no-op.
    pub fn toggle_output(&self, channel: OutputChannel) -> Option<ActionRequest> {
        let (toggle, active) = match channel {
            OutputChannel::One => (self.toggle_output1.as_ref(), self.output1_active),
            OutputChannel::Two => (self.toggle_output2.as_ref(), self.output2_active),
        };
        Some(toggle?.request(active.unwrap_or(false)))
    }

    pub fn set_dod(&self, value: f64) -> Option<ActionRequest> {
        Some(self.set_dod.as_ref()?.request(value))
    }

    pub fn set_discharge_threshold(&self, value: f64) -> Option<ActionRequest> {
        Some(self.set_discharge_threshold.as_ref()?.request(value))
    }

    pub fn advance_info(&mut self) -> InfoField {
        self.info_cursor = self.info_cursor.advance();
        self.info_cursor
    }

    /// Metadata value under the cursor, as a tag/table pair rather than a
    /// reflective field access.
    pub fn selected_info(&self) -> Option<&str> {
        let field = match self.info_cursor {
            InfoField::Name => &self.device_name,
            InfoField::Type => &self.device_type,
            InfoField::Id => &self.device_id,
            InfoField::Mac => &self.mac,
        };
        field.as_deref()
    }

    /// True once the charge has dropped into the configured depth-of-discharge
    /// reserve.
    pub fn battery_alert(&self) -> bool {
        match (self.battery_percentage, self.dod) {
            (Some(level), Some(dod)) => level <= 100.0 - dod,
            _ => false,
        }
    }
}

fn bound_toggle(event: &StateEvent) -> Option<OutputToggle> {
    if event.value.is_null() {
        None
    } else {
        Some(OutputToggle::new(&event.id))
    }
}

fn bound_setter(event: &StateEvent) -> Option<ValueSetter> {
    if event.value.is_null() {
        None
    } else {
        Some(ValueSetter::new(&event.id))
    }
}
