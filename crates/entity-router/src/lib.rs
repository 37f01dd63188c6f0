/// Entity kinds the bridge exposes. Routing only uses the kind to recognize
/// the identifier shape; it carries no further meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorClass {
    Sensor,
    Switch,
    Text,
    TextSensor,
    Number,
    BinarySensor,
    Button,
}

impl SensorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorClass::Sensor => "sensor",
            SensorClass::Switch => "switch",
            SensorClass::Text => "text",
            SensorClass::TextSensor => "text_sensor",
            SensorClass::Number => "number",
            SensorClass::BinarySensor => "binary_sensor",
            SensorClass::Button => "button",
        }
    }
}

// Longest prefixes first so `text_sensor` and `binary_sensor` are tried
// before their shorter cousins.
const CLASS_PREFIXES: &[(&str, SensorClass)] = &[
    ("binary_sensor", SensorClass::BinarySensor),
    ("text_sensor", SensorClass::TextSensor),
    ("sensor", SensorClass::Sensor),
    ("switch", SensorClass::Switch),
    ("number", SensorClass::Number),
    ("button", SensorClass::Button),
    ("text", SensorClass::Text),
];

const SEGMENT_SEPARATOR: &str = "_-_";
const ATTRIBUTE_SEPARATOR: &str = "__";

/// Parsed pieces of one identifier on the shared stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub class: SensorClass,
    /// Numeral naming which physical unit of the family this message is for.
    pub slot: &'a str,
    /// Human-assigned label between slot and attribute. Carried through,
    /// never matched on.
    pub name: &'a str,
    /// Canonical attribute key, resolved via [`Attribute::from_id`].
    pub attribute: &'a str,
}

/// Routes raw identifiers of one device family out of the flat, shared
/// namespace. Identifiers look like
/// `sensor-b2500_-_1_-_temperatur_1__temperature_1`; anything that does not
/// fit the shape, or names another family, is simply not ours.
#[derive(Debug, Clone)]
pub struct EntityRouter {
    family: String,
}

impl EntityRouter {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Parse `raw` into its routed parts. `None` is the expected outcome for
    /// the bulk of a shared stream and is never an error.
    ///
    /// The family tag is compared byte-for-byte, so tags containing pattern
    /// metacharacters stay literal.
    pub fn route<'a>(&self, raw: &'a str) -> Option<RouteMatch<'a>> {
        let (class, rest) = strip_class(raw)?;
        let rest = rest.strip_prefix(self.family.as_str())?;
        let rest = rest.strip_prefix(SEGMENT_SEPARATOR)?;

        let slot_len = rest
            .bytes()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        if slot_len == 0 {
            return None;
        }
        let (slot, rest) = rest.split_at(slot_len);
        let rest = rest.strip_prefix(SEGMENT_SEPARATOR)?;

        // Name is the shortest capture: everything up to the first `__`.
        let (name, attribute) = rest.split_once(ATTRIBUTE_SEPARATOR)?;

        Some(RouteMatch {
            class,
            slot,
            name,
            attribute,
        })
    }
}

fn strip_class(raw: &str) -> Option<(SensorClass, &str)> {
    for (prefix, class) in CLASS_PREFIXES {
        if let Some(rest) = raw.strip_prefix(prefix) {
            if let Some(rest) = rest.strip_prefix('-') {
                return Some((*class, rest));
            }
        }
    }
    None
}

/// Routing-significant attribute keys a storage unit reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Pv1Active,
    Pv2Active,
    Pv1Power,
    Pv2Power,
    Scene,
    Output1Power,
    Output2Power,
    Output1Active,
    Output2Active,
    TotalPowerOut,
    BatteryLevel,
    BatteryCapacity,
    LastResponse,
    Dod,
    DischargeThreshold,
    Temperature1,
    Temperature2,
    Generation,
    Name,
    DeviceType,
    DeviceId,
    Mac,
    BleConnected,
    WifiConnected,
    MqttConnected,
}

const ATTRIBUTE_TABLE: &[(&str, Attribute)] = &[
    ("pv_1_-_active", Attribute::Pv1Active),
    ("pv_2_-_active", Attribute::Pv2Active),
    ("in_1_-_power", Attribute::Pv1Power),
    ("in_2_-_power", Attribute::Pv2Power),
    ("scene", Attribute::Scene),
    ("out_1_-_power", Attribute::Output1Power),
    ("out_2_-_power", Attribute::Output2Power),
    ("out_1_-_active", Attribute::Output1Active),
    ("out_2_-_active", Attribute::Output2Active),
    ("total_power_out", Attribute::TotalPowerOut),
    ("battery_level", Attribute::BatteryLevel),
    ("battery_capacity", Attribute::BatteryCapacity),
    ("last_response", Attribute::LastResponse),
    ("dod", Attribute::Dod),
    ("discharge_threshold", Attribute::DischargeThreshold),
    ("temperature_1", Attribute::Temperature1),
    ("temperature_2", Attribute::Temperature2),
    ("generation", Attribute::Generation),
    ("name", Attribute::Name),
    ("device_type", Attribute::DeviceType),
    ("device_id", Attribute::DeviceId),
    ("mac", Attribute::Mac),
    ("ble_connected", Attribute::BleConnected),
    ("wifi_connected", Attribute::WifiConnected),
    ("mqtt_connected", Attribute::MqttConnected),
];

impl Attribute {
    /// Dispatch-table lookup. Well-formed identifiers may still carry keys we
    /// do not know; those resolve to `None` and the caller decides how loudly
    /// to say so.
    pub fn from_id(id: &str) -> Option<Attribute> {
        ATTRIBUTE_TABLE
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, attribute)| *attribute)
    }

    pub fn id(&self) -> &'static str {
        ATTRIBUTE_TABLE
            .iter()
            .find(|(_, attribute)| attribute == self)
            .map(|(key, _)| *key)
            .unwrap_or("")
    }
}
