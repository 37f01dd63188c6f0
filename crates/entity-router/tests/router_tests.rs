use entity_router::{Attribute, EntityRouter, SensorClass};

#[test]
fn routes_a_plain_sensor_identifier() {
    let router = EntityRouter::new("b2500");
    let matched = router
        .route("sensor-b2500_-_1_-_temperatur_1__temperature_1")
        .expect("route");

    assert_eq!(matched.class, SensorClass::Sensor);
    assert_eq!(matched.slot, "1");
    assert_eq!(matched.name, "temperatur_1");
    assert_eq!(matched.attribute, "temperature_1");
}

#[test]
fn recognizes_every_sensor_class_prefix() {
    let router = EntityRouter::new("b2500");
    let cases = [
        ("sensor", SensorClass::Sensor),
        ("switch", SensorClass::Switch),
        ("text", SensorClass::Text),
        ("text_sensor", SensorClass::TextSensor),
        ("number", SensorClass::Number),
        ("binary_sensor", SensorClass::BinarySensor),
        ("button", SensorClass::Button),
    ];

    for (prefix, expected) in cases {
        let raw = format!("{prefix}-b2500_-_2_-_some_label__dod");
        let matched = router.route(&raw).expect("route");
        assert_eq!(matched.class, expected, "prefix {prefix}");
        assert_eq!(matched.slot, "2");
        assert_eq!(matched.attribute, "dod");
    }
}

#[test]
fn ignores_other_families() {
    let router = EntityRouter::new("b2500");
    assert!(router
        .route("sensor-venus_-_1_-_temperatur__temperature_1")
        .is_none());
    assert!(router.route("sensor-b250_-_1_-_t__temperature_1").is_none());
    assert!(router.route("completely unrelated").is_none());
    assert!(router.route("").is_none());
}

#[test]
fn ignores_unrecognized_class_prefixes() {
    let router = EntityRouter::new("b2500");
    assert!(router.route("climate-b2500_-_1_-_hvac__dod").is_none());
    assert!(router.route("b2500_-_1_-_no_class__dod").is_none());
}

#[test]
fn requires_a_numeric_slot() {
    let router = EntityRouter::new("b2500");
    assert!(router.route("sensor-b2500_-_x_-_label__dod").is_none());
    assert!(router.route("sensor-b2500_-__-_label__dod").is_none());

    let matched = router
        .route("sensor-b2500_-_12_-_label__dod")
        .expect("multi-digit slot");
    assert_eq!(matched.slot, "12");
}

#[test]
fn requires_the_attribute_separator() {
    let router = EntityRouter::new("b2500");
    assert!(router.route("sensor-b2500_-_1_-_label_only").is_none());
}

#[test]
fn free_text_name_may_contain_pattern_metacharacters() {
    let router = EntityRouter::new("b2500");
    let matched = router
        .route("sensor-b2500_-_3_-_a.b(c)*+?[x]{2}|^$__battery_level")
        .expect("route");

    assert_eq!(matched.slot, "3");
    assert_eq!(matched.name, "a.b(c)*+?[x]{2}|^$");
    assert_eq!(matched.attribute, "battery_level");
}

#[test]
fn name_splits_at_the_first_attribute_separator() {
    let router = EntityRouter::new("b2500");
    let matched = router
        .route("sensor-b2500_-_1_-_a__b__battery_level")
        .expect("route");

    assert_eq!(matched.name, "a");
    assert_eq!(matched.attribute, "b__battery_level");
}

#[test]
fn family_tag_metacharacters_stay_literal() {
    let router = EntityRouter::new("b2.5+00");

    let matched = router
        .route("sensor-b2.5+00_-_1_-_label__dod")
        .expect("literal tag");
    assert_eq!(matched.attribute, "dod");

    // `.` must not act as a wildcard.
    assert!(router.route("sensor-b2x5+00_-_1_-_label__dod").is_none());
}

#[test]
fn nested_separators_in_attribute_ids_round_trip() {
    let router = EntityRouter::new("b2500");
    let matched = router
        .route("switch-b2500_-_1_-_out_1_-_power__out_1_-_power")
        .expect("route");

    assert_eq!(matched.class, SensorClass::Switch);
    assert_eq!(matched.name, "out_1_-_power");
    assert_eq!(matched.attribute, "out_1_-_power");
    assert_eq!(
        Attribute::from_id(matched.attribute),
        Some(Attribute::Output1Power)
    );
}

#[test]
fn dispatch_table_covers_all_known_attributes() {
    let ids = [
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

    for (id, expected) in ids {
        assert_eq!(Attribute::from_id(id), Some(expected), "id {id}");
        assert_eq!(expected.id(), id);
    }
}

#[test]
fn unknown_attribute_ids_resolve_to_none() {
    assert_eq!(Attribute::from_id("bar_baz"), None);
    assert_eq!(Attribute::from_id(""), None);
    assert_eq!(Attribute::from_id("DOD"), None);
}
