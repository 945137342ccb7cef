use mentora::CliSettings;

#[test]
fn settings_tolerate_missing_fields() {
    let settings: CliSettings = serde_json::from_str("{}").expect("parse");
    assert!(settings.base_url.is_none());
    assert!(settings.timeout_secs.is_none());
}

#[test]
fn settings_round_trip_through_json() {
    let settings = CliSettings {
        base_url: Some("https://mentora.example.com/api/v1".to_string()),
        timeout_secs: Some(15),
    };
    let serialized = serde_json::to_string(&settings).expect("serialize");
    let parsed: CliSettings = serde_json::from_str(&serialized).expect("parse");
    assert_eq!(parsed.base_url, settings.base_url);
    assert_eq!(parsed.timeout_secs, settings.timeout_secs);
}
