use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_match_the_public_backend() {
    let settings = ShopSettings::default();
    assert_eq!(
        settings.api_base_url,
        "https://shopping-backend-express.onrender.com"
    );
    assert_eq!(settings.search_debounce(), Duration::from_millis(300));
    assert!(!settings.payment_required);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = ShopSettings::default();
    apply_file(
        &mut settings,
        r#"
api_base_url = "http://localhost:3000/"
search_debounce_ms = 150
payment_required = true
"#,
    )
    .expect("apply file");

    assert_eq!(settings.api_base_url, "http://localhost:3000/");
    assert_eq!(settings.search_debounce_ms, 150);
    assert_eq!(settings.request_timeout_secs, 15);
    assert!(settings.payment_required);
}

#[test]
fn unknown_file_keys_are_rejected() {
    let mut settings = ShopSettings::default();
    assert!(apply_file(&mut settings, "bind_addr = \"0.0.0.0\"").is_err());
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = ShopSettings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("SHOP_API_BASE_URL", "http://plain.example"),
            ("APP__API_BASE_URL", "http://prefixed.example"),
            ("APP__REQUEST_TIMEOUT_SECS", " 30 "),
            ("APP__PAYMENT_REQUIRED", "yes"),
        ]),
    )
    .expect("apply env");

    assert_eq!(settings.api_base_url, "http://prefixed.example");
    assert_eq!(settings.request_timeout_secs, 30);
    assert!(settings.payment_required);
}

#[test]
fn malformed_env_numbers_and_flags_are_errors() {
    let mut settings = ShopSettings::default();
    assert!(apply_env(&mut settings, env_from(&[("APP__SEARCH_DEBOUNCE_MS", "fast")])).is_err());
    assert!(apply_env(&mut settings, env_from(&[("APP__PAYMENT_REQUIRED", "maybe")])).is_err());
}

#[test]
fn validation_normalizes_url_and_rejects_zero_timeout() {
    let settings = validate(ShopSettings {
        api_base_url: "http://localhost:3000/".into(),
        ..ShopSettings::default()
    })
    .expect("valid");
    assert_eq!(settings.api_base_url, "http://localhost:3000");

    assert!(validate(ShopSettings {
        api_base_url: "localhost:3000".into(),
        ..ShopSettings::default()
    })
    .is_err());
    assert!(validate(ShopSettings {
        request_timeout_secs: 0,
        ..ShopSettings::default()
    })
    .is_err());
}

#[test]
fn explicit_settings_file_must_exist() {
    let missing = env::temp_dir().join("shop_settings_that_do_not_exist.toml");
    let err = load_settings(Some(missing.as_path())).expect_err("must fail");
    assert!(err.to_string().contains("failed to read settings file"));
}

#[test]
fn loads_explicit_settings_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("shop_settings_test_{suffix}.toml"));
    fs::write(&path, "search_debounce_ms = 120\n").expect("write settings");

    let settings = load_settings(Some(path.as_path())).expect("load");
    assert_eq!(settings.search_debounce_ms, 120);

    fs::remove_file(path).expect("cleanup");
}
