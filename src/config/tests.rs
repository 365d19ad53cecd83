use super::*;
use crate::domain::{HttpMethod, TlsVersion};
use crate::error::{AppError, ConfigError, ValidationError};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<std::path::PathBuf, String> {
    let path = dir.join(name);
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;
    Ok(path)
}

#[test]
fn parse_duration_units() -> Result<(), String> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("10s", Duration::from_secs(10)),
        ("7", Duration::from_secs(7)),
        ("5m", Duration::from_secs(300)),
        ("2h", Duration::from_secs(7_200)),
        ("0s", Duration::ZERO),
        (" 3s ", Duration::from_secs(3)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_value(input).map_err(|err| err.to_string())?;
        if parsed != expected {
            return Err(format!("{} parsed as {:?}", input, parsed));
        }
    }
    Ok(())
}

#[test]
fn parse_duration_rejects_bad_input() -> Result<(), String> {
    match parse_duration_value("") {
        Err(AppError::Validation(ValidationError::DurationEmpty)) => {}
        other => return Err(format!("Expected empty error: {:?}", other)),
    }
    match parse_duration_value("fast") {
        Err(AppError::Validation(ValidationError::InvalidDurationFormat { .. })) => {}
        other => return Err(format!("Expected format error: {:?}", other)),
    }
    match parse_duration_value("10d") {
        Err(AppError::Validation(ValidationError::InvalidDurationUnit { unit })) if unit == "d" => {
        }
        other => return Err(format!("Expected unit error: {:?}", other)),
    }
    match parse_duration_value("99999999999999999999h") {
        Err(AppError::Validation(ValidationError::InvalidDurationNumber { .. })) => {}
        other => return Err(format!("Expected number error: {:?}", other)),
    }
    match parse_duration_value("18446744073709551615h") {
        Err(AppError::Validation(ValidationError::DurationOverflow)) => Ok(()),
        other => Err(format!("Expected overflow: {:?}", other)),
    }
}

#[test]
fn whole_seconds_rounds_up() -> Result<(), String> {
    if whole_seconds(Duration::from_millis(1_500)) != 2
        || whole_seconds(Duration::from_secs(3)) != 3
        || whole_seconds(Duration::ZERO) != 0
    {
        return Err("Unexpected rounding".to_owned());
    }
    Ok(())
}

#[test]
fn parse_toml_settings_with_profiles() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_file(
        dir.path(),
        "volley.toml",
        r#"
store_path = "data/volley.db"
tick_interval_ms = 50
grace_period = "3s"
default_profile = "staging"

[profiles.staging]
insecure = true
tls_min = "1.2"

[profiles.staging.vars]
host = "staging.internal"
token = "abc"
"#,
    )?;

    let settings = load_settings_file(&path).map_err(|err| err.to_string())?;
    if settings.tick_interval_ms != Some(50)
        || settings.default_profile.as_deref() != Some("staging")
    {
        return Err(format!("Unexpected settings: {:?}", settings));
    }
    let grace = settings
        .grace_period
        .as_ref()
        .ok_or_else(|| "Missing grace".to_owned())?
        .to_duration()
        .map_err(|err| err.to_string())?;
    if grace != Duration::from_secs(3) {
        return Err(format!("Unexpected grace: {:?}", grace));
    }
    let staging = settings
        .profiles
        .get("staging")
        .ok_or_else(|| "Missing staging profile".to_owned())?;
    if !staging.tls.insecure || staging.tls.tls_min != Some(TlsVersion::V1_2) {
        return Err(format!("Unexpected TLS options: {:?}", staging.tls));
    }
    if staging.vars.get("host").map(String::as_str) != Some("staging.internal") {
        return Err("Missing profile vars".to_owned());
    }
    Ok(())
}

#[test]
fn parse_json_settings() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_file(
        dir.path(),
        "volley.json",
        r#"{"grace_period": 2, "profiles": {"dev": {"vars": {"host": "localhost"}}}}"#,
    )?;
    let settings = load_settings_file(&path).map_err(|err| err.to_string())?;
    let grace = settings
        .grace_period
        .as_ref()
        .map(DurationValue::to_duration)
        .transpose()
        .map_err(|err| err.to_string())?;
    if grace != Some(Duration::from_secs(2)) {
        return Err(format!("Unexpected grace: {:?}", grace));
    }
    let dev = settings
        .profiles
        .get("dev")
        .ok_or_else(|| "Missing dev profile".to_owned())?;
    if dev.tls.insecure || dev.tls.cacert.is_some() {
        return Err("TLS options should default off".to_owned());
    }
    Ok(())
}

#[test]
fn settings_extension_is_checked() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_file(dir.path(), "volley.yaml", "store_path: x")?;
    match load_settings_file(&path) {
        Err(AppError::Config(ConfigError::UnsupportedExtension { ext })) if ext == "yaml" => {
            Ok(())
        }
        other => Err(format!("Expected extension error: {:?}", other)),
    }
}

#[test]
fn explicit_missing_settings_file_fails() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let missing = dir.path().join("absent.toml");
    match load_settings(Some(&missing)) {
        Err(AppError::Config(ConfigError::ReadConfig { .. })) => Ok(()),
        other => Err(format!("Expected read error: {:?}", other)),
    }
}

#[test]
fn request_file_resolves_variables() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    write_file(
        dir.path(),
        "checkout.toml",
        r#"
method = "post"
url = "https://{{ host }}/api/checkout"
body = '{"user": "{{user}}"}'
timeout = "2s"

[headers]
Authorization = "Bearer {{token}}"
Content-Type = "application/json"

[expect]
status = 201
body_contains = "ok"
"#,
    )?;

    let file = load_request_file(Path::new("checkout.toml"), Some(dir.path()))
        .map_err(|err| err.to_string())?;
    let resolved = file
        .resolve(&vars(&[
            ("host", "shop.test"),
            ("user", "alice"),
            ("token", "t0k"),
        ]))
        .map_err(|err| err.to_string())?;

    if resolved.method != HttpMethod::Post || resolved.url != "https://shop.test/api/checkout" {
        return Err(format!("Unexpected target: {:?}", resolved));
    }
    if resolved.body.as_deref() != Some(r#"{"user": "alice"}"#) {
        return Err(format!("Unexpected body: {:?}", resolved.body));
    }
    if resolved.headers.get("Authorization").map(String::as_str) != Some("Bearer t0k") {
        return Err(format!("Unexpected headers: {:?}", resolved.headers));
    }
    if resolved.timeout != Some(Duration::from_secs(2))
        || resolved.expect.status != Some(201)
        || resolved.expect.body_contains.as_deref() != Some("ok")
    {
        return Err(format!("Unexpected options: {:?}", resolved));
    }
    Ok(())
}

#[test]
fn json_request_file_defaults_to_get() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_file(dir.path(), "ping.json", r#"{"url": "http://localhost/ping"}"#)?;
    let resolved = load_request_file(&path, None)
        .map_err(|err| err.to_string())?
        .resolve(&BTreeMap::new())
        .map_err(|err| err.to_string())?;
    if resolved.method != HttpMethod::Get || resolved.timeout.is_some() || resolved.body.is_some()
    {
        return Err(format!("Unexpected defaults: {:?}", resolved));
    }
    Ok(())
}

#[test]
fn unresolved_variable_is_fatal() -> Result<(), String> {
    let file = RequestFile {
        method: HttpMethod::Get,
        url: "http://{{host}}/".to_owned(),
        headers: BTreeMap::new(),
        body: None,
        timeout: None,
        expect: crate::domain::Expectations::default(),
    };
    match file.resolve(&vars(&[("other", "x")])) {
        Err(AppError::Config(ConfigError::UnresolvedVariable { name, field: "url" }))
            if name == "host" =>
        {
            Ok(())
        }
        other => Err(format!("Expected unresolved variable: {:?}", other)),
    }
}

#[test]
fn request_file_rejects_bad_url_and_header() -> Result<(), String> {
    let mut file = RequestFile {
        method: HttpMethod::Get,
        url: "not a url".to_owned(),
        headers: BTreeMap::new(),
        body: None,
        timeout: None,
        expect: crate::domain::Expectations::default(),
    };
    match file.resolve(&BTreeMap::new()) {
        Err(AppError::Config(ConfigError::InvalidUrl { .. })) => {}
        other => return Err(format!("Expected invalid url: {:?}", other)),
    }
    file.url = "http://localhost/".to_owned();
    file.headers.insert("bad header".to_owned(), "x".to_owned());
    match file.resolve(&BTreeMap::new()) {
        Err(AppError::Config(ConfigError::InvalidHeaderName { .. })) => Ok(()),
        other => Err(format!("Expected invalid header: {:?}", other)),
    }
}

#[test]
fn unparseable_request_file_reports_path() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_file(dir.path(), "broken.toml", "url = ")?;
    match load_request_file(&path, None) {
        Err(AppError::Config(ConfigError::ParseRequestFile { path: reported, .. }))
            if reported == path =>
        {
            Ok(())
        }
        other => Err(format!("Expected parse error: {:?}", other)),
    }
}

#[test]
fn render_template_edge_cases() -> Result<(), String> {
    let values = vars(&[("a", "1"), ("b", "2")]);
    let rendered = render_template("{{a}}-{{ b }}-}}-{", &values, "body")
        .map_err(|err| err.to_string())?;
    if rendered != "1-2-}}-{" {
        return Err(format!("Unexpected render: {}", rendered));
    }
    if render_template("plain", &values, "body").map_err(|err| err.to_string())? != "plain" {
        return Err("Plain text should pass through".to_owned());
    }
    match render_template("x {{a", &values, "body") {
        Err(AppError::Config(ConfigError::UnterminatedPlaceholder { field: "body" })) => Ok(()),
        other => Err(format!("Expected unterminated error: {:?}", other)),
    }
}
