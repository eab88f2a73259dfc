//! Config load validation tests for signon-config.
// crates/signon-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use signon_config::AuditSinkKind;
use signon_config::ConfigError;
use signon_config::ProviderConfig;
use signon_config::Region;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<ProviderConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_reads_full_config() -> TestResult {
    let file = write_config(
        br#"
[api]
region = "CA"
access_token_env = "MY_TOKEN"
connect_timeout_ms = 2000
request_timeout_ms = 15000

[retry]
initial_delay_ms = 500
multiplier = 3
max_delay_ms = 10000
budget_ms = 60000

[audit]
sink = "file"
path = "/var/log/signon/audit.jsonl"
"#,
    )?;
    let config = ProviderConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.api.region != Region::Canada {
        return Err(format!("unexpected region {}", config.api.region.code()));
    }
    let settings = config.api.client_settings();
    if settings.api_base_url != "https://api.pingone.ca/v1"
        || settings.connect_timeout != Duration::from_secs(2)
    {
        return Err(format!("unexpected client settings {}", settings.api_base_url));
    }
    let policy = config.retry.policy();
    if policy.multiplier != 3 || policy.budget != Duration::from_secs(60) {
        return Err("unexpected retry policy".to_string());
    }
    if config.audit.sink != AuditSinkKind::File {
        return Err("expected file sink".to_string());
    }
    Ok(())
}

#[test]
fn load_reports_missing_file_as_io() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(ProviderConfig::load(Some(&path)), "config io error")
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(ProviderConfig::load(Some(path)), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(ProviderConfig::load(Some(path)), "config path component too long")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'a'; 1_048_577])?;
    assert_invalid(ProviderConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(ProviderConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_unknown_region() -> TestResult {
    let file = write_config(b"[api]\nregion = \"MARS\"\n")?;
    assert_invalid(ProviderConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_rejects_unknown_section() -> TestResult {
    let file = write_config(b"[logging]\nlevel = \"debug\"\n")?;
    assert_invalid(ProviderConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_rejects_out_of_range_timeout() -> TestResult {
    let file = write_config(b"[api]\nrequest_timeout_ms = 0\n")?;
    assert_invalid(ProviderConfig::load(Some(file.path())), "api.request_timeout_ms")
}
