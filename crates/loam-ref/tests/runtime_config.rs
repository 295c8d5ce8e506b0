//! Runtime configuration loading and one-time installation
//!
//! Installing the global runtime is process-wide, so everything that touches
//! it lives in a single test.
#![recursion_limit = "256"]

use loam_core::Value;
use loam_ref::prelude::*;
use loam_ref::{executor, ConfigError, RuntimeConfig};
use loam_test_utils::{failing_fn, long, wait_until};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::Duration;

const CONFIG: &str = r#"
[executor]
pooled_threads = 2
pooled_thread_name = "cfg-pool"
solo_thread_name = "cfg-solo"

[agent]
default_error_mode = "fail"
"#;

#[test]
fn test_load_install_and_use() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let config = RuntimeConfig::load(file.path()).unwrap();
    assert_eq!(config.executor.pooled_threads, Some(2));
    assert_eq!(config.agent.default_error_mode, ErrorMode::Fail);

    executor::configure(&config).unwrap();
    assert!(matches!(
        executor::configure(&config),
        Err(ConfigError::AlreadyConfigured)
    ));

    let agent = Agent::new(long(0));
    assert_eq!(agent.error_mode(), ErrorMode::Fail);
    agent.send(failing_fn("configured"), []).unwrap();
    assert!(wait_until(Duration::from_secs(30), || agent.error().is_some()));

    let thread_name = Agent::new(Value::Nil);
    thread_name.set_error_mode(ErrorMode::Continue);
    let name = loam_core::Func::new("name", |_| {
        Ok(std::thread::current().name().map_or(Value::Nil, Value::string))
    });
    thread_name.send(name.clone(), []).unwrap();
    await_agents(&[thread_name.clone()], Some(Duration::from_secs(30))).unwrap();
    match thread_name.deref() {
        Value::Str(s) => assert!(s.starts_with("cfg-pool-"), "{s}"),
        other => panic!("unexpected {other:?}"),
    }

    thread_name.send_off(name, []).unwrap();
    await_agents(&[thread_name.clone()], Some(Duration::from_secs(30))).unwrap();
    match thread_name.deref() {
        Value::Str(s) => assert!(s.starts_with("cfg-solo-"), "{s}"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = RuntimeConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_bad_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[executor\npooled_threads = 2").unwrap();
    assert!(matches!(
        RuntimeConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));
}
