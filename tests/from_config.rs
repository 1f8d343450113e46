//! Building a pool from a TOML configuration.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Recorder, ScriptedFactory};
use db_cluster_pool::config::parse_config;
use db_cluster_pool::pool::Availability;
use db_cluster_pool::{ClusterPool, PoolError};

const CONFIG: &str = r#"
[pool]
suppression_ttl_ms = 5000

[defaults]
adapter = "mysql"

[[backends]]
name = "writer"
url = "mysql://10.0.0.1:3306/app"
primary = true

[[backends]]
name = "reader_a"
url = "mysql://10.0.0.2:3306/app"
weight = 3

[[backends]]
name = "reader_b"
url = "mysql://10.0.0.3/app"
weight = 2
"#;

#[test]
fn test_builds_pool_in_config_order() {
    let config = parse_config(CONFIG).unwrap();
    let factory = ScriptedFactory::default();

    let pool = ClusterPool::from_config(&config, &factory, Arc::new(Recorder::default())).unwrap();

    let names: Vec<_> = pool.all_backends().iter().map(|b| b.id.to_string()).collect();
    assert_eq!(names, vec!["writer", "reader_a", "reader_b"]);
    assert_eq!(pool.designated_primary().id.as_str(), "writer");
    assert_eq!(pool.registry().weighted_set().total_weight(), 6);
    assert_eq!(factory.created.lock().unwrap().len(), 3);

    pool.suppress_backend(&"reader_a".into(), None).unwrap();
    match pool.availability(&"reader_a".into()).unwrap() {
        Availability::Suppressed { ttl, .. } => assert_eq!(ttl, Duration::from_millis(5000)),
        other => panic!("expected suppressed, got {:?}", other),
    }
}

#[test]
fn test_unreachable_backend_is_skipped() {
    let config = parse_config(CONFIG).unwrap();
    let factory = ScriptedFactory::refusing(&["reader_a"]);

    let pool = ClusterPool::from_config(&config, &factory, Arc::new(Recorder::default())).unwrap();

    let names: Vec<_> = pool.all_backends().iter().map(|b| b.id.to_string()).collect();
    assert_eq!(names, vec!["writer", "reader_b"]);
    assert_eq!(pool.designated_primary().id.as_str(), "writer");
}

#[test]
fn test_unreachable_primary_is_replaced() {
    let config = parse_config(CONFIG).unwrap();
    let factory = ScriptedFactory::refusing(&["writer"]);

    let pool = ClusterPool::from_config(&config, &factory, Arc::new(Recorder::default())).unwrap();

    assert_eq!(pool.designated_primary().id.as_str(), "reader_a");
    assert_eq!(pool.current_primary().id.as_str(), "reader_a");
    let value = pool.select_value("SELECT 1").unwrap();
    assert_eq!(value["backend"], "reader_a");
}

#[test]
fn test_nothing_reachable_is_an_error() {
    let config = parse_config(CONFIG).unwrap();
    let factory = ScriptedFactory::refusing(&["writer", "reader_a", "reader_b"]);

    let err = ClusterPool::from_config(&config, &factory, Arc::new(Recorder::default())).unwrap_err();
    assert!(matches!(err, PoolError::Configuration(_)));
}

#[test]
fn test_invalid_config_rejected_before_connecting() {
    let mut config = parse_config(CONFIG).unwrap();
    config.backends[1].adapter = Some("cluster_pool".to_string());
    let factory = ScriptedFactory::default();

    let err = ClusterPool::from_config(&config, &factory, Arc::new(Recorder::default())).unwrap_err();

    assert!(matches!(err, PoolError::Configuration(msg) if msg.contains("reader_a")));
    assert!(factory.created.lock().unwrap().is_empty());
}

const ARCHIVE_FIRST: &str = r#"
[defaults]
adapter = "postgresql"

[[backends]]
name = "archive"
url = "postgres://10.0.1.1/app"
weight = 0

[[backends]]
name = "writer"
url = "postgres://10.0.1.2/app"
primary = true

[[backends]]
name = "reader"
url = "postgres://10.0.1.3/app"
weight = 2
"#;

#[test]
fn test_replacement_primary_has_weight() {
    let config = parse_config(ARCHIVE_FIRST).unwrap();
    let factory = ScriptedFactory::refusing(&["writer"]);

    let pool = ClusterPool::from_config(&config, &factory, Arc::new(Recorder::default())).unwrap();

    assert_eq!(pool.designated_primary().id.as_str(), "reader");
    let names: Vec<_> = pool.all_backends().iter().map(|b| b.id.to_string()).collect();
    assert_eq!(names, vec!["archive", "reader"]);
}

#[test]
fn test_error_names_skipped_backends() {
    let config = parse_config(ARCHIVE_FIRST).unwrap();
    let factory = ScriptedFactory::refusing(&["writer", "reader"]);

    let err = ClusterPool::from_config(&config, &factory, Arc::new(Recorder::default())).unwrap_err();

    match err {
        PoolError::Configuration(msg) => {
            assert!(msg.contains("positive weight"), "{}", msg);
            assert!(msg.contains("writer, reader"), "{}", msg);
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
}
