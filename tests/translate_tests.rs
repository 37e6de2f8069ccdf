// Stats translation tests: node record, container record, all-or-nothing batch

mod common;

use chrono::Utc;
use common::*;
use nodestats::aggregator::AggregateState;
use nodestats::error::RuntimeError;
use nodestats::translate::{
    DEFAULT_INTERFACE_NAME, build_all_containers, build_container_stats, build_node_stats,
};
use std::sync::Mutex;

#[test]
fn node_stats_copy_snapshot_fields() {
    let start = created();
    let snapshot = AggregateState {
        cpu_usage_core_nanoseconds: 2_000_000_000,
        memory_working_set_bytes: 1024,
        memory_committed_bytes: 2048,
        memory_capacity_bytes: CAPACITY_BYTES,
        start_time: start,
    };
    let before = Utc::now();
    let info = build_node_stats(&snapshot);
    let after = Utc::now();

    assert_eq!(info.spec.creation_time, start);
    assert_eq!(info.spec.memory.limit, CAPACITY_BYTES);
    assert!(info.spec.has_cpu);
    assert!(info.spec.has_memory);
    assert_eq!(info.stats.len(), 1);
    let stats = info.latest().unwrap();
    assert_eq!(stats.cpu.unwrap().usage.total, 2_000_000_000);
    let memory = stats.memory.unwrap();
    assert_eq!(memory.working_set, 1024);
    assert_eq!(memory.usage, 2048);
    assert!(stats.network.is_none());
    assert!(stats.timestamp >= before && stats.timestamp <= after);
}

#[test]
fn container_stats_convert_cpu_ticks_to_nanoseconds() {
    let info = build_container_stats(&raw_usage("abc", 500));
    let stats = info.latest().unwrap();
    assert_eq!(stats.cpu.unwrap().usage.total, 50_000);
}

#[test]
fn container_stats_copy_memory_and_map_interfaces() {
    let mut raw = raw_usage("abc", 1);
    raw.networks.push(nodestats::models::NetworkUsageRaw {
        rx_dropped: 5,
        tx_errors: 6,
        ..Default::default()
    });
    let info = build_container_stats(&raw);

    assert_eq!(info.spec.creation_time, created());
    assert_eq!(info.spec.namespace, "docker");
    assert_eq!(info.spec.image, "abc:latest");
    assert_eq!(info.spec.labels.get("app").map(String::as_str), Some("abc"));
    assert!(info.spec.has_network);
    assert!(!info.spec.has_filesystem);
    assert!(!info.spec.has_diskio);

    let stats = info.latest().unwrap();
    let memory = stats.memory.unwrap();
    assert_eq!(memory.working_set, 4096);
    assert_eq!(memory.usage, 8192);

    let interfaces = &stats.network.as_ref().unwrap().interfaces;
    assert_eq!(interfaces.len(), 2);
    assert!(interfaces.iter().all(|i| i.name == DEFAULT_INTERFACE_NAME));
    assert_eq!(interfaces[0].rx_bytes, 10);
    assert_eq!(interfaces[0].tx_packets, 2);
    assert_eq!(interfaces[1].rx_dropped, 5);
    assert_eq!(interfaces[1].tx_errors, 6);
}

#[tokio::test]
async fn build_all_containers_returns_every_container() {
    let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let infos = build_all_containers(&ids, |id| async move {
        Ok::<_, RuntimeError>(raw_usage(&id, 10))
    })
    .await
    .unwrap();
    assert_eq!(infos.len(), 3);
    assert_eq!(infos["b"].spec.image, "b:latest");
    assert_eq!(infos["c"].latest().unwrap().cpu.unwrap().usage.total, 1_000);
}

#[tokio::test]
async fn build_all_containers_fails_fast_without_partial_map() {
    let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let fetched = Mutex::new(Vec::new());
    let result = build_all_containers(&ids, |id| {
        fetched.lock().unwrap().push(id.clone());
        async move {
            if id == "b" {
                Err(RuntimeError::NoStats { id })
            } else {
                Ok(raw_usage(&id, 10))
            }
        }
    })
    .await;

    assert!(matches!(result, Err(RuntimeError::NoStats { ref id }) if id == "b"));
    assert_eq!(*fetched.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn build_all_containers_with_no_ids_is_empty() {
    let infos = build_all_containers(&[], |id| async move {
        Ok::<_, RuntimeError>(raw_usage(&id, 0))
    })
    .await
    .unwrap();
    assert!(infos.is_empty());
}
