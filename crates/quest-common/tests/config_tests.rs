use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use quest_common::config::{QuestConfig, SchedulePolicy, DEFAULT_RESTART_SECS, REPORT_USAGE_URL};
use quest_common::QuestError;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn derives_endpoints_from_lowercased_agent_id() {
    let cfg = QuestConfig::from_lookup(lookup(&[("WALLET_ADDRESSES", "0xAAA, 0xBBB"), ("AGENT_ID", "XYZ")])).unwrap();
    assert_eq!(cfg.wallets, vec!["0xAAA", "0xBBB"]);
    assert_eq!(cfg.endpoints.agent_url, "https://deployment-xyz.stag-vxzy.zettablock.com/main");
    assert_eq!(cfg.endpoints.agent_host.as_deref(), Some("deployment-xyz.stag-vxzy.zettablock.com"));
    assert_eq!(cfg.endpoints.report_url, REPORT_USAGE_URL);
    assert_eq!(cfg.endpoints.report_agent_id(), "deployment_xyz");
    assert_eq!(cfg.messages_path, PathBuf::from("messages.json"));
    assert_eq!(cfg.schedule, SchedulePolicy::Repeat(Duration::from_secs(DEFAULT_RESTART_SECS)));
}

#[test]
fn missing_wallets_is_fatal() {
    let err = QuestConfig::from_lookup(lookup(&[("AGENT_ID", "xyz")])).unwrap_err();
    assert!(matches!(err, QuestError::MissingEnv("WALLET_ADDRESSES")));
    let err = QuestConfig::from_lookup(lookup(&[("WALLET_ADDRESSES", " , "), ("AGENT_ID", "xyz")])).unwrap_err();
    assert!(matches!(err, QuestError::MissingEnv("WALLET_ADDRESSES")));
}

#[test]
fn missing_agent_id_is_fatal() {
    let err = QuestConfig::from_lookup(lookup(&[("WALLET_ADDRESSES", "0xAAA"), ("AGENT_ID", "  ")])).unwrap_err();
    assert!(matches!(err, QuestError::MissingEnv("AGENT_ID")));
    assert!(err.to_string().contains("AGENT_ID"));
}

#[test]
fn schedule_and_overrides_from_env() {
    let cfg = QuestConfig::from_lookup(lookup(&[
        ("WALLET_ADDRESSES", "0xAAA"),
        ("AGENT_ID", "xyz"),
        ("QUEST_SCHEDULE", "once"),
        ("AGENT_URL", "http://127.0.0.1:9000/main"),
        ("REPORT_USAGE_URL", "http://127.0.0.1:9000/report"),
    ]))
    .unwrap();
    assert_eq!(cfg.schedule, SchedulePolicy::Once);
    assert_eq!(cfg.endpoints.agent_url, "http://127.0.0.1:9000/main");
    assert_eq!(cfg.endpoints.agent_host, None);
    assert_eq!(cfg.endpoints.report_url, "http://127.0.0.1:9000/report");
}

#[test]
fn rejects_bad_schedule_and_zero_restart() {
    let err = QuestConfig::from_lookup(lookup(&[("WALLET_ADDRESSES", "a"), ("AGENT_ID", "x"), ("QUEST_SCHEDULE", "weekly")])).unwrap_err();
    assert!(matches!(err, QuestError::Config(_)));
    let err = QuestConfig::from_lookup(lookup(&[("WALLET_ADDRESSES", "a"), ("AGENT_ID", "x"), ("QUEST_RESTART_SECS", "0")])).unwrap_err();
    assert!(matches!(err, QuestError::Config(_)));
}

#[test]
fn yaml_file_fills_optional_fields_and_env_wins() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "messages: prompts.json\nschedule: daily\nrestart_secs: 60\nreport_url: http://file/report").unwrap();
    let path = file.path().display().to_string();
    let cfg = QuestConfig::from_lookup(lookup(&[
        ("WALLET_ADDRESSES", "0xAAA"),
        ("AGENT_ID", "xyz"),
        ("QUEST_CONFIG", path.as_str()),
        ("QUEST_RESTART_SECS", "30"),
    ]))
    .unwrap();
    assert_eq!(cfg.messages_path, PathBuf::from("prompts.json"));
    assert_eq!(cfg.schedule, SchedulePolicy::Repeat(Duration::from_secs(30)));
    assert_eq!(cfg.endpoints.report_url, "http://file/report");
    assert!(cfg.endpoints.agent_host.is_some());
}
