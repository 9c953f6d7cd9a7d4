// tests/config_env.rs
// These tests mutate process env; serialize them.
use std::fs;
use std::time::Duration;

use ld_job_harvester::classify::Category;
use ld_job_harvester::config::keywords::{load_keywords_default, load_keywords_from, ENV_KEYWORDS_PATH};
use ld_job_harvester::config::sources::{load_sources_default, ENV_SOURCES_PATH};
use ld_job_harvester::config::AppConfig;
use serial_test::serial;

#[test]
#[serial]
fn sources_path_and_enable_flags_compose() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sources.toml");
    fs::write(
        &path,
        r#"
[[sources]]
name = "RemoteOK"
parser = "remoteok"

[[sources]]
name = "Learning Guild"
parser = "learningguild"
enabled = false
"#,
    )
    .unwrap();

    std::env::set_var(ENV_SOURCES_PATH, &path);
    std::env::set_var("SOURCE_REMOTEOK_ENABLED", "false");
    std::env::set_var("SOURCE_LEARNINGGUILD_ENABLED", "yes");
    let loaded = load_sources_default();
    std::env::remove_var(ENV_SOURCES_PATH);
    std::env::remove_var("SOURCE_REMOTEOK_ENABLED");
    std::env::remove_var("SOURCE_LEARNINGGUILD_ENABLED");

    let sources = loaded.unwrap();
    assert_eq!(sources.len(), 2);
    assert!(!sources[0].enabled);
    assert!(sources[1].enabled);
}

#[test]
#[serial]
fn missing_sources_path_is_an_error() {
    std::env::set_var(ENV_SOURCES_PATH, "/definitely/not/here/sources.toml");
    let loaded = load_sources_default();
    std::env::remove_var(ENV_SOURCES_PATH);
    assert!(loaded.is_err());
}

#[test]
#[serial]
fn keywords_load_from_json_and_toml_files() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("keywords.json");
    fs::write(&json, r#"{"relevance": ["facilitator"]}"#).unwrap();
    let k = load_keywords_from(&json).unwrap();
    assert!(k.relevance.is_relevant("Workshop Facilitator"));
    assert!(!k.relevance.is_relevant("Instructional Designer"));

    let toml = dir.path().join("keywords.toml");
    fs::write(&toml, "[categories]\ninstructional-design = [\"storyboard\"]\n").unwrap();
    std::env::set_var(ENV_KEYWORDS_PATH, &toml);
    let k = load_keywords_default();
    std::env::remove_var(ENV_KEYWORDS_PATH);
    let k = k.unwrap();
    assert_eq!(k.categories.detect("Storyboard artist", ""), Category::InstructionalDesign);
}

#[test]
#[serial]
fn unreadable_keywords_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("keywords.toml");
    fs::write(&bad, "relevance = [[[").unwrap();
    assert!(load_keywords_from(&bad).is_err());
}

fn lookup_with(key: &'static str, value: &'static str) -> impl Fn(&str) -> Option<String> {
    move |k| (k == key).then(|| value.to_string())
}

#[test]
fn expiry_days_outside_bounds_are_rejected() {
    for raw in ["-5", "0", "3651", "1000000000"] {
        assert!(
            AppConfig::from_lookup(lookup_with("JOB_EXPIRY_DAYS", raw)).is_err(),
            "JOB_EXPIRY_DAYS={raw} accepted"
        );
    }
    let cfg = AppConfig::from_lookup(lookup_with("JOB_EXPIRY_DAYS", "3650")).unwrap();
    assert_eq!(cfg.expiry_days, 3650);
}

#[test]
fn interval_hours_outside_bounds_are_rejected() {
    for raw in ["0", "8761", "18446744073709551615"] {
        assert!(
            AppConfig::from_lookup(lookup_with("SCRAPE_INTERVAL_HOURS", raw)).is_err(),
            "SCRAPE_INTERVAL_HOURS={raw} accepted"
        );
    }
    let cfg = AppConfig::from_lookup(lookup_with("SCRAPE_INTERVAL_HOURS", "24")).unwrap();
    assert_eq!(cfg.interval, Duration::from_secs(24 * 3600));
}
