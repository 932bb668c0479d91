//! Policy configured through a TOML file, end to end.

use std::fs;

use repospec_core::config::{load_config, parse_config_str};
use repospec_core::provider::ProviderRegistry;
use serde_json::json;
use tempfile::TempDir;

const CONFIG: &str = r#"
[github]
access_token = "from-file"

[cache]
capacity = 16

[policy]
banned_specs = ["^evil/.*", "^spam-org/"]
high_quota_specs = ["^jupyterhub/.*"]
per_repo_quota = 100
per_repo_quota_higher = 200

[[policy.spec_config]]
pattern = "^jupyterhub/.*"
config = { quota = 500, node_selector = "large" }

[[policy.spec_config]]
pattern = "^jupyterhub/binder.*"
config = { quota = 999 }
"#;

#[test]
fn policy_from_file_drives_registry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("repospec.toml");
    fs::write(&path, CONFIG).unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.cache.capacity, 16);
    let registry = ProviderRegistry::new(config).unwrap();

    assert!(registry.is_banned("Evil/Repo/master"));
    assert!(registry.is_banned("spam-org/x/main"));
    assert!(!registry.is_banned("good/evil/main"));

    assert!(registry.has_higher_quota("JupyterHub/repo2docker/main"));
    assert!(!registry.has_higher_quota("someone/jupyterhub/main"));

    let plain = registry.repo_config("someone/repo/main");
    assert_eq!(plain.len(), 1);
    assert_eq!(plain["quota"], json!(100));

    let elevated = registry.repo_config("jupyterhub/repo2docker/main");
    assert_eq!(elevated["quota"], json!(500));
    assert_eq!(elevated["node_selector"], json!("large"));

    let most_specific = registry.repo_config("jupyterhub/binderhub/main");
    assert_eq!(most_specific["quota"], json!(999));
    assert_eq!(most_specific["node_selector"], json!("large"));
}

#[test]
fn invalid_policy_is_rejected_at_load() {
    let bad_regex = "[policy]\nbanned_specs = [\"(unclosed\"]\n";
    assert!(parse_config_str(bad_regex).is_err());

    let bad_override = "[[policy.spec_config]]\npattern = 42\nconfig = {}\n";
    let err = parse_config_str(bad_override).unwrap_err();
    assert!(format!("{err:#}").contains("Invalid policy configuration"));

    let zero_capacity = "[cache]\ncapacity = 0\n";
    assert!(parse_config_str(zero_capacity).is_err());
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
