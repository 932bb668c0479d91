//! Per-spec policy: ban lists, quota tiers and pattern-based config overrides.
//!
//! Patterns are regular expressions anchored at the start of the spec and
//! matched case-insensitively, since most hosts treat `DS-100/textbook` and
//! `ds-100/textbook` as the same repository.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProviderError, Result};

/// Merged configuration for one repository. Always contains `quota`.
pub type RepoConfig = Map<String, Value>;

/// Quota tiers applied before any pattern override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSettings {
    /// Quota for ordinary specs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_repo_quota: Option<i64>,
    /// Quota for specs matching `high_quota_specs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_repo_quota_higher: Option<i64>,
}

/// Raw policy configuration as it appears in `repospec.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySettings {
    /// Patterns of specs that may not be built
    #[serde(default)]
    pub banned_specs: Vec<String>,

    /// Patterns of specs that get `per_repo_quota_higher`
    #[serde(default)]
    pub high_quota_specs: Vec<String>,

    /// Ordered `{ pattern, config }` tables; kept untyped so malformed
    /// entries can be reported precisely
    #[serde(default)]
    pub spec_config: Vec<Value>,

    #[serde(flatten)]
    pub quotas: QuotaSettings,
}

/// One validated `spec_config` entry.
#[derive(Debug, Clone)]
struct SpecOverride {
    pattern: Regex,
    config: Map<String, Value>,
}

impl SpecOverride {
    fn from_value(item: &Value) -> Result<Self> {
        let pattern = match item.get("pattern") {
            Some(Value::String(pattern)) => pattern,
            other => {
                return Err(ProviderError::configuration(format!(
                    "Spec-pattern configuration expected a regex pattern string, not {}",
                    type_name(other)
                )));
            }
        };
        let config = match item.get("config") {
            Some(Value::Object(config)) => config.clone(),
            other => {
                return Err(ProviderError::configuration(format!(
                    "Spec-pattern configuration expected a specification configuration mapping, not {}",
                    type_name(other)
                )));
            }
        };
        Ok(Self {
            pattern: compile(pattern)?,
            config,
        })
    }
}

fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None | Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "mapping",
    }
}

/// Compile a pattern so that it only matches at the start of the input.
fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(&format!("^(?:{pattern})"))
        .case_insensitive(true)
        .size_limit(1024 * 1024)
        .build()
        .map_err(|e| {
            ProviderError::configuration(format!("Invalid spec pattern '{pattern}': {e}"))
        })
}

/// Compiled policy, evaluated against spec strings.
#[derive(Debug, Clone, Default)]
pub struct PolicyMatcher {
    banned: Vec<Regex>,
    high_quota: Vec<Regex>,
    overrides: Vec<SpecOverride>,
}

impl PolicyMatcher {
    /// Compile every pattern and validate every override entry.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid regex or an override
    /// entry whose `pattern` is not a string or whose `config` is not a table.
    pub fn new(settings: &PolicySettings) -> Result<Self> {
        let banned = settings
            .banned_specs
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;
        let high_quota = settings
            .high_quota_specs
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;
        let overrides = settings
            .spec_config
            .iter()
            .map(SpecOverride::from_value)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            banned,
            high_quota,
            overrides,
        })
    }

    /// True if any banned pattern matches.
    pub fn is_banned(&self, spec: &str) -> bool {
        self.banned.iter().any(|re| re.is_match(spec))
    }

    /// True if any elevated-quota pattern matches.
    pub fn has_higher_quota(&self, spec: &str) -> bool {
        self.high_quota.iter().any(|re| re.is_match(spec))
    }

    /// Merge the quota tier with every matching override, in declaration
    /// order. Later overrides win on key collisions.
    pub fn repo_config(&self, spec: &str, quotas: &QuotaSettings) -> RepoConfig {
        let quota = if self.has_higher_quota(spec) {
            quotas.per_repo_quota_higher
        } else {
            quotas.per_repo_quota
        };

        let mut config = RepoConfig::new();
        config.insert("quota".to_string(), Value::from(quota));

        for item in &self.overrides {
            if item.pattern.is_match(spec) {
                for (key, value) in &item.config {
                    config.insert(key.clone(), value.clone());
                }
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quotas() -> QuotaSettings {
        QuotaSettings {
            per_repo_quota: Some(10),
            per_repo_quota_higher: Some(100),
        }
    }

    fn matcher(settings: PolicySettings) -> PolicyMatcher {
        PolicyMatcher::new(&settings).unwrap()
    }

    #[test]
    fn banned_match_ignores_case() {
        let policy = matcher(PolicySettings {
            banned_specs: vec!["^evil/.*".to_string()],
            ..Default::default()
        });
        assert!(policy.is_banned("Evil/Repo/master"));
        assert!(!policy.is_banned("good/repo/master"));
    }

    #[test]
    fn patterns_are_anchored_at_start() {
        let policy = matcher(PolicySettings {
            banned_specs: vec!["evil".to_string()],
            ..Default::default()
        });
        assert!(policy.is_banned("evil/repo/master"));
        assert!(policy.is_banned("evilcorp/repo/master"));
        assert!(!policy.is_banned("not-evil/repo/master"));
    }

    #[test]
    fn alternation_stays_anchored() {
        let policy = matcher(PolicySettings {
            banned_specs: vec!["a/.*|b/.*".to_string()],
            ..Default::default()
        });
        assert!(policy.is_banned("b/repo/master"));
        assert!(!policy.is_banned("xb/repo/master"));
    }

    #[test]
    fn quota_tiers() {
        let policy = matcher(PolicySettings {
            high_quota_specs: vec!["^jupyterhub/.*".to_string()],
            ..Default::default()
        });
        assert!(policy.has_higher_quota("JupyterHub/binderhub/master"));

        let config = policy.repo_config("jupyterhub/binderhub/master", &quotas());
        assert_eq!(config["quota"], json!(100));

        let config = policy.repo_config("someone/else/master", &quotas());
        assert_eq!(config["quota"], json!(10));
    }

    #[test]
    fn missing_quota_is_null() {
        let policy = PolicyMatcher::default();
        let config = policy.repo_config("a/b/c", &QuotaSettings::default());
        assert_eq!(config["quota"], Value::Null);
    }

    #[test]
    fn overlapping_overrides_merge_in_order() {
        let policy = matcher(PolicySettings {
            spec_config: vec![
                json!({"pattern": "^org/.*", "config": {"quota": 5, "cpu": 1}}),
                json!({"pattern": "^nomatch/.*", "config": {"cpu": 99}}),
                json!({"pattern": "^org/repo.*", "config": {"quota": 7, "memory": "2G"}}),
            ],
            ..Default::default()
        });

        let config = policy.repo_config("ORG/repo/master", &quotas());
        assert_eq!(config["quota"], json!(7));
        assert_eq!(config["cpu"], json!(1));
        assert_eq!(config["memory"], json!("2G"));
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn non_string_pattern_is_rejected() {
        let err = PolicyMatcher::new(&PolicySettings {
            spec_config: vec![json!({"pattern": 3, "config": {}})],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn non_mapping_config_is_rejected() {
        let err = PolicyMatcher::new(&PolicySettings {
            spec_config: vec![json!({"pattern": "^a", "config": [1, 2]})],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = PolicyMatcher::new(&PolicySettings {
            banned_specs: vec!["(unclosed".to_string()],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }
}
