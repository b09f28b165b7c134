//! Trust configuration: which directories become tokens
//!
//! A [`TrustConfig`] lists trust paths in priority order. Each non-empty path
//! becomes one token with its own slot id. Labels come from [`LabelRule`]s:
//! the first path starting with a rule's prefix claims that rule's label, and
//! every later path falls back to its base name.
//!
//! ```toml
//! paths = ["~/.config/trust", "/usr/share/trust", "/etc/trust"]
//!
//! [[labels]]
//! prefix = "/opt/"
//! label = "Vendor Trust"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use trust_fs::{ConfigStore, NormalizedPath};

use crate::Result;
use crate::error::Error;
use crate::token::{SlotId, Token};

/// Slot id of the first configured token.
pub const BASE_SLOT_ID: SlotId = 18;

const HOME_PREFIX: &str = "~/";

/// Assigns a label to the first trust path starting with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    pub prefix: String,
    pub label: String,
}

impl LabelRule {
    pub fn new(prefix: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            label: label.into(),
        }
    }
}

fn default_labels() -> Vec<LabelRule> {
    vec![
        LabelRule::new(HOME_PREFIX, "User Trust"),
        LabelRule::new("/usr/share/", "Default Trust"),
        LabelRule::new("/etc/", "System Trust"),
    ]
}

/// Trust path configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Trust paths in priority order; `~/` expands to the home directory
    #[serde(default)]
    pub paths: Vec<String>,

    /// Label rules, checked in order against each path as written
    #[serde(default = "default_labels")]
    pub labels: Vec<LabelRule>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            labels: default_labels(),
        }
    }
}

/// Everything needed to create one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpec {
    pub slot: SlotId,
    pub path: NormalizedPath,
    pub label: String,
}

impl TrustConfig {
    /// Build a configuration from a `:`-separated path list.
    pub fn from_path_list(list: &str) -> Self {
        Self {
            paths: list.split(':').map(str::to_string).collect(),
            ..Self::default()
        }
    }

    /// Load a configuration file (`.toml` or `.json`).
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    /// Resolve slot ids, labels and expanded paths, in configured order.
    ///
    /// Empty entries are skipped without consuming a slot id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a path starts with `~/` and no home
    /// directory is known.
    pub fn token_specs(&self) -> Result<Vec<TokenSpec>> {
        let mut claimed = vec![false; self.labels.len()];
        let mut specs = Vec::new();

        for raw in self.paths.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let rule = self
                .labels
                .iter()
                .enumerate()
                .find(|(i, rule)| !claimed[*i] && raw.starts_with(&rule.prefix));
            let path = expand_home(raw)?;

            let label = match rule {
                Some((i, rule)) => {
                    claimed[i] = true;
                    rule.label.clone()
                }
                None => path.file_name().unwrap_or(path.as_str()).to_string(),
            };

            specs.push(TokenSpec {
                slot: BASE_SLOT_ID + specs.len() as SlotId,
                path,
                label,
            });
        }

        Ok(specs)
    }

    /// Create one unloaded token per configured path.
    pub fn create_tokens(&self) -> Result<Vec<Token>> {
        self.token_specs()?
            .into_iter()
            .map(|spec| Token::new(spec.slot, spec.path, spec.label))
            .collect()
    }
}

fn expand_home(raw: &str) -> Result<NormalizedPath> {
    let Some(rest) = raw.strip_prefix(HOME_PREFIX) else {
        return Ok(NormalizedPath::new(raw));
    };
    let home: PathBuf = dirs::home_dir().ok_or_else(|| Error::Config {
        message: format!("cannot expand {}: no home directory", raw),
    })?;
    Ok(NormalizedPath::new(home.join(rest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_list_skips_empty_entries() {
        let config = TrustConfig::from_path_list("/etc/trust::/opt/certs:");
        let specs = config.token_specs().unwrap();

        let slots: Vec<_> = specs.iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![BASE_SLOT_ID, BASE_SLOT_ID + 1]);
    }

    #[test]
    fn each_label_rule_is_claimed_once() {
        let config = TrustConfig::from_path_list("/etc/trust:/etc/pki/extra");
        let specs = config.token_specs().unwrap();

        assert_eq!(specs[0].label, "System Trust");
        assert_eq!(specs[1].label, "extra");
    }

    #[test]
    fn unmatched_path_uses_base_name() {
        let config = TrustConfig::from_path_list("/opt/vendor/certs/");
        let specs = config.token_specs().unwrap();

        assert_eq!(specs[0].label, "certs");
        assert_eq!(specs[0].path.as_str(), "/opt/vendor/certs");
    }
}
