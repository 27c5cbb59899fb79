use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILENAME: &str = "docsync.toml";
pub const DEFAULT_ENDPOINT: &str = "https://dash.readme.com/api/v1/";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_USER_AGENT: &str = concat!("docsync/", env!("CARGO_PKG_VERSION"));

/// On-disk configuration file. Every key is optional.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub local: LocalSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct RemoteSection {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct LocalSection {
    pub doc_root: Option<PathBuf>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub doc_root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub api_key: String,
    pub endpoint: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub doc_root: PathBuf,
}

/// Load and parse the config file. Returns defaults if the file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<FileConfig> {
    if !config_path.exists() {
        return Ok(FileConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: FileConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// Resolve settings with precedence flag > env > file > default.
pub fn resolve_settings(file: &FileConfig, overrides: &Overrides) -> Result<Settings> {
    resolve_settings_with_lookup(file, overrides, |key| env::var(key).ok())
}

fn resolve_settings_with_lookup<F>(
    file: &FileConfig,
    overrides: &Overrides,
    lookup_env: F,
) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let env_value = |key: &str| {
        lookup_env(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let api_key = overrides
        .api_key
        .clone()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| env_value("API_KEY"))
        .or_else(|| file.remote.api_key.clone())
        .filter(|value| !value.trim().is_empty());
    let Some(api_key) = api_key else {
        bail!(
            "API key is not specified: pass --api-key, set API_KEY, or add api_key under [remote] in {DEFAULT_CONFIG_FILENAME}"
        );
    };

    let endpoint = env_value("README_API_ENDPOINT")
        .or_else(|| file.remote.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let timeout_ms = match env_value("README_HTTP_TIMEOUT_MS") {
        Some(value) => value
            .parse::<u64>()
            .with_context(|| format!("README_HTTP_TIMEOUT_MS is not a number: {value}"))?,
        None => file.remote.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
    };

    let user_agent = file
        .remote
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    let doc_root = overrides
        .doc_root
        .clone()
        .or_else(|| env_value("DOC_ROOT").map(PathBuf::from))
        .or_else(|| file.local.doc_root.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(Settings {
        remote: RemoteSettings {
            api_key,
            endpoint,
            timeout_ms,
            user_agent,
        },
        doc_root,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};

    use tempfile::tempdir;

    use super::*;

    fn file_with_key(key: &str) -> FileConfig {
        FileConfig {
            remote: RemoteSection {
                api_key: Some(key.to_string()),
                ..RemoteSection::default()
            },
            local: LocalSection::default(),
        }
    }

    #[test]
    fn load_config_returns_default_for_missing_file() {
        let config = load_config(Path::new("/nonexistent/docsync.toml")).expect("load config");
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn load_config_parses_sections() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("docsync.toml");
        fs::write(
            &config_path,
            r#"
[remote]
api_key = "file-key"
endpoint = "https://docs.example.com/api/v1/"
timeout_ms = 5000

[local]
doc_root = "docs"
"#,
        )
        .expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.remote.api_key.as_deref(), Some("file-key"));
        assert_eq!(
            config.remote.endpoint.as_deref(),
            Some("https://docs.example.com/api/v1/")
        );
        assert_eq!(config.remote.timeout_ms, Some(5000));
        assert_eq!(config.local.doc_root, Some(PathBuf::from("docs")));
    }

    #[test]
    fn load_config_returns_error_for_invalid_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("docsync.toml");
        fs::write(&config_path, "[remote\napi_key = \"oops\"").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let file = file_with_key("file-key");
        let env = HashMap::from([
            ("API_KEY".to_string(), "env-key".to_string()),
            ("DOC_ROOT".to_string(), "/env/docs".to_string()),
        ]);

        let from_env =
            resolve_settings_with_lookup(&file, &Overrides::default(), |key| env.get(key).cloned())
                .expect("resolve");
        assert_eq!(from_env.remote.api_key, "env-key");
        assert_eq!(from_env.doc_root, PathBuf::from("/env/docs"));

        let overrides = Overrides {
            api_key: Some("flag-key".to_string()),
            doc_root: Some(PathBuf::from("/flag/docs")),
        };
        let from_flag =
            resolve_settings_with_lookup(&file, &overrides, |key| env.get(key).cloned())
                .expect("resolve");
        assert_eq!(from_flag.remote.api_key, "flag-key");
        assert_eq!(from_flag.doc_root, PathBuf::from("/flag/docs"));

        let from_file = resolve_settings_with_lookup(&file, &Overrides::default(), |_| None)
            .expect("resolve");
        assert_eq!(from_file.remote.api_key, "file-key");
        assert_eq!(from_file.doc_root, PathBuf::from("."));
        assert_eq!(from_file.remote.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(from_file.remote.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let error = resolve_settings_with_lookup(&FileConfig::default(), &Overrides::default(), |_| {
            None
        })
        .expect_err("must fail");
        assert!(error.to_string().contains("API key is not specified"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let env = HashMap::from([("API_KEY".to_string(), "   ".to_string())]);
        let settings = resolve_settings_with_lookup(
            &file_with_key("file-key"),
            &Overrides::default(),
            |key| env.get(key).cloned(),
        )
        .expect("resolve");
        assert_eq!(settings.remote.api_key, "file-key");
    }

    #[test]
    fn invalid_timeout_is_reported() {
        let env = HashMap::from([("README_HTTP_TIMEOUT_MS".to_string(), "soon".to_string())]);
        let error = resolve_settings_with_lookup(
            &file_with_key("file-key"),
            &Overrides::default(),
            |key| env.get(key).cloned(),
        )
        .expect_err("must fail");
        assert!(error.to_string().contains("README_HTTP_TIMEOUT_MS"));
    }
}
