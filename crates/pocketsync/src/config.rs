use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use library::{FfmpegTranscoder, NamePass, NameRules, NormaliseMode, RulesError, SyncContext};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "POCKETSYNC_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    pub source_dir: String,
    pub dest_dir: String,
    pub artists: Vec<String>,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub names: NamesConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    pub program: String,
    pub timeout_secs: u64,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            timeout_secs: 600,
        }
    }
}

impl TranscoderConfig {
    pub fn build(&self) -> FfmpegTranscoder {
        let program = self.program.trim();
        let program = if program.is_empty() { "ffmpeg" } else { program };
        FfmpegTranscoder::new(program, Duration::from_secs(self.timeout_secs.max(1)))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NamesConfig {
    pub enabled: bool,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<String>,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dry_run: false,
            rules_path: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Rules(RulesError),
    Empty(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Json(err) => write!(f, "json error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
            ConfigError::Rules(err) => write!(f, "{}", err),
            ConfigError::Empty(key) => write!(f, "config key {} is empty", key),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

impl From<RulesError> for ConfigError {
    fn from(err: RulesError) -> Self {
        ConfigError::Rules(err)
    }
}

/// Explicit argument, then `POCKETSYNC_CONFIG`, then `config.json`.
pub fn config_path(arg: Option<String>) -> PathBuf {
    if let Some(arg) = arg.filter(|value| !value.trim().is_empty()) {
        return PathBuf::from(arg);
    }
    match env::var(CONFIG_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml")
        })
        .unwrap_or(false);
    let config: SyncConfig = if is_yaml {
        serde_yaml::from_str(&contents)?
    } else {
        serde_json::from_str(&contents)?
    };
    if config.source_dir.trim().is_empty() {
        return Err(ConfigError::Empty("source_dir"));
    }
    if config.dest_dir.trim().is_empty() {
        return Err(ConfigError::Empty("dest_dir"));
    }
    Ok(config)
}

pub fn build_context(config_path: &Path, config: &SyncConfig) -> Result<SyncContext, ConfigError> {
    let names = if config.names.enabled {
        let rules = match config.names.rules_path.as_deref() {
            Some(value) if !value.trim().is_empty() => {
                NameRules::from_path(&resolve_path(config_path, value.trim()))?
            }
            _ => NameRules::builtin()?,
        };
        let mode = if config.names.dry_run {
            NormaliseMode::DryRun
        } else {
            NormaliseMode::Apply
        };
        Some(NamePass { rules, mode })
    } else {
        None
    };

    Ok(SyncContext {
        source_root: resolve_path(config_path, config.source_dir.trim()),
        dest_root: resolve_path(config_path, config.dest_dir.trim()),
        artists: config.artists.clone(),
        names,
    })
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_json_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{"source_dir": "music", "dest_dir": "/mnt/phone", "artists": ["Björk", "Outkast"]}"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.artists, ["Björk", "Outkast"]);
        assert_eq!(config.transcoder.program, "ffmpeg");
        assert!(config.names.enabled);
        assert!(!config.names.dry_run);

        let context = build_context(&path, &config).unwrap();
        assert_eq!(context.source_root, dir.path().join("music"));
        assert_eq!(context.dest_root, PathBuf::from("/mnt/phone"));
        assert_eq!(context.names.unwrap().mode, NormaliseMode::Apply);
    }

    #[test]
    fn missing_required_key_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{"source_dir": "music", "artists": []}"#,
        );
        assert!(matches!(load_config(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn empty_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{"source_dir": " ", "dest_dir": "out", "artists": []}"#,
        );
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Empty("source_dir"))
        ));
    }

    #[test]
    fn loads_yaml_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "sync.yaml",
            "source_dir: music\ndest_dir: out\nartists:\n  - Low\nnames:\n  dry_run: true\ntranscoder:\n  timeout_secs: 30\n",
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.artists, ["Low"]);
        assert_eq!(config.transcoder.timeout_secs, 30);
        let context = build_context(&path, &config).unwrap();
        assert_eq!(context.names.unwrap().mode, NormaliseMode::DryRun);
    }

    #[test]
    fn name_pass_can_be_disabled_or_use_external_rules() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "rules.json",
            r#"{"articles": [], "words": {"abba": "ABBA"}}"#,
        );
        let path = write(
            &dir,
            "config.json",
            r#"{"source_dir": "a", "dest_dir": "b", "artists": [],
                "names": {"rules_path": "rules.json"}}"#,
        );
        let config = load_config(&path).unwrap();
        let pass = build_context(&path, &config).unwrap().names.unwrap();
        assert_eq!(pass.rules.normalise("abba"), "ABBA");

        let path = write(
            &dir,
            "off.json",
            r#"{"source_dir": "a", "dest_dir": "b", "artists": [], "names": {"enabled": false}}"#,
        );
        let config = load_config(&path).unwrap();
        assert!(build_context(&path, &config).unwrap().names.is_none());
    }

    #[test]
    fn explicit_argument_wins() {
        assert_eq!(
            config_path(Some("custom.json".to_string())),
            PathBuf::from("custom.json")
        );
    }

    #[test]
    fn resolves_relative_to_config_dir() {
        let path = resolve_path(Path::new("/etc/pocketsync/config.json"), "music");
        assert_eq!(path, PathBuf::from("/etc/pocketsync/music"));
        let path = resolve_path(Path::new("config.json"), "music");
        assert_eq!(path, PathBuf::from("./music"));
    }
}
