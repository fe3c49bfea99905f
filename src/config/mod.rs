//! Configuration management for `sidecar`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`SIDECAR_*`)
//! 3. Data-dir config (`<data-dir>/config.yaml`)
//! 4. User config (`~/.config/sidecar/config.yaml`)
//! 5. Defaults
//!
//! Keys are compared with `_`, `-` and `.` treated alike, so
//! `linear.page-size`, `linear_page_size` and `SIDECAR_LINEAR_PAGE_SIZE`
//! all name the same setting.

use crate::error::{Result, SidecarError};
use crate::linear::{
    DEFAULT_COMPLETED_WINDOW_DAYS, DEFAULT_LINEAR_URL, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS,
    LinearSettings,
};
use crate::overlay::OVERLAY_FILENAME;
use crate::util::expand_home;
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default address for `sidecar serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
/// Directory under `$HOME` used when nothing else names one.
pub const DEFAULT_DATA_DIRNAME: &str = ".sidecar";
/// Config filename looked up in the data dir and the user config dir.
pub const CONFIG_FILENAME: &str = "config.yaml";
/// Env var that names the data directory.
pub const DATA_DIR_ENV: &str = "SIDECAR_DIR";

const ENV_PREFIX: &str = "SIDECAR_";

/// A flat key/value configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Set `key`, normalising it first.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Look up `key` regardless of separator style.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| SidecarError::path_io(path, e))?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `SIDECAR_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build a layer from explicit `(name, value)` pairs.
    #[must_use]
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            if key == DATA_DIR_ENV {
                continue;
            }
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.set(stripped, value);
            }
        }
        layer
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_dir: Option<PathBuf>,
    pub bind: Option<String>,
    pub overlay: Option<PathBuf>,
    pub linear_url: Option<String>,
    pub release_completed_ranks: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(bind) = &self.bind {
            layer.set("bind", bind.clone());
        }
        if let Some(path) = &self.overlay {
            layer.set("overlay", path.to_string_lossy().to_string());
        }
        if let Some(url) = &self.linear_url {
            layer.set("linear.url", url.clone());
        }
        if let Some(release) = self.release_completed_ranks {
            layer.set("release-completed-ranks", release.to_string());
        }

        layer
    }
}

/// Resolve the data directory: explicit path, then `SIDECAR_DIR`, then
/// `$HOME/.sidecar`.
///
/// # Errors
///
/// Returns `NoDataDir` if none of those is available.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_data_dir_with_env(
        explicit,
        env::var(DATA_DIR_ENV).ok().as_deref(),
        env::var("HOME").ok().as_deref(),
    )
}

fn resolve_data_dir_with_env(
    explicit: Option<&Path>,
    env_dir: Option<&str>,
    home: Option<&str>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(dir) = env_dir.filter(|d| !d.trim().is_empty()) {
        return Ok(expand_home(dir));
    }
    home.filter(|h| !h.trim().is_empty())
        .map(|h| Path::new(h).join(DEFAULT_DATA_DIRNAME))
        .ok_or(SidecarError::NoDataDir)
}

/// Load user config (`~/.config/sidecar/config.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("sidecar")
        .join(CONFIG_FILENAME);
    ConfigLayer::from_yaml(&path)
}

/// Load the data-dir config (`<data-dir>/config.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_data_dir_config(data_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&data_dir.join(CONFIG_FILENAME))
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.set("bind", DEFAULT_BIND);
    layer.set("linear.url", DEFAULT_LINEAR_URL);
    layer.set("linear.page-size", DEFAULT_PAGE_SIZE.to_string());
    layer.set("linear.timeout-secs", DEFAULT_TIMEOUT_SECS.to_string());
    layer.set(
        "linear.completed-window-days",
        DEFAULT_COMPLETED_WINDOW_DAYS.to_string(),
    );
    layer.set("release-completed-ranks", "false");
    layer
}

/// Load configuration with the full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(data_dir: &Path, cli: &CliOverrides) -> Result<ConfigLayer> {
    let defaults = default_config_layer();
    let user = load_user_config()?;
    let data_dir_layer = load_data_dir_config(data_dir)?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    Ok(ConfigLayer::merge_layers(&[
        defaults,
        user,
        data_dir_layer,
        env_layer,
        cli_layer,
    ]))
}

/// Typed settings resolved from a merged layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    pub overlay_path: PathBuf,
    pub linear: LinearSettings,
    pub release_completed_ranks: bool,
}

impl Settings {
    /// Type-check a merged layer.
    ///
    /// # Errors
    ///
    /// Returns a config error naming the key whose value does not parse.
    pub fn from_layer(layer: &ConfigLayer, data_dir: &Path) -> Result<Self> {
        let bind = parse_value(layer, "bind")?.unwrap_or_else(|| {
            SocketAddr::from(([127, 0, 0, 1], 5000))
        });

        let overlay_path = layer
            .get("overlay")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| data_dir.join(OVERLAY_FILENAME), expand_home);
        let overlay_path = if overlay_path.is_relative() {
            data_dir.join(overlay_path)
        } else {
            overlay_path
        };

        let page_size: u32 = parse_value(layer, "linear.page-size")?.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(SidecarError::Config(
                "linear.page-size must be at least 1".to_string(),
            ));
        }

        let linear = LinearSettings {
            url: layer
                .get("linear.url")
                .filter(|value| !value.trim().is_empty())
                .map_or_else(|| DEFAULT_LINEAR_URL.to_string(), |v| v.trim().to_string()),
            page_size,
            timeout_secs: parse_value(layer, "linear.timeout-secs")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            completed_window_days: parse_value(layer, "linear.completed-window-days")?
                .unwrap_or(DEFAULT_COMPLETED_WINDOW_DAYS),
            token: layer
                .get("linear.token")
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string),
        };

        let release_completed_ranks = match layer.get("release-completed-ranks") {
            Some(value) => parse_bool(value).ok_or_else(|| {
                SidecarError::Config(format!(
                    "release-completed-ranks: expected true or false, got '{value}'"
                ))
            })?,
            None => false,
        };

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            bind,
            overlay_path,
            linear,
            release_completed_ranks,
        })
    }

    /// Resolve the data dir and load every layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the data dir cannot be determined or a layer
    /// fails to load or type-check.
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
        let layer = load_config(&data_dir, cli)?;
        Self::from_layer(&layer, &data_dir)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['_', '-'], ".")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_value<T: FromStr>(layer: &ConfigLayer, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    layer
        .get(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| SidecarError::Config(format!("{key}: invalid value '{value}': {e}")))
        })
        .transpose()
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.set(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_produce_expected_settings() {
        let data_dir = Path::new("/data");
        let settings = Settings::from_layer(&default_config_layer(), data_dir).expect("settings");
        assert_eq!(settings.bind.to_string(), DEFAULT_BIND);
        assert_eq!(settings.overlay_path, data_dir.join("overlay.json"));
        assert_eq!(settings.linear.page_size, 50);
        assert_eq!(settings.linear.timeout_secs, 30);
        assert_eq!(settings.linear.completed_window_days, 180);
        assert!(settings.linear.token.is_none());
        assert!(!settings.release_completed_ranks);
    }

    #[test]
    fn yaml_is_flattened_to_dotted_keys() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            "bind: 0.0.0.0:8080\nlinear:\n  page_size: 25\n  token: lin_api_x\nrelease-completed-ranks: true\n",
        )
        .expect("write config");

        let layer = ConfigLayer::from_yaml(&path).expect("layer");
        assert_eq!(layer.get("linear.page-size"), Some("25"));

        let settings = Settings::from_layer(&layer, temp.path()).expect("settings");
        assert_eq!(settings.bind.port(), 8080);
        assert_eq!(settings.linear.page_size, 25);
        assert_eq!(settings.linear.token.as_deref(), Some("lin_api_x"));
        assert!(settings.release_completed_ranks);
    }

    #[test]
    fn missing_yaml_is_empty_layer() {
        let temp = TempDir::new().expect("tempdir");
        let layer = ConfigLayer::from_yaml(&temp.path().join("nope.yaml")).expect("layer");
        assert!(layer.values.is_empty());
    }

    #[test]
    fn env_vars_map_onto_dotted_keys() {
        let layer = ConfigLayer::from_vars([
            ("SIDECAR_LINEAR_TIMEOUT_SECS".to_string(), "5".to_string()),
            ("SIDECAR_DIR".to_string(), "/elsewhere".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ]);
        assert_eq!(layer.get("linear.timeout-secs"), Some("5"));
        assert_eq!(layer.values.len(), 1);
    }

    #[test]
    fn later_layers_win() {
        let mut low = ConfigLayer::default();
        low.set("bind", "127.0.0.1:1");
        let cli = CliOverrides {
            bind: Some("127.0.0.1:2".to_string()),
            ..Default::default()
        };
        let merged = ConfigLayer::merge_layers(&[default_config_layer(), low, cli.as_layer()]);
        assert_eq!(merged.get("bind"), Some("127.0.0.1:2"));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let mut layer = default_config_layer();
        layer.set("linear.page-size", "lots");
        let err = Settings::from_layer(&layer, Path::new("/data")).unwrap_err();
        assert!(matches!(err, SidecarError::Config(_)));
        assert!(err.to_string().contains("linear.page-size"));

        let mut layer = default_config_layer();
        layer.set("release-completed-ranks", "sometimes");
        assert!(Settings::from_layer(&layer, Path::new("/data")).is_err());
    }

    #[test]
    fn relative_overlay_path_is_under_data_dir() {
        let mut layer = default_config_layer();
        layer.set("overlay", "custom.json");
        let settings = Settings::from_layer(&layer, Path::new("/data")).expect("settings");
        assert_eq!(settings.overlay_path, PathBuf::from("/data/custom.json"));
    }

    #[test]
    fn data_dir_precedence() {
        let explicit = Path::new("/explicit");
        assert_eq!(
            resolve_data_dir_with_env(Some(explicit), Some("/env"), Some("/home/u")).unwrap(),
            explicit
        );
        assert_eq!(
            resolve_data_dir_with_env(None, Some("/env"), Some("/home/u")).unwrap(),
            PathBuf::from("/env")
        );
        assert_eq!(
            resolve_data_dir_with_env(None, Some(" "), Some("/home/u")).unwrap(),
            PathBuf::from("/home/u/.sidecar")
        );
        assert!(matches!(
            resolve_data_dir_with_env(None, None, None).unwrap_err(),
            SidecarError::NoDataDir
        ));
    }
}
