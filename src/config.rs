//! TOML configuration for the photo generator and the dev server.
//!
//! Every section and field has a default, so the CLI runs with no config
//! file at all. See [`load_config`] for the validation rules.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    /// Defaults to `<images_dir>/manifest.json`.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            images_dir: default_images_dir(),
            manifest: None,
        }
    }
}

impl PathsConfig {
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.images_dir.join("manifest.json"))
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("shared/js/data.js")
}
fn default_images_dir() -> PathBuf {
    PathBuf::from("shared/images")
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_full_px")]
    pub full_px: u32,
    #[serde(default = "default_thumb_px")]
    pub thumb_px: u32,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_cost_per_image")]
    pub cost_per_image: f64,
    #[serde(default = "default_start_delay_secs")]
    pub start_delay_secs: u64,
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_rate_limit_cooldown_secs")]
    pub rate_limit_cooldown_secs: u64,
    /// `None` retries a rate-limited item until the service lets it through.
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            size: default_size(),
            quality: default_quality(),
            style: default_style(),
            full_px: default_full_px(),
            thumb_px: default_thumb_px(),
            extension: default_extension(),
            cost_per_image: default_cost_per_image(),
            start_delay_secs: default_start_delay_secs(),
            pacing_ms: default_pacing_ms(),
            rate_limit_cooldown_secs: default_rate_limit_cooldown_secs(),
            max_rate_limit_retries: None,
            timeout_secs: default_timeout_secs(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_model() -> String {
    "dall-e-3".to_string()
}
fn default_size() -> String {
    "1024x1024".to_string()
}
fn default_quality() -> String {
    "standard".to_string()
}
fn default_style() -> String {
    "natural".to_string()
}
fn default_full_px() -> u32 {
    512
}
fn default_thumb_px() -> u32 {
    128
}
fn default_extension() -> String {
    "webp".to_string()
}
fn default_cost_per_image() -> f64 {
    0.04
}
fn default_start_delay_secs() -> u64 {
    3
}
fn default_pacing_ms() -> u64 {
    1500
}
fn default_rate_limit_cooldown_secs() -> u64 {
    30
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            root: default_root(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8766
}
fn default_root() -> PathBuf {
    PathBuf::from(".")
}

const IMAGE_EXTENSIONS: &[&str] = &["webp", "png", "jpg", "jpeg"];

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let generation = &config.generation;

    if generation.full_px == 0 || generation.thumb_px == 0 {
        anyhow::bail!("generation.full_px and generation.thumb_px must be > 0");
    }

    if generation.cost_per_image.is_nan() || generation.cost_per_image < 0.0 {
        anyhow::bail!("generation.cost_per_image must be >= 0");
    }

    if !IMAGE_EXTENSIONS.contains(&generation.extension.as_str()) {
        anyhow::bail!(
            "Unknown image extension: '{}'. Must be one of: {}",
            generation.extension,
            IMAGE_EXTENSIONS.join(", ")
        );
    }

    if generation.api_key_env.trim().is_empty() {
        anyhow::bail!("generation.api_key_env must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = load_config(Path::new("/definitely/not/here/photos.toml")).unwrap();
        assert_eq!(cfg.generation.model, "dall-e-3");
        assert_eq!(cfg.generation.full_px, 512);
        assert_eq!(cfg.server.port, 8766);
        assert_eq!(
            cfg.paths.manifest_path(),
            PathBuf::from("shared/images/manifest.json")
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photos.toml");
        std::fs::write(
            &path,
            "[paths]\nimages_dir = \"out\"\n\n[generation]\npacing_ms = 0\nmax_rate_limit_retries = 4\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.paths.images_dir, PathBuf::from("out"));
        assert_eq!(cfg.paths.manifest_path(), PathBuf::from("out/manifest.json"));
        assert_eq!(cfg.generation.pacing_ms, 0);
        assert_eq!(cfg.generation.max_rate_limit_retries, Some(4));
        assert_eq!(cfg.generation.quality, "standard");
    }

    #[test]
    fn rejects_unknown_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photos.toml");
        std::fs::write(&path, "[generation]\nextension = \"gif\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("gif"));
    }

    #[test]
    fn rejects_zero_thumbnail() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photos.toml");
        std::fs::write(&path, "[generation]\nthumb_px = 0\n").unwrap();

        assert!(load_config(&path).is_err());
    }
}
