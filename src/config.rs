use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ingest::RetentionWindow;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub dir: PathBuf,
    #[serde(default = "default_hymns")]
    pub hymns: String,
    #[serde(default = "default_lyrics")]
    pub lyrics: String,
    #[serde(default = "default_conventions")]
    pub conventions: String,
    #[serde(default = "default_sung")]
    pub sung: String,
    #[serde(default = "default_tunes")]
    pub tunes: String,
}

fn default_hymns() -> String {
    "hymns.json".to_string()
}
fn default_lyrics() -> String {
    "lyrics.json".to_string()
}
fn default_conventions() -> String {
    "conventions.json".to_string()
}
fn default_sung() -> String {
    "sung.json".to_string()
}
fn default_tunes() -> String {
    "tunes.json".to_string()
}

impl SourceConfig {
    fn file_names(&self) -> [&str; 5] {
        [
            self.hymns.as_str(),
            self.lyrics.as_str(),
            self.conventions.as_str(),
            self.sung.as_str(),
            self.tunes.as_str(),
        ]
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VocabularyConfig {
    /// Years of sung history that count towards the vocabulary. 0 keeps all.
    #[serde(default = "default_retention_years")]
    pub retention_years: u32,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            retention_years: default_retention_years(),
        }
    }
}

fn default_retention_years() -> u32 {
    3
}

impl VocabularyConfig {
    pub fn window(&self) -> RetentionWindow {
        RetentionWindow::years(self.retention_years)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

impl Config {
    /// All-defaults configuration reading from `dir`.
    pub fn minimal(dir: &Path) -> Self {
        Self {
            source: SourceConfig {
                dir: dir.to_path_buf(),
                hymns: default_hymns(),
                lyrics: default_lyrics(),
                conventions: default_conventions(),
                sung: default_sung(),
                tunes: default_tunes(),
            },
            vocabulary: VocabularyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate source
    if config.source.dir.as_os_str().is_empty() {
        anyhow::bail!("source.dir must not be empty");
    }

    let names = config.source.file_names();
    if names.iter().any(|n| n.trim().is_empty()) {
        anyhow::bail!("source file names must not be empty");
    }
    for (i, name) in names.iter().enumerate() {
        if names[i + 1..].contains(name) {
            anyhow::bail!("source file '{}' is configured for more than one sheet", name);
        }
    }

    // Validate vocabulary
    if config.vocabulary.retention_years > 50 {
        anyhow::bail!("vocabulary.retention_years must be <= 50");
    }

    Ok(())
}
