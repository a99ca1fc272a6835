use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs::try_exists;

use crate::app::Mode;

const DEFAULT_COLOR_NORMAL: &str = "#BC0E4C";
const DEFAULT_COLOR_INSERT: &str = "#354F60";
const DEFAULT_COLOR_COMMAND: &str = "#FFC501";
const DEFAULT_COLOR_VISUAL: &str = "#2E8B57";
const DEFAULT_COLOR_REPLACE: &str = "#8B4513";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub colors: ModeColors,
    pub font: FontConfig,
    pub editor: EditorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeColors {
    pub normal: String,
    pub insert: String,
    pub command: String,
    pub visual: String,
    pub replace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    pub family: String,
    pub size: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    pub tab_size: usize,
    pub use_spaces: bool,
    pub line_numbers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            colors: ModeColors {
                normal: String::from(DEFAULT_COLOR_NORMAL),
                insert: String::from(DEFAULT_COLOR_INSERT),
                command: String::from(DEFAULT_COLOR_COMMAND),
                visual: String::from(DEFAULT_COLOR_VISUAL),
                replace: String::from(DEFAULT_COLOR_REPLACE),
            },
            font: FontConfig {
                family: String::from("Hack"),
                size: 16,
            },
            editor: EditorConfig {
                tab_size: 4,
                use_spaces: true,
                line_numbers: false,
            },
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        if let Some(config_path) = Self::config_path() {
            if try_exists(&config_path).await? {
                match tokio::fs::read_to_string(&config_path).await {
                    Ok(content) if !content.trim().is_empty() => {
                        match serde_json::from_str::<Self>(&content) {
                            Ok(mut config) => {
                                config.validate();
                                log::info!("Loaded config from {}", config_path.display());
                                return Ok(config);
                            }
                            Err(e) => {
                                log::error!("Failed to parse config: {}", e);
                                // Keep the broken file around for inspection.
                                let backup = config_path.with_extension("bak");
                                if let Err(e) = tokio::fs::copy(&config_path, &backup).await {
                                    log::warn!("Failed to back up broken config: {}", e);
                                }
                            }
                        }
                    }
                    Ok(_) => log::warn!("Config file is empty, using defaults"),
                    Err(e) => log::error!("Failed to read config: {}", e),
                }
            } else {
                log::info!("No config file, using defaults");
            }
        }

        let default_config = Self::default();
        let _ = default_config.save().await;
        Ok(default_config)
    }

    pub async fn save(&self) -> Result<()> {
        let Some(config_path) = Self::config_path() else {
            return Ok(());
        };
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow::anyhow!("Failed to create {}: {}", parent.display(), e)
            })?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&config_path, content)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", config_path.display(), e))?;
        Ok(())
    }

    /// Clamp out-of-range values back to their defaults.
    pub fn validate(&mut self) {
        if self.font.size < 6 || self.font.size > 72 {
            log::warn!("Invalid font size {}, using default", self.font.size);
            self.font.size = 16;
        }
        if self.editor.tab_size == 0 || self.editor.tab_size > 16 {
            log::warn!("Invalid tab size {}, using default", self.editor.tab_size);
            self.editor.tab_size = 4;
        }
        if self.font.family.is_empty() {
            self.font.family = String::from("Hack");
        }
        for (color, default) in [
            (&mut self.colors.normal, DEFAULT_COLOR_NORMAL),
            (&mut self.colors.insert, DEFAULT_COLOR_INSERT),
            (&mut self.colors.command, DEFAULT_COLOR_COMMAND),
            (&mut self.colors.visual, DEFAULT_COLOR_VISUAL),
            (&mut self.colors.replace, DEFAULT_COLOR_REPLACE),
        ] {
            if color.is_empty() {
                *color = String::from(default);
            }
        }
    }

    pub fn mode_color(&self, mode: Mode) -> &str {
        match mode {
            Mode::Normal => &self.colors.normal,
            Mode::Insert => &self.colors.insert,
            Mode::Command => &self.colors.command,
            Mode::Visual => &self.colors.visual,
            Mode::Replace => &self.colors.replace,
        }
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SHED_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }
        if let Ok(dir) = std::env::var("SHED_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.json"));
        }
        ProjectDirs::from("com", "shed", "shed").map(|dirs| dirs.config_dir().join("config.json"))
    }
}
