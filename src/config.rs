use crate::engine::{
    DensityPolicy, EngineSettings, FrameSettings, OrientationSettings, PointerSettings,
};
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    #[default]
    #[strum(serialize = "background", serialize = "bg", serialize = "wallpaper")]
    Background,
    #[strum(serialize = "bottom")]
    Bottom,
    #[strum(serialize = "top")]
    Top,
    #[strum(serialize = "overlay")]
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Appearance {
    pub layer: LayerKind,
    pub click_through: bool,
    pub glow: bool,
    pub glow_radius: f64,
    pub hyprland_cursor: bool,
    pub poll_interval_ms: u64,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            layer: LayerKind::Background,
            click_through: false,
            glow: true,
            glow_radius: 48.0,
            hyprland_cursor: false,
            poll_interval_ms: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub grid: DensityPolicy,
    #[serde(default)]
    pub pointer: PointerSettings,
    #[serde(default)]
    pub orientation: OrientationSettings,
    #[serde(default)]
    pub frame: FrameSettings,
    #[serde(default)]
    pub appearance: Appearance,
}

impl Config {
    /// Replaces values the engine cannot work with, logging each one.
    pub fn validated(mut self) -> Self {
        let defaults = Config::default();

        self.grid = self.grid.validated();

        let smooth = self.pointer.smooth_factor;
        if !(smooth > 0.0) {
            log::warn!(
                "pointer.smooth_factor {} is not above 0, using {}",
                smooth,
                defaults.pointer.smooth_factor
            );
            self.pointer.smooth_factor = defaults.pointer.smooth_factor;
        } else if smooth > 1.0 {
            log::warn!("pointer.smooth_factor {} is above 1, using 1", smooth);
            self.pointer.smooth_factor = 1.0;
        }

        if !(self.frame.fps > 0.0 && self.frame.fps.is_finite()) {
            log::warn!("frame.fps {} is not usable, using {}", self.frame.fps, defaults.frame.fps);
            self.frame.fps = defaults.frame.fps;
        }

        let slack = self.frame.slack_ms;
        if !(slack >= 0.0 && slack < self.frame.interval_ms()) {
            log::warn!("frame.slack_ms {} is outside one frame, using 0", slack);
            self.frame.slack_ms = 0.0;
        }

        if !(self.orientation.epsilon >= 0.0) {
            log::warn!("orientation.epsilon {} is negative, using 0", self.orientation.epsilon);
            self.orientation.epsilon = 0.0;
        }

        if self.orientation.max_batch == 0 {
            log::warn!("orientation.max_batch must be at least 1");
            self.orientation.max_batch = 1;
        }

        if self.appearance.poll_interval_ms == 0 {
            self.appearance.poll_interval_ms = defaults.appearance.poll_interval_ms;
        }

        self
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            density: self.grid.clone(),
            pointer: self.pointer.clone(),
            orientation: self.orientation.clone(),
            frame: self.frame.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<std::path::PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "vane", "vane").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(
            config::Environment::with_prefix("VANE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(s.try_deserialize::<Config>()?.validated())
}

pub fn load_or_default() -> Config {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    }
}

pub fn write_default_config() -> std::io::Result<std::path::PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

use crate::events::AppEvent;
use async_channel::Sender;

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );

                if meaningful_event
                    && event.paths.iter().any(|p| p == &config_path)
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_deserialization() {
        let cases = vec![
            ("\"background\"", LayerKind::Background),
            ("\"Background\"", LayerKind::Background),
            ("\"BG\"", LayerKind::Background),
            ("\"wallpaper\"", LayerKind::Background),
            ("\"bottom\"", LayerKind::Bottom),
            ("\"TOP\"", LayerKind::Top),
            ("\"overlay\"", LayerKind::Overlay),
        ];

        for (json, expected) in cases {
            let deserialized: LayerKind = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
        assert!(serde_json::from_str::<LayerKind>("\"sideways\"").is_err());
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let parsed: Config = config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{
            "grid": { "policy": "fixed", "columns": 4 },
            "pointer": { "smooth_factor": 0.3 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.grid,
            DensityPolicy::Fixed {
                columns: 4,
                rows: 15,
                indicator_size: 16.0
            }
        );
        assert_eq!(config.pointer.smooth_factor, 0.3);
        assert_eq!(config.pointer.idle_timeout_ms, 100.0);
        assert_eq!(config.frame.fps, 60.0);
        assert_eq!(config.appearance.layer, LayerKind::Background);
    }

    #[test]
    fn test_validated_replaces_unusable_values() {
        let mut config = Config::default();
        config.pointer.smooth_factor = 0.0;
        config.frame.fps = -1.0;
        config.orientation.epsilon = -2.0;
        config.orientation.max_batch = 0;

        let config = config.validated();
        assert_eq!(config.pointer.smooth_factor, 0.15);
        assert_eq!(config.frame.fps, 60.0);
        assert_eq!(config.orientation.epsilon, 0.0);
        assert_eq!(config.orientation.max_batch, 1);

        let mut config = Config::default();
        config.pointer.smooth_factor = 4.0;
        assert_eq!(config.validated().pointer.smooth_factor, 1.0);
    }

    #[test]
    fn test_validated_bounds_grid_and_slack() {
        let json = r#"{
            "grid": { "policy": "capped", "desktop_size": 1e-9 },
            "frame": { "fps": 60.0, "slack_ms": 50.0 }
        }"#;
        let config: Config = serde_json::from_str::<Config>(json).unwrap().validated();

        match config.grid {
            DensityPolicy::Capped { desktop_size, .. } => assert_eq!(desktop_size, 1.0),
            other => panic!("unexpected policy {:?}", other),
        }
        assert_eq!(config.frame.slack_ms, 0.0);
    }
}
