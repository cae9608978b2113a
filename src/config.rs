use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "SKELETON_OVERLAY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "skeleton_overlay.json";
pub const MAX_LINE_THICKNESS: u32 = 32;
pub const MAX_LANDMARK_RADIUS: u32 = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Rgb = [u8; 3];

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PoseConfig {
    pub enabled: bool,
    pub detection_confidence: f32,
    pub tracking_confidence: f32,
    /// 0 = lite, 1 = full, 2 = heavy.
    pub model_complexity: u8,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detection_confidence: 0.5,
            tracking_confidence: 0.5,
            model_complexity: 1,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HandsConfig {
    pub enabled: bool,
    pub detection_confidence: f32,
    pub tracking_confidence: f32,
    pub max_hands: usize,
}

impl Default for HandsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detection_confidence: 0.5,
            tracking_confidence: 0.5,
            max_hands: 2,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub skeleton_color: Rgb,
    pub hand_color: Rgb,
    pub landmark_color: Rgb,
    pub text_color: Rgb,
    pub line_thickness: u32,
    pub landmark_radius: u32,
    pub show_landmarks: bool,
    pub show_connections: bool,
    pub draw_detection_box: bool,
    pub full_body_skeleton: bool,
    pub visibility_threshold: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            skeleton_color: [0, 255, 0],
            hand_color: [0, 0, 255],
            landmark_color: [255, 0, 0],
            text_color: [255, 255, 255],
            line_thickness: 2,
            landmark_radius: 5,
            show_landmarks: true,
            show_connections: true,
            draw_detection_box: false,
            full_body_skeleton: false,
            visibility_threshold: 0.5,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    pub window_title: String,
    pub show_fps: bool,
    pub show_instructions: bool,
    pub text_size: f32,
    pub font_path: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_title: "Skeleton Overlay".to_string(),
            show_fps: true,
            show_instructions: true,
            text_size: 18.0,
            font_path: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub models_dir: PathBuf,
    pub screenshot_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            screenshot_dir: PathBuf::from("screenshots"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub pose: PoseConfig,
    pub hands: HandsConfig,
    pub mirror: bool,
    pub smooth_landmarks: bool,
    pub debug_mode: bool,
    pub log_level: String,
    pub render: RenderConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            pose: PoseConfig::default(),
            hands: HandsConfig::default(),
            mirror: true,
            smooth_landmarks: true,
            debug_mode: false,
            log_level: "info".to_string(),
            render: RenderConfig::default(),
            ui: UiConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolves the config location from the environment, falling back to
    /// defaults when no file exists there.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok((config, None));
        }

        let config = Self::from_file(&path)?;
        Ok((config, Some(path)))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("pose.detection_confidence", self.pose.detection_confidence)?;
        check_unit("pose.tracking_confidence", self.pose.tracking_confidence)?;
        check_unit("hands.detection_confidence", self.hands.detection_confidence)?;
        check_unit("hands.tracking_confidence", self.hands.tracking_confidence)?;
        check_unit(
            "render.visibility_threshold",
            self.render.visibility_threshold,
        )?;

        if self.pose.model_complexity > 2 {
            return Err(ConfigError::Invalid {
                field: "pose.model_complexity",
                reason: format!("expected 0, 1 or 2, got {}", self.pose.model_complexity),
            });
        }
        if !(1..=crate::types::MAX_HANDS).contains(&self.hands.max_hands) {
            return Err(ConfigError::Invalid {
                field: "hands.max_hands",
                reason: format!(
                    "expected 1..={}, got {}",
                    crate::types::MAX_HANDS,
                    self.hands.max_hands
                ),
            });
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid {
                field: "camera",
                reason: format!(
                    "resolution must be non-zero, got {}x{}",
                    self.camera.width, self.camera.height
                ),
            });
        }
        if self.camera.fps == 0 {
            return Err(ConfigError::Invalid {
                field: "camera.fps",
                reason: "must be non-zero".to_string(),
            });
        }
        if !(1..=MAX_LINE_THICKNESS).contains(&self.render.line_thickness) {
            return Err(ConfigError::Invalid {
                field: "render.line_thickness",
                reason: format!(
                    "expected 1..={MAX_LINE_THICKNESS}, got {}",
                    self.render.line_thickness
                ),
            });
        }
        if self.render.landmark_radius > MAX_LANDMARK_RADIUS {
            return Err(ConfigError::Invalid {
                field: "render.landmark_radius",
                reason: format!(
                    "expected at most {MAX_LANDMARK_RADIUS}, got {}",
                    self.render.landmark_radius
                ),
            });
        }
        if !(self.ui.text_size.is_finite() && self.ui.text_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "ui.text_size",
                reason: format!("must be positive, got {}", self.ui.text_size),
            });
        }
        Ok(())
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a value in [0, 1], got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.hands.max_hands, 2);
        assert!(config.mirror);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "camera": { "index": 2 }, "mirror": false, "render": { "hand_color": [1, 2, 3] } }"#,
        )
        .unwrap();
        assert_eq!(config.camera.index, 2);
        assert_eq!(config.camera.height, 720);
        assert!(!config.mirror);
        assert_eq!(config.render.hand_color, [1, 2, 3]);
        assert_eq!(config.render.skeleton_color, [0, 255, 0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = AppConfig::default();
        config.pose.detection_confidence = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "pose.detection_confidence",
                ..
            })
        ));

        let mut config = AppConfig::default();
        config.hands.max_hands = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "hands.max_hands",
                ..
            })
        ));

        let mut config = AppConfig::default();
        config.pose.model_complexity = 3;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.render.landmark_radius = 100_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "render.landmark_radius",
                ..
            })
        ));

        let mut config = AppConfig::default();
        config.render.line_thickness = 100_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "render.line_thickness",
                ..
            })
        ));

        let mut config = AppConfig::default();
        config.render.landmark_radius = MAX_LANDMARK_RADIUS;
        config.render.line_thickness = MAX_LINE_THICKNESS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = serde_json::from_str::<AppConfig>(r#"{ "camera_idx": 1 }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = std::env::temp_dir().join(format!(
            "skeleton-overlay-config-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, r#"{ "hands": { "max_hands": 1 } }"#).unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.hands.max_hands, 1);

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));

        let _ = fs::remove_dir_all(&dir);
    }
}
