//! Canvas configuration loading and validation
//!
//! Every field has a default, so an empty document (or no document at all)
//! yields the stock scene: `/spin.glb`, a 75° camera at z = 5 and a white
//! directional light of intensity 5 at z = 10.

use bevy_color::{Color, Srgba};
use bevy_math::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::camera::{DirectionalLight, PerspectiveCamera};
use crate::error::ConfigError;
use crate::glow::{GlowOverlay, GlowShape};
use crate::material::MaterialOverridePass;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default)]
    pub asset: AssetConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub surface: SurfaceSettings,
    #[serde(default)]
    pub wireframe: WireframeConfig,
    #[serde(default)]
    pub glow: GlowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Path or URL of the binary glTF model
    #[serde(default = "default_asset_path")]
    pub path: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            path: default_asset_path(),
        }
    }
}

fn default_asset_path() -> String {
    "/spin.glb".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
            position: default_camera_position(),
        }
    }
}

fn default_fov() -> f32 {
    75.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 5.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_white", with = "hex_color")]
    pub color: Srgba,
    #[serde(default = "default_light_intensity")]
    pub intensity: f32,
    #[serde(default = "default_light_position")]
    pub position: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: default_white(),
            intensity: default_light_intensity(),
            position: default_light_position(),
        }
    }
}

fn default_white() -> Srgba {
    Srgba::WHITE
}

fn default_light_intensity() -> f32 {
    5.0
}

fn default_light_position() -> [f32; 3] {
    [0.0, 0.0, 10.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSettings {
    #[serde(default = "default_black", with = "hex_color")]
    pub clear_color: Srgba,
    #[serde(default = "default_clear_alpha")]
    pub clear_alpha: f32,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            clear_color: default_black(),
            clear_alpha: default_clear_alpha(),
        }
    }
}

fn default_black() -> Srgba {
    Srgba::BLACK
}

fn default_clear_alpha() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireframeConfig {
    #[serde(default = "default_white", with = "hex_color")]
    pub color: Srgba,
}

impl Default for WireframeConfig {
    fn default() -> Self {
        Self { color: default_white() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlowConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub shape: GlowShape,
    #[serde(default = "default_glow_radius")]
    pub radius: f32,
    #[serde(default = "default_glow_color", with = "hex_color")]
    pub color: Srgba,
    #[serde(default)]
    pub position: [f32; 3],
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            shape: GlowShape::default(),
            radius: default_glow_radius(),
            color: default_glow_color(),
            position: [0.0; 3],
        }
    }
}

fn default_glow_radius() -> f32 {
    1.5
}

fn default_glow_color() -> Srgba {
    Srgba::rgb_u8(0x66, 0xcc, 0xff)
}

/// `"#rrggbb"` / `"#rrggbbaa"` strings mapped onto `Srgba`
mod hex_color {
    use bevy_color::Srgba;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Srgba, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&color.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Srgba, D::Error> {
        let value = String::deserialize(deserializer)?;
        Srgba::hex(&value).map_err(|e| de::Error::custom(format!("invalid color '{}': {}", value, e)))
    }
}

impl CanvasConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: CanvasConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Reject values that would produce a degenerate camera or overlay
    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(invalid("camera.fov_degrees", "must be between 0 and 180"));
        }
        if !(camera.near > 0.0) {
            return Err(invalid("camera.near", "must be positive"));
        }
        if !(camera.far > camera.near) {
            return Err(invalid("camera.far", "must be greater than camera.near"));
        }
        if !(0.0..=1.0).contains(&self.surface.clear_alpha) {
            return Err(invalid("surface.clear_alpha", "must be within [0, 1]"));
        }
        if self.glow.enabled && !(self.glow.radius > 0.0) {
            return Err(invalid("glow.radius", "must be positive"));
        }
        Ok(())
    }

    /// Camera placed at the configured position, sized for `aspect`
    pub fn camera(&self, aspect: f32) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(self.camera.fov_degrees, aspect, self.camera.near, self.camera.far);
        camera.position = Vec3::from_array(self.camera.position);
        camera
    }

    pub fn light(&self) -> DirectionalLight {
        DirectionalLight {
            color: Color::from(self.light.color),
            intensity: self.light.intensity,
            position: Vec3::from_array(self.light.position),
        }
    }

    pub fn clear_color(&self) -> [f32; 4] {
        let Srgba { red, green, blue, .. } = self.surface.clear_color;
        [red, green, blue, self.surface.clear_alpha]
    }

    pub fn wireframe_pass(&self) -> MaterialOverridePass {
        MaterialOverridePass::new(Color::from(self.wireframe.color))
    }

    /// The overlay, when enabled
    pub fn glow_overlay(&self) -> Option<GlowOverlay> {
        self.glow.enabled.then(|| {
            GlowOverlay::new(
                self.glow.shape,
                self.glow.radius,
                Color::from(self.glow.color),
                Vec3::from_array(self.glow.position),
            )
        })
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CanvasConfig::from_toml("").unwrap();
        assert_eq!(config, CanvasConfig::default());
        assert_eq!(config.asset.path, "/spin.glb");
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.light.intensity, 5.0);
        assert_eq!(config.clear_color(), [0.0, 0.0, 0.0, 1.0]);
        assert!(config.glow_overlay().is_none());
    }

    #[test]
    fn test_partial_document() {
        let config = CanvasConfig::from_toml(
            r##"
            [asset]
            path = "/models/robot.glb"

            [wireframe]
            color = "#ff0000"

            [glow]
            enabled = true
            shape = "sphere"
            "##,
        )
        .unwrap();

        assert_eq!(config.asset.path, "/models/robot.glb");
        assert_eq!(config.wireframe.color, Srgba::rgb(1.0, 0.0, 0.0));
        assert_eq!(config.glow.shape, GlowShape::Sphere);
        assert_eq!(config.glow.radius, 1.5);
        assert!(config.glow_overlay().is_some());
        // Untouched sections keep their defaults
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_bad_color_rejected() {
        let err = CanvasConfig::from_toml("[light]\ncolor = \"not-a-color\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_camera_rejected() {
        let err = CanvasConfig::from_toml("[camera]\nnear = 10.0\nfar = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "camera.far", .. }));
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spincanvas.toml");
        let mut config = CanvasConfig::default();
        config.light.intensity = 2.5;
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        assert_eq!(CanvasConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_camera_from_config() {
        let camera = CanvasConfig::default().camera(2.0);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.aspect, 2.0);
        assert_eq!(camera.far, 1000.0);
    }
}
