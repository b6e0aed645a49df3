//! Pulsing glow overlay
//!
//! The overlay owns a small decoration fragment (a ring or a sphere) drawn
//! with a glow material. Its [`GlowState`] is a pure function of the canvas
//! clock's elapsed time, so restarting the clock restarts the pulse.

use bevy_color::Color;
use bevy_math::Vec3;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::bounds::CenteringPass;
use crate::fragment::{SceneGraphFragment, Transform};
use crate::geometry::{self, SphereOptions};
use crate::material::{GlowMaterial, Material};
use crate::surface::GeometryKey;

/// Intensity and sharpness of the glow for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowState {
    /// In `[0, 1]`, period π
    pub intensity: f32,
    /// In `[0.3, 0.7]`, period 2π/3
    pub sharpness: f32,
}

impl GlowState {
    pub fn at(elapsed: f64) -> Self {
        Self {
            intensity: (0.5 + 0.5 * (2.0 * elapsed).sin()) as f32,
            sharpness: (0.5 + 0.2 * (3.0 * elapsed).sin()) as f32,
        }
    }

    /// Modulate a straight RGBA color for drawing
    ///
    /// Brightness scales with intensity. Alpha falls off as
    /// `intensity^(1 - sharpness)`, so sharper pulses fade in and out harder.
    pub fn tint(&self, [r, g, b, a]: [f32; 4]) -> [f32; 4] {
        let i = self.intensity;
        [r * i, g * i, b * i, a * i.powf(1.0 - self.sharpness)]
    }
}

impl Default for GlowState {
    fn default() -> Self {
        Self::at(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlowShape {
    #[default]
    Ring,
    Sphere,
}

const RING_SEGMENTS: u32 = 64;

#[derive(Debug)]
pub struct GlowOverlay {
    fragment: SceneGraphFragment,
    material: Rc<GlowMaterial>,
    state: GlowState,
}

impl GlowOverlay {
    pub fn new(shape: GlowShape, radius: f32, color: Color, position: Vec3) -> Self {
        let material = Rc::new(GlowMaterial { color });
        let mesh = match shape {
            GlowShape::Ring => geometry::ring(radius, RING_SEGMENTS),
            GlowShape::Sphere => geometry::uv_sphere(SphereOptions {
                radius,
                ..SphereOptions::default()
            }),
        };

        let mut fragment = SceneGraphFragment::new("glow");
        let pivot = fragment.add_node(fragment.root(), "decoration", Transform::IDENTITY);
        fragment.add_drawable(pivot, mesh, Material::Glow(material.clone()));
        CenteringPass.apply(&mut fragment);
        let root = fragment.root();
        fragment.node_mut(root).transform.translation += position;
        fragment.node_mut(root).rest.translation += position;

        Self {
            fragment,
            material,
            state: GlowState::default(),
        }
    }

    pub fn fragment(&self) -> &SceneGraphFragment {
        &self.fragment
    }

    pub fn material(&self) -> &Rc<GlowMaterial> {
        &self.material
    }

    pub fn state(&self) -> GlowState {
        self.state
    }

    /// Recompute the glow for the given elapsed time
    pub fn update(&mut self, elapsed: f64) -> GlowState {
        self.state = GlowState::at(elapsed);
        self.state
    }

    pub fn geometry_keys(&self) -> Vec<GeometryKey> {
        GeometryKey::for_decoration(&self.fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::fragment_bounds;
    use std::f64::consts::PI;

    #[test]
    fn test_glow_bounds() {
        for i in 0..2000 {
            let state = GlowState::at(i as f64 * 0.01);
            assert!((0.0..=1.0).contains(&state.intensity));
            assert!(state.sharpness >= 0.3 - 1e-6 && state.sharpness <= 0.7 + 1e-6);
        }
    }

    #[test]
    fn test_glow_periods() {
        for i in 0..100 {
            let t = i as f64 * 0.137;
            let now = GlowState::at(t);
            assert!((GlowState::at(t + PI).intensity - now.intensity).abs() < 1e-5);
            assert!((GlowState::at(t + 2.0 * PI / 3.0).sharpness - now.sharpness).abs() < 1e-5);
        }
    }

    #[test]
    fn test_tint_follows_intensity() {
        let off = GlowState {
            intensity: 0.0,
            sharpness: 0.5,
        };
        assert_eq!(off.tint([1.0, 0.5, 0.25, 1.0]), [0.0, 0.0, 0.0, 0.0]);

        let full = GlowState {
            intensity: 1.0,
            sharpness: 0.3,
        };
        assert_eq!(full.tint([1.0, 0.5, 0.25, 1.0]), [1.0, 0.5, 0.25, 1.0]);
    }

    #[test]
    fn test_glow_is_deterministic() {
        let mut a = GlowOverlay::new(GlowShape::Ring, 1.0, Color::WHITE, Vec3::ZERO);
        let mut b = GlowOverlay::new(GlowShape::Sphere, 2.0, Color::WHITE, Vec3::ZERO);
        assert_eq!(a.update(1.25), b.update(1.25));
        assert_eq!(a.state(), GlowState::at(1.25));
        assert_eq!(GlowState::at(0.0).intensity, 0.5);
    }

    #[test]
    fn test_decoration_placed_at_position() {
        let position = Vec3::new(1.0, -2.0, 0.5);
        let overlay = GlowOverlay::new(GlowShape::Sphere, 1.5, Color::WHITE, position);
        let bounds = fragment_bounds(overlay.fragment()).unwrap();
        assert!((bounds.center() - position).length() < 1e-4);
        assert_eq!(overlay.geometry_keys().len(), 1);
    }
}
