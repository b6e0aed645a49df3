//! State owned by a mounted canvas

use crate::animation::AnimationDriver;
use crate::camera::PerspectiveCamera;
use crate::clock::{Clock, TimeSource};
use crate::glow::GlowOverlay;
use crate::scene::Scene;
use crate::surface::{GeometryKey, RenderSurface};

/// Everything the render loop and viewport binding operate on
///
/// Created at mount and dropped at unmount, so nothing can reach the scene
/// or the surface once the canvas has been torn down.
#[derive(Debug)]
pub struct CanvasContext<S, T> {
    pub surface: S,
    pub camera: PerspectiveCamera,
    pub scene: Scene,
    pub animations: AnimationDriver,
    pub glow: Option<GlowOverlay>,
    pub clock: Clock<T>,
    pub clear_color: [f32; 4],
}

impl<S: RenderSurface, T: TimeSource> CanvasContext<S, T> {
    pub fn new(surface: S, time: T, camera: PerspectiveCamera, clear_color: [f32; 4]) -> Self {
        Self {
            surface,
            camera,
            scene: Scene::new(),
            animations: AnimationDriver::new(),
            glow: None,
            clock: Clock::new(time),
            clear_color,
        }
    }

    /// Keys of every geometry the surface may hold for this canvas
    pub fn geometry_keys(&self) -> Vec<GeometryKey> {
        let mut keys = self.scene.geometry_keys();
        if let Some(glow) = &self.glow {
            keys.extend(glow.geometry_keys());
        }
        keys
    }

    /// Release loaded geometry, clear the scene and dispose the surface
    pub fn release(&mut self) {
        for key in self.geometry_keys() {
            self.surface.release_geometry(key);
        }
        self.animations.clear();
        self.scene.clear();
        self.glow = None;
        self.clock.stop();
        self.surface.dispose();
    }
}
