//! Viewport binding: keeps the camera and surface sized to the host window

use tracing::debug;

use crate::clock::TimeSource;
use crate::context::CanvasContext;
use crate::surface::RenderSurface;

/// Host window size in CSS pixels plus the device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            pixel_ratio: 1.0,
        }
    }
}

/// The window the canvas fills
///
/// The platform owns the actual listener; `subscribe_resize` installs it and
/// `unsubscribe_resize` must remove it, not merely silence it.
pub trait HostWindow {
    fn viewport(&self) -> Viewport;

    fn subscribe_resize(&mut self);

    fn unsubscribe_resize(&mut self);
}

#[derive(Debug)]
pub struct ViewportBinding<W> {
    window: W,
    subscribed: bool,
}

impl<W: HostWindow> ViewportBinding<W> {
    pub fn new(window: W) -> Self {
        Self {
            window,
            subscribed: false,
        }
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn viewport(&self) -> Viewport {
        self.window.viewport()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Install the resize subscription; binding twice keeps one listener
    pub fn bind(&mut self) {
        if !self.subscribed {
            self.window.subscribe_resize();
            self.subscribed = true;
        }
    }

    pub fn unbind(&mut self) {
        if self.subscribed {
            self.window.unsubscribe_resize();
            self.subscribed = false;
        }
    }

    /// Apply the window's current size to the camera and surface
    ///
    /// Returns `None` when the binding is not subscribed.
    pub fn handle_resize<S, T>(&self, ctx: &mut CanvasContext<S, T>) -> Option<Viewport>
    where
        S: RenderSurface,
        T: TimeSource,
    {
        if !self.subscribed {
            return None;
        }
        let viewport = self.window.viewport();
        ctx.camera.set_viewport(viewport.width, viewport.height);
        ctx.camera.update_projection();
        ctx.surface.resize(viewport.width, viewport.height);
        debug!(
            width = viewport.width,
            height = viewport.height,
            aspect = ctx.camera.aspect,
            "Viewport resized"
        );
        Some(viewport)
    }
}
