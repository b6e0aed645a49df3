//! Spincanvas Web - WebGL2 browser frontend
//!
//! Binds the platform-independent scene canvas to the browser: a WebGL2
//! line renderer, `requestAnimationFrame` ticks, window resize events,
//! `fetch` for the model and `performance.now()` for time. The canvas is
//! exported to JavaScript as [`SceneCanvasHandle`].

mod events;
mod fetch;
mod scheduler;
mod surface;
mod time;
mod window;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use spincanvas_scene::config::CanvasConfig;
use spincanvas_scene::{Platform, PlatformParts, SceneCanvas, TracingDiagnostics};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

pub use events::{CanvasEvents, CanvasLink};
pub use fetch::FetchLoader;
pub use scheduler::AnimationFrameLoop;
pub use surface::WebGlSurface;
pub use time::PerformanceTime;
pub use window::BrowserWindow;

/// Browser collaborators for [`SceneCanvas`]
#[derive(Debug)]
pub struct WebPlatform;

impl Platform for WebPlatform {
    type Surface = WebGlSurface;
    type Window = BrowserWindow;
    type Scheduler = AnimationFrameLoop;
    type Loader = FetchLoader;
    type Time = PerformanceTime;
}

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::WARN)
            .build(),
    );
}

/// A scene canvas filling `container`, driven from JavaScript
///
/// ```js
/// const canvas = new SceneCanvasHandle(document.getElementById("root"));
/// canvas.mount();
/// // later
/// canvas.unmount();
/// ```
#[wasm_bindgen]
pub struct SceneCanvasHandle {
    canvas: Rc<RefCell<SceneCanvas<WebPlatform>>>,
}

#[wasm_bindgen]
impl SceneCanvasHandle {
    /// Create a canvas for `container`, optionally configured by a TOML string
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, config: Option<String>) -> Result<SceneCanvasHandle, JsValue> {
        let config = match config {
            Some(toml) => CanvasConfig::from_toml(&toml).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => CanvasConfig::default(),
        };
        let browser = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let surface = WebGlSurface::new(&browser, container).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let canvas = Rc::new_cyclic(|weak: &Weak<RefCell<SceneCanvas<WebPlatform>>>| {
            let link: CanvasLink = weak.clone();
            let parts = PlatformParts {
                surface,
                window: BrowserWindow::new(browser.clone(), link.clone()),
                scheduler: AnimationFrameLoop::new(browser.clone(), link.clone()),
                loader: FetchLoader::new(link),
                time: PerformanceTime::new(&browser),
                diagnostics: Box::new(TracingDiagnostics),
            };
            RefCell::new(SceneCanvas::new(config, parts))
        });

        Ok(SceneCanvasHandle { canvas })
    }

    pub fn mount(&self) -> Result<(), JsValue> {
        let mut canvas = self
            .canvas
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("Canvas is busy"))?;
        canvas.mount().map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn unmount(&self) {
        match self.canvas.try_borrow_mut() {
            Ok(mut canvas) => canvas.unmount(),
            Err(_) => tracing::warn!("Unmount requested while the canvas is busy"),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn mounted(&self) -> bool {
        self.canvas.try_borrow().map(|c| c.is_mounted()).unwrap_or(false)
    }
}
