//! Browser window size and resize subscription

use spincanvas_scene::{HostWindow, Viewport};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::events::{dispatch, CanvasLink};

pub struct BrowserWindow {
    window: web_sys::Window,
    link: CanvasLink,
    listener: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

impl BrowserWindow {
    pub fn new(window: web_sys::Window, link: CanvasLink) -> Self {
        Self {
            window,
            link,
            listener: None,
        }
    }
}

fn dimension(value: Result<JsValue, JsValue>) -> u32 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0).max(0.0) as u32
}

impl HostWindow for BrowserWindow {
    fn viewport(&self) -> Viewport {
        Viewport {
            width: dimension(self.window.inner_width()),
            height: dimension(self.window.inner_height()),
            pixel_ratio: self.window.device_pixel_ratio(),
        }
    }

    fn subscribe_resize(&mut self) {
        if self.listener.is_some() {
            return;
        }
        let link = self.link.clone();
        let listener = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            dispatch(&link, "resize", |canvas| canvas.on_resize());
        }) as Box<dyn FnMut(_)>);

        match self
            .window
            .add_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())
        {
            Ok(()) => self.listener = Some(listener),
            Err(e) => tracing::error!("Failed to add resize listener: {:?}", e),
        }
    }

    fn unsubscribe_resize(&mut self) {
        if let Some(listener) = self.listener.take() {
            if let Err(e) = self
                .window
                .remove_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())
            {
                tracing::error!("Failed to remove resize listener: {:?}", e);
            }
        }
    }
}

impl Drop for BrowserWindow {
    fn drop(&mut self) {
        self.unsubscribe_resize();
    }
}
