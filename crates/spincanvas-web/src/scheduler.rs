//! `requestAnimationFrame` driven frame scheduler

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spincanvas_scene::FrameScheduler;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::events::{dispatch, CanvasLink};

struct FrameLoop {
    window: web_sys::Window,
    running: Cell<bool>,
    /// Id of the pending animation frame request
    handle: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameLoop {
    fn request(&self) {
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            return;
        };
        match self.window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(id) => self.handle.set(Some(id)),
            Err(e) => tracing::error!("requestAnimationFrame failed: {:?}", e),
        }
    }

    fn cancel(&self) {
        if let Some(id) = self.handle.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
    }
}

/// Re-requests a frame after every tick until stopped
pub struct AnimationFrameLoop {
    inner: Rc<FrameLoop>,
}

impl AnimationFrameLoop {
    pub fn new(window: web_sys::Window, link: CanvasLink) -> Self {
        let inner = Rc::new(FrameLoop {
            window,
            running: Cell::new(false),
            handle: Cell::new(None),
            callback: RefCell::new(None),
        });

        let weak: Weak<FrameLoop> = Rc::downgrade(&inner);
        let callback = Closure::wrap(Box::new(move |_timestamp: f64| {
            let Some(frame_loop) = weak.upgrade() else {
                return;
            };
            frame_loop.handle.set(None);
            if !frame_loop.running.get() {
                return;
            }
            dispatch(&link, "frame", |canvas| canvas.on_frame());
            // Stopping during the tick prevents the next request
            if frame_loop.running.get() {
                frame_loop.request();
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.callback.borrow_mut() = Some(callback);

        Self { inner }
    }
}

impl FrameScheduler for AnimationFrameLoop {
    fn start(&mut self) {
        if self.inner.running.replace(true) {
            return;
        }
        self.inner.request();
    }

    fn stop(&mut self) {
        self.inner.running.set(false);
        self.inner.cancel();
    }
}

impl Drop for AnimationFrameLoop {
    fn drop(&mut self) {
        self.inner.running.set(false);
        self.inner.cancel();
        self.inner.callback.borrow_mut().take();
    }
}
