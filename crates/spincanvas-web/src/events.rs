//! Routing of browser callbacks back into the canvas

use std::cell::RefCell;
use std::rc::Weak;

use spincanvas_scene::{LoadError, LoadTicket, LoadedAsset, SceneCanvas};
use tracing::{debug, warn};

use crate::WebPlatform;

/// Events delivered by the browser collaborators
pub trait CanvasEvents {
    fn on_frame(&mut self);

    fn on_resize(&mut self);

    fn on_load(&mut self, ticket: LoadTicket, result: Result<LoadedAsset, LoadError>);
}

/// Non-owning reference held by every browser callback
pub type CanvasLink = Weak<RefCell<dyn CanvasEvents>>;

impl CanvasEvents for SceneCanvas<WebPlatform> {
    fn on_frame(&mut self) {
        self.tick();
    }

    fn on_resize(&mut self) {
        SceneCanvas::on_resize(self);
    }

    fn on_load(&mut self, ticket: LoadTicket, result: Result<LoadedAsset, LoadError>) {
        self.complete_load(ticket, result);
    }
}

/// Run `f` against the canvas if it is still alive and not already borrowed
pub(crate) fn dispatch(link: &CanvasLink, event: &'static str, f: impl FnOnce(&mut (dyn CanvasEvents + 'static))) {
    let Some(canvas) = link.upgrade() else {
        debug!(event, "Canvas dropped, ignoring callback");
        return;
    };
    match canvas.try_borrow_mut() {
        Ok(mut canvas) => f(&mut *canvas),
        Err(_) => warn!(event, "Canvas busy, dropping callback"),
    };
}
