//! Mount/unmount lifecycle of a scene canvas
//!
//! ```text
//! Unmounted -> Mounting -> Mounted -> Unmounting -> Unmounted
//! ```
//!
//! Mount configures and attaches the surface, places camera and light,
//! starts the asset load, subscribes to resizes and finally starts the render
//! loop. Unmount reverses that: stop the loop, unsubscribe, cancel the
//! pending load, detach, release geometry and dispose the surface. A canvas
//! is mounted at most once.

use tracing::{debug, info, warn};

use crate::clock::TimeSource;
use crate::config::CanvasConfig;
use crate::context::CanvasContext;
use crate::diagnostics::DiagnosticsSink;
use crate::error::{AssetLoadFailure, LifecycleError, LoadError};
use crate::loader::{AssetLoader, CancellationToken, LoadRequest, LoadTicket, LoadedAsset};
use crate::material::MaterialOverridePass;
use crate::render_loop::{FrameScheduler, RenderLoop, TickOutcome};
use crate::scene::FragmentId;
use crate::surface::{RenderSurface, SurfaceConfig};
use crate::viewport::{HostWindow, Viewport, ViewportBinding};

/// The set of collaborators a platform provides
pub trait Platform {
    type Surface: RenderSurface;
    type Window: HostWindow;
    type Scheduler: FrameScheduler;
    type Loader: AssetLoader;
    type Time: TimeSource;
}

/// Concrete collaborators handed to [`SceneCanvas::new`]
pub struct PlatformParts<P: Platform> {
    pub surface: P::Surface,
    pub window: P::Window,
    pub scheduler: P::Scheduler,
    pub loader: P::Loader,
    pub time: P::Time,
    pub diagnostics: Box<dyn DiagnosticsSink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Unmounted,
    Mounting,
    Mounted,
    Unmounting,
}

/// Result of delivering a load completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The prepared fragment joined the scene
    Added { fragment: FragmentId, animated: bool },
    /// The load failed and was reported to diagnostics
    Failed,
    /// The canvas was torn down before the load finished
    Discarded,
}

pub struct SceneCanvas<P: Platform> {
    config: CanvasConfig,
    state: MountState,
    disposed: bool,
    render_loop: RenderLoop<P::Scheduler>,
    viewport: ViewportBinding<P::Window>,
    loader: P::Loader,
    diagnostics: Box<dyn DiagnosticsSink>,
    /// Surface and time source waiting for mount
    parked: Option<(P::Surface, P::Time)>,
    context: Option<CanvasContext<P::Surface, P::Time>>,
    cancel: Option<CancellationToken>,
    next_ticket: u64,
    materials: MaterialOverridePass,
}

impl<P: Platform> SceneCanvas<P> {
    pub fn new(config: CanvasConfig, parts: PlatformParts<P>) -> Self {
        let materials = config.wireframe_pass();
        Self {
            config,
            state: MountState::Unmounted,
            disposed: false,
            render_loop: RenderLoop::new(parts.scheduler),
            viewport: ViewportBinding::new(parts.window),
            loader: parts.loader,
            diagnostics: parts.diagnostics,
            parked: Some((parts.surface, parts.time)),
            context: None,
            cancel: None,
            next_ticket: 0,
            materials,
        }
    }

    pub fn state(&self) -> MountState {
        self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.state == MountState::Mounted
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Live state while mounted
    pub fn context(&self) -> Option<&CanvasContext<P::Surface, P::Time>> {
        self.context.as_ref()
    }

    pub fn render_loop(&self) -> &RenderLoop<P::Scheduler> {
        &self.render_loop
    }

    pub fn viewport(&self) -> &ViewportBinding<P::Window> {
        &self.viewport
    }

    pub fn mount(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            MountState::Unmounted if !self.disposed => {}
            MountState::Unmounted => {
                warn!("Mount requested on a disposed canvas");
                return Err(LifecycleError::Disposed);
            }
            state => {
                warn!(?state, "Mount requested on a mounted canvas");
                return Err(LifecycleError::AlreadyMounted);
            }
        }
        let Some((mut surface, time)) = self.parked.take() else {
            return Err(LifecycleError::Disposed);
        };
        self.state = MountState::Mounting;

        let viewport = self.viewport.viewport();
        surface.configure(&SurfaceConfig {
            width: viewport.width,
            height: viewport.height,
            pixel_ratio: viewport.pixel_ratio,
            clear_color: self.config.clear_color(),
        });
        if let Err(err) = surface.attach() {
            warn!(error = %err, "Failed to attach render surface");
            self.parked = Some((surface, time));
            self.state = MountState::Unmounted;
            return Err(err.into());
        }

        let aspect = if viewport.height > 0 {
            viewport.width as f32 / viewport.height as f32
        } else {
            1.0
        };
        let mut ctx = CanvasContext::new(surface, time, self.config.camera(aspect), self.config.clear_color());
        ctx.scene.set_light(self.config.light());
        ctx.glow = self.config.glow_overlay();
        self.context = Some(ctx);

        let token = CancellationToken::new();
        self.next_ticket += 1;
        let path = self.config.asset.path.clone();
        let ticket = LoadTicket {
            id: self.next_ticket,
            path: path.clone(),
            token: token.clone(),
        };
        self.cancel = Some(token);
        self.loader.start(LoadRequest { path: path.clone(), ticket });

        self.viewport.bind();
        self.render_loop.start();
        self.state = MountState::Mounted;
        info!(
            path = %path,
            width = viewport.width,
            height = viewport.height,
            pixel_ratio = viewport.pixel_ratio,
            "Scene canvas mounted"
        );
        Ok(())
    }

    /// Tear everything down; a no-op unless mounted
    pub fn unmount(&mut self) {
        if self.state != MountState::Mounted {
            warn!(state = ?self.state, "Unmount requested on a canvas that is not mounted");
            return;
        }
        self.state = MountState::Unmounting;

        self.render_loop.stop();
        self.viewport.unbind();
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if let Some(mut ctx) = self.context.take() {
            ctx.surface.detach();
            ctx.release();
        }

        self.disposed = true;
        self.state = MountState::Unmounted;
        info!(frames = self.render_loop.frames(), "Scene canvas unmounted");
    }

    /// Deliver the result of the load started at mount
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<LoadedAsset, LoadError>) -> LoadOutcome {
        if ticket.token.is_cancelled() || self.state != MountState::Mounted {
            debug!(path = %ticket.path, ticket = ticket.id, "Discarding load completion after teardown");
            return LoadOutcome::Discarded;
        }
        let Some(ctx) = self.context.as_mut() else {
            debug!(path = %ticket.path, ticket = ticket.id, "Discarding load completion without context");
            return LoadOutcome::Discarded;
        };

        match result {
            Ok(asset) => {
                let prepared = asset.prepare(&self.materials);
                let overridden = prepared.overridden();
                let offset = prepared.offset().unwrap_or_default();
                let (fragment, clips) = prepared.into_parts();
                let clip_count = clips.len();

                let id = ctx.scene.insert(ticket.path.as_str(), fragment);
                let animated = ctx.animations.register(id, clips);
                info!(
                    path = %ticket.path,
                    overridden,
                    clips = clip_count,
                    offset = ?offset,
                    "Model loaded"
                );
                LoadOutcome::Added { fragment: id, animated }
            }
            Err(error) => {
                let failure = AssetLoadFailure {
                    path: ticket.path,
                    error,
                };
                self.diagnostics.report_load_failure(&failure);
                LoadOutcome::Failed
            }
        }
    }

    /// Handle a host-window resize notification
    pub fn on_resize(&mut self) -> Option<Viewport> {
        if self.state != MountState::Mounted {
            debug!("Ignoring resize on an unmounted canvas");
            return None;
        }
        let ctx = self.context.as_mut()?;
        self.viewport.handle_resize(ctx)
    }

    /// Run one render-loop tick
    pub fn tick(&mut self) -> TickOutcome {
        match self.context.as_mut() {
            Some(ctx) => self.render_loop.tick(ctx),
            None => TickOutcome::Idle,
        }
    }
}

impl<P: Platform> Drop for SceneCanvas<P> {
    fn drop(&mut self) {
        if self.state == MountState::Mounted {
            self.unmount();
        }
    }
}
