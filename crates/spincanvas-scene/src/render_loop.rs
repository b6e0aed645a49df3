//! Render loop state machine
//!
//! The loop is either [`LoopState::Idle`] (nothing scheduled) or
//! [`LoopState::Running`] (the platform scheduler invokes
//! `SceneCanvas::tick` once per display refresh). Each running tick:
//!
//! 1. takes the delta from the context clock
//! 2. advances every animation player by that delta
//! 3. recomputes the glow state from elapsed time, if the overlay is active
//! 4. draws the scene from the camera onto the surface, loaded or not

use tracing::{debug, trace};

use crate::clock::TimeSource;
use crate::context::CanvasContext;
use crate::glow::GlowState;
use crate::surface::{FrameView, RenderSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Platform hook that delivers ticks while started
///
/// After `stop` returns no new tick may be scheduled. A tick already being
/// delivered is allowed to finish.
pub trait FrameScheduler {
    fn start(&mut self);

    fn stop(&mut self);
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Sequence number of the frame, starting at 1
    pub frame: u64,
    pub delta: f64,
    pub elapsed: f64,
    pub draw_items: usize,
    pub glow: Option<GlowState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The loop was not running, nothing happened
    Idle,
    Drawn(FrameStats),
}

#[derive(Debug)]
pub struct RenderLoop<F> {
    scheduler: F,
    state: LoopState,
    frames: u64,
}

impl<F: FrameScheduler> RenderLoop<F> {
    pub fn new(scheduler: F) -> Self {
        Self {
            scheduler,
            state: LoopState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    /// Idle -> Running; returns `false` if the loop was already running
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = LoopState::Running;
        self.scheduler.start();
        debug!("Render loop started");
        true
    }

    /// Running -> Idle; returns `false` if the loop was already idle
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = LoopState::Idle;
        self.scheduler.stop();
        debug!(frames = self.frames, "Render loop stopped");
        true
    }

    pub fn tick<S, T>(&mut self, ctx: &mut CanvasContext<S, T>) -> TickOutcome
    where
        S: RenderSurface,
        T: TimeSource,
    {
        if !self.is_running() {
            return TickOutcome::Idle;
        }

        let delta = ctx.clock.delta();
        ctx.animations.advance(delta as f32, &mut ctx.scene);

        let elapsed = ctx.clock.elapsed();
        let glow = ctx.glow.as_mut().map(|overlay| overlay.update(elapsed));

        let frame = FrameView::build(ctx.clear_color, &ctx.camera, &ctx.scene, ctx.glow.as_ref());
        let draw_items = frame.items.len();
        ctx.surface.draw(&frame);

        self.frames += 1;
        trace!(frame = self.frames, delta, draw_items, "Frame drawn");
        TickOutcome::Drawn(FrameStats {
            frame: self.frames,
            delta,
            elapsed,
            draw_items,
            glow,
        })
    }
}
