//! In-memory platform for tests and the CLI
//!
//! Each collaborator is split into the part handed to the canvas and a
//! cloneable probe that shares its state, so callers can inspect and steer
//! the platform while the canvas owns it.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use crate::clock::ManualTime;
use crate::diagnostics::DiagnosticsSink;
use crate::error::{AssetLoadFailure, SurfaceError};
use crate::lifecycle::{Platform, PlatformParts};
use crate::loader::{AssetLoader, LoadRequest};
use crate::render_loop::FrameScheduler;
use crate::surface::{FrameView, GeometryKey, RenderSurface, SurfaceConfig};
use crate::viewport::{HostWindow, Viewport};

#[derive(Debug, Default)]
struct SurfaceState {
    config: Option<SurfaceConfig>,
    attached: bool,
    disposed: bool,
    fail_attach: bool,
    size: (u32, u32),
    draws: u64,
    resident: BTreeSet<GeometryKey>,
}

/// Surface that records calls and tracks which geometry is uploaded
#[derive(Debug)]
pub struct HeadlessSurface {
    state: Rc<RefCell<SurfaceState>>,
}

#[derive(Debug, Clone)]
pub struct SurfaceProbe {
    state: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new() -> (Self, SurfaceProbe) {
        let state = Rc::new(RefCell::new(SurfaceState::default()));
        (
            Self { state: state.clone() },
            SurfaceProbe { state },
        )
    }
}

impl RenderSurface for HeadlessSurface {
    fn configure(&mut self, config: &SurfaceConfig) {
        let mut state = self.state.borrow_mut();
        state.config = Some(*config);
        state.size = (config.width, config.height);
    }

    fn attach(&mut self) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        if state.fail_attach {
            return Err(SurfaceError::Attach("container unavailable".to_string()));
        }
        state.attached = true;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().size = (width, height);
    }

    fn draw(&mut self, frame: &FrameView<'_>) {
        let mut state = self.state.borrow_mut();
        state.draws += 1;
        state.resident.extend(frame.items.iter().map(|item| item.key));
    }

    fn release_geometry(&mut self, key: GeometryKey) {
        self.state.borrow_mut().resident.remove(&key);
    }

    fn detach(&mut self) {
        self.state.borrow_mut().attached = false;
    }

    fn dispose(&mut self) {
        let mut state = self.state.borrow_mut();
        state.resident.clear();
        state.disposed = true;
    }
}

impl SurfaceProbe {
    pub fn config(&self) -> Option<SurfaceConfig> {
        self.state.borrow().config
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    pub fn size(&self) -> (u32, u32) {
        self.state.borrow().size
    }

    pub fn draws(&self) -> u64 {
        self.state.borrow().draws
    }

    /// Number of geometries currently uploaded
    pub fn resident_geometry(&self) -> usize {
        self.state.borrow().resident.len()
    }

    /// Make the next `attach` fail
    pub fn fail_attach(&self, fail: bool) {
        self.state.borrow_mut().fail_attach = fail;
    }
}

#[derive(Debug)]
struct WindowState {
    viewport: Viewport,
    listeners: usize,
}

#[derive(Debug)]
pub struct HeadlessWindow {
    state: Rc<RefCell<WindowState>>,
}

#[derive(Debug, Clone)]
pub struct WindowProbe {
    state: Rc<RefCell<WindowState>>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> (Self, WindowProbe) {
        let state = Rc::new(RefCell::new(WindowState {
            viewport: Viewport {
                width,
                height,
                pixel_ratio: 1.0,
            },
            listeners: 0,
        }));
        (Self { state: state.clone() }, WindowProbe { state })
    }
}

impl HostWindow for HeadlessWindow {
    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    fn subscribe_resize(&mut self) {
        self.state.borrow_mut().listeners += 1;
    }

    fn unsubscribe_resize(&mut self) {
        let mut state = self.state.borrow_mut();
        state.listeners = state.listeners.saturating_sub(1);
    }
}

impl WindowProbe {
    /// Change the window size; deliver the notification with `on_resize`
    pub fn set_size(&self, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        state.viewport.width = width;
        state.viewport.height = height;
    }

    pub fn set_pixel_ratio(&self, pixel_ratio: f64) {
        self.state.borrow_mut().viewport.pixel_ratio = pixel_ratio;
    }

    /// Resize listeners currently installed
    pub fn listeners(&self) -> usize {
        self.state.borrow().listeners
    }
}

/// Scheduler whose ticks are delivered by hand
#[derive(Debug)]
pub struct ManualScheduler {
    running: Rc<RefCell<bool>>,
}

#[derive(Debug, Clone)]
pub struct SchedulerProbe {
    running: Rc<RefCell<bool>>,
}

impl ManualScheduler {
    pub fn new() -> (Self, SchedulerProbe) {
        let running = Rc::new(RefCell::new(false));
        (
            Self {
                running: running.clone(),
            },
            SchedulerProbe { running },
        )
    }
}

impl FrameScheduler for ManualScheduler {
    fn start(&mut self) {
        *self.running.borrow_mut() = true;
    }

    fn stop(&mut self) {
        *self.running.borrow_mut() = false;
    }
}

impl SchedulerProbe {
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }
}

/// Loader that only queues requests; completion is up to the caller
#[derive(Debug)]
pub struct DeferredLoader {
    queue: Rc<RefCell<VecDeque<LoadRequest>>>,
}

#[derive(Debug, Clone)]
pub struct LoaderProbe {
    queue: Rc<RefCell<VecDeque<LoadRequest>>>,
}

impl DeferredLoader {
    pub fn new() -> (Self, LoaderProbe) {
        let queue = Rc::new(RefCell::new(VecDeque::new()));
        (Self { queue: queue.clone() }, LoaderProbe { queue })
    }
}

impl AssetLoader for DeferredLoader {
    fn start(&mut self, request: LoadRequest) {
        self.queue.borrow_mut().push_back(request);
    }
}

impl LoaderProbe {
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn take(&self) -> Option<LoadRequest> {
        self.queue.borrow_mut().pop_front()
    }
}

/// Diagnostics sink that keeps every message
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    reports: Rc<RefCell<Vec<String>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn report_load_failure(&mut self, failure: &AssetLoadFailure) {
        self.reports.borrow_mut().push(failure.to_string());
    }
}

#[derive(Debug)]
pub struct HeadlessPlatform;

impl Platform for HeadlessPlatform {
    type Surface = HeadlessSurface;
    type Window = HeadlessWindow;
    type Scheduler = ManualScheduler;
    type Loader = DeferredLoader;
    type Time = ManualTime;
}

/// Probes for every collaborator of a headless canvas
#[derive(Debug, Clone)]
pub struct HeadlessProbes {
    pub surface: SurfaceProbe,
    pub window: WindowProbe,
    pub scheduler: SchedulerProbe,
    pub loader: LoaderProbe,
    pub diagnostics: RecordingDiagnostics,
    pub time: ManualTime,
}

impl HeadlessPlatform {
    pub fn parts(width: u32, height: u32) -> (PlatformParts<HeadlessPlatform>, HeadlessProbes) {
        let (surface, surface_probe) = HeadlessSurface::new();
        let (window, window_probe) = HeadlessWindow::new(width, height);
        let (scheduler, scheduler_probe) = ManualScheduler::new();
        let (loader, loader_probe) = DeferredLoader::new();
        let diagnostics = RecordingDiagnostics::new();
        let time = ManualTime::new();

        let parts = PlatformParts {
            surface,
            window,
            scheduler,
            loader,
            time: time.clone(),
            diagnostics: Box::new(diagnostics.clone()),
        };
        let probes = HeadlessProbes {
            surface: surface_probe,
            window: window_probe,
            scheduler: scheduler_probe,
            loader: loader_probe,
            diagnostics,
            time,
        };
        (parts, probes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::context::CanvasContext;
    use crate::viewport::ViewportBinding;

    #[test]
    fn test_binding_subscribes_once() {
        let (window, probe) = HeadlessWindow::new(800, 600);
        let mut binding = ViewportBinding::new(window);

        binding.bind();
        binding.bind();
        assert_eq!(probe.listeners(), 1);
        binding.unbind();
        binding.unbind();
        assert_eq!(probe.listeners(), 0);
    }

    #[test]
    fn test_resize_updates_camera_and_surface() {
        let (window, window_probe) = HeadlessWindow::new(800, 600);
        let (surface, surface_probe) = HeadlessSurface::new();
        let mut ctx = CanvasContext::new(surface, ManualTime::new(), PerspectiveCamera::default(), [0.0; 4]);
        let mut binding = ViewportBinding::new(window);
        binding.bind();

        window_probe.set_size(1280, 720);
        let viewport = binding.handle_resize(&mut ctx).unwrap();
        assert_eq!((viewport.width, viewport.height), (1280, 720));
        assert!((ctx.camera.aspect - 1280.0 / 720.0).abs() < 1e-6);
        assert_eq!(surface_probe.size(), (1280, 720));
    }

    #[test]
    fn test_unbound_resize_is_noop() {
        let (window, window_probe) = HeadlessWindow::new(800, 600);
        let (surface, surface_probe) = HeadlessSurface::new();
        let mut ctx = CanvasContext::new(surface, ManualTime::new(), PerspectiveCamera::default(), [0.0; 4]);
        let binding = ViewportBinding::new(window);

        window_probe.set_size(10, 10);
        assert!(binding.handle_resize(&mut ctx).is_none());
        assert_eq!(ctx.camera.aspect, 1.0);
        assert_eq!(surface_probe.size(), (0, 0));
    }

    #[test]
    fn test_zero_height_keeps_aspect() {
        let (window, window_probe) = HeadlessWindow::new(800, 400);
        let (surface, _) = HeadlessSurface::new();
        let mut ctx = CanvasContext::new(surface, ManualTime::new(), PerspectiveCamera::new(75.0, 2.0, 0.1, 1000.0), [0.0; 4]);
        let mut binding = ViewportBinding::new(window);
        binding.bind();

        window_probe.set_size(800, 0);
        binding.handle_resize(&mut ctx);
        assert_eq!(ctx.camera.aspect, 2.0);
    }
}
