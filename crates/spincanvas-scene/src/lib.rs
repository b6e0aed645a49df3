//! Spincanvas Scene - Scene lifecycle and render-loop core
//!
//! This crate holds everything that does not depend on a concrete platform:
//! - Asset loading (glTF/GLB parsing) and the post-load material/centering passes
//! - Keyframe and skeletal animation playback
//! - The glow overlay and its decorative geometry
//! - The render loop, viewport binding and mount/unmount lifecycle state machines
//!
//! Platform crates (the wasm frontend, the headless CLI) plug in through the
//! traits in [`surface`], [`viewport`], [`render_loop`], [`loader`] and [`clock`].

pub mod animation;
pub mod bounds;
pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod fragment;
pub mod geometry;
pub mod glow;
pub mod headless;
pub mod lifecycle;
pub mod loader;
pub mod material;
pub mod render_loop;
pub mod scene;
pub mod surface;
pub mod viewport;

pub use animation::{AnimationClip, AnimationDriver, AnimationPlayer, Channel, Interpolation, Keyframes};
pub use bounds::{Aabb, CenteringPass};
pub use camera::{DirectionalLight, PerspectiveCamera};
pub use clock::{Clock, ManualTime, TimeSource};
pub use config::CanvasConfig;
pub use context::CanvasContext;
pub use diagnostics::{DiagnosticsSink, TracingDiagnostics};
pub use error::{AssetLoadFailure, ConfigError, LifecycleError, LoadError, SurfaceError};
pub use fragment::{Drawable, Mesh, Node, NodeId, SceneGraphFragment, Skin, Transform};
pub use glow::{GlowOverlay, GlowShape, GlowState};
pub use lifecycle::{LoadOutcome, MountState, Platform, PlatformParts, SceneCanvas};
pub use loader::{AssetLoader, CancellationToken, LoadRequest, LoadTicket, LoadedAsset, PreparedAsset};
pub use material::{Material, MaterialOverridePass, WireframeMaterial};
pub use render_loop::{FrameScheduler, FrameStats, LoopState, RenderLoop, TickOutcome};
pub use scene::{FragmentId, Scene};
pub use surface::{DrawItem, FrameView, GeometryKey, GeometryOwner, RenderSurface, SurfaceConfig};
pub use viewport::{HostWindow, Viewport, ViewportBinding};
