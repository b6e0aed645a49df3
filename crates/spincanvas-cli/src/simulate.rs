//! Headless run of the full canvas lifecycle
//!
//! Mounts a [`SceneCanvas`] on the headless platform, delivers the model
//! read from disk as the load completion, steps the render loop with a
//! fixed delta and unmounts again.

use anyhow::{anyhow, Result};
use serde::Serialize;
use spincanvas_scene::config::CanvasConfig;
use spincanvas_scene::headless::HeadlessPlatform;
use spincanvas_scene::lifecycle::{LoadOutcome, SceneCanvas};
use spincanvas_scene::loader::load_from_path;
use spincanvas_scene::render_loop::TickOutcome;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Parse a `WIDTHxHEIGHT` window size
pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid width '{}': {}", width, e))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid height '{}': {}", height, e))?;
    Ok((width, height))
}

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub frames: u32,
    pub delta: f64,
    pub width: u32,
    pub height: u32,
    pub resize: Option<(u32, u32)>,
}

#[derive(Debug, Serialize)]
pub struct ClipTime {
    pub name: String,
    pub time: f32,
}

#[derive(Debug, Serialize)]
pub struct SimulateReport {
    pub path: String,
    pub load: String,
    pub frames: u64,
    pub elapsed: f64,
    pub draw_items: usize,
    pub aspect: f32,
    pub glow_intensity: Option<f32>,
    pub clips: Vec<ClipTime>,
    pub load_failures: Vec<String>,
    /// Geometry the surface held before teardown
    pub resident_geometry: usize,
    pub released_geometry: bool,
    pub resize_listeners: usize,
    pub surface_disposed: bool,
}

pub fn simulate(path: &Path, mut config: CanvasConfig, options: &SimulateOptions) -> Result<SimulateReport> {
    config.asset.path = path.display().to_string();
    let (parts, probes) = HeadlessPlatform::parts(options.width, options.height);
    let mut canvas = SceneCanvas::new(config, parts);
    canvas.mount()?;

    let request = probes
        .loader
        .take()
        .ok_or_else(|| anyhow!("Mount did not start a load"))?;
    let outcome = canvas.complete_load(request.ticket, load_from_path(path));
    let load = match outcome {
        LoadOutcome::Added { animated: true, .. } => "added (animated)".to_string(),
        LoadOutcome::Added { animated: false, .. } => "added".to_string(),
        LoadOutcome::Failed => "failed".to_string(),
        LoadOutcome::Discarded => "discarded".to_string(),
    };
    info!(path = %path.display(), load = %load, "Delivered model to headless canvas");

    let mut last = None;
    for frame in 0..options.frames {
        if frame == options.frames / 2 {
            if let Some((width, height)) = options.resize {
                probes.window.set_size(width, height);
                canvas.on_resize();
            }
        }
        if frame > 0 {
            probes.time.advance(options.delta);
        }
        if let TickOutcome::Drawn(stats) = canvas.tick() {
            last = Some(stats);
        }
    }
    debug!(frames = canvas.render_loop().frames(), "Simulation finished");

    let ctx = canvas
        .context()
        .ok_or_else(|| anyhow!("Canvas is not mounted"))?;
    let aspect = ctx.camera.aspect;
    let clips = ctx
        .animations
        .players()
        .iter()
        .flat_map(|player| player.actions())
        .map(|action| ClipTime {
            name: action.clip().name().to_string(),
            time: action.time(),
        })
        .collect();
    let resident_geometry = probes.surface.resident_geometry();

    canvas.unmount();

    Ok(SimulateReport {
        path: path.display().to_string(),
        load,
        frames: last.as_ref().map_or(0, |s| s.frame),
        elapsed: last.as_ref().map_or(0.0, |s| s.elapsed),
        draw_items: last.as_ref().map_or(0, |s| s.draw_items),
        aspect,
        glow_intensity: last.as_ref().and_then(|s| s.glow).map(|g| g.intensity),
        clips,
        load_failures: probes.diagnostics.reports(),
        resident_geometry,
        released_geometry: probes.surface.resident_geometry() == 0,
        resize_listeners: probes.window.listeners(),
        surface_disposed: probes.surface.is_disposed(),
    })
}

impl fmt::Display for SimulateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulated: {}", self.path)?;
        writeln!(f, "  Load:      {}", self.load)?;
        writeln!(
            f,
            "  Frames:    {} over {:.3}s, {} draw items, aspect {:.3}",
            self.frames, self.elapsed, self.draw_items, self.aspect
        )?;
        if let Some(intensity) = self.glow_intensity {
            writeln!(f, "  Glow:      intensity {:.3}", intensity)?;
        }
        for clip in &self.clips {
            writeln!(f, "  Clip:      {} at {:.3}s", clip.name, clip.time)?;
        }
        for failure in &self.load_failures {
            writeln!(f, "  Failure:   {}", failure)?;
        }
        writeln!(
            f,
            "  Teardown:  {} resident -> released {}, {} listeners, disposed {}",
            self.resident_geometry, self.released_geometry, self.resize_listeners, self.surface_disposed
        )?;
        Ok(())
    }
}
