//! End-to-end lifecycle scenarios on the headless platform

use bevy_math::Vec3;
use spincanvas_scene::config::CanvasConfig;
use spincanvas_scene::headless::{HeadlessPlatform, HeadlessProbes};
use spincanvas_scene::{
    AnimationClip, Channel, Interpolation, Keyframes, LoadError, LoadOutcome, LoadedAsset, Material, Mesh,
    MountState, SceneCanvas, SceneGraphFragment, TickOutcome, Transform,
};

fn mounted_canvas(config: CanvasConfig) -> (SceneCanvas<HeadlessPlatform>, HeadlessProbes) {
    let (parts, probes) = HeadlessPlatform::parts(1024, 768);
    let mut canvas = SceneCanvas::new(config, parts);
    canvas.mount().unwrap();
    (canvas, probes)
}

/// An off-center triangle under a node animated by two clips
fn two_clip_asset() -> LoadedAsset {
    let mut fragment = SceneGraphFragment::new("spin");
    let pivot = fragment.add_node(fragment.root(), "pivot", Transform::from_translation(Vec3::new(3.0, 1.0, 0.0)));
    fragment.add_drawable(
        pivot,
        Mesh::from_triangles(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[0, 1, 2]),
        Material::default(),
    );

    let clip = |name: &str, keyframes: Keyframes| {
        AnimationClip::new(
            name,
            vec![Channel::new(pivot, vec![0.0, 2.0], keyframes, Interpolation::Linear)],
        )
    };
    LoadedAsset {
        fragment,
        clips: vec![
            clip("spin", Keyframes::Rotation(vec![bevy_math::Quat::IDENTITY, bevy_math::Quat::from_rotation_y(1.0)])),
            clip("grow", Keyframes::Scale(vec![Vec3::ONE, Vec3::splat(2.0)])),
        ],
    }
}

#[test]
fn test_two_clips_advance_by_frame_delta() {
    let (mut canvas, probes) = mounted_canvas(CanvasConfig::default());
    let request = probes.loader.take().unwrap();

    let outcome = canvas.complete_load(request.ticket, Ok(two_clip_asset()));
    let LoadOutcome::Added { fragment, animated } = outcome else {
        panic!("expected the asset to be added, got {:?}", outcome);
    };
    assert!(animated);

    // The first tick starts the clock
    assert!(matches!(canvas.tick(), TickOutcome::Drawn(stats) if stats.delta == 0.0));
    probes.time.advance(0.016);
    let TickOutcome::Drawn(stats) = canvas.tick() else {
        panic!("loop should be running");
    };
    assert!((stats.delta - 0.016).abs() < 1e-9);
    assert_eq!(stats.draw_items, 1);

    let ctx = canvas.context().unwrap();
    let player = ctx.animations.player_for(fragment).unwrap();
    assert!((player.clip_time("spin").unwrap() - 0.016).abs() < 1e-6);
    assert!((player.clip_time("grow").unwrap() - 0.016).abs() < 1e-6);
}

#[test]
fn test_loaded_fragment_is_prepared() {
    let (mut canvas, probes) = mounted_canvas(CanvasConfig::default());
    let request = probes.loader.take().unwrap();
    let LoadOutcome::Added { fragment, .. } = canvas.complete_load(request.ticket, Ok(two_clip_asset())) else {
        panic!("expected the asset to be added");
    };

    let ctx = canvas.context().unwrap();
    let fragment = ctx.scene.fragment(fragment).unwrap();
    let bounds = spincanvas_scene::bounds::fragment_bounds(fragment).unwrap();
    assert!(bounds.center().length() < 1e-5);
    for (_, node) in fragment.nodes() {
        assert!(node.drawables.iter().all(|d| d.material.is_wireframe()));
    }
}

#[test]
fn test_resize_updates_camera_and_surface() {
    let (mut canvas, probes) = mounted_canvas(CanvasConfig::default());

    probes.window.set_size(1920, 1080);
    let viewport = canvas.on_resize().unwrap();
    assert_eq!((viewport.width, viewport.height), (1920, 1080));

    let ctx = canvas.context().unwrap();
    assert!((ctx.camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    assert_eq!(probes.surface.size(), (1920, 1080));
}

#[test]
fn test_load_failure_keeps_rendering() {
    let (mut canvas, probes) = mounted_canvas(CanvasConfig::default());
    let request = probes.loader.take().unwrap();

    let outcome = canvas.complete_load(
        request.ticket,
        Err(LoadError::Http {
            status: 404,
            status_text: "Not Found".to_string(),
        }),
    );
    assert_eq!(outcome, LoadOutcome::Failed);

    for _ in 0..3 {
        assert!(matches!(canvas.tick(), TickOutcome::Drawn(stats) if stats.draw_items == 0));
    }
    assert_eq!(probes.surface.draws(), 3);
    assert_eq!(probes.diagnostics.len(), 1);
    let report = &probes.diagnostics.reports()[0];
    assert!(report.contains("/spin.glb"));
    assert!(report.contains("404"));
}

#[test]
fn test_late_load_after_unmount_is_discarded() {
    let (mut canvas, probes) = mounted_canvas(CanvasConfig::default());
    let request = probes.loader.take().unwrap();
    canvas.unmount();

    assert!(request.ticket.token.is_cancelled());
    let outcome = canvas.complete_load(request.ticket, Ok(two_clip_asset()));
    assert_eq!(outcome, LoadOutcome::Discarded);

    assert!(canvas.context().is_none());
    assert_eq!(canvas.state(), MountState::Unmounted);
    assert_eq!(probes.surface.resident_geometry(), 0);
    assert!(!probes.surface.is_attached());
    assert!(probes.diagnostics.is_empty());
}

#[test]
fn test_late_failure_after_unmount_is_not_reported() {
    let (mut canvas, probes) = mounted_canvas(CanvasConfig::default());
    let request = probes.loader.take().unwrap();
    canvas.unmount();

    let outcome = canvas.complete_load(request.ticket, Err(LoadError::NoScene));
    assert_eq!(outcome, LoadOutcome::Discarded);
    assert!(probes.diagnostics.is_empty());
}

#[test]
fn test_unmount_releases_everything() {
    let mut config = CanvasConfig::default();
    config.glow.enabled = true;
    let (mut canvas, probes) = mounted_canvas(config);
    let request = probes.loader.take().unwrap();
    canvas.complete_load(request.ticket, Ok(two_clip_asset()));
    canvas.tick();
    // Model plus the glow decoration
    assert_eq!(probes.surface.resident_geometry(), 2);

    canvas.unmount();
    assert_eq!(probes.surface.resident_geometry(), 0);
    assert!(probes.surface.is_disposed());
    assert_eq!(probes.window.listeners(), 0);
    assert!(!probes.scheduler.is_running());

    // Post-teardown notifications are no-ops
    probes.window.set_size(10, 10);
    assert!(canvas.on_resize().is_none());
    assert_eq!(canvas.tick(), TickOutcome::Idle);
    assert_eq!(probes.surface.draws(), 1);
}

#[test]
fn test_glow_follows_elapsed_time() {
    let mut config = CanvasConfig::default();
    config.glow.enabled = true;
    let (mut canvas, probes) = mounted_canvas(config);

    canvas.tick();
    probes.time.advance(0.5);
    let TickOutcome::Drawn(stats) = canvas.tick() else {
        panic!("loop should be running");
    };
    let glow = stats.glow.unwrap();
    assert!((glow.intensity - (0.5 + 0.5 * 1.0f64.sin()) as f32).abs() < 1e-5);
    assert!((glow.sharpness - (0.5 + 0.2 * 1.5f64.sin()) as f32).abs() < 1e-5);
}

#[test]
fn test_double_mount_rejected() {
    let (mut canvas, probes) = mounted_canvas(CanvasConfig::default());
    assert!(canvas.mount().is_err());
    assert_eq!(probes.window.listeners(), 1);
    assert_eq!(probes.loader.pending(), 1);
}

#[test]
fn test_clipless_load_creates_no_player() {
    let (mut canvas, probes) = mounted_canvas(CanvasConfig::default());
    let request = probes.loader.take().unwrap();

    let mut asset = two_clip_asset();
    asset.clips.clear();
    let outcome = canvas.complete_load(request.ticket, Ok(asset));
    assert!(matches!(outcome, LoadOutcome::Added { animated: false, .. }));

    canvas.tick();
    let ctx = canvas.context().unwrap();
    assert_eq!(ctx.scene.len(), 1);
    assert!(ctx.animations.is_empty());
}

#[test]
fn test_unparseable_asset_creates_no_player() {
    let (mut canvas, probes) = mounted_canvas(CanvasConfig::default());
    let request = probes.loader.take().unwrap();

    let result = spincanvas_scene::loader::parse_gltf(b"glTF but not really");
    let outcome = canvas.complete_load(request.ticket, result);
    assert_eq!(outcome, LoadOutcome::Failed);

    canvas.tick();
    let ctx = canvas.context().unwrap();
    assert!(ctx.scene.is_empty());
    assert!(ctx.animations.is_empty());
    assert_eq!(probes.diagnostics.len(), 1);
}
