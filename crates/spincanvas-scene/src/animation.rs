//! Keyframe animation clips, players and the per-frame driver
//!
//! Every clip handed to [`AnimationDriver::register`] plays at once and loops
//! forever. When several clips drive the same node property their samples
//! are averaged with equal weight.

use bevy_math::{Quat, Vec3, Vec4};
use std::collections::HashMap;

use crate::fragment::{NodeId, SceneGraphFragment};
use crate::scene::{FragmentId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Keyframes {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl Keyframes {
    pub fn len(&self) -> usize {
        match self {
            Keyframes::Translation(v) | Keyframes::Scale(v) => v.len(),
            Keyframes::Rotation(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One animated property of one node
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub node: NodeId,
    pub times: Vec<f32>,
    pub keyframes: Keyframes,
    pub interpolation: Interpolation,
}

impl Channel {
    pub fn new(node: NodeId, times: Vec<f32>, keyframes: Keyframes, interpolation: Interpolation) -> Self {
        Self {
            node,
            times,
            keyframes,
            interpolation,
        }
    }

    /// Last key time, or 0 for an empty channel
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Key index pair and blend factor for time `t`
    fn locate(&self, t: f32) -> Option<(usize, usize, f32)> {
        let keys = self.times.len().min(self.keyframes.len());
        if keys == 0 {
            return None;
        }
        let times = &self.times[..keys];
        let upper = times.partition_point(|&k| k <= t);
        if upper == 0 {
            return Some((0, 0, 0.0));
        }
        if upper >= keys {
            return Some((keys - 1, keys - 1, 0.0));
        }
        let (a, b) = (upper - 1, upper);
        let span = times[b] - times[a];
        let factor = match self.interpolation {
            Interpolation::Step => 0.0,
            Interpolation::Linear if span > 0.0 => ((t - times[a]) / span).clamp(0.0, 1.0),
            Interpolation::Linear => 0.0,
        };
        Some((a, b, factor))
    }

    pub fn sample(&self, t: f32) -> Option<Sample> {
        let (a, b, f) = self.locate(t)?;
        Some(match &self.keyframes {
            Keyframes::Translation(v) => Sample::Translation(v[a].lerp(v[b], f)),
            Keyframes::Rotation(v) => Sample::Rotation(v[a].slerp(v[b], f).normalize()),
            Keyframes::Scale(v) => Sample::Scale(v[a].lerp(v[b], f)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

/// Named, immutable set of transform tracks
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    channels: Vec<Channel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels.iter().map(Channel::end_time).fold(0.0, f32::max);
        Self {
            name: name.into(),
            duration,
            channels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

/// Playback state of one clip within a player
#[derive(Debug, Clone)]
pub struct ClipAction {
    clip: AnimationClip,
    time: f32,
}

impl ClipAction {
    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Local playback time, wrapped into `[0, duration)`
    pub fn time(&self) -> f32 {
        self.time
    }

    fn advance(&mut self, delta: f32) {
        let duration = self.clip.duration;
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        self.time += delta;
        if self.time >= duration {
            self.time %= duration;
        }
    }
}

/// Binds one fragment to its clips and tracks their playback
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    fragment: FragmentId,
    actions: Vec<ClipAction>,
    elapsed: f64,
}

impl AnimationPlayer {
    fn new(fragment: FragmentId, clips: Vec<AnimationClip>) -> Self {
        Self {
            fragment,
            actions: clips
                .into_iter()
                .map(|clip| ClipAction { clip, time: 0.0 })
                .collect(),
            elapsed: 0.0,
        }
    }

    pub fn fragment(&self) -> FragmentId {
        self.fragment
    }

    pub fn actions(&self) -> &[ClipAction] {
        &self.actions
    }

    /// Total unwrapped time this player has been advanced by
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Playback time of the named clip
    pub fn clip_time(&self, name: &str) -> Option<f32> {
        self.actions
            .iter()
            .find(|a| a.clip.name == name)
            .map(|a| a.time)
    }

    /// Move every action forward and write the blended pose
    pub fn advance(&mut self, delta: f32, fragment: &mut SceneGraphFragment) {
        self.elapsed += delta as f64;
        for action in &mut self.actions {
            action.advance(delta);
        }
        self.apply_pose(fragment);
    }

    fn apply_pose(&self, fragment: &mut SceneGraphFragment) {
        let mut blends: HashMap<NodeId, PoseBlend> = HashMap::new();

        for action in &self.actions {
            for channel in &action.clip.channels {
                if fragment.get(channel.node).is_none() {
                    continue;
                }
                if let Some(sample) = channel.sample(action.time) {
                    blends.entry(channel.node).or_default().add(sample);
                }
            }
        }

        for (id, blend) in blends {
            let node = fragment.node_mut(id);
            let rest = node.rest;
            node.transform.translation = blend.translation().unwrap_or(rest.translation);
            node.transform.rotation = blend.rotation().unwrap_or(rest.rotation);
            node.transform.scale = blend.scale().unwrap_or(rest.scale);
        }
    }
}

/// Equal-weight accumulation of samples for one node
#[derive(Debug, Default)]
struct PoseBlend {
    translation: (Vec3, u32),
    rotation: (Vec4, u32),
    scale: (Vec3, u32),
}

impl PoseBlend {
    fn add(&mut self, sample: Sample) {
        match sample {
            Sample::Translation(v) => {
                self.translation.0 += v;
                self.translation.1 += 1;
            }
            Sample::Rotation(q) => {
                let mut v = Vec4::from(q);
                // Keep every quaternion in the same hemisphere as the first
                if self.rotation.1 > 0 && self.rotation.0.dot(v) < 0.0 {
                    v = -v;
                }
                self.rotation.0 += v;
                self.rotation.1 += 1;
            }
            Sample::Scale(v) => {
                self.scale.0 += v;
                self.scale.1 += 1;
            }
        }
    }

    fn translation(&self) -> Option<Vec3> {
        (self.translation.1 > 0).then(|| self.translation.0 / self.translation.1 as f32)
    }

    fn rotation(&self) -> Option<Quat> {
        if self.rotation.1 == 0 || self.rotation.0.length_squared() <= f32::EPSILON {
            return None;
        }
        Some(Quat::from_vec4(self.rotation.0).normalize())
    }

    fn scale(&self) -> Option<Vec3> {
        (self.scale.1 > 0).then(|| self.scale.0 / self.scale.1 as f32)
    }
}

/// Owns every player and advances them once per frame
#[derive(Debug, Default)]
pub struct AnimationDriver {
    players: Vec<AnimationPlayer>,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a player that loops every clip simultaneously
    ///
    /// An empty clip set creates no player and returns `false`.
    pub fn register(&mut self, fragment: FragmentId, clips: Vec<AnimationClip>) -> bool {
        if clips.is_empty() {
            return false;
        }
        self.players.push(AnimationPlayer::new(fragment, clips));
        true
    }

    /// Advance all players by `delta` seconds and pose their fragments
    ///
    /// Negative or non-finite deltas are treated as zero.
    pub fn advance(&mut self, delta: f32, scene: &mut Scene) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        for player in &mut self.players {
            if let Some(fragment) = scene.fragment_mut(player.fragment) {
                player.advance(delta, fragment);
            }
        }
    }

    pub fn players(&self) -> &[AnimationPlayer] {
        &self.players
    }

    pub fn player_for(&self, fragment: FragmentId) -> Option<&AnimationPlayer> {
        self.players.iter().find(|p| p.fragment == fragment)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Transform;
    use crate::loader::PreparedAsset;
    use crate::material::MaterialOverridePass;

    fn slide_clip(node: NodeId, name: &str, to: Vec3) -> AnimationClip {
        AnimationClip::new(
            name,
            vec![Channel::new(
                node,
                vec![0.0, 1.0],
                Keyframes::Translation(vec![Vec3::ZERO, to]),
                Interpolation::Linear,
            )],
        )
    }

    fn scene_with_node() -> (Scene, FragmentId, NodeId) {
        let mut fragment = SceneGraphFragment::new("model");
        let node = fragment.add_node(fragment.root(), "slider", Transform::IDENTITY);
        let prepared = PreparedAsset::prepare(fragment, Vec::new(), &MaterialOverridePass::default());
        let mut scene = Scene::new();
        let id = scene.insert("test.glb", prepared.into_parts().0);
        (scene, id, node)
    }

    #[test]
    fn test_linear_and_step_sampling() {
        let node = NodeId(1);
        let linear = Channel::new(
            node,
            vec![0.0, 2.0],
            Keyframes::Translation(vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)]),
            Interpolation::Linear,
        );
        assert_eq!(linear.sample(0.5), Some(Sample::Translation(Vec3::new(0.5, 0.0, 0.0))));
        assert_eq!(linear.sample(-1.0), Some(Sample::Translation(Vec3::ZERO)));
        assert_eq!(linear.sample(5.0), Some(Sample::Translation(Vec3::new(2.0, 0.0, 0.0))));

        let step = Channel { interpolation: Interpolation::Step, ..linear };
        assert_eq!(step.sample(1.9), Some(Sample::Translation(Vec3::ZERO)));
    }

    #[test]
    fn test_empty_clip_set_creates_no_player() {
        let (_, id, _) = scene_with_node();
        let mut driver = AnimationDriver::new();
        assert!(!driver.register(id, Vec::new()));
        assert!(driver.is_empty());
    }

    #[test]
    fn test_clips_play_simultaneously() {
        let (mut scene, id, node) = scene_with_node();
        let mut driver = AnimationDriver::new();
        assert!(driver.register(
            id,
            vec![slide_clip(node, "a", Vec3::X), slide_clip(node, "b", Vec3::Y)],
        ));

        driver.advance(0.016, &mut scene);
        let player = driver.player_for(id).unwrap();
        assert!((player.clip_time("a").unwrap() - 0.016).abs() < 1e-6);
        assert!((player.clip_time("b").unwrap() - 0.016).abs() < 1e-6);

        driver.advance(0.484, &mut scene);
        // Two clips on the same property blend evenly
        let translation = scene.fragment(id).unwrap().node(node).transform.translation;
        assert!((translation - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_clips_loop() {
        let (mut scene, id, node) = scene_with_node();
        let mut driver = AnimationDriver::new();
        driver.register(id, vec![slide_clip(node, "loop", Vec3::X)]);

        driver.advance(1.25, &mut scene);
        let player = driver.player_for(id).unwrap();
        assert!((player.clip_time("loop").unwrap() - 0.25).abs() < 1e-5);
        assert!((player.elapsed() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let (mut scene, id, node) = scene_with_node();
        let mut driver = AnimationDriver::new();
        driver.register(id, vec![slide_clip(node, "clip", Vec3::X)]);

        let deltas = [0.0, 0.016, 0.5, 0.0, 3.0, -1.0, f32::NAN, 0.033];
        let mut previous = 0.0;
        for delta in deltas {
            driver.advance(delta, &mut scene);
            let elapsed = driver.player_for(id).unwrap().elapsed();
            assert!(elapsed >= previous);
            previous = elapsed;
        }
    }

    #[test]
    fn test_rotation_blend_normalized() {
        let node = NodeId(1);
        let mut fragment = SceneGraphFragment::new("spin");
        fragment.add_node(fragment.root(), "spinner", Transform::IDENTITY);
        let spin = |name: &str, angle: f32| {
            AnimationClip::new(
                name,
                vec![Channel::new(
                    node,
                    vec![0.0, 1.0],
                    Keyframes::Rotation(vec![Quat::from_rotation_y(angle), Quat::from_rotation_y(angle)]),
                    Interpolation::Linear,
                )],
            )
        };
        let mut player = AnimationPlayer::new(FragmentId(0), vec![spin("a", 0.0), spin("b", 1.0)]);
        player.advance(0.1, &mut fragment);

        let rotation = fragment.node(node).transform.rotation;
        assert!((rotation.length() - 1.0).abs() < 1e-5);
        assert!(rotation.angle_between(Quat::from_rotation_y(0.5)) < 1e-3);
    }
}
