//! glTF asset loading and the post-load preparation pipeline
//!
//! Parsing produces a [`LoadedAsset`]. Before anything reaches the scene it
//! is turned into a [`PreparedAsset`] by running the material override pass
//! and then the centering pass; [`crate::scene::Scene::insert`] only accepts
//! the prepared form.

use base64::Engine;
use bevy_color::Color;
use bevy_math::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::mesh::Mode;
use std::borrow::Cow;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::animation::{AnimationClip, Channel, Interpolation, Keyframes};
use crate::bounds::CenteringPass;
use crate::error::LoadError;
use crate::fragment::{Mesh, NodeId, SceneGraphFragment, Skin, SkinWeights, Transform};
use crate::material::{Material, MaterialOverridePass, SourceMaterial};

/// Shared flag set by unmount so late load completions can be discarded
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Identifies one in-flight load and the mount it belongs to
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub id: u64,
    pub path: String,
    pub token: CancellationToken,
}

#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub path: String,
    pub ticket: LoadTicket,
}

/// Platform hook that fetches and parses assets without blocking
///
/// Implementations must not call back into the canvas from `start`; the
/// result is delivered later through `SceneCanvas::complete_load`.
pub trait AssetLoader {
    fn start(&mut self, request: LoadRequest);
}

/// A parsed fragment and its animation clips
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub fragment: SceneGraphFragment,
    pub clips: Vec<AnimationClip>,
}

impl LoadedAsset {
    /// Run the material override pass, then the centering pass
    pub fn prepare(self, materials: &MaterialOverridePass) -> PreparedAsset {
        PreparedAsset::prepare(self.fragment, self.clips, materials)
    }
}

/// A fragment that has been through both post-load passes
#[derive(Debug)]
pub struct PreparedFragment(SceneGraphFragment);

impl PreparedFragment {
    pub fn fragment(&self) -> &SceneGraphFragment {
        &self.0
    }

    pub(crate) fn into_inner(self) -> SceneGraphFragment {
        self.0
    }
}

#[derive(Debug)]
pub struct PreparedAsset {
    fragment: PreparedFragment,
    clips: Vec<AnimationClip>,
    overridden: usize,
    offset: Option<Vec3>,
}

impl PreparedAsset {
    pub fn prepare(
        mut fragment: SceneGraphFragment,
        clips: Vec<AnimationClip>,
        materials: &MaterialOverridePass,
    ) -> Self {
        let overridden = materials.apply(&mut fragment);
        let offset = CenteringPass.apply(&mut fragment);
        Self {
            fragment: PreparedFragment(fragment),
            clips,
            overridden,
            offset,
        }
    }

    pub fn fragment(&self) -> &SceneGraphFragment {
        self.fragment.fragment()
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    /// Number of drawables that received the wireframe material
    pub fn overridden(&self) -> usize {
        self.overridden
    }

    /// Translation applied to the root by the centering pass
    pub fn offset(&self) -> Option<Vec3> {
        self.offset
    }

    pub fn into_parts(self) -> (PreparedFragment, Vec<AnimationClip>) {
        (self.fragment, self.clips)
    }
}

/// Read and parse a model from the local file system
pub fn load_from_path(path: &Path) -> Result<LoadedAsset, LoadError> {
    let bytes = std::fs::read(path)?;
    parse_gltf(&bytes)
}

/// Parse a binary (`.glb`) or JSON glTF document with embedded buffers
pub fn parse_gltf(bytes: &[u8]) -> Result<LoadedAsset, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let buffers = resolve_buffers(&gltf.document, gltf.blob.as_deref())?;
    let get_buffer = |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|b| &b[..]);

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or(LoadError::NoScene)?;

    let mut fragment = SceneGraphFragment::new(scene.name().unwrap_or("scene"));
    let mut node_map: HashMap<usize, NodeId> = HashMap::new();

    // Build the node tree first so skins and channels can resolve targets
    let root = fragment.root();
    let mut stack: Vec<(gltf::Node<'_>, NodeId)> = scene.nodes().map(|n| (n, root)).collect();
    stack.reverse();
    while let Some((node, parent)) = stack.pop() {
        if node_map.contains_key(&node.index()) {
            continue;
        }
        let (translation, rotation, scale) = node.transform().decomposed();
        let transform = Transform {
            translation: Vec3::from_array(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from_array(scale),
        };
        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node.index()));
        let id = fragment.add_node(parent, name, transform);
        node_map.insert(node.index(), id);

        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|child| (child, id)));
    }

    let nodes: Vec<gltf::Node<'_>> = gltf.nodes().collect();
    let mut mapped: Vec<(usize, NodeId)> = node_map.iter().map(|(&k, &v)| (k, v)).collect();
    mapped.sort_by_key(|(_, id)| *id);

    for (index, id) in mapped {
        let node = &nodes[index];

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if let Some(built) = read_primitive(&primitive, &get_buffer)? {
                    let material = primitive.material();
                    let [r, g, b, a] = material.pbr_metallic_roughness().base_color_factor();
                    fragment.add_drawable(
                        id,
                        built,
                        Material::Source(SourceMaterial {
                            name: material.name().map(str::to_string),
                            base_color: Color::linear_rgba(r, g, b, a),
                        }),
                    );
                }
            }
        }

        if let Some(skin) = node.skin() {
            let joints: Vec<NodeId> = skin
                .joints()
                .map(|joint| node_map.get(&joint.index()).copied().unwrap_or(root))
                .collect();
            let inverse_bind: Vec<Mat4> = skin
                .reader(get_buffer)
                .read_inverse_bind_matrices()
                .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
                .unwrap_or_else(|| vec![Mat4::IDENTITY; joints.len()]);
            fragment.set_skin(id, Skin { joints, inverse_bind });
        }
    }

    let mut clips = Vec::new();
    for (index, animation) in gltf.animations().enumerate() {
        let mut channels = Vec::new();
        for channel in animation.channels() {
            let Some(&node) = node_map.get(&channel.target().node().index()) else {
                continue;
            };
            let reader = channel.reader(get_buffer);
            let inputs = reader
                .read_inputs()
                .ok_or_else(|| LoadError::Accessor(format!("animation {} input", index)))?;
            let times: Vec<f32> = inputs.collect();

            let (interpolation, cubic) = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Step => (Interpolation::Step, false),
                gltf::animation::Interpolation::Linear => (Interpolation::Linear, false),
                // Cubic-spline outputs carry in/out tangents around each value
                gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, true),
            };

            let keyframes = match reader.read_outputs() {
                Some(ReadOutputs::Translations(iter)) => {
                    Keyframes::Translation(spline_values(iter.map(Vec3::from_array).collect(), cubic))
                }
                Some(ReadOutputs::Rotations(iter)) => Keyframes::Rotation(
                    spline_values(iter.into_f32().map(Quat::from_array).collect(), cubic)
                        .into_iter()
                        .map(Quat::normalize)
                        .collect(),
                ),
                Some(ReadOutputs::Scales(iter)) => {
                    Keyframes::Scale(spline_values(iter.map(Vec3::from_array).collect(), cubic))
                }
                Some(ReadOutputs::MorphTargetWeights(_)) => continue,
                None => return Err(LoadError::Accessor(format!("animation {} output", index))),
            };

            channels.push(Channel::new(node, times, keyframes, interpolation));
        }

        let name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("animation_{}", index));
        clips.push(AnimationClip::new(name, channels));
    }

    Ok(LoadedAsset { fragment, clips })
}

/// Keep only the value element of each cubic-spline key triple
fn spline_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if !cubic {
        return values;
    }
    values.chunks_exact(3).map(|triple| triple[1]).collect()
}

/// Build the wireframe mesh of one primitive; `None` for skipped primitives
fn read_primitive<'a, 's, F>(primitive: &'a gltf::Primitive<'a>, get_buffer: &F) -> Result<Option<Mesh>, LoadError>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    if primitive.mode() == Mode::Points || primitive.get(&gltf::Semantic::Positions).is_none() {
        return Ok(None);
    }
    let reader = primitive.reader(get_buffer.clone());
    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| LoadError::Accessor(format!("primitive {} positions", primitive.index())))?
        .map(Vec3::from_array)
        .collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let mesh = match primitive.mode() {
        Mode::Triangles => Mesh::from_triangles(positions, &indices),
        Mode::TriangleStrip => Mesh::from_triangle_strip(positions, &indices),
        Mode::TriangleFan => Mesh::from_triangle_fan(positions, &indices),
        Mode::Lines => Mesh::from_lines(positions, &indices),
        Mode::LineStrip => Mesh::from_line_strip(positions, &indices, false),
        Mode::LineLoop => Mesh::from_line_strip(positions, &indices, true),
        Mode::Points => return Ok(None),
    };

    let joints = reader.read_joints(0).map(|j| j.into_u16().collect::<Vec<_>>());
    let weights = reader.read_weights(0).map(|w| w.into_f32().collect::<Vec<_>>());
    Ok(Some(match (joints, weights) {
        (Some(joints), Some(weights)) => mesh.with_skin(SkinWeights { joints, weights }),
        _ => mesh,
    }))
}

fn resolve_buffers<'b>(document: &gltf::Document, blob: Option<&'b [u8]>) -> Result<Vec<Cow<'b, [u8]>>, LoadError> {
    document
        .buffers()
        .map(|buffer| {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => blob
                    .map(Cow::Borrowed)
                    .ok_or(LoadError::MissingBuffer(buffer.index()))?,
                gltf::buffer::Source::Uri(uri) => Cow::Owned(decode_data_uri(uri)?),
            };
            if data.len() < buffer.length() {
                return Err(LoadError::BufferLength {
                    index: buffer.index(),
                    expected: buffer.length(),
                    actual: data.len(),
                });
            }
            Ok(data)
        })
        .collect()
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, LoadError> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Err(LoadError::ExternalBuffer(uri.to_string()));
    };
    let (_, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| LoadError::DataUri("expected base64 payload".to_string()))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| LoadError::DataUri(e.to_string()))
}
