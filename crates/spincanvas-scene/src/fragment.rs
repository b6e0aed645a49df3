//! Scene-graph fragments: the node tree produced by the asset loader
//!
//! A fragment is an arena of nodes under one synthetic root. The root is the
//! handle the centering pass moves; loaded nodes hang below it, so animation
//! tracks never touch the root transform.

use bevy_math::{Mat4, Quat, Vec3};
use std::collections::HashSet;

use crate::material::Material;

/// Index of a node within its fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Translation, rotation and scale of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-vertex skinning attributes (up to four joint influences)
#[derive(Debug, Clone, PartialEq)]
pub struct SkinWeights {
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
}

/// Edge geometry ready for wireframe drawing
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    /// Pairs of indices into `positions`
    pub edges: Vec<[u32; 2]>,
    pub skin: Option<SkinWeights>,
}

impl Mesh {
    /// Build from a triangle list, keeping every unique triangle edge once
    pub fn from_triangles(positions: Vec<Vec3>, indices: &[u32]) -> Self {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        let count = positions.len() as u32;

        for tri in indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                if a >= count || b >= count || a == b {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    edges.push([key.0, key.1]);
                }
            }
        }

        Self {
            positions,
            edges,
            skin: None,
        }
    }

    /// Build from a triangle strip
    pub fn from_triangle_strip(positions: Vec<Vec3>, indices: &[u32]) -> Self {
        let triangles: Vec<u32> = indices
            .windows(3)
            .flat_map(|w| [w[0], w[1], w[2]])
            .collect();
        Self::from_triangles(positions, &triangles)
    }

    /// Build from a triangle fan
    pub fn from_triangle_fan(positions: Vec<Vec3>, indices: &[u32]) -> Self {
        let Some((&hub, rest)) = indices.split_first() else {
            return Self::from_triangles(positions, &[]);
        };
        let triangles: Vec<u32> = rest
            .windows(2)
            .flat_map(|w| [hub, w[0], w[1]])
            .collect();
        Self::from_triangles(positions, &triangles)
    }

    /// Build from a line list (pairs of indices)
    pub fn from_lines(positions: Vec<Vec3>, indices: &[u32]) -> Self {
        let count = positions.len() as u32;
        let edges = indices
            .chunks_exact(2)
            .filter(|pair| pair[0] < count && pair[1] < count)
            .map(|pair| [pair[0], pair[1]])
            .collect();
        Self {
            positions,
            edges,
            skin: None,
        }
    }

    /// Build from a polyline, optionally closing it back to the first index
    pub fn from_line_strip(positions: Vec<Vec3>, indices: &[u32], closed: bool) -> Self {
        let mut list: Vec<u32> = indices.windows(2).flat_map(|w| [w[0], w[1]]).collect();
        if closed && indices.len() > 2 {
            list.extend([indices[indices.len() - 1], indices[0]]);
        }
        Self::from_lines(positions, &list)
    }

    pub fn with_skin(mut self, skin: SkinWeights) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Joint binding for a skinned node
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    pub joints: Vec<NodeId>,
    pub inverse_bind: Vec<Mat4>,
}

/// A mesh and the material it is drawn with
#[derive(Debug, Clone)]
pub struct Drawable {
    pub mesh: Mesh,
    pub material: Material,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Current (possibly animated) local transform
    pub transform: Transform,
    /// Local transform the animation driver falls back to
    pub rest: Transform,
    pub drawables: Vec<Drawable>,
    pub skin: Option<Skin>,
}

impl Node {
    pub fn is_drawable(&self) -> bool {
        !self.drawables.is_empty()
    }
}

/// Tree of nodes owned by the scene once attached
#[derive(Debug, Clone)]
pub struct SceneGraphFragment {
    name: String,
    nodes: Vec<Node>,
}

impl SceneGraphFragment {
    /// Create a fragment holding only its root node
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let root = Node {
            name: name.clone(),
            parent: None,
            children: Vec::new(),
            transform: Transform::IDENTITY,
            rest: Transform::IDENTITY,
            drawables: Vec::new(),
            skin: None,
        };
        Self {
            name,
            nodes: vec![root],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a node under `parent`; its transform doubles as its rest pose
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>, transform: Transform) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            transform,
            rest: transform,
            drawables: Vec::new(),
            skin: None,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn add_drawable(&mut self, node: NodeId, mesh: Mesh, material: Material) {
        self.nodes[node.0].drawables.push(Drawable { mesh, material });
    }

    pub fn set_skin(&mut self, node: NodeId, skin: Skin) {
        self.nodes[node.0].skin = Some(skin);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    /// Depth-first, parents before children, starting at the root
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            // Reverse so children come out in declaration order
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// World matrix of every node, indexed by `NodeId::index`
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.nodes.len()];
        for id in self.traverse() {
            let node = &self.nodes[id.0];
            let local = node.transform.matrix();
            world[id.0] = match node.parent {
                Some(parent) => world[parent.0] * local,
                None => local,
            };
        }
        world
    }

    pub fn drawable_count(&self) -> usize {
        self.nodes.iter().map(|n| n.drawables.len()).sum()
    }

    /// World-space positions of a drawable's vertices
    ///
    /// Skinned meshes are deformed by their joints; everything else is
    /// transformed by the owning node's world matrix.
    pub fn world_positions(&self, node: NodeId, drawable: usize, world: &[Mat4]) -> Vec<Vec3> {
        let owner = &self.nodes[node.0];
        let mesh = &owner.drawables[drawable].mesh;
        match (&owner.skin, &mesh.skin) {
            (Some(skin), Some(weights)) => skin_positions(mesh, weights, skin, world),
            _ => {
                let matrix = world[node.0];
                mesh.positions.iter().map(|p| matrix.transform_point3(*p)).collect()
            }
        }
    }

    /// Whether a drawable has to be deformed on the CPU each frame
    pub fn is_skinned(&self, node: NodeId, drawable: usize) -> bool {
        let owner = &self.nodes[node.0];
        owner.skin.is_some() && owner.drawables[drawable].mesh.skin.is_some()
    }
}

/// Linear blend skinning of a mesh against the current joint world matrices
pub fn skin_positions(mesh: &Mesh, weights: &SkinWeights, skin: &Skin, world: &[Mat4]) -> Vec<Vec3> {
    let palette: Vec<Mat4> = skin
        .joints
        .iter()
        .enumerate()
        .map(|(i, joint)| {
            let inverse_bind = skin.inverse_bind.get(i).copied().unwrap_or(Mat4::IDENTITY);
            world.get(joint.0).copied().unwrap_or(Mat4::IDENTITY) * inverse_bind
        })
        .collect();

    mesh.positions
        .iter()
        .enumerate()
        .map(|(v, position)| {
            let (Some(joints), Some(w)) = (weights.joints.get(v), weights.weights.get(v)) else {
                return *position;
            };
            let total: f32 = w.iter().sum();
            if total <= f32::EPSILON {
                return *position;
            }
            let mut out = Vec3::ZERO;
            for k in 0..4 {
                if w[k] == 0.0 {
                    continue;
                }
                let m = palette.get(joints[k] as usize).copied().unwrap_or(Mat4::IDENTITY);
                out += m.transform_point3(*position) * (w[k] / total);
            }
            out
        })
        .collect()
}
