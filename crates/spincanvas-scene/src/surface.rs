//! Render surface abstraction and the per-frame draw list

use bevy_math::{Mat4, Vec3};

use crate::camera::{DirectionalLight, PerspectiveCamera};
use crate::error::SurfaceError;
use crate::fragment::{Mesh, NodeId, SceneGraphFragment};
use crate::glow::{GlowOverlay, GlowState};
use crate::scene::{FragmentId, Scene};

/// Who owns a piece of geometry on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryOwner {
    Fragment(FragmentId),
    /// The glow overlay's decoration
    Decoration,
}

/// Stable identity of one drawable, used to cache and release GPU buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryKey {
    pub owner: GeometryOwner,
    pub node: NodeId,
    pub drawable: usize,
}

impl GeometryKey {
    pub fn for_fragment(id: FragmentId, fragment: &SceneGraphFragment) -> Vec<GeometryKey> {
        Self::collect(GeometryOwner::Fragment(id), fragment)
    }

    pub fn for_decoration(fragment: &SceneGraphFragment) -> Vec<GeometryKey> {
        Self::collect(GeometryOwner::Decoration, fragment)
    }

    fn collect(owner: GeometryOwner, fragment: &SceneGraphFragment) -> Vec<GeometryKey> {
        fragment
            .nodes()
            .flat_map(|(node, n)| (0..n.drawables.len()).map(move |drawable| GeometryKey { owner, node, drawable }))
            .collect()
    }
}

/// Size, density and clear color applied to the surface at mount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
    /// Straight RGBA in sRGB space
    pub clear_color: [f32; 4],
}

/// One drawable in the current frame
#[derive(Debug)]
pub struct DrawItem<'a> {
    pub key: GeometryKey,
    pub mesh: &'a Mesh,
    /// World-space positions for skinned meshes; `None` means draw `mesh`
    /// through `world`
    pub positions: Option<Vec<Vec3>>,
    pub world: Mat4,
    /// Final straight RGBA, already tinted for glow items
    pub color: [f32; 4],
    pub glow: Option<GlowState>,
}

/// Everything a surface needs to draw one frame
#[derive(Debug)]
pub struct FrameView<'a> {
    pub clear_color: [f32; 4],
    pub view_projection: Mat4,
    pub light: Option<&'a DirectionalLight>,
    pub items: Vec<DrawItem<'a>>,
}

impl<'a> FrameView<'a> {
    /// Snapshot the scene and the optional overlay from the camera
    pub fn build(
        clear_color: [f32; 4],
        camera: &PerspectiveCamera,
        scene: &'a Scene,
        glow: Option<&'a GlowOverlay>,
    ) -> Self {
        let mut view = Self {
            clear_color,
            view_projection: camera.view_projection(),
            light: scene.light(),
            items: Vec::new(),
        };
        for entry in scene.entries() {
            view.push_fragment(GeometryOwner::Fragment(entry.id), &entry.fragment, None);
        }
        if let Some(overlay) = glow {
            view.push_fragment(GeometryOwner::Decoration, overlay.fragment(), Some(overlay.state()));
        }
        view
    }

    fn push_fragment(&mut self, owner: GeometryOwner, fragment: &'a SceneGraphFragment, glow: Option<GlowState>) {
        let world = fragment.world_matrices();
        for (node, n) in fragment.nodes() {
            for (index, drawable) in n.drawables.iter().enumerate() {
                let positions = fragment
                    .is_skinned(node, index)
                    .then(|| fragment.world_positions(node, index, &world));
                self.items.push(DrawItem {
                    key: GeometryKey {
                        owner,
                        node,
                        drawable: index,
                    },
                    mesh: &drawable.mesh,
                    positions,
                    world: world[node.index()],
                    color: match glow {
                        Some(state) => state.tint(drawable.material.draw_color()),
                        None => drawable.material.draw_color(),
                    },
                    glow,
                });
            }
        }
    }
}

/// Drawable target bound to the host container
///
/// Exactly one per mounted canvas. Geometry is uploaded lazily on first draw
/// and kept until released by key or until the surface is disposed.
pub trait RenderSurface {
    fn configure(&mut self, config: &SurfaceConfig);

    /// Insert the surface into its container, replacing previous children
    fn attach(&mut self) -> Result<(), SurfaceError>;

    fn resize(&mut self, width: u32, height: u32);

    fn draw(&mut self, frame: &FrameView<'_>);

    fn release_geometry(&mut self, key: GeometryKey);

    fn detach(&mut self);

    /// Free every remaining GPU resource
    fn dispose(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Transform;
    use crate::loader::PreparedAsset;
    use crate::material::{Material, MaterialOverridePass};
    use bevy_color::Color;

    fn two_drawable_scene() -> Scene {
        let mut fragment = SceneGraphFragment::new("model");
        let a = fragment.add_node(fragment.root(), "a", Transform::from_translation(Vec3::X));
        let mesh = Mesh::from_triangles(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[0, 1, 2]);
        fragment.add_drawable(a, mesh.clone(), Material::default());
        fragment.add_drawable(a, mesh, Material::default());

        let prepared = PreparedAsset::prepare(fragment, Vec::new(), &MaterialOverridePass::default());
        let mut scene = Scene::new();
        scene.insert("model.glb", prepared.into_parts().0);
        scene
    }

    #[test]
    fn test_frame_lists_every_drawable() {
        let scene = two_drawable_scene();
        let camera = PerspectiveCamera::default();
        let frame = FrameView::build([0.0, 0.0, 0.0, 1.0], &camera, &scene, None);

        assert_eq!(frame.items.len(), 2);
        assert!(frame.items.iter().all(|i| i.positions.is_none() && i.glow.is_none()));
        assert_eq!(frame.items[0].color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(
            frame.items.iter().map(|i| i.key).collect::<Vec<_>>(),
            scene.geometry_keys()
        );
    }

    #[test]
    fn test_empty_scene_frame() {
        let scene = Scene::new();
        let frame = FrameView::build([0.0; 4], &PerspectiveCamera::default(), &scene, None);
        assert!(frame.items.is_empty());
        assert!(frame.light.is_none());
    }

    #[test]
    fn test_glow_items_carry_state() {
        let scene = Scene::new();
        let mut overlay = GlowOverlay::new(crate::glow::GlowShape::Ring, 1.0, Color::WHITE, Vec3::ZERO);
        let state = overlay.update(0.75);
        let frame = FrameView::build([0.0; 4], &PerspectiveCamera::default(), &scene, Some(&overlay));

        assert_eq!(frame.items.len(), 1);
        assert_eq!(frame.items[0].key.owner, GeometryOwner::Decoration);
        assert_eq!(frame.items[0].glow, Some(state));
        assert_eq!(frame.items[0].color, state.tint([1.0, 1.0, 1.0, 1.0]));
    }
}
