//! Materials and the wireframe override pass

use bevy_color::{Color, ColorToComponents, Srgba};
use std::rc::Rc;

use crate::fragment::SceneGraphFragment;

/// Material as authored in the source asset
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMaterial {
    pub name: Option<String>,
    pub base_color: Color,
}

impl Default for SourceMaterial {
    fn default() -> Self {
        Self {
            name: None,
            base_color: Color::WHITE,
        }
    }
}

/// Unlit, solid-color material that draws only geometric edges
#[derive(Debug, Clone, PartialEq)]
pub struct WireframeMaterial {
    pub color: Color,
    pub wireframe: bool,
    pub unlit: bool,
}

impl WireframeMaterial {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            wireframe: true,
            unlit: true,
        }
    }
}

/// Edge material whose brightness follows the glow overlay pulse
#[derive(Debug, Clone, PartialEq)]
pub struct GlowMaterial {
    pub color: Color,
}

#[derive(Debug, Clone)]
pub enum Material {
    Source(SourceMaterial),
    Wireframe(Rc<WireframeMaterial>),
    Glow(Rc<GlowMaterial>),
}

impl Default for Material {
    fn default() -> Self {
        Material::Source(SourceMaterial::default())
    }
}

impl Material {
    pub fn is_wireframe(&self) -> bool {
        matches!(self, Material::Wireframe(_))
    }

    /// Whether two materials are the same shared instance
    pub fn same_instance(&self, other: &Material) -> bool {
        match (self, other) {
            (Material::Wireframe(a), Material::Wireframe(b)) => Rc::ptr_eq(a, b),
            (Material::Glow(a), Material::Glow(b)) => Rc::ptr_eq(a, b),
            (Material::Source(a), Material::Source(b)) => a == b,
            _ => false,
        }
    }

    /// Base color as non-linear sRGB components, the way surfaces consume it
    pub fn draw_color(&self) -> [f32; 4] {
        let color = match self {
            Material::Source(m) => m.base_color,
            Material::Wireframe(m) => m.color,
            Material::Glow(m) => m.color,
        };
        Srgba::from(color).to_f32_array()
    }
}

/// Replaces every drawable's material with one shared wireframe material
#[derive(Debug, Clone)]
pub struct MaterialOverridePass {
    material: Rc<WireframeMaterial>,
}

impl MaterialOverridePass {
    pub fn new(color: Color) -> Self {
        Self {
            material: Rc::new(WireframeMaterial::new(color)),
        }
    }

    pub fn material(&self) -> &Rc<WireframeMaterial> {
        &self.material
    }

    /// Override all drawables in the fragment, returning how many were visited
    ///
    /// Nodes without drawables are left untouched.
    pub fn apply(&self, fragment: &mut SceneGraphFragment) -> usize {
        let mut visited = 0;
        for node in fragment.nodes_mut() {
            for drawable in &mut node.drawables {
                drawable.material = Material::Wireframe(self.material.clone());
                visited += 1;
            }
        }
        visited
    }
}

impl Default for MaterialOverridePass {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}
