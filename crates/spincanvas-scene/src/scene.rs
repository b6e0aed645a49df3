//! The scene: prepared fragments plus the light placed at mount

use crate::camera::DirectionalLight;
use crate::fragment::SceneGraphFragment;
use crate::loader::PreparedFragment;
use crate::surface::GeometryKey;

/// Handle to a fragment attached to a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(pub(crate) u32);

#[derive(Debug)]
pub struct SceneEntry {
    pub id: FragmentId,
    /// Asset path the fragment was loaded from
    pub source: String,
    pub fragment: SceneGraphFragment,
}

#[derive(Debug, Default)]
pub struct Scene {
    entries: Vec<SceneEntry>,
    light: Option<DirectionalLight>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a fragment that has been through both post-load passes
    pub fn insert(&mut self, source: impl Into<String>, fragment: PreparedFragment) -> FragmentId {
        let id = FragmentId(self.next_id);
        self.next_id += 1;
        self.entries.push(SceneEntry {
            id,
            source: source.into(),
            fragment: fragment.into_inner(),
        });
        id
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&SceneGraphFragment> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.fragment)
    }

    pub fn fragment_mut(&mut self, id: FragmentId) -> Option<&mut SceneGraphFragment> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| &mut e.fragment)
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_light(&mut self, light: DirectionalLight) {
        self.light = Some(light);
    }

    pub fn light(&self) -> Option<&DirectionalLight> {
        self.light.as_ref()
    }

    /// Every GPU-uploadable geometry owned by the scene's fragments
    pub fn geometry_keys(&self) -> Vec<GeometryKey> {
        self.entries
            .iter()
            .flat_map(|entry| GeometryKey::for_fragment(entry.id, &entry.fragment))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.light = None;
    }
}
