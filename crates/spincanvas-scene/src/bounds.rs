//! Axis-aligned bounds and the centering pass

use bevy_math::Vec3;

use crate::fragment::SceneGraphFragment;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_point(first), |mut acc, p| {
            acc.extend(p);
            acc
        }))
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Bounds of every drawable in the fragment at its current pose
///
/// Returns `None` for fragments without any vertex.
pub fn fragment_bounds(fragment: &SceneGraphFragment) -> Option<Aabb> {
    let world = fragment.world_matrices();
    let mut bounds: Option<Aabb> = None;

    for (id, node) in fragment.nodes() {
        for index in 0..node.drawables.len() {
            let positions = fragment.world_positions(id, index, &world);
            if let Some(b) = Aabb::from_points(positions) {
                bounds = Some(match bounds {
                    Some(acc) => acc.union(&b),
                    None => b,
                });
            }
        }
    }

    bounds
}

/// Moves a fragment's root so its bounding-volume center sits at the origin
#[derive(Debug, Clone, Copy, Default)]
pub struct CenteringPass;

impl CenteringPass {
    /// Translate the root by the negative bounds center
    ///
    /// Returns the applied offset, or `None` when the fragment has no
    /// geometry and was left as is. Orientation and scale are unchanged.
    pub fn apply(&self, fragment: &mut SceneGraphFragment) -> Option<Vec3> {
        let center = fragment_bounds(fragment)?.center();
        let root = fragment.root();
        let node = fragment.node_mut(root);
        node.transform.translation -= center;
        node.rest.translation -= center;
        Some(-center)
    }
}
