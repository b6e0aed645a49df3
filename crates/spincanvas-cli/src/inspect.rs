//! Model summary after the post-load passes

use anyhow::{Context, Result};
use serde::Serialize;
use spincanvas_scene::bounds::{fragment_bounds, Aabb};
use spincanvas_scene::config::CanvasConfig;
use spincanvas_scene::loader::load_from_path;
use std::fmt;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct BoundsReport {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub center: [f32; 3],
    pub size: [f32; 3],
}

impl From<Aabb> for BoundsReport {
    fn from(aabb: Aabb) -> Self {
        Self {
            min: aabb.min.to_array(),
            max: aabb.max.to_array(),
            center: aabb.center().to_array(),
            size: aabb.size().to_array(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClipReport {
    pub name: String,
    pub duration: f32,
    pub channels: usize,
}

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub path: String,
    pub scene: String,
    pub nodes: usize,
    pub drawables: usize,
    pub vertices: usize,
    pub edges: usize,
    pub skinned_nodes: usize,
    /// Drawables switched to the wireframe material
    pub overridden: usize,
    /// Root translation applied by the centering pass
    pub centering_offset: Option<[f32; 3]>,
    pub source_bounds: Option<BoundsReport>,
    pub bounds: Option<BoundsReport>,
    pub clips: Vec<ClipReport>,
}

pub fn inspect(path: &Path, config: &CanvasConfig) -> Result<InspectReport> {
    let asset = load_from_path(path).with_context(|| format!("Failed to load model {}", path.display()))?;
    let source_bounds = fragment_bounds(&asset.fragment).map(BoundsReport::from);

    let prepared = asset.prepare(&config.wireframe_pass());
    let fragment = prepared.fragment();

    let mut vertices = 0;
    let mut edges = 0;
    let mut skinned_nodes = 0;
    for (_, node) in fragment.nodes() {
        if node.skin.is_some() {
            skinned_nodes += 1;
        }
        for drawable in &node.drawables {
            vertices += drawable.mesh.vertex_count();
            edges += drawable.mesh.edge_count();
        }
    }

    Ok(InspectReport {
        path: path.display().to_string(),
        scene: fragment.name().to_string(),
        // The synthetic root is not part of the model
        nodes: fragment.len() - 1,
        drawables: fragment.drawable_count(),
        vertices,
        edges,
        skinned_nodes,
        overridden: prepared.overridden(),
        centering_offset: prepared.offset().map(|o| o.to_array()),
        source_bounds,
        bounds: fragment_bounds(fragment).map(BoundsReport::from),
        clips: prepared
            .clips()
            .iter()
            .map(|clip| ClipReport {
                name: clip.name().to_string(),
                duration: clip.duration(),
                channels: clip.channels().len(),
            })
            .collect(),
    })
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {} (scene '{}')", self.path, self.scene)?;
        writeln!(f, "  Nodes:     {}", self.nodes)?;
        writeln!(
            f,
            "  Drawables: {} ({} vertices, {} edges)",
            self.drawables, self.vertices, self.edges
        )?;
        if self.skinned_nodes > 0 {
            writeln!(f, "  Skinned:   {} nodes", self.skinned_nodes)?;
        }
        writeln!(f, "  Wireframe: {} drawables overridden", self.overridden)?;
        if let (Some(source), Some(offset)) = (&self.source_bounds, self.centering_offset) {
            writeln!(
                f,
                "  Bounds:    size {:.3?}, center {:.3?} moved by {:.3?}",
                source.size, source.center, offset
            )?;
        }
        if self.clips.is_empty() {
            writeln!(f, "  Clips:     none")?;
        } else {
            writeln!(f, "  Clips:")?;
            for clip in &self.clips {
                writeln!(
                    f,
                    "    - {} ({:.3}s, {} channels)",
                    clip.name, clip.duration, clip.channels
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// A triangle at (2..4, 2..4, 0) under a pivot, with one translation clip
    pub(crate) fn sample_glb() -> Vec<u8> {
        let mut bin: Vec<u8> = Vec::new();
        let floats: [f32; 9] = [2.0, 2.0, 0.0, 4.0, 2.0, 0.0, 2.0, 4.0, 0.0];
        for v in floats {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for v in [0u32, 1, 2] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        let keys: [f32; 8] = [0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        for v in keys {
            bin.extend_from_slice(&v.to_le_bytes());
        }

        let document = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "name": "sample", "nodes": [0] }],
            "nodes": [
                { "name": "pivot", "children": [1] },
                { "name": "triangle", "mesh": 0 }
            ],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
            "buffers": [{ "byteLength": bin.len() }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 12 },
                { "buffer": 0, "byteOffset": 48, "byteLength": 8 },
                { "buffer": 0, "byteOffset": 56, "byteLength": 24 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [2.0, 2.0, 0.0], "max": [4.0, 4.0, 0.0] },
                { "bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR" },
                { "bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR",
                  "min": [0.0], "max": [2.0] },
                { "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3" }
            ],
            "animations": [{
                "name": "lift",
                "samplers": [{ "input": 2, "output": 3, "interpolation": "LINEAR" }],
                "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }]
            }]
        });

        let mut json = serde_json::to_vec(&document).unwrap();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }

    pub(crate) fn write_sample(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("sample.glb");
        std::fs::write(&path, sample_glb()).unwrap();
        path
    }

    #[test]
    fn test_inspect_summarizes_prepared_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);

        let report = inspect(&path, &CanvasConfig::default()).unwrap();
        assert_eq!(report.scene, "sample");
        assert_eq!(report.nodes, 2);
        assert_eq!(report.drawables, 1);
        assert_eq!(report.vertices, 3);
        assert_eq!(report.edges, 3);
        assert_eq!(report.overridden, 1);
        assert_eq!(report.skinned_nodes, 0);

        let offset = report.centering_offset.unwrap();
        assert!((offset[0] + 3.0).abs() < 1e-5);
        assert!((offset[1] + 3.0).abs() < 1e-5);
        let bounds = report.bounds.unwrap();
        assert!(bounds.center.iter().all(|c| c.abs() < 1e-5));

        assert_eq!(report.clips.len(), 1);
        assert_eq!(report.clips[0].name, "lift");
        assert_eq!(report.clips[0].duration, 2.0);
    }

    #[test]
    fn test_inspect_report_display() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);

        let text = inspect(&path, &CanvasConfig::default()).unwrap().to_string();
        assert!(text.contains("Drawables: 1 (3 vertices, 3 edges)"));
        assert!(text.contains("- lift (2.000s, 1 channels)"));
    }

    #[test]
    fn test_inspect_missing_file() {
        let err = inspect(Path::new("/nonexistent/sample.glb"), &CanvasConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to load model"));
    }
}
