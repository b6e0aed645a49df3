//! WebGL2 wireframe surface
//!
//! Every drawable is uploaded once as a vertex buffer plus an edge index
//! buffer and drawn with `gl.LINES`. Skinned drawables re-upload their
//! deformed positions each frame and are drawn with an identity model matrix.

use std::collections::HashMap;

use bevy_math::Mat4;
use spincanvas_scene::{DrawItem, FrameView, GeometryKey, RenderSurface, SurfaceConfig, SurfaceError};
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, HtmlElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

const VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
uniform mat4 u_view_projection;
uniform mat4 u_model;
void main() {
    gl_Position = u_view_projection * u_model * vec4(a_position, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
uniform vec4 u_color;
out vec4 frag_color;
void main() {
    frag_color = u_color;
}
"#;

struct GpuGeometry {
    vao: WebGlVertexArrayObject,
    vertices: WebGlBuffer,
    indices: WebGlBuffer,
    index_count: i32,
}

struct Uniforms {
    view_projection: Option<WebGlUniformLocation>,
    model: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
}

pub struct WebGlSurface {
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    gl: Gl,
    program: Option<WebGlProgram>,
    uniforms: Uniforms,
    geometry: HashMap<GeometryKey, GpuGeometry>,
    pixel_ratio: f64,
}

impl WebGlSurface {
    pub fn new(window: &web_sys::Window, container: HtmlElement) -> Result<Self, SurfaceError> {
        let document = window
            .document()
            .ok_or_else(|| SurfaceError::Context("no document".to_string()))?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| SurfaceError::Context(format!("{:?}", e)))?
            .dyn_into()
            .map_err(|_| SurfaceError::Context("canvas element cast failed".to_string()))?;

        let gl: Gl = canvas
            .get_context("webgl2")
            .map_err(|e| SurfaceError::Context(format!("{:?}", e)))?
            .ok_or_else(|| SurfaceError::Context("WebGL2 not supported".to_string()))?
            .dyn_into()
            .map_err(|_| SurfaceError::Context("WebGL2 context cast failed".to_string()))?;

        let vertex = compile_shader(&gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment = compile_shader(&gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link_program(&gl, &vertex, &fragment)?;
        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));

        let uniforms = Uniforms {
            view_projection: gl.get_uniform_location(&program, "u_view_projection"),
            model: gl.get_uniform_location(&program, "u_model"),
            color: gl.get_uniform_location(&program, "u_color"),
        };

        Ok(Self {
            container,
            canvas,
            gl,
            program: Some(program),
            uniforms,
            geometry: HashMap::new(),
            pixel_ratio: 1.0,
        })
    }

    fn upload(&self, item: &DrawItem<'_>) -> Option<GpuGeometry> {
        let gl = &self.gl;
        let vao = gl.create_vertex_array()?;
        let vertices = gl.create_buffer()?;
        let indices = gl.create_buffer()?;

        gl.bind_vertex_array(Some(&vao));

        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&vertices));
        let usage = if item.positions.is_some() { Gl::DYNAMIC_DRAW } else { Gl::STATIC_DRAW };
        let flat = flatten_positions(item);
        let array = js_sys::Float32Array::from(flat.as_slice());
        gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, usage);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_with_i32(0, 3, Gl::FLOAT, false, 0, 0);

        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&indices));
        let edges: Vec<u32> = item.mesh.edges.iter().flatten().copied().collect();
        let array = js_sys::Uint32Array::from(edges.as_slice());
        gl.buffer_data_with_array_buffer_view(Gl::ELEMENT_ARRAY_BUFFER, &array, Gl::STATIC_DRAW);

        gl.bind_vertex_array(None);

        Some(GpuGeometry {
            vao,
            vertices,
            indices,
            index_count: edges.len() as i32,
        })
    }

    fn delete(&self, geometry: GpuGeometry) {
        self.gl.delete_buffer(Some(&geometry.vertices));
        self.gl.delete_buffer(Some(&geometry.indices));
        self.gl.delete_vertex_array(Some(&geometry.vao));
    }

    fn apply_size(&self, width: u32, height: u32) {
        let physical_width = (width as f64 * self.pixel_ratio).round() as u32;
        let physical_height = (height as f64 * self.pixel_ratio).round() as u32;
        self.canvas.set_width(physical_width);
        self.canvas.set_height(physical_height);

        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", width));
        let _ = style.set_property("height", &format!("{}px", height));
        self.gl.viewport(0, 0, physical_width as i32, physical_height as i32);
    }
}

fn flatten_positions(item: &DrawItem<'_>) -> Vec<f32> {
    let positions = item.positions.as_deref().unwrap_or(&item.mesh.positions);
    positions.iter().flat_map(|p| p.to_array()).collect()
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, SurfaceError> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| SurfaceError::Shader("unable to create shader".to_string()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(SurfaceError::Shader(log))
    }
}

fn link_program(gl: &Gl, vertex: &WebGlShader, fragment: &WebGlShader) -> Result<WebGlProgram, SurfaceError> {
    let program = gl
        .create_program()
        .ok_or_else(|| SurfaceError::Shader("unable to create program".to_string()))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(SurfaceError::Shader(log))
    }
}

impl RenderSurface for WebGlSurface {
    fn configure(&mut self, config: &SurfaceConfig) {
        self.pixel_ratio = config.pixel_ratio.max(1.0);
        let [r, g, b, a] = config.clear_color;
        self.gl.clear_color(r, g, b, a);
        self.apply_size(config.width, config.height);
    }

    fn attach(&mut self) -> Result<(), SurfaceError> {
        self.container.set_inner_html("");
        let style = self.container.style();
        let _ = style.set_property("position", "relative");
        let _ = style.set_property("width", "100vw");
        let _ = style.set_property("height", "100vh");
        let _ = self.canvas.style().set_property("position", "fixed");

        self.container
            .append_child(&self.canvas)
            .map(|_| ())
            .map_err(|e| SurfaceError::Attach(format!("{:?}", e)))
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.apply_size(width, height);
    }

    fn draw(&mut self, frame: &FrameView<'_>) {
        let Some(program) = self.program.as_ref() else {
            return;
        };
        let gl = &self.gl;
        let [r, g, b, a] = frame.clear_color;
        gl.clear_color(r, g, b, a);
        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
        gl.enable(Gl::DEPTH_TEST);
        gl.enable(Gl::BLEND);
        gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);

        gl.use_program(Some(program));
        gl.uniform_matrix4fv_with_f32_array(
            self.uniforms.view_projection.as_ref(),
            false,
            &frame.view_projection.to_cols_array(),
        );

        for item in &frame.items {
            if !self.geometry.contains_key(&item.key) {
                match self.upload(item) {
                    Some(geometry) => {
                        self.geometry.insert(item.key, geometry);
                    }
                    None => {
                        tracing::error!(key = ?item.key, "Failed to allocate GPU buffers");
                        continue;
                    }
                }
            }
            let Some(geometry) = self.geometry.get(&item.key) else {
                continue;
            };
            let gl = &self.gl;

            gl.bind_vertex_array(Some(&geometry.vao));
            let model = if item.positions.is_some() {
                // Skinned positions are already in world space
                gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&geometry.vertices));
                let flat = flatten_positions(item);
                let array = js_sys::Float32Array::from(flat.as_slice());
                gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::DYNAMIC_DRAW);
                Mat4::IDENTITY
            } else {
                item.world
            };

            gl.uniform_matrix4fv_with_f32_array(self.uniforms.model.as_ref(), false, &model.to_cols_array());
            gl.uniform4fv_with_f32_array(self.uniforms.color.as_ref(), &item.color);
            gl.draw_elements_with_i32(Gl::LINES, geometry.index_count, Gl::UNSIGNED_INT, 0);
        }
        self.gl.bind_vertex_array(None);
    }

    fn release_geometry(&mut self, key: GeometryKey) {
        if let Some(geometry) = self.geometry.remove(&key) {
            self.delete(geometry);
        }
    }

    fn detach(&mut self) {
        if let Some(parent) = self.canvas.parent_node() {
            let _ = parent.remove_child(&self.canvas);
        }
    }

    fn dispose(&mut self) {
        let remaining: Vec<GpuGeometry> = self.geometry.drain().map(|(_, g)| g).collect();
        for geometry in remaining {
            self.delete(geometry);
        }
        if let Some(program) = self.program.take() {
            self.gl.delete_program(Some(&program));
        }
    }
}
