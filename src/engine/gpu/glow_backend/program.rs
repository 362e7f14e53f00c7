//! ### English
//! Shader program linking and the unit quad mesh.
//!
//! ### 中文
//! 着色器 program 链接与单位四边形网格。

use glow::HasContext as _;

use crate::engine::error::{GpuError, GpuResult};
use crate::engine::gpu::{MeshId, ProgramId};

use super::{GlowBackend, create_error};

/// ### English
/// Triangle strip covering clip space: `(x, y, u, v)` per vertex.
///
/// ### 中文
/// 覆盖裁剪空间的三角形带：每顶点 `(x, y, u, v)`。
const UNIT_QUAD: [f32; 16] = [
    -1.0, -1.0, 0.0, 0.0, //
    1.0, -1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0, 1.0, //
    1.0, 1.0, 1.0, 1.0,
];

const FLOATS_PER_VERTEX: i32 = 4;
const F32_BYTES: i32 = std::mem::size_of::<f32>() as i32;

impl GlowBackend {
    fn compile_shader(&self, kind: u32, source: &str) -> GpuResult<glow::NativeShader> {
        let gl = &self.gl;
        unsafe {
            let shader = gl.create_shader(kind).map_err(create_error("shader"))?;
            let full_source = format!("{}{}", self.version.glsl_header(), source);
            gl.shader_source(shader, &full_source);
            gl.compile_shader(shader);
            if gl.get_shader_compile_status(shader) {
                Ok(shader)
            } else {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                Err(GpuError::Shader(log))
            }
        }
    }

    /// ### English
    /// Compiles both stages and links them; shaders are detached and deleted afterwards.
    ///
    /// ### 中文
    /// 编译两个阶段并链接；之后分离并删除着色器对象。
    pub(super) fn link_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> GpuResult<ProgramId> {
        let vertex = self.compile_shader(glow::VERTEX_SHADER, vertex_source)?;
        let fragment = match self.compile_shader(glow::FRAGMENT_SHADER, fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(err);
            }
        };

        let gl = &self.gl;
        unsafe {
            let program = match gl.create_program() {
                Ok(program) => program,
                Err(reason) => {
                    gl.delete_shader(vertex);
                    gl.delete_shader(fragment);
                    return Err(create_error("program")(reason));
                }
            };
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);

            if linked {
                Ok(ProgramId(program.0))
            } else {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                Err(GpuError::Shader(log))
            }
        }
    }

    pub(super) fn build_unit_quad(&mut self) -> GpuResult<MeshId> {
        let bytes: Vec<u8> = UNIT_QUAD.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let gl = &self.gl;
        unsafe {
            let vertex_array = gl
                .create_vertex_array()
                .map_err(create_error("vertex array"))?;
            let buffer = match gl.create_buffer() {
                Ok(buffer) => buffer,
                Err(reason) => {
                    gl.delete_vertex_array(vertex_array);
                    return Err(create_error("vertex buffer")(reason));
                }
            };

            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, &bytes, glow::STATIC_DRAW);
            let stride = FLOATS_PER_VERTEX * F32_BYTES;
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, 2 * F32_BYTES);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            let mesh = MeshId(vertex_array.0);
            self.mesh_buffers.insert(mesh, buffer);
            Ok(mesh)
        }
    }

    pub(super) fn release_mesh(&mut self, mesh: MeshId) {
        let buffer = self.mesh_buffers.remove(&mesh);
        unsafe {
            if let Some(buffer) = buffer {
                self.gl.delete_buffer(buffer);
            }
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(mesh.0));
        }
    }
}
