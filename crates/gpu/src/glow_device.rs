//! `DeviceContext` over any `glow` GL/WebGL context.

use glow::HasContext;

use crate::context::{
    BlendFactor, BufferUsage, Capability, DeviceContext, DeviceError, ShaderStage,
};

/// Borrows the host's GL context for the duration of a lifecycle call or a
/// frame.
pub struct GlowDevice<'gl, C: HasContext> {
    gl: &'gl C,
}

impl<'gl, C: HasContext> GlowDevice<'gl, C> {
    pub fn new(gl: &'gl C) -> Self {
        Self { gl }
    }
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn capability_enum(capability: Capability) -> u32 {
    match capability {
        Capability::Blend => glow::BLEND,
        Capability::DepthTest => glow::DEPTH_TEST,
    }
}

fn blend_enum(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
    }
}

fn usage_enum(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
    }
}

// SAFETY (all blocks below): the handles passed in were created by this same
// context and the caller owns the context's current-thread binding.
impl<C: HasContext> DeviceContext for GlowDevice<'_, C> {
    type Shader = C::Shader;
    type Program = C::Program;
    type Buffer = C::Buffer;
    type UniformLocation = C::UniformLocation;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<C::Shader, DeviceError> {
        unsafe {
            let shader = self
                .gl
                .create_shader(stage_enum(stage))
                .map_err(|reason| DeviceError::Allocation {
                    what: "shader",
                    reason,
                })?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(DeviceError::Compile { stage, log });
            }
            Ok(shader)
        }
    }

    fn delete_shader(&mut self, shader: C::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn link_program(&mut self, vertex: &C::Shader, fragment: &C::Shader) -> Result<C::Program, DeviceError> {
        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(|reason| DeviceError::Allocation {
                    what: "program",
                    reason,
                })?;
            self.gl.attach_shader(program, *vertex);
            self.gl.attach_shader(program, *fragment);
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);
            self.gl.detach_shader(program, *vertex);
            self.gl.detach_shader(program, *fragment);
            if !linked {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(DeviceError::Link { log });
            }
            Ok(program)
        }
    }

    fn delete_program(&mut self, program: C::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&mut self, program: Option<&C::Program>) {
        unsafe { self.gl.use_program(program.copied()) }
    }

    fn uniform_location(&mut self, program: &C::Program, name: &str) -> Option<C::UniformLocation> {
        unsafe { self.gl.get_uniform_location(*program, name) }
    }

    fn attrib_location(&mut self, program: &C::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(*program, name) }
    }

    fn uniform_mat4(&mut self, location: &C::UniformLocation, value: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, value)
        }
    }

    fn uniform_f32(&mut self, location: &C::UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(location), value) }
    }

    fn uniform_vec4(&mut self, location: &C::UniformLocation, value: [f32; 4]) {
        unsafe { self.gl.uniform_4_f32_slice(Some(location), &value) }
    }

    fn create_buffer(&mut self) -> Result<C::Buffer, DeviceError> {
        unsafe {
            self.gl
                .create_buffer()
                .map_err(|reason| DeviceError::Allocation {
                    what: "array buffer",
                    reason,
                })
        }
    }

    fn delete_buffer(&mut self, buffer: C::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn bind_array_buffer(&mut self, buffer: Option<&C::Buffer>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer.copied()) }
    }

    fn array_buffer_data(&mut self, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, usage_enum(usage))
        }
    }

    fn enable_vertex_attrib(&mut self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn disable_vertex_attrib(&mut self, location: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(location) }
    }

    fn vertex_attrib_f32(&mut self, location: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, stride, offset)
        }
    }

    fn set_enabled(&mut self, capability: Capability, enabled: bool) {
        let cap = capability_enum(capability);
        unsafe {
            if enabled {
                self.gl.enable(cap);
            } else {
                self.gl.disable(cap);
            }
        }
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(blend_enum(src), blend_enum(dst)) }
    }

    fn draw_points(&mut self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::POINTS, first, count) }
    }
}
