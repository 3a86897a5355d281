//! Device context capability.
//!
//! The point layer never talks to a concrete graphics API. Whatever the host
//! renders with implements [`DeviceContext`], exposing the handful of
//! GL-style calls the layer needs. Handles are associated types so a backend
//! can use its native objects directly.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Fixed-function state the layer toggles around its draw call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Blend,
    DepthTest,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Upload frequency hint for buffer storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("{stage} shader compile failed: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program link failed: {log}")]
    Link { log: String },
    #[error("failed to allocate {what}: {reason}")]
    Allocation { what: &'static str, reason: String },
    #[error("uniform `{0}` not found in linked program")]
    MissingUniform(&'static str),
    #[error("attribute `{0}` not found in linked program")]
    MissingAttribute(&'static str),
}

pub trait DeviceContext {
    type Shader;
    type Program;
    type Buffer;
    type UniformLocation;

    /// Create and compile one stage. On failure the shader is released and
    /// the error carries the compiler log.
    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Self::Shader, DeviceError>;
    fn delete_shader(&mut self, shader: Self::Shader);

    /// Link two compiled stages. On failure the program is released and the
    /// error carries the linker log; the shaders stay owned by the caller.
    fn link_program(
        &mut self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
    ) -> Result<Self::Program, DeviceError>;
    fn delete_program(&mut self, program: Self::Program);
    fn use_program(&mut self, program: Option<&Self::Program>);

    fn uniform_location(
        &mut self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    fn attrib_location(&mut self, program: &Self::Program, name: &str) -> Option<u32>;

    fn uniform_mat4(&mut self, location: &Self::UniformLocation, value: &[f32; 16]);
    fn uniform_f32(&mut self, location: &Self::UniformLocation, value: f32);
    fn uniform_vec4(&mut self, location: &Self::UniformLocation, value: [f32; 4]);

    fn create_buffer(&mut self) -> Result<Self::Buffer, DeviceError>;
    fn delete_buffer(&mut self, buffer: Self::Buffer);
    fn bind_array_buffer(&mut self, buffer: Option<&Self::Buffer>);
    /// Replace the storage of the bound array buffer with `data`.
    fn array_buffer_data(&mut self, data: &[u8], usage: BufferUsage);

    fn enable_vertex_attrib(&mut self, location: u32);
    fn disable_vertex_attrib(&mut self, location: u32);
    /// Describe tightly or loosely packed `f32` components in the bound
    /// array buffer. `stride` and `offset` are in bytes.
    fn vertex_attrib_f32(&mut self, location: u32, components: i32, stride: i32, offset: i32);

    fn set_enabled(&mut self, capability: Capability, enabled: bool);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);

    fn draw_points(&mut self, first: i32, count: i32);
}
