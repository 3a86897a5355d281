//! Shader program construction.

use tracing::debug;

use crate::context::{DeviceContext, DeviceError, ShaderStage};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShaderSource<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// Compile both stages and link them.
///
/// Any compile or link failure is returned with the device log; nothing is
/// retried and no device object outlives the failure. Stage objects are
/// released once the program is linked.
pub fn build_program<D>(ctx: &mut D, source: ShaderSource<'_>) -> Result<D::Program, DeviceError>
where
    D: DeviceContext + ?Sized,
{
    let vertex = ctx.compile_shader(ShaderStage::Vertex, source.vertex)?;
    let fragment = match ctx.compile_shader(ShaderStage::Fragment, source.fragment) {
        Ok(s) => s,
        Err(e) => {
            ctx.delete_shader(vertex);
            return Err(e);
        }
    };

    let linked = ctx.link_program(&vertex, &fragment);
    ctx.delete_shader(vertex);
    ctx.delete_shader(fragment);

    let program = linked?;
    debug!("shader program linked");
    Ok(program)
}

/// Look up a uniform that the layer cannot work without.
pub fn require_uniform<D>(
    ctx: &mut D,
    program: &D::Program,
    name: &'static str,
) -> Result<D::UniformLocation, DeviceError>
where
    D: DeviceContext + ?Sized,
{
    ctx.uniform_location(program, name)
        .ok_or(DeviceError::MissingUniform(name))
}

/// Look up a vertex attribute that the layer cannot work without.
pub fn require_attribute<D>(
    ctx: &mut D,
    program: &D::Program,
    name: &'static str,
) -> Result<u32, DeviceError>
where
    D: DeviceContext + ?Sized,
{
    ctx.attrib_location(program, name)
        .ok_or(DeviceError::MissingAttribute(name))
}
