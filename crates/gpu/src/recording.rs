//! Headless device that records every call.
//!
//! Used by tests and the CLI in place of a real GL context. It tracks live
//! objects and fixed-function state the way a driver would, so callers can
//! assert on leaks and on the state left behind after a frame. Uniform and
//! attribute lookups succeed only for names that appear in the linked
//! sources, which catches shader/layer name drift.

use std::collections::{BTreeMap, BTreeSet};

use crate::context::{
    BlendFactor, BufferUsage, Capability, DeviceContext, DeviceError, ShaderStage,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CompileShader { stage: ShaderStage, shader: ShaderId },
    DeleteShader(ShaderId),
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    UniformLocation { program: ProgramId, name: String },
    AttribLocation { program: ProgramId, name: String },
    UniformMat4 { location: UniformId, value: [f32; 16] },
    UniformF32 { location: UniformId, value: f32 },
    UniformVec4 { location: UniformId, value: [f32; 4] },
    CreateBuffer(BufferId),
    DeleteBuffer(BufferId),
    BindArrayBuffer(Option<BufferId>),
    ArrayBufferData {
        buffer: Option<BufferId>,
        len: usize,
        usage: BufferUsage,
    },
    EnableVertexAttrib(u32),
    DisableVertexAttrib(u32),
    VertexAttribF32 {
        location: u32,
        components: i32,
        stride: i32,
        offset: i32,
    },
    Enable(Capability),
    Disable(Capability),
    BlendFunc { src: BlendFactor, dst: BlendFactor },
    DrawPoints { first: i32, count: i32 },
}

#[derive(Debug)]
pub struct RecordingDevice {
    next_id: u32,
    commands: Vec<Command>,
    shaders: BTreeMap<ShaderId, String>,
    programs: BTreeMap<ProgramId, String>,
    buffers: BTreeMap<BufferId, Vec<u8>>,
    bound_buffer: Option<BufferId>,
    current_program: Option<ProgramId>,
    enabled: BTreeSet<Capability>,
    blend: Option<(BlendFactor, BlendFactor)>,
    enabled_attribs: BTreeSet<u32>,
    uniform_names: Vec<String>,
    attrib_names: Vec<String>,
    compile_failure: Option<(ShaderStage, String)>,
    link_failure: Option<String>,
    buffer_failure: Option<String>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    /// A fresh device in the state a 3D host leaves it: depth testing on,
    /// blending off.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            commands: Vec::new(),
            shaders: BTreeMap::new(),
            programs: BTreeMap::new(),
            buffers: BTreeMap::new(),
            bound_buffer: None,
            current_program: None,
            enabled: BTreeSet::from([Capability::DepthTest]),
            blend: None,
            enabled_attribs: BTreeSet::new(),
            uniform_names: Vec::new(),
            attrib_names: Vec::new(),
            compile_failure: None,
            link_failure: None,
            buffer_failure: None,
        }
    }

    /// Make the next compile of `stage` fail with `log`.
    pub fn fail_compile(&mut self, stage: ShaderStage, log: impl Into<String>) {
        self.compile_failure = Some((stage, log.into()));
    }

    /// Make the next link fail with `log`.
    pub fn fail_link(&mut self, log: impl Into<String>) {
        self.link_failure = Some(log.into());
    }

    /// Make the next buffer allocation fail with `reason`.
    pub fn fail_buffer_creation(&mut self, reason: impl Into<String>) {
        self.buffer_failure = Some(reason.into());
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// `(first, count)` of every point draw recorded so far.
    pub fn draw_calls(&self) -> Vec<(i32, i32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawPoints { first, count } => Some((*first, *count)),
                _ => None,
            })
            .collect()
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    pub fn blend_func_state(&self) -> Option<(BlendFactor, BlendFactor)> {
        self.blend
    }

    pub fn bound_array_buffer(&self) -> Option<BufferId> {
        self.bound_buffer
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    pub fn enabled_attribs(&self) -> impl Iterator<Item = u32> + '_ {
        self.enabled_attribs.iter().copied()
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn name_slot(names: &mut Vec<String>, name: &str) -> u32 {
        match names.iter().position(|n| n == name) {
            Some(i) => i as u32,
            None => {
                names.push(name.to_string());
                (names.len() - 1) as u32
            }
        }
    }
}

impl DeviceContext for RecordingDevice {
    type Shader = ShaderId;
    type Program = ProgramId;
    type Buffer = BufferId;
    type UniformLocation = UniformId;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, DeviceError> {
        let shader = ShaderId(self.alloc_id());
        self.commands.push(Command::CompileShader { stage, shader });

        if let Some((fail_stage, log)) = self.compile_failure.take() {
            if fail_stage == stage {
                self.commands.push(Command::DeleteShader(shader));
                return Err(DeviceError::Compile { stage, log });
            }
            self.compile_failure = Some((fail_stage, log));
        }

        self.shaders.insert(shader, source.to_string());
        Ok(shader)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.commands.push(Command::DeleteShader(shader));
        let removed = self.shaders.remove(&shader);
        debug_assert!(removed.is_some(), "delete of unknown shader {shader:?}");
    }

    fn link_program(&mut self, vertex: &ShaderId, fragment: &ShaderId) -> Result<ProgramId, DeviceError> {
        let program = ProgramId(self.alloc_id());
        self.commands.push(Command::LinkProgram(program));

        if let Some(log) = self.link_failure.take() {
            self.commands.push(Command::DeleteProgram(program));
            return Err(DeviceError::Link { log });
        }

        let combined = match (self.shaders.get(vertex), self.shaders.get(fragment)) {
            (Some(vs), Some(fs)) => Some(format!("{vs}\n{fs}")),
            _ => None,
        };
        let Some(combined) = combined else {
            self.commands.push(Command::DeleteProgram(program));
            return Err(DeviceError::Link {
                log: "attached shader is not compiled".to_string(),
            });
        };
        self.programs.insert(program, combined);
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.commands.push(Command::DeleteProgram(program));
        let removed = self.programs.remove(&program);
        debug_assert!(removed.is_some(), "delete of unknown program {program:?}");
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: Option<&ProgramId>) {
        self.commands.push(Command::UseProgram(program.copied()));
        self.current_program = program.copied();
    }

    fn uniform_location(&mut self, program: &ProgramId, name: &str) -> Option<UniformId> {
        self.commands.push(Command::UniformLocation {
            program: *program,
            name: name.to_string(),
        });
        let source = self.programs.get(program)?;
        if !source.contains(name) {
            return None;
        }
        Some(UniformId(Self::name_slot(&mut self.uniform_names, name)))
    }

    fn attrib_location(&mut self, program: &ProgramId, name: &str) -> Option<u32> {
        self.commands.push(Command::AttribLocation {
            program: *program,
            name: name.to_string(),
        });
        let source = self.programs.get(program)?;
        if !source.contains(name) {
            return None;
        }
        Some(Self::name_slot(&mut self.attrib_names, name))
    }

    fn uniform_mat4(&mut self, location: &UniformId, value: &[f32; 16]) {
        self.commands.push(Command::UniformMat4 {
            location: *location,
            value: *value,
        });
    }

    fn uniform_f32(&mut self, location: &UniformId, value: f32) {
        self.commands.push(Command::UniformF32 {
            location: *location,
            value,
        });
    }

    fn uniform_vec4(&mut self, location: &UniformId, value: [f32; 4]) {
        self.commands.push(Command::UniformVec4 {
            location: *location,
            value,
        });
    }

    fn create_buffer(&mut self) -> Result<BufferId, DeviceError> {
        if let Some(reason) = self.buffer_failure.take() {
            return Err(DeviceError::Allocation {
                what: "array buffer",
                reason,
            });
        }
        let buffer = BufferId(self.alloc_id());
        self.commands.push(Command::CreateBuffer(buffer));
        self.buffers.insert(buffer, Vec::new());
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.commands.push(Command::DeleteBuffer(buffer));
        let removed = self.buffers.remove(&buffer);
        debug_assert!(removed.is_some(), "delete of unknown buffer {buffer:?}");
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
    }

    fn bind_array_buffer(&mut self, buffer: Option<&BufferId>) {
        self.commands.push(Command::BindArrayBuffer(buffer.copied()));
        self.bound_buffer = buffer.copied();
    }

    fn array_buffer_data(&mut self, data: &[u8], usage: BufferUsage) {
        self.commands.push(Command::ArrayBufferData {
            buffer: self.bound_buffer,
            len: data.len(),
            usage,
        });
        debug_assert!(self.bound_buffer.is_some(), "buffer data with no array buffer bound");
        if let Some(storage) = self.bound_buffer.and_then(|b| self.buffers.get_mut(&b)) {
            storage.clear();
            storage.extend_from_slice(data);
        }
    }

    fn enable_vertex_attrib(&mut self, location: u32) {
        self.commands.push(Command::EnableVertexAttrib(location));
        self.enabled_attribs.insert(location);
    }

    fn disable_vertex_attrib(&mut self, location: u32) {
        self.commands.push(Command::DisableVertexAttrib(location));
        self.enabled_attribs.remove(&location);
    }

    fn vertex_attrib_f32(&mut self, location: u32, components: i32, stride: i32, offset: i32) {
        self.commands.push(Command::VertexAttribF32 {
            location,
            components,
            stride,
            offset,
        });
    }

    fn set_enabled(&mut self, capability: Capability, enabled: bool) {
        if enabled {
            self.commands.push(Command::Enable(capability));
            self.enabled.insert(capability);
        } else {
            self.commands.push(Command::Disable(capability));
            self.enabled.remove(&capability);
        }
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.commands.push(Command::BlendFunc { src, dst });
        self.blend = Some((src, dst));
    }

    fn draw_points(&mut self, first: i32, count: i32) {
        self.commands.push(Command::DrawPoints { first, count });
    }
}
