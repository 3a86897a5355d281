//! Coordinate buffer management.

use tracing::debug;

use crate::context::{BufferUsage, DeviceContext, DeviceError};

/// Flat `[x0, y0, x1, y1, ...]` coordinates plus the one device buffer that
/// mirrors them.
///
/// The CPU copy is authoritative. `replace` marks it dirty; `upload` copies it
/// to the device and clears the flag. The device buffer is created once per
/// attach and reused for every upload; the driver resizes its storage.
#[derive(Debug)]
pub struct CoordinateBuffer<B> {
    coords: Vec<f32>,
    dirty: bool,
    device: Option<B>,
}

impl<B> Default for CoordinateBuffer<B> {
    fn default() -> Self {
        Self {
            coords: Vec::new(),
            dirty: false,
            device: None,
        }
    }
}

impl<B> CoordinateBuffer<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new coordinate set. Last write wins; nothing is queued.
    pub fn replace(&mut self, coords: Vec<f32>) {
        self.coords = coords;
        self.dirty = true;
    }

    pub fn coords(&self) -> &[f32] {
        &self.coords
    }

    pub fn point_count(&self) -> usize {
        self.coords.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_attached(&self) -> bool {
        self.device.is_some()
    }

    pub fn device_buffer(&self) -> Option<&B> {
        self.device.as_ref()
    }

    /// Allocate the device buffer. Calling again while attached is a no-op.
    pub fn attach<D>(&mut self, ctx: &mut D) -> Result<(), DeviceError>
    where
        D: DeviceContext<Buffer = B> + ?Sized,
    {
        if self.device.is_none() {
            self.device = Some(ctx.create_buffer()?);
        }
        Ok(())
    }

    /// Copy the coordinates to the device if they changed.
    ///
    /// Returns `true` when an upload happened. Clean or detached buffers are
    /// left alone.
    pub fn upload<D>(&mut self, ctx: &mut D) -> bool
    where
        D: DeviceContext<Buffer = B> + ?Sized,
    {
        if !self.dirty {
            return false;
        }
        let Some(buffer) = self.device.as_ref() else {
            return false;
        };

        let bytes: &[u8] = bytemuck::cast_slice(&self.coords);
        ctx.bind_array_buffer(Some(buffer));
        ctx.array_buffer_data(bytes, BufferUsage::Dynamic);
        ctx.bind_array_buffer(None);
        self.dirty = false;

        debug!(
            points = self.point_count(),
            bytes = bytes.len(),
            "uploaded coordinate buffer"
        );
        true
    }

    /// Delete the device buffer. The CPU copy is kept and marked dirty so a
    /// later attach uploads it again. Returns `false` if nothing was attached.
    pub fn release<D>(&mut self, ctx: &mut D) -> bool
    where
        D: DeviceContext<Buffer = B> + ?Sized,
    {
        match self.device.take() {
            Some(buffer) => {
                ctx.delete_buffer(buffer);
                self.dirty = true;
                true
            }
            None => false,
        }
    }
}
