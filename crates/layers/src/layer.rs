use gpu::DeviceContext;

use crate::error::LayerError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;
}

/// What a frame did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// One draw call covering `count` points.
    Drawn { count: usize },
    /// The layer holds no device resources.
    SkippedUnbound,
    /// No points to draw.
    SkippedEmpty,
}

/// A layer the host drives through its own GL context.
///
/// The host calls `on_add` once its context exists, `render` once per frame
/// with that frame's projection matrix, and `on_remove` when the layer leaves
/// the map. Frames never overlap.
pub trait CustomLayer<D: DeviceContext>: Layer {
    fn on_add(&mut self, ctx: &mut D) -> Result<(), LayerError>;
    fn on_remove(&mut self, ctx: &mut D);
    fn render(&mut self, ctx: &mut D, matrix: &[f32; 16]) -> RenderOutcome;
}
