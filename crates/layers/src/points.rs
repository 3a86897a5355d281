use std::fmt;

use foundation::math::{LngLat, Projection};
use gpu::{Capability, CoordinateBuffer, DeviceContext, ShaderSource};
use scene::picking::{self, DEFAULT_PICK_RADIUS_PX};
use scene::spatial::Bvh;
use tracing::{debug, trace, warn};

use crate::error::LayerError;
use crate::layer::{CustomLayer, Layer, LayerId, RenderOutcome};
use crate::shaders;
use crate::symbology::{PointLayerOptions, PointStyle};

/// Largest point set one layer accepts; the draw call counts in `i32`.
pub const MAX_POINTS: usize = i32::MAX as usize;

/// Where a layer is in its device lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerState {
    Unbound,
    Bound,
    Released,
}

/// Every location the frame loop touches, resolved once at bind.
struct PointLocations<D: DeviceContext> {
    u_matrix: D::UniformLocation,
    u_point_size: D::UniformLocation,
    u_color: D::UniformLocation,
    u_stroke_color: D::UniformLocation,
    u_stroke_width_frac: D::UniformLocation,
    a_pos: u32,
}

impl<D: DeviceContext> PointLocations<D> {
    fn find(ctx: &mut D, program: &D::Program) -> Result<Self, gpu::DeviceError> {
        Ok(Self {
            u_matrix: gpu::require_uniform(ctx, program, shaders::U_MATRIX)?,
            u_point_size: gpu::require_uniform(ctx, program, shaders::U_POINT_SIZE)?,
            u_color: gpu::require_uniform(ctx, program, shaders::U_COLOR)?,
            u_stroke_color: gpu::require_uniform(ctx, program, shaders::U_STROKE_COLOR)?,
            u_stroke_width_frac: gpu::require_uniform(
                ctx,
                program,
                shaders::U_STROKE_WIDTH_FRAC,
            )?,
            a_pos: gpu::require_attribute(ctx, program, shaders::A_POS)?,
        })
    }
}

struct PointProgram<D: DeviceContext> {
    program: D::Program,
    loc: PointLocations<D>,
}

impl<D: DeviceContext> PointProgram<D> {
    fn build(ctx: &mut D) -> Result<Self, LayerError> {
        let program = gpu::build_program(
            ctx,
            ShaderSource {
                vertex: shaders::POINT_VERTEX,
                fragment: shaders::POINT_FRAGMENT,
            },
        )?;

        match PointLocations::find(ctx, &program) {
            Ok(loc) => Ok(Self { program, loc }),
            Err(e) => {
                ctx.delete_program(program);
                Err(e.into())
            }
        }
    }
}

enum Lifecycle<D: DeviceContext> {
    Unbound,
    Bound(PointProgram<D>),
    Released,
}

/// Draws a flat `[lng0, lat0, lng1, lat1, ...]` buffer as anti-aliased discs
/// in a single draw call, and answers nearest-point queries against it.
///
/// `set_data` replaces the coordinates and the spatial index together, so a
/// query never sees an index built from older data. Device work happens only
/// while bound; data set earlier is uploaded on bind.
pub struct PointLayer<D: DeviceContext> {
    id: LayerId,
    style: PointStyle,
    buffer: CoordinateBuffer<D::Buffer>,
    index: Option<Bvh>,
    lifecycle: Lifecycle<D>,
}

impl<D: DeviceContext> PointLayer<D> {
    pub fn new(id: u64, style: PointStyle) -> Self {
        Self {
            id: LayerId(id),
            style,
            buffer: CoordinateBuffer::new(),
            index: None,
            lifecycle: Lifecycle::Unbound,
        }
    }

    pub fn with_options(id: u64, options: &PointLayerOptions) -> Self {
        Self::new(id, options.resolve())
    }

    pub fn style(&self) -> &PointStyle {
        &self.style
    }

    pub fn state(&self) -> LayerState {
        match self.lifecycle {
            Lifecycle::Unbound => LayerState::Unbound,
            Lifecycle::Bound(_) => LayerState::Bound,
            Lifecycle::Released => LayerState::Released,
        }
    }

    pub fn point_count(&self) -> usize {
        self.buffer.point_count()
    }

    pub fn coords(&self) -> &[f32] {
        self.buffer.coords()
    }

    /// True when the coordinates changed since the last device upload.
    pub fn is_dirty(&self) -> bool {
        self.buffer.is_dirty()
    }

    /// Number of points in the spatial index (0 before any data).
    pub fn indexed_count(&self) -> usize {
        self.index.as_ref().map_or(0, Bvh::len)
    }

    /// Replace every point.
    ///
    /// Rebuilds the spatial index before returning. An odd-length buffer is
    /// rejected and leaves the current data untouched, as is a set larger
    /// than [`MAX_POINTS`].
    pub fn set_data(&mut self, coords: Vec<f32>) -> Result<(), LayerError> {
        check_coordinate_len(coords.len())?;

        let index = Bvh::from_points(&coords);
        self.buffer.replace(coords);
        self.index = Some(index);

        debug!(
            layer = self.id.0,
            points = self.point_count(),
            "point data replaced, index rebuilt"
        );
        Ok(())
    }

    /// Compile the program, cache locations and allocate the coordinate
    /// buffer. Pending data is uploaded right away.
    pub fn bind(&mut self, ctx: &mut D) -> Result<(), LayerError> {
        if matches!(self.lifecycle, Lifecycle::Bound(_)) {
            return Err(LayerError::AlreadyBound);
        }

        let program = PointProgram::build(ctx)?;
        if let Err(e) = self.buffer.attach(ctx) {
            ctx.delete_program(program.program);
            return Err(e.into());
        }
        self.lifecycle = Lifecycle::Bound(program);
        debug!(layer = self.id.0, "point layer bound");

        self.buffer.upload(ctx);
        Ok(())
    }

    /// Release the program and buffer.
    ///
    /// Releasing a layer that is not bound is a caller error: it panics in
    /// debug builds and is ignored otherwise.
    pub fn unbind(&mut self, ctx: &mut D) {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Released) {
            Lifecycle::Bound(program) => {
                ctx.delete_program(program.program);
                self.buffer.release(ctx);
                debug!(layer = self.id.0, "point layer released");
            }
            previous => {
                let state = match previous {
                    Lifecycle::Unbound => LayerState::Unbound,
                    _ => LayerState::Released,
                };
                self.lifecycle = previous;
                if cfg!(debug_assertions) {
                    panic!("unbind of point layer in state {state:?}");
                }
                warn!(layer = self.id.0, ?state, "ignoring unbind of unbound point layer");
            }
        }
    }

    /// Copy pending coordinates to the device now instead of on the next
    /// frame. Returns `true` if an upload happened.
    pub fn upload(&mut self, ctx: &mut D) -> bool {
        match self.lifecycle {
            Lifecycle::Bound(_) => self.buffer.upload(ctx),
            _ => false,
        }
    }

    /// Draw every point with one call, leaving blend, depth, buffer and
    /// attribute state as the host had it.
    pub fn render(&mut self, ctx: &mut D, matrix: &[f32; 16]) -> RenderOutcome {
        let Lifecycle::Bound(p) = &self.lifecycle else {
            trace!(layer = self.id.0, "render skipped: not bound");
            return RenderOutcome::SkippedUnbound;
        };
        // An emptied set still reaches the device so stale bytes are dropped.
        if self.buffer.is_dirty() {
            self.buffer.upload(ctx);
        }
        if self.buffer.is_empty() {
            trace!(layer = self.id.0, "render skipped: no points");
            return RenderOutcome::SkippedEmpty;
        }

        let style = &self.style;
        ctx.use_program(Some(&p.program));
        ctx.uniform_mat4(&p.loc.u_matrix, matrix);
        ctx.uniform_f32(&p.loc.u_point_size, style.point_size());
        ctx.uniform_vec4(&p.loc.u_color, style.color());
        ctx.uniform_vec4(&p.loc.u_stroke_color, style.stroke_color());
        ctx.uniform_f32(&p.loc.u_stroke_width_frac, style.stroke_width_frac());

        ctx.bind_array_buffer(self.buffer.device_buffer());
        ctx.enable_vertex_attrib(p.loc.a_pos);
        ctx.vertex_attrib_f32(p.loc.a_pos, 2, 0, 0);

        let (src, dst) = style.blend_mode().factors();
        ctx.set_enabled(Capability::DepthTest, false);
        ctx.set_enabled(Capability::Blend, true);
        ctx.blend_func(src, dst);

        let count = self.buffer.point_count();
        // set_data keeps count within MAX_POINTS.
        ctx.draw_points(0, count as i32);

        ctx.disable_vertex_attrib(p.loc.a_pos);
        ctx.bind_array_buffer(None);
        ctx.set_enabled(Capability::Blend, false);
        ctx.set_enabled(Capability::DepthTest, true);

        RenderOutcome::Drawn { count }
    }

    /// Index of the point nearest to `click` within `pixel_radius` screen
    /// pixels, or `None`.
    pub fn find_nearest<P>(&self, projection: &P, click: LngLat, pixel_radius: f64) -> Option<usize>
    where
        P: Projection + ?Sized,
    {
        picking::find_nearest(
            projection,
            self.buffer.coords(),
            self.index.as_ref(),
            click,
            pixel_radius,
        )
    }

    /// [`PointLayer::find_nearest`] with the default 12 px radius.
    pub fn find_nearest_default<P>(&self, projection: &P, click: LngLat) -> Option<usize>
    where
        P: Projection + ?Sized,
    {
        self.find_nearest(projection, click, DEFAULT_PICK_RADIUS_PX)
    }
}

fn check_coordinate_len(len: usize) -> Result<(), LayerError> {
    if len % 2 != 0 {
        return Err(LayerError::OddCoordinateLength(len));
    }
    let count = len / 2;
    if count > MAX_POINTS {
        return Err(LayerError::TooManyPoints {
            count,
            max: MAX_POINTS,
        });
    }
    Ok(())
}

impl<D: DeviceContext> Layer for PointLayer<D> {
    fn id(&self) -> LayerId {
        self.id
    }
}

impl<D: DeviceContext> CustomLayer<D> for PointLayer<D> {
    fn on_add(&mut self, ctx: &mut D) -> Result<(), LayerError> {
        self.bind(ctx)
    }

    fn on_remove(&mut self, ctx: &mut D) {
        self.unbind(ctx);
    }

    fn render(&mut self, ctx: &mut D, matrix: &[f32; 16]) -> RenderOutcome {
        PointLayer::render(self, ctx, matrix)
    }
}

impl<D: DeviceContext> fmt::Debug for PointLayer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointLayer")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("points", &self.point_count())
            .field("dirty", &self.is_dirty())
            .field("style", &self.style)
            .finish()
    }
}

impl<D: DeviceContext> Drop for PointLayer<D> {
    fn drop(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Bound(_)) {
            warn!(layer = self.id.0, "point layer dropped while bound; device objects leaked");
        }
    }
}
