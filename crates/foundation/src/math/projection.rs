//! Web Mercator projection and the host projection capability.
//!
//! Mercator unit square: `x` runs 0..1 from 180°W to 180°E, `y` runs 0..1 from
//! the northern to the southern Mercator limit. The point-layer vertex shader
//! performs the same mapping on the GPU; keep the two in step.

use std::f64::consts::PI;

use super::vec::{LngLat, Vec2};

/// Latitude at which the Mercator square is cut off (degrees).
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Side of the zoom-0 world in screen pixels (MapLibre convention).
pub const TILE_SIZE_PX: f64 = 512.0;

/// Degrees to Mercator unit square.
///
/// Latitude is clamped to `±MAX_MERCATOR_LAT` so the poles stay finite.
pub fn lng_lat_to_mercator(p: LngLat) -> Vec2 {
    let lat = p.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = (p.lng + 180.0) / 360.0;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (PI / 4.0 + lat_rad / 2.0).tan().ln() / PI) / 2.0;
    Vec2::new(x, y)
}

/// Mercator unit square to degrees.
pub fn mercator_to_lng_lat(m: Vec2) -> LngLat {
    let lng = m.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * m.y)).sinh().atan().to_degrees();
    LngLat::new(lng, lat)
}

/// Geographic <-> screen pixel conversion supplied by the host map.
///
/// Screen pixels have their origin at the top-left corner, `y` pointing down.
pub trait Projection {
    fn project(&self, lng_lat: LngLat) -> Vec2;
    fn unproject(&self, screen: Vec2) -> LngLat;
}

impl<P: Projection + ?Sized> Projection for &P {
    fn project(&self, lng_lat: LngLat) -> Vec2 {
        (**self).project(lng_lat)
    }

    fn unproject(&self, screen: Vec2) -> LngLat {
        (**self).unproject(screen)
    }
}

/// Flat, unrotated Web Mercator camera.
///
/// Stands in for a host map: it answers `project`/`unproject` and produces
/// the per-frame matrix the point layer multiplies Mercator coordinates by.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MercatorViewport {
    pub center: LngLat,
    pub zoom: f64,
    pub width_px: f64,
    pub height_px: f64,
}

impl MercatorViewport {
    pub fn new(center: LngLat, zoom: f64, width_px: f64, height_px: f64) -> Self {
        Self {
            center,
            zoom,
            width_px,
            height_px,
        }
    }

    /// Size of the whole Mercator square in screen pixels at this zoom.
    pub fn world_size_px(&self) -> f64 {
        TILE_SIZE_PX * 2.0_f64.powf(self.zoom)
    }

    /// Column-major 4x4 matrix taking Mercator unit coordinates to clip space.
    pub fn matrix(&self) -> [f32; 16] {
        let world = self.world_size_px();
        let c = lng_lat_to_mercator(self.center);
        let sx = 2.0 * world / self.width_px.max(1.0);
        let sy = -2.0 * world / self.height_px.max(1.0);

        let mut m = [0.0_f32; 16];
        m[0] = sx as f32;
        m[5] = sy as f32;
        m[10] = 1.0;
        m[12] = (-sx * c.x) as f32;
        m[13] = (-sy * c.y) as f32;
        m[15] = 1.0;
        m
    }
}

impl Projection for MercatorViewport {
    fn project(&self, lng_lat: LngLat) -> Vec2 {
        let world = self.world_size_px();
        let m = lng_lat_to_mercator(lng_lat);
        let c = lng_lat_to_mercator(self.center);
        Vec2::new(
            (m.x - c.x) * world + self.width_px / 2.0,
            (m.y - c.y) * world + self.height_px / 2.0,
        )
    }

    fn unproject(&self, screen: Vec2) -> LngLat {
        let world = self.world_size_px();
        let c = lng_lat_to_mercator(self.center);
        mercator_to_lng_lat(Vec2::new(
            (screen.x - self.width_px / 2.0) / world + c.x,
            (screen.y - self.height_px / 2.0) / world + c.y,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MAX_MERCATOR_LAT, MercatorViewport, Projection, lng_lat_to_mercator, mercator_to_lng_lat,
    };
    use crate::math::{LngLat, Vec2};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn null_island_maps_to_square_center() {
        let m = lng_lat_to_mercator(LngLat::new(0.0, 0.0));
        assert_close(m.x, 0.5, 1e-12);
        assert_close(m.y, 0.5, 1e-12);
    }

    #[test]
    fn mercator_limits_map_to_square_edges() {
        let nw = lng_lat_to_mercator(LngLat::new(-180.0, MAX_MERCATOR_LAT));
        let se = lng_lat_to_mercator(LngLat::new(180.0, -MAX_MERCATOR_LAT));
        assert_close(nw.x, 0.0, 1e-12);
        assert_close(nw.y, 0.0, 1e-9);
        assert_close(se.x, 1.0, 1e-12);
        assert_close(se.y, 1.0, 1e-9);

        // Poles clamp instead of going infinite.
        assert!(lng_lat_to_mercator(LngLat::new(0.0, 90.0)).y.is_finite());
    }

    #[test]
    fn inverse_recovers_degrees() {
        let p = LngLat::new(-74.006, 40.7128);
        let back = mercator_to_lng_lat(lng_lat_to_mercator(p));
        assert_close(back.lng, p.lng, 1e-9);
        assert_close(back.lat, p.lat, 1e-9);
    }

    #[test]
    fn viewport_centre_projects_to_screen_centre() {
        let vp = MercatorViewport::new(LngLat::new(20.0, 20.0), 2.0, 800.0, 600.0);
        let s = vp.project(LngLat::new(20.0, 20.0));
        assert_close(s.x, 400.0, 1e-9);
        assert_close(s.y, 300.0, 1e-9);

        let g = vp.unproject(Vec2::new(400.0, 300.0));
        assert_close(g.lng, 20.0, 1e-9);
        assert_close(g.lat, 20.0, 1e-9);
    }

    #[test]
    fn north_is_up_on_screen() {
        let vp = MercatorViewport::new(LngLat::new(0.0, 0.0), 3.0, 512.0, 512.0);
        let north = vp.project(LngLat::new(0.0, 10.0));
        let east = vp.project(LngLat::new(10.0, 0.0));
        assert!(north.y < 256.0);
        assert!(east.x > 256.0);
    }

    #[test]
    fn matrix_agrees_with_screen_projection() {
        let vp = MercatorViewport::new(LngLat::new(10.0, 45.0), 4.0, 1024.0, 768.0);
        let m = vp.matrix();
        let p = LngLat::new(12.5, 44.0);
        let merc = lng_lat_to_mercator(p);

        let clip_x = f64::from(m[0]) * merc.x + f64::from(m[12]);
        let clip_y = f64::from(m[5]) * merc.y + f64::from(m[13]);

        let s = vp.project(p);
        assert_close(clip_x, s.x / 1024.0 * 2.0 - 1.0, 1e-4);
        assert_close(clip_y, 1.0 - s.y / 768.0 * 2.0, 1e-4);
    }
}
