use foundation::bounds::Aabb2;
use foundation::math::{LngLat, Projection, Vec2};

use crate::spatial::Bvh;

/// Default hit radius around a click, in screen pixels.
pub const DEFAULT_PICK_RADIUS_PX: f64 = 12.0;

/// Geographic search box for a screen-space hit radius around `click`.
///
/// The radius is converted to degrees by unprojecting one offset along each
/// screen axis at the click location, so distortion is sampled there only.
pub fn pick_bounds<P>(projection: &P, click: LngLat, pixel_radius: f64) -> Aabb2
where
    P: Projection + ?Sized,
{
    let screen = projection.project(click);
    let east = projection.unproject(screen + Vec2::new(pixel_radius, 0.0));
    let south = projection.unproject(screen + Vec2::new(0.0, pixel_radius));

    let d_lng = east.lng - click.lng;
    let d_lat = south.lat - click.lat;
    Aabb2::around(click.lng, click.lat, d_lng, d_lat)
}

/// Nearest point to a click in screen space.
///
/// `coords` is the flat `[lng0, lat0, lng1, lat1, ...]` buffer `index` was
/// built from. Returns the point index, or `None` when nothing lies within
/// `pixel_radius` pixels.
///
/// Ordering contract:
/// - Candidates are visited in ascending index order and only a strictly
///   smaller distance replaces the current best, so equidistant points
///   resolve to the lowest index.
pub fn find_nearest<P>(
    projection: &P,
    coords: &[f32],
    index: Option<&Bvh>,
    click: LngLat,
    pixel_radius: f64,
) -> Option<usize>
where
    P: Projection + ?Sized,
{
    let index = index?;
    if coords.len() < 2 || index.is_empty() {
        return None;
    }
    debug_assert_eq!(index.len(), coords.len() / 2, "index out of step with coordinates");
    if !(pixel_radius >= 0.0) || !pixel_radius.is_finite() {
        return None;
    }

    let query = pick_bounds(projection, click, pixel_radius);
    let candidates = index.query_aabb(&query);
    if candidates.is_empty() {
        return None;
    }

    let click_px = projection.project(click);
    let mut best: Option<(usize, f64)> = None;
    for i in candidates {
        let i = i as usize;
        let Some(pair) = coords.get(2 * i..2 * i + 2) else {
            continue;
        };
        let p = projection.project(LngLat::new(f64::from(pair[0]), f64::from(pair[1])));
        let d2 = p.distance_squared(click_px);
        match best {
            Some((_, bd)) if d2 >= bd => {}
            _ => best = Some((i, d2)),
        }
    }

    let (i, d2) = best?;
    (d2 <= pixel_radius * pixel_radius).then_some(i)
}
