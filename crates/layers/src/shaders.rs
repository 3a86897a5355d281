//! GLSL ES 1.00 sources for the point layer.
//!
//! Uniform and attribute names here are looked up by name at bind time; the
//! `A_*` and `U_*` constants are the single source for those strings on the
//! Rust side.

pub const A_POS: &str = "a_pos";
pub const U_MATRIX: &str = "u_matrix";
pub const U_POINT_SIZE: &str = "u_point_size";
pub const U_COLOR: &str = "u_color";
pub const U_STROKE_COLOR: &str = "u_stroke_color";
pub const U_STROKE_WIDTH_FRAC: &str = "u_stroke_width_frac";

/// Degrees -> Mercator unit square -> host matrix.
///
/// Must agree with `foundation::math::lng_lat_to_mercator`.
pub const POINT_VERTEX: &str = r#"
precision highp float;

attribute vec2 a_pos;
uniform mat4 u_matrix;
uniform float u_point_size;

const float PI = 3.141592653589793;

vec2 mercator(vec2 lng_lat) {
    float x = (lng_lat.x + 180.0) / 360.0;
    float phi = radians(lng_lat.y);
    float y = (1.0 - log(tan(PI / 4.0 + phi / 2.0)) / PI) / 2.0;
    return vec2(x, y);
}

void main() {
    gl_Position = u_matrix * vec4(mercator(a_pos), 0.0, 1.0);
    gl_PointSize = u_point_size;
}
"#;

/// Anti-aliased disc with a stroke ring.
///
/// `r` is 0 at the sprite centre and 1 at its edge. The fill occupies
/// `r < 1 - u_stroke_width_frac`; both boundaries fade with smoothstep.
pub const POINT_FRAGMENT: &str = r#"
precision mediump float;

uniform vec4 u_color;
uniform vec4 u_stroke_color;
uniform float u_stroke_width_frac;

void main() {
    float r = 2.0 * length(gl_PointCoord - vec2(0.5));
    if (r > 1.0) {
        discard;
    }

    float ring_start = 1.0 - u_stroke_width_frac;
    if (r > ring_start) {
        float across = (r - ring_start) / max(u_stroke_width_frac, 0.001);
        float fade = 1.0 - smoothstep(0.8, 1.0, across);
        gl_FragColor = vec4(u_stroke_color.rgb, u_stroke_color.a * fade);
    } else {
        float toward_ring = r / max(ring_start, 0.001);
        float fade = 1.0 - smoothstep(0.75, 1.0, toward_ring);
        gl_FragColor = vec4(u_color.rgb, u_color.a * fade);
    }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_appears_in_its_stage() {
        for name in [A_POS, U_MATRIX, U_POINT_SIZE] {
            assert!(POINT_VERTEX.contains(name), "{name} missing from vertex stage");
        }
        for name in [U_COLOR, U_STROKE_COLOR, U_STROKE_WIDTH_FRAC] {
            assert!(POINT_FRAGMENT.contains(name), "{name} missing from fragment stage");
        }
    }

    #[test]
    fn fragment_stage_discards_outside_disc() {
        assert!(POINT_FRAGMENT.contains("discard"));
        assert!(POINT_FRAGMENT.contains("smoothstep"));
    }
}
