use gpu::BlendFactor;
use serde::{Deserialize, Serialize};

/// Default point diameter in pixels.
pub const DEFAULT_POINT_SIZE_PX: f32 = 10.0;
/// Default fill, a light blue at 90% alpha.
pub const DEFAULT_FILL: [f32; 4] = [0.537, 0.706, 0.980, 0.9];
/// Default stroke, a dark near-black.
pub const DEFAULT_STROKE: [f32; 4] = [0.118, 0.118, 0.180, 1.0];
/// Default stroke width in pixels.
pub const DEFAULT_STROKE_WIDTH_PX: f32 = 1.5;

/// How overlapping points combine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Ordinary transparency.
    #[default]
    Normal,
    /// Overlaps brighten; useful for density views.
    Additive,
}

impl BlendMode {
    /// Source and destination factors for this mode.
    pub fn factors(self) -> (BlendFactor, BlendFactor) {
        match self {
            BlendMode::Normal => (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
            BlendMode::Additive => (BlendFactor::SrcAlpha, BlendFactor::One),
        }
    }
}

/// User-facing point layer configuration. Every field is optional.
///
/// JSON form uses camelCase keys:
/// `{"pointSize": 8, "color": [1, 0, 0, 1], "blendMode": "additive"}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PointLayerOptions {
    pub point_size: Option<f32>,
    pub color: Option<[f32; 4]>,
    pub stroke_color: Option<[f32; 4]>,
    pub stroke_width: Option<f32>,
    pub blend_mode: Option<BlendMode>,
}

impl PointLayerOptions {
    pub fn from_json_str(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn resolve(&self) -> PointStyle {
        PointStyle::new(
            self.point_size.unwrap_or(DEFAULT_POINT_SIZE_PX),
            self.color.unwrap_or(DEFAULT_FILL),
            self.stroke_color.unwrap_or(DEFAULT_STROKE),
            self.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH_PX),
            self.blend_mode.unwrap_or_default(),
        )
    }
}

/// Resolved, immutable point style.
///
/// The stroke width is stored as a fraction of the point radius, the unit the
/// fragment shader works in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointStyle {
    point_size: f32,
    color: [f32; 4],
    stroke_color: [f32; 4],
    stroke_width_frac: f32,
    blend_mode: BlendMode,
}

impl PointStyle {
    pub fn new(
        point_size: f32,
        color: [f32; 4],
        stroke_color: [f32; 4],
        stroke_width_px: f32,
        blend_mode: BlendMode,
    ) -> Self {
        Self {
            point_size,
            color,
            stroke_color,
            stroke_width_frac: stroke_fraction(stroke_width_px, point_size),
            blend_mode,
        }
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn stroke_color(&self) -> [f32; 4] {
        self.stroke_color
    }

    pub fn stroke_width_frac(&self) -> f32 {
        self.stroke_width_frac
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }
}

impl Default for PointStyle {
    fn default() -> Self {
        PointLayerOptions::default().resolve()
    }
}

fn stroke_fraction(stroke_width_px: f32, point_size: f32) -> f32 {
    if !(point_size > 0.0) {
        return 1.0;
    }
    ((stroke_width_px * 2.0) / point_size).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::{BlendMode, DEFAULT_FILL, PointLayerOptions, PointStyle};
    use gpu::BlendFactor;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let style = PointStyle::default();
        assert_eq!(style.point_size(), 10.0);
        assert_eq!(style.color(), DEFAULT_FILL);
        assert_eq!(style.stroke_width_frac(), 0.3);
        assert_eq!(style.blend_mode(), BlendMode::Normal);
    }

    #[test]
    fn stroke_fraction_is_clamped() {
        let thick = PointStyle::new(4.0, [1.0; 4], [0.0; 4], 10.0, BlendMode::Normal);
        assert_eq!(thick.stroke_width_frac(), 1.0);

        let degenerate = PointStyle::new(0.0, [1.0; 4], [0.0; 4], 1.5, BlendMode::Normal);
        assert_eq!(degenerate.stroke_width_frac(), 1.0);

        let none = PointStyle::new(10.0, [1.0; 4], [0.0; 4], 0.0, BlendMode::Normal);
        assert_eq!(none.stroke_width_frac(), 0.0);
    }

    #[test]
    fn parses_camel_case_json() {
        let opts = PointLayerOptions::from_json_str(
            r#"{"pointSize": 20, "strokeWidth": 2, "blendMode": "additive"}"#,
        )
        .expect("parse");
        assert_eq!(
            opts,
            PointLayerOptions {
                point_size: Some(20.0),
                stroke_width: Some(2.0),
                blend_mode: Some(BlendMode::Additive),
                ..PointLayerOptions::default()
            }
        );

        let style = opts.resolve();
        assert_eq!(style.stroke_width_frac(), 0.2);
        assert_eq!(style.color(), DEFAULT_FILL);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(PointLayerOptions::from_json_str(r#"{"radius": 3}"#).is_err());
    }

    #[test]
    fn blend_factors_per_mode() {
        assert_eq!(
            BlendMode::Normal.factors(),
            (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)
        );
        assert_eq!(
            BlendMode::Additive.factors(),
            (BlendFactor::SrcAlpha, BlendFactor::One)
        );
    }
}
