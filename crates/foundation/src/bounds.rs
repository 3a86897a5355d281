/// Axis-aligned bounding box in 2D.
///
/// For geographic data `x` is longitude and `y` is latitude, both in degrees.
/// Bounds are closed: a box touching another on an edge intersects it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Zero-area box at a single point (`min == max`).
    pub fn from_point(x: f64, y: f64) -> Self {
        Aabb2 {
            min: [x, y],
            max: [x, y],
        }
    }

    /// Box centred on `(x, y)` extending `dx`/`dy` on each side.
    pub fn around(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        let dx = dx.abs();
        let dy = dy.abs();
        Aabb2 {
            min: [x - dx, y - dy],
            max: [x + dx, y + dy],
        }
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2 {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    pub fn center(&self, axis: usize) -> f64 {
        (self.min[axis] + self.max[axis]) * 0.5
    }
}
