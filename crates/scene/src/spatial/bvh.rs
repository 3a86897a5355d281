use foundation::bounds::Aabb2;
use foundation::math::precision::stable_total_cmp_f64;

/// A static, bulk-built bounding volume hierarchy over 2D boxes.
///
/// Items are addressed by their `u32` index into the caller's data. The tree
/// is never mutated after `build`; replacing the data means building a new
/// one.
///
/// Ordering contract:
/// - `query_aabb` returns indices in ascending order, independent of the
///   order items were supplied in.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
    items: Vec<Item>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bounds: Aabb2,
        start: usize,
        end: usize,
    },
    Internal {
        bounds: Aabb2,
        left: usize,
        right: usize,
    },
}

impl Node {
    fn bounds(&self) -> &Aabb2 {
        match self {
            Node::Leaf { bounds, .. } | Node::Internal { bounds, .. } => bounds,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Item {
    pub index: u32,
    pub bounds: Aabb2,
}

const LEAF_MAX: usize = 8;

impl Bvh {
    pub fn build(items: Vec<Item>) -> Self {
        let mut items = items;
        let mut nodes = Vec::with_capacity(2 * items.len() / LEAF_MAX + 1);
        if !items.is_empty() {
            let len = items.len();
            build_node(&mut nodes, &mut items, 0, len);
        }
        Self { nodes, items }
    }

    /// Index a flat `[x0, y0, x1, y1, ...]` buffer, one degenerate box per
    /// pair. A trailing unpaired value is ignored.
    ///
    /// Point indices must fit in `u32`; `PointLayer::set_data` caps point
    /// sets well below that.
    pub fn from_points(coords: &[f32]) -> Self {
        debug_assert!(coords.len() / 2 <= u32::MAX as usize, "too many points to index");
        let items = coords
            .chunks_exact(2)
            .enumerate()
            .map(|(i, xy)| Item {
                index: i as u32,
                bounds: Aabb2::from_point(f64::from(xy[0]), f64::from(xy[1])),
            })
            .collect();
        Self::build(items)
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bounds of everything in the tree, if anything.
    pub fn bounds(&self) -> Option<Aabb2> {
        self.nodes.first().map(|n| *n.bounds())
    }

    /// Query the BVH for items whose bounds intersect `query`.
    ///
    /// Returns indices in ascending order.
    pub fn query_aabb(&self, query: &Aabb2) -> Vec<u32> {
        let mut hits = Vec::new();
        self.query_aabb_into(query, &mut hits);
        hits
    }

    /// Like [`Bvh::query_aabb`], reusing `hits` (cleared first).
    pub fn query_aabb_into(&self, query: &Aabb2, hits: &mut Vec<u32>) {
        hits.clear();
        if self.nodes.is_empty() {
            return;
        }

        let mut stack: Vec<usize> = vec![0];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if !node.bounds().intersects(query) {
                continue;
            }
            match node {
                Node::Leaf { start, end, .. } => {
                    for item in &self.items[*start..*end] {
                        if item.bounds.intersects(query) {
                            hits.push(item.index);
                        }
                    }
                }
                Node::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        hits.sort_unstable();
    }
}

fn build_node(nodes: &mut Vec<Node>, items: &mut [Item], start: usize, end: usize) -> usize {
    let slice = &mut items[start..end];
    let bounds = bounds_for_items(slice);

    let idx = nodes.len();
    if slice.len() <= LEAF_MAX {
        nodes.push(Node::Leaf { bounds, start, end });
        return idx;
    }

    let axis = split_axis(&bounds);
    let mid = slice.len() / 2;

    // Median partition keeps construction at O(n) per level.
    slice.select_nth_unstable_by(mid, |a, b| {
        stable_total_cmp_f64(a.bounds.center(axis), b.bounds.center(axis))
            .then_with(|| a.index.cmp(&b.index))
    });

    // Placeholder; patched once both children exist.
    nodes.push(Node::Leaf {
        bounds,
        start,
        end: start,
    });

    let left = build_node(nodes, items, start, start + mid);
    let right = build_node(nodes, items, start + mid, end);

    nodes[idx] = Node::Internal {
        bounds,
        left,
        right,
    };
    idx
}

fn split_axis(bounds: &Aabb2) -> usize {
    // Deterministic tie-break: prefer X.
    if bounds.extent(0) >= bounds.extent(1) {
        0
    } else {
        1
    }
}

fn bounds_for_items(items: &[Item]) -> Aabb2 {
    let mut b = items[0].bounds;
    for item in &items[1..] {
        b = b.union(&item.bounds);
    }
    b
}

#[cfg(test)]
mod tests {
    use super::{Bvh, Item};
    use foundation::bounds::Aabb2;
    use pretty_assertions::assert_eq;

    fn grid(n: u32) -> Vec<f32> {
        let mut coords = Vec::new();
        for y in 0..n {
            for x in 0..n {
                coords.push(x as f32);
                coords.push(y as f32);
            }
        }
        coords
    }

    fn brute_force(coords: &[f32], q: &Aabb2) -> Vec<u32> {
        coords
            .chunks_exact(2)
            .enumerate()
            .filter(|(_, p)| Aabb2::from_point(f64::from(p[0]), f64::from(p[1])).intersects(q))
            .map(|(i, _)| i as u32)
            .collect()
    }

    #[test]
    fn query_returns_indices_in_ascending_order() {
        let items = vec![
            Item {
                index: 2,
                bounds: Aabb2::new([10.0, 0.0], [11.0, 1.0]),
            },
            Item {
                index: 1,
                bounds: Aabb2::new([0.0, 0.0], [1.0, 1.0]),
            },
            Item {
                index: 3,
                bounds: Aabb2::new([0.5, 0.5], [2.0, 2.0]),
            },
        ];
        let bvh = Bvh::build(items);

        let hits = bvh.query_aabb(&Aabb2::new([0.25, 0.25], [1.5, 1.5]));
        assert_eq!(hits, vec![1, 3]);
    }

    #[test]
    fn build_is_input_order_independent_for_results() {
        let a = vec![
            Item {
                index: 1,
                bounds: Aabb2::from_point(0.5, 0.5),
            },
            Item {
                index: 2,
                bounds: Aabb2::from_point(2.5, 0.5),
            },
            Item {
                index: 3,
                bounds: Aabb2::from_point(4.5, 0.5),
            },
        ];
        let mut b = a.clone();
        b.reverse();

        let q = Aabb2::new([1.5, 0.0], [4.5, 1.0]);
        let ha = Bvh::build(a).query_aabb(&q);
        let hb = Bvh::build(b).query_aabb(&q);
        assert_eq!(ha, hb);
        assert_eq!(ha, vec![2, 3]);
    }

    #[test]
    fn from_points_indexes_every_pair() {
        let coords = grid(20);
        let bvh = Bvh::from_points(&coords);
        assert_eq!(bvh.len(), 400);
        assert_eq!(bvh.bounds(), Some(Aabb2::new([0.0, 0.0], [19.0, 19.0])));
    }

    #[test]
    fn matches_linear_scan_on_a_grid() {
        let coords = grid(32);
        let bvh = Bvh::from_points(&coords);
        for q in [
            Aabb2::new([3.5, 3.5], [7.2, 9.0]),
            Aabb2::from_point(10.0, 10.0),
            Aabb2::new([-5.0, -5.0], [0.0, 0.0]),
            Aabb2::new([31.0, 0.0], [40.0, 31.0]),
            Aabb2::new([100.0, 100.0], [101.0, 101.0]),
        ] {
            assert_eq!(bvh.query_aabb(&q), brute_force(&coords, &q));
        }
    }

    #[test]
    fn duplicate_points_are_all_returned() {
        let coords = vec![5.0_f32; 2 * 50];
        let bvh = Bvh::from_points(&coords);
        let hits = bvh.query_aabb(&Aabb2::from_point(5.0, 5.0));
        assert_eq!(hits, (0..50).collect::<Vec<u32>>());
    }

    #[test]
    fn empty_tree_answers_nothing() {
        let bvh = Bvh::from_points(&[]);
        assert!(bvh.is_empty());
        assert_eq!(bvh.bounds(), None);
        assert!(bvh.query_aabb(&Aabb2::new([-180.0, -90.0], [180.0, 90.0])).is_empty());
    }

    #[test]
    fn query_into_reuses_buffer() {
        let bvh = Bvh::from_points(&[0.0, 0.0, 1.0, 1.0]);
        let mut hits = vec![99, 98];
        bvh.query_aabb_into(&Aabb2::from_point(1.0, 1.0), &mut hits);
        assert_eq!(hits, vec![1]);
    }
}
