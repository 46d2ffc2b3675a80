use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Axis-aligned square cell.
#[derive(Clone, Copy, Debug)]
pub(super) struct Cell {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Cell {
    /// Smallest padded square around every point, or `None` if any point
    /// is not finite or there are none.
    fn around(points: &[Vec2]) -> Option<Self> {
        if points.is_empty() || points.iter().any(|point| !(point.x.is_finite() && point.y.is_finite())) {
            return None;
        }

        let (min, max) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), &point| (min.min(point), max.max(point)),
        );
        let span = (max - min).max(Vec2::splat(1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span.max_elem() * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Quadrant index: bit 0 is east, bit 1 is south.
    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign = |bit: usize| if quadrant & bit == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(sign(1), sign(2)),
            half_extent: quarter,
        }
    }

    /// Squared gap between two cells; zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        dx * dx + dy * dy
    }
}

/// Quadtree over node positions. Every cell carries the centroid and count
/// of the nodes below it for the Barnes-Hut charge approximation, and the
/// largest collision radius below it so collision pairs can be pruned per
/// cell.
pub(super) struct QuadNode {
    pub(super) cell: Cell,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) max_radius: f32,
    /// Node indices; only populated on leaves.
    pub(super) indices: Vec<usize>,
    children: Vec<QuadNode>,
}

impl QuadNode {
    /// `radii` runs parallel to `positions`.
    pub(super) fn build(positions: &[Vec2], radii: &[f32]) -> Option<Self> {
        let cell = Cell::around(positions)?;
        let indices = (0..positions.len()).collect();
        Some(Self::grow(cell, indices, positions, radii, 0))
    }

    fn grow(cell: Cell, indices: Vec<usize>, positions: &[Vec2], radii: &[f32], depth: usize) -> Self {
        let mass = indices.len() as f32;
        let sum = indices
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index]);
        let max_radius = indices
            .iter()
            .map(|&index| radii.get(index).copied().unwrap_or(0.0))
            .fold(0.0_f32, f32::max);

        let mut node = Self {
            cell,
            center_of_mass: if mass > 0.0 { sum / mass } else { sum },
            mass,
            max_radius,
            indices,
            children: Vec::new(),
        };

        if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &node.indices {
            buckets[cell.quadrant_of(positions[index])].push(index);
        }

        // Everything in one quadrant: the points nearly coincide.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        node.children = buckets
            .into_iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(quadrant, bucket)| Self::grow(cell.quadrant(quadrant), bucket, positions, radii, depth + 1))
            .collect();
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(super) fn children(&self) -> &[QuadNode] {
        &self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_indices(node: &QuadNode, out: &mut Vec<usize>) {
        out.extend(&node.indices);
        for child in node.children() {
            leaf_indices(child, out);
        }
    }

    fn grid(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| vec2((index % 7) as f32 * 13.0, (index / 7) as f32 * 17.0))
            .collect()
    }

    #[test]
    fn every_point_ends_up_in_exactly_one_leaf() {
        let positions = grid(50);

        let tree = QuadNode::build(&positions, &[1.0; 50]).expect("finite positions");
        let mut seen = Vec::new();
        leaf_indices(&tree, &mut seen);
        seen.sort_unstable();

        assert_eq!(seen, (0..50).collect::<Vec<_>>());
        assert_eq!(tree.mass, 50.0);
        assert!(!tree.is_leaf());
    }

    #[test]
    fn cells_track_largest_radius_below_them() {
        let positions = grid(50);
        let mut radii = vec![2.0; 50];
        radii[49] = 11.0;

        let tree = QuadNode::build(&positions, &radii).expect("finite positions");

        assert_eq!(tree.max_radius, 11.0);
        for child in tree.children() {
            let mut below = Vec::new();
            leaf_indices(child, &mut below);
            let expected = if below.contains(&49) { 11.0 } else { 2.0 };
            assert_eq!(child.max_radius, expected);
        }
    }

    #[test]
    fn non_finite_positions_build_no_tree() {
        assert!(QuadNode::build(&[vec2(f32::NAN, 0.0)], &[1.0]).is_none());
        assert!(QuadNode::build(&[vec2(0.0, 0.0), vec2(f32::INFINITY, 1.0)], &[1.0, 1.0]).is_none());
        assert!(QuadNode::build(&[], &[]).is_none());
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 30];
        let tree = QuadNode::build(&positions, &[3.0; 30]).expect("finite positions");
        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 30);
    }

    #[test]
    fn quadrants_split_the_parent_cell() {
        let cell = Cell {
            center: vec2(0.0, 0.0),
            half_extent: 4.0,
        };

        assert_eq!(cell.quadrant_of(vec2(-1.0, -1.0)), 0);
        assert_eq!(cell.quadrant_of(vec2(1.0, -1.0)), 1);
        assert_eq!(cell.quadrant_of(vec2(-1.0, 1.0)), 2);
        assert_eq!(cell.quadrant(3).center, vec2(2.0, 2.0));
        assert_eq!(cell.quadrant(0).center, vec2(-2.0, -2.0));
        assert_eq!(cell.quadrant(1).half_extent, 2.0);
    }
}
