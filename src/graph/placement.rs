use eframe::egui::{Vec2, vec2};
use rand::Rng;

use super::model::Node;

const GRID_ORIGIN: f32 = 80.0;
const MIN_CELL: f32 = 160.0;
const JITTER: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridShape {
    pub cols: usize,
    pub rows: usize,
    pub cell: Vec2,
}

impl GridShape {
    /// Top-left corner of the cell a node at `index` is assigned to.
    pub fn cell_origin(&self, index: usize) -> Vec2 {
        let row = index / self.cols;
        let col = index % self.cols;
        vec2(
            GRID_ORIGIN + col as f32 * self.cell.x,
            GRID_ORIGIN + row as f32 * self.cell.y,
        )
    }
}

/// Near-square grid for `count` nodes on a `canvas`-sized area.
pub fn grid_shape(count: usize, canvas: Vec2) -> GridShape {
    let cols = ((count as f64).sqrt().floor() as usize).max(1);
    let rows = count.div_ceil(cols);
    let cell = vec2(
        (canvas.x / (cols as f32 + 0.5)).max(MIN_CELL),
        (canvas.y / (rows as f32 + 0.5)).max(MIN_CELL),
    );
    GridShape { cols, rows, cell }
}

/// Spreads nodes over a coarse grid so the simulation never starts from overlap.
pub fn place(nodes: &mut [Node], canvas: Vec2) {
    place_with_rng(nodes, canvas, &mut rand::thread_rng());
}

pub fn place_with_rng<R: Rng>(nodes: &mut [Node], canvas: Vec2, rng: &mut R) {
    let shape = grid_shape(nodes.len(), canvas);
    for (index, node) in nodes.iter_mut().enumerate() {
        let jitter = vec2(rng.gen_range(0.0..JITTER), rng.gen_range(0.0..JITTER));
        node.position = shape.cell_origin(index) + jitter;
        node.velocity = Vec2::ZERO;
        node.pinned = None;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn nodes(count: usize) -> Vec<Node> {
        (0..count).map(|index| Node::new(format!("n{index}"))).collect()
    }

    #[test]
    fn nine_nodes_form_three_by_three() {
        let shape = grid_shape(9, vec2(1200.0, 700.0));
        assert_eq!((shape.cols, shape.rows), (3, 3));
    }

    #[test]
    fn cells_are_at_least_min_size() {
        let shape = grid_shape(100, vec2(300.0, 200.0));
        assert!(shape.cell.x >= MIN_CELL && shape.cell.y >= MIN_CELL);
    }

    #[test]
    fn zero_and_one_node_do_not_divide_by_zero() {
        let empty = grid_shape(0, vec2(800.0, 600.0));
        assert_eq!((empty.cols, empty.rows), (1, 0));

        let mut single = nodes(1);
        place_with_rng(&mut single, vec2(800.0, 600.0), &mut StdRng::seed_from_u64(1));
        assert!(single[0].position.x.is_finite() && single[0].position.y.is_finite());
    }

    #[test]
    fn every_node_lands_inside_its_cell() {
        let canvas = vec2(1200.0, 700.0);
        let mut placed = nodes(9);
        for node in &mut placed {
            node.velocity = vec2(3.0, -2.0);
            node.pinned = Some(Vec2::ZERO);
        }

        place_with_rng(&mut placed, canvas, &mut StdRng::seed_from_u64(7));

        let shape = grid_shape(9, canvas);
        for (index, node) in placed.iter().enumerate() {
            let origin = shape.cell_origin(index);
            let offset = node.position - origin;
            assert!(offset.x >= 0.0 && offset.x <= JITTER, "node {index} x offset {offset:?}");
            assert!(offset.y >= 0.0 && offset.y <= JITTER, "node {index} y offset {offset:?}");
            assert_eq!(node.velocity, Vec2::ZERO);
            assert!(node.pinned.is_none());
        }
    }
}
