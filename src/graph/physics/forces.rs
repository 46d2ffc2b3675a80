use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

/// Distance below which charge stops growing.
const CHARGE_DISTANCE_MIN_SQ: f32 = 1.0;

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Signed strength already scaled by the current alpha; negative repels.
    pub(super) strength: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
}

/// Deterministic unit direction for coincident pairs.
pub(super) fn separation_direction(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Pseudo offset from `point` towards `other`, antisymmetric in the pair.
fn pair_direction(point: usize, other: usize) -> Vec2 {
    if point < other {
        separation_direction(point, other)
    } else {
        -separation_direction(other, point)
    }
}

fn charge_between(point: Vec2, other: Vec2, weight: f32, params: ChargeParams, fallback: Vec2) -> Vec2 {
    let mut delta = other - point;
    if delta.length_sq() <= f32::EPSILON {
        delta = fallback * 1e-3;
    }
    let distance_sq = delta.length_sq().max(CHARGE_DISTANCE_MIN_SQ);
    delta * (params.strength * weight / distance_sq)
}

/// Adds the charge acting on `index` to `velocity`, approximating distant
/// cells by their centroid.
pub(super) fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            *velocity += charge_between(
                point,
                positions[other],
                1.0,
                params,
                pair_direction(index, other),
            );
        }
        return;
    }

    let distance = (node.center_of_mass - point).length().max(1e-3);
    let far_enough = !node.cell.contains(point) && node.cell.side_length() / distance < params.theta;
    if far_enough {
        *velocity += charge_between(
            point,
            node.center_of_mass,
            node.mass,
            params,
            separation_direction(index, index + 1),
        );
        return;
    }

    for child in node.children() {
        accumulate_charge(child, index, positions, params, velocity);
    }
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let mut offset = positions[from] - positions[to];
    let mut distance_sq = offset.length_sq();
    if distance_sq >= reach * reach {
        return;
    }

    if distance_sq <= f32::EPSILON {
        offset = separation_direction(from, to) * 1e-3;
        distance_sq = offset.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = offset * ((reach - distance) / distance * params.strength);
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = if from_sq + to_sq > 0.0 {
        to_sq / (from_sq + to_sq)
    } else {
        0.5
    };

    deltas[from] += push * share;
    deltas[to] -= push * (1.0 - share);
}

/// Visits every pair of overlapping circles once, pruning cell pairs that
/// are farther apart than the largest radii inside them can bridge.
pub(super) fn accumulate_collisions(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let reach = node_a.max_radius + node_b.max_radius;
    if node_a.cell.gap_sq(node_b.cell) > reach * reach {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    resolve_overlap(from, to, positions, radii, params, deltas);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_overlap(from, to, positions, radii, params, deltas);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children();
        for (first, child_a) in children.iter().enumerate() {
            accumulate_collisions(child_a, child_a, true, positions, radii, params, deltas);
            for child_b in &children[first + 1..] {
                accumulate_collisions(child_a, child_b, false, positions, radii, params, deltas);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.cell.half_extent >= node_b.cell.half_extent
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collisions(child, node_b, false, positions, radii, params, deltas);
        }
    } else {
        for child in node_b.children() {
            accumulate_collisions(node_a, child, false, positions, radii, params, deltas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_circle_reaches_across_cells() {
        let mut positions = (0..12).map(|index| vec2(index as f32 * 10.0, 0.0)).collect::<Vec<_>>();
        positions.push(vec2(200.0, 0.0));
        positions.push(vec2(260.0, 0.0));
        let mut radii = vec![1.0; 14];
        radii[13] = 70.0;

        let tree = QuadNode::build(&positions, &radii).expect("finite positions");
        assert!(!tree.is_leaf());
        let mut deltas = vec![Vec2::ZERO; positions.len()];
        accumulate_collisions(
            &tree,
            &tree,
            true,
            &positions,
            &radii,
            CollisionParams { strength: 1.0 },
            &mut deltas,
        );

        assert!(deltas[12].x < 0.0, "{:?}", deltas[12]);
        assert!(deltas[13].x > 0.0, "{:?}", deltas[13]);
        assert!(deltas[..12].iter().all(|delta| *delta == Vec2::ZERO));
    }

    #[test]
    fn charge_repels_under_negative_strength() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadNode::build(&positions, &[1.0, 1.0]).expect("finite positions");
        let params = ChargeParams {
            strength: -50.0,
            theta: 0.9,
        };

        let mut velocity = Vec2::ZERO;
        accumulate_charge(&tree, 0, &positions, params, &mut velocity);

        assert!(velocity.x < 0.0);
        assert_eq!(velocity.y, 0.0);
    }
}
