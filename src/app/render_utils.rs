use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};
use threat_graph::graph::{Category, ViewTransform};

const MIN_NODE_RADIUS: f32 = 5.0;
const MAX_NODE_RADIUS: f32 = 28.0;

pub(super) const LINK_COLOR: Color32 = Color32::from_rgb(148, 163, 184);
pub(super) const LABEL_COLOR: Color32 = Color32::from_gray(226);
pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

pub(super) fn category_color(category: Category) -> Color32 {
    match category {
        Category::Domain => Color32::from_rgb(0x3B, 0x82, 0xF6),
        Category::Ip => Color32::from_rgb(0x06, 0xB6, 0xD4),
        Category::Cert => Color32::from_rgb(0xF5, 0x9E, 0x0B),
        Category::Hash => Color32::from_rgb(0xEF, 0x44, 0x44),
        Category::Other => Color32::from_rgb(0x6B, 0x72, 0x80),
    }
}

/// Faded variant used for dimmed nodes, links and labels.
pub(super) fn dim_color(color: Color32) -> Color32 {
    color.gamma_multiply(0.15)
}

/// Square-root scale of `metric` over `[0, max_metric]` into the node radius range.
pub(super) fn node_radius(metric: f64, max_metric: f64) -> f32 {
    let max_metric = if max_metric > 0.0 { max_metric } else { 1.0 };
    let t = (metric.max(0.0) / max_metric).sqrt().clamp(0.0, 1.0) as f32;
    MIN_NODE_RADIUS + t * (MAX_NODE_RADIUS - MIN_NODE_RADIUS)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, view: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(15, 23, 42));

    let step = (60.0 * view.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + view.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(51, 65, 85, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}
