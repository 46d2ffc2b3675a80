use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use super::super::ViewModel;
use super::super::render_utils::{
    LABEL_COLOR, LINK_COLOR, SELECTED_COLOR, category_color, circle_visible, dim_color,
    draw_background, node_radius,
};
use super::interaction::{ScreenNode, node_at};

impl ViewModel {
    fn screen_nodes(&self, rect: egui::Rect) -> Vec<ScreenNode> {
        let view = self.session.view();
        let mode = self.session.mode();
        let graph = self.session.graph();
        let max_metric = graph.max_metric(mode);

        graph
            .nodes()
            .iter()
            .map(|node| ScreenNode {
                position: view.world_to_screen(rect.min, node.position),
                radius: node_radius(node.metric(mode), max_metric) * view.scale,
            })
            .collect()
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.canvas_rect = Some(rect);
        self.session.resize_canvas(rect.size());

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.session.view());

        if self.session.graph().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes at or above the current threshold.",
                FontId::proportional(14.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.handle_graph_zoom(ui, rect, &response);

        let before = self.screen_nodes(rect);
        let hovered = node_at(ui.input(|input| input.pointer.hover_pos()), &before);
        self.handle_graph_drag(ui, rect, &response, &before);
        self.handle_graph_click(ui, &response, hovered);

        if self.session.tick() || self.drag.is_some() {
            ui.ctx().request_repaint();
        }

        // Positions may have moved under the drag above.
        let screen = self.screen_nodes(rect);
        let view = self.session.view();
        let mode = self.session.mode();
        let graph = self.session.graph();
        let highlight = self.session.highlight();

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let link_width = (1.2 * view.scale.sqrt()).clamp(0.5, 3.0);
        for (link_index, &(source, target)) in graph.edges().iter().enumerate() {
            let (Some(start), Some(end)) = (screen.get(source), screen.get(target)) else {
                continue;
            };
            let color = if highlight.link_dimmed(link_index) {
                dim_color(LINK_COLOR)
            } else {
                LINK_COLOR.gamma_multiply(0.6)
            };
            painter.line_segment([start.position, end.position], Stroke::new(link_width, color));
        }

        let font = FontId::proportional((10.0 * view.scale).clamp(6.0, 22.0));
        for (index, node) in graph.nodes().iter().enumerate() {
            let Some(at) = screen.get(index) else {
                continue;
            };
            if !circle_visible(rect, at.position, at.radius + 120.0) {
                continue;
            }

            let dimmed = highlight.node_dimmed(&node.id);
            let base = category_color(node.category);
            let fill = if dimmed { dim_color(base) } else { base };
            painter.circle_filled(at.position, at.radius, fill);

            let stroke = if highlight.is_selected(&node.id) {
                Stroke::new(2.5, SELECTED_COLOR)
            } else if hovered == Some(index) {
                Stroke::new(1.8, Color32::WHITE)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 23, 42, 200))
            };
            painter.circle_stroke(at.position, at.radius, stroke);

            let label_color = if highlight.label_dimmed(&node.id) {
                dim_color(LABEL_COLOR)
            } else {
                LABEL_COLOR
            };
            painter.text(
                view.world_to_screen(rect.min, node.position + vec2(8.0, 3.0)),
                Align2::LEFT_BOTTOM,
                node.display_name(),
                font.clone(),
                label_color,
            );
        }

        if let Some(node) = hovered.and_then(|index| graph.nodes().get(index)) {
            let hover_text = format!(
                "{}  |  {}  |  {:.3} %",
                node.display_name(),
                node.category.as_str(),
                node.metric(mode)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                hover_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
