use eframe::egui::{self, Key, PointerButton, Pos2, Rect, Ui};

use super::super::{DragTarget, ViewModel};

/// A node as currently laid out on screen.
#[derive(Clone, Copy)]
pub(super) struct ScreenNode {
    pub(super) position: Pos2,
    pub(super) radius: f32,
}

/// Topmost node under `pointer`. Later nodes are drawn over earlier ones.
pub(super) fn node_at(pointer: Option<Pos2>, screen: &[ScreenNode]) -> Option<usize> {
    let pointer = pointer?;
    screen
        .iter()
        .enumerate()
        .rev()
        .find(|(_, node)| node.position.distance(pointer) <= node.radius.max(4.0))
        .map(|(index, _)| index)
}

impl ViewModel {
    pub(super) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.session.view_mut().zoom_about(rect.min, pointer, factor);
    }

    /// Primary drag moves the node it started on, or pans when it started on
    /// empty canvas. Secondary and middle drags always pan.
    pub(super) fn handle_graph_drag(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        screen: &[ScreenNode],
    ) {
        if response.drag_started_by(PointerButton::Primary) {
            let press = ui.input(|input| input.pointer.press_origin());
            let target = node_at(press, screen)
                .and_then(|index| self.session.graph().nodes().get(index))
                .map(|node| node.id.clone());
            self.drag = match target {
                Some(id) if self.session.begin_drag(&id) => Some(DragTarget::Node(id)),
                _ => Some(DragTarget::Canvas),
            };
        }

        if response.dragged_by(PointerButton::Primary) {
            match &self.drag {
                Some(DragTarget::Node(id)) => {
                    if let Some(pointer) = response.interact_pointer_pos() {
                        let world = self.session.view().screen_to_world(rect.min, pointer);
                        self.session.update_drag(id, world);
                    }
                }
                Some(DragTarget::Canvas) => self.session.view_mut().pan_by(response.drag_delta()),
                None => {}
            }
        } else if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.session.view_mut().pan_by(response.drag_delta());
        }

        if response.drag_stopped() {
            if let Some(DragTarget::Node(id)) = self.drag.take() {
                self.session.end_drag(&id);
            }
        }
    }

    pub(super) fn handle_graph_click(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        if response.clicked_by(PointerButton::Primary) {
            let id = hovered
                .and_then(|index| self.session.graph().nodes().get(index))
                .map(|node| node.id.clone());
            self.session.select_node(id.as_deref());
        }

        if ui.input(|input| input.key_pressed(Key::Escape)) {
            self.session.clear_selection();
        }
    }
}
