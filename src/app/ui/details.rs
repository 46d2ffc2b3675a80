use eframe::egui::{self, RichText, Ui};
use threat_graph::graph::NeighborDirection;

use super::super::ViewModel;
use super::super::render_utils::category_color;

fn format_percent(value: f64) -> String {
    format!("{value:.3} %")
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Node Details");
        ui.add_space(6.0);

        let Some(details) = self.session.selected_details() else {
            ui.label("Click a node to inspect it.");
            return;
        };

        ui.label(RichText::new(details.title.as_str()).strong());
        ui.small(details.id.as_str());
        ui.add_space(6.0);

        egui::Grid::new("node_details_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Type");
                ui.label(RichText::new(details.category.as_str()).color(category_color(details.category)));
                ui.end_row();

                ui.label("Label");
                ui.label(details.label.as_deref().unwrap_or("-"));
                ui.end_row();

                ui.label("PageRank (static)");
                ui.label(format_percent(details.pr_percent));
                ui.end_row();

                ui.label("PageRank (temporal)");
                ui.label(format_percent(details.pr_temporal_percent));
                ui.end_row();

                ui.label("Last seen");
                ui.label(details.last_seen.as_deref().unwrap_or("-"));
                ui.end_row();
            });

        ui.separator();
        ui.label(RichText::new(format!("Neighbors ({})", details.neighbors.len())).strong());
        if details.neighbors.is_empty() {
            ui.label("No linked nodes.");
            return;
        }

        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("neighbors_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for neighbor in &details.neighbors {
                    ui.horizontal(|ui| {
                        let arrow = match neighbor.direction {
                            NeighborDirection::Outgoing => "->",
                            NeighborDirection::Incoming => "<-",
                        };
                        ui.monospace(arrow);
                        ui.label(
                            RichText::new(neighbor.category.as_str())
                                .small()
                                .color(category_color(neighbor.category)),
                        );
                        if ui
                            .link(neighbor.name.as_str())
                            .on_hover_text(neighbor.id.as_str())
                            .clicked()
                        {
                            picked = Some(neighbor.id.clone());
                        }
                    });
                }
            });

        if let Some(id) = picked {
            self.session.select_node(Some(&id));
        }
    }
}
