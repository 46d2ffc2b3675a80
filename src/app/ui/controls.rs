use eframe::egui::{self, Key, RichText, Sense, Ui, vec2};
use threat_graph::graph::{Category, DisplayMode};

use super::super::ViewModel;
use super::super::render_utils::category_color;

impl ViewModel {
    pub(in crate::app) fn draw_controls(
        &mut self,
        ui: &mut Ui,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.small(format!("Data source: {}", self.source_label));
        let reload_button = ui
            .add_enabled(!is_loading, egui::Button::new("Generate graph"))
            .on_hover_text("Fetch the graph again from the data source.");
        if reload_button.clicked() {
            *reload_requested = true;
        }

        ui.separator();

        let mut filter_changed = false;
        ui.horizontal(|ui| {
            ui.label("Score:");
            filter_changed |= ui
                .selectable_value(&mut self.mode, DisplayMode::Static, "Static")
                .on_hover_text("Size, filter and rank nodes by pr_percent.")
                .changed();
            filter_changed |= ui
                .selectable_value(&mut self.mode, DisplayMode::Temporal, "Temporal")
                .on_hover_text("Size, filter and rank nodes by pr_temporal_percent.")
                .changed();
        });

        let threshold_slider = ui
            .add(
                egui::Slider::new(&mut self.threshold, 0.0..=100.0)
                    .step_by(0.1)
                    .fixed_decimals(1)
                    .text("Min score (%)"),
            )
            .on_hover_text("Hide nodes whose active score is below this value.");
        if threshold_slider.drag_stopped() || (threshold_slider.changed() && !threshold_slider.dragged()) {
            filter_changed = true;
        }

        if filter_changed {
            self.apply_filter();
        }

        ui.separator();

        ui.label("Search (exact id or label)");
        let mut run_search = false;
        ui.horizontal(|ui| {
            let response = ui.text_edit_singleline(&mut self.search);
            if response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
                run_search = true;
            }
            if ui.button("Search").clicked() {
                run_search = true;
            }
        });

        self.refresh_suggestions();
        let mut picked = None;
        if !self.suggestions.is_empty() {
            ui.indent("search_suggestions", |ui| {
                for name in &self.suggestions {
                    if ui.link(name).clicked() {
                        picked = Some(name.clone());
                    }
                }
            });
        }
        if let Some(name) = picked {
            self.search = name;
            run_search = true;
        }
        if run_search {
            self.run_search();
        }

        ui.separator();

        ui.horizontal_wrapped(|ui| {
            if ui.button("Reset view").clicked() {
                self.reset_view();
            }
            if ui
                .button("Organize")
                .on_hover_text("Lay out each connected component in rings around its top node.")
                .clicked()
            {
                self.organize();
            }
        });
        ui.horizontal_wrapped(|ui| {
            if ui.button("Export JSON").clicked() {
                self.export_json();
            }
            if ui.button("Export PNG").clicked() {
                let ctx = ui.ctx().clone();
                self.request_png(&ctx);
            }
        });

        ui.separator();
        ui.label(RichText::new("Legend").strong());
        for category in Category::LEGEND {
            ui.horizontal(|ui| {
                let (swatch, _) = ui.allocate_exact_size(vec2(14.0, 14.0), Sense::hover());
                ui.painter()
                    .circle_filled(swatch.center(), 5.5, category_color(category));
                ui.label(category.as_str());
            });
        }

        ui.separator();
        ui.label(RichText::new("Log").strong());
        egui::ScrollArea::vertical()
            .id_salt("status_log_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for line in self.status_lines() {
                    ui.small(line);
                }
            });
    }
}
