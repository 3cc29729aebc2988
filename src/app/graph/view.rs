use eframe::egui::{self, Sense, Ui, vec2};

use propagation_view::tree::RenderRequest;

use super::super::ViewModel;
use super::super::render_utils::{PainterSurface, draw_background};

impl ViewModel {
    pub(in crate::app) fn draw_tree(&mut self, ui: &mut Ui) {
        let Some(contract_id) = self.selected_contract.clone() else {
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                ui.label("Select a contract to show its subscription tree.");
            });
            return;
        };
        if !self.snapshot.contracts.contains_key(&contract_id) {
            ui.label("Selected contract no longer exists in the snapshot.");
            return;
        }

        let visible = ui.available_size();
        let now = ui.input(|input| input.time) * 1000.0;

        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let width = self.tree.content_width().max(visible.x);
                let height = self.tree.content_height().max(visible.y);
                let (rect, response) =
                    ui.allocate_exact_size(vec2(width, height), Sense::click());
                let painter = ui.painter_at(rect);
                draw_background(&painter, rect);

                // Hit targets live in surface coordinates, relative to `rect`.
                let pointer = response
                    .hover_pos()
                    .map(|position| (position - rect.min).to_pos2());
                let hover = self.tree.hover(pointer);
                self.hovered_node = hover.target.as_ref().map(|target| target.id.clone());

                let Some(telemetry) = self.snapshot.contracts.get(&contract_id) else {
                    return;
                };
                let request = RenderRequest {
                    contract_id: &contract_id,
                    telemetry,
                    topology: &self.snapshot.topology,
                    surface_size: visible,
                    selected: self.selected_node.as_deref(),
                    hovered: self.hovered_node.as_deref(),
                    highlighted: &self.highlighted,
                    names: &self.snapshot.names,
                    self_id: self.self_id.as_deref(),
                };
                let outcome = self.tree.render(&request, now);
                if outcome.request_tick {
                    ui.ctx().request_repaint();
                }

                let mut surface = PainterSurface::new(&painter, rect.min);
                self.tree.scene().replay(&mut surface);

                self.draw_hover(ui, rect, &hover);

                if response.clicked()
                    && let Some(pointer) = pointer
                {
                    self.handle_tree_click(pointer);
                }
            });
    }
}
