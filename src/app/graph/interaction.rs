use eframe::egui::{Color32, CursorIcon, FontId, Pos2, Rect, Stroke, StrokeKind, Ui, vec2};

use propagation_view::tree::{CursorKind, HoverState, place_tooltip};

use super::super::ViewModel;

const TOOLTIP_PADDING: f32 = 6.0;

impl ViewModel {
    /// Paints the tooltip for the hovered node, kept inside the visible part of `rect`.
    pub(in crate::app) fn draw_hover(&self, ui: &Ui, rect: Rect, hover: &HoverState) {
        if hover.cursor == CursorKind::PointingHand {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }

        let Some(target) = &hover.target else {
            return;
        };
        let Some(pointer) = ui.input(|input| input.pointer.hover_pos()) else {
            return;
        };

        let painter = ui.painter_at(ui.clip_rect());
        let galley = painter.layout_no_wrap(
            target.tooltip.clone(),
            FontId::proportional(12.0),
            Color32::from_gray(235),
        );
        let size = galley.size() + vec2(TOOLTIP_PADDING * 2.0, TOOLTIP_PADDING * 2.0);
        let container = ui.clip_rect().intersect(rect);
        let origin = place_tooltip(pointer, size, container);

        let frame = Rect::from_min_size(origin, size);
        painter.rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(24, 28, 36, 235));
        painter.rect_stroke(
            frame,
            4.0,
            Stroke::new(1.0, Color32::from_gray(80)),
            StrokeKind::Inside,
        );
        painter.galley(
            origin + vec2(TOOLTIP_PADDING, TOOLTIP_PADDING),
            galley,
            Color32::from_gray(235),
        );
    }

    /// `pointer` is in tree-surface coordinates.
    pub(in crate::app) fn handle_tree_click(&mut self, pointer: Pos2) {
        let selected = self.selected_node.clone();
        let mut clicked = None;
        self.tree
            .click(pointer, selected.as_deref(), |id| clicked = Some(id.to_owned()));
        if let Some(id) = clicked {
            self.toggle_node(&id);
        }
    }
}
