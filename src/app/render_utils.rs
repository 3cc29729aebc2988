use eframe::egui::epaint::QuadraticBezierShape;
use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};

use propagation_view::tree::DrawingSurface;

/// Replays tree drawing commands onto an egui painter, shifted by `offset`.
pub(super) struct PainterSurface<'a> {
    painter: &'a Painter,
    offset: Vec2,
}

impl<'a> PainterSurface<'a> {
    pub(super) fn new(painter: &'a Painter, origin: Pos2) -> Self {
        Self {
            painter,
            offset: origin.to_vec2(),
        }
    }
}

impl DrawingSurface for PainterSurface<'_> {
    fn curve(&mut self, from: Pos2, control: Pos2, to: Pos2, stroke: Stroke) {
        self.painter.add(QuadraticBezierShape::from_points_stroke(
            [from + self.offset, control + self.offset, to + self.offset],
            false,
            Color32::TRANSPARENT,
            stroke,
        ));
    }

    fn dashed_line(&mut self, from: Pos2, to: Pos2, stroke: Stroke, dash: f32, gap: f32) {
        self.painter.extend(Shape::dashed_line(
            &[from + self.offset, to + self.offset],
            stroke,
            dash,
            gap,
        ));
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        self.painter
            .circle(center + self.offset, radius, fill, stroke);
    }

    fn rect(&mut self, rect: Rect, fill: Color32) {
        self.painter
            .rect_filled(rect.translate(self.offset), 0.0, fill);
    }

    fn polygon(&mut self, points: Vec<Pos2>, fill: Color32) {
        let points = points.into_iter().map(|point| point + self.offset).collect();
        self.painter
            .add(Shape::convex_polygon(points, fill, Stroke::NONE));
    }

    fn text(&mut self, anchor: Pos2, align: Align2, text: &str, size: f32, color: Color32) {
        self.painter.text(
            anchor + self.offset,
            align,
            text,
            FontId::proportional(size),
            color,
        );
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = 56.0;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 40));

    let mut x = rect.left() + step;
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + step;
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}
