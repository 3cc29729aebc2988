use eframe::egui::{Align2, Color32, Pos2, Rect, Stroke};

/// Minimal set of primitives the tree painter needs from a backend.
pub trait DrawingSurface {
    /// Quadratic curve from `from` to `to` bent towards `control`.
    fn curve(&mut self, from: Pos2, control: Pos2, to: Pos2, stroke: Stroke);
    fn dashed_line(&mut self, from: Pos2, to: Pos2, stroke: Stroke, dash: f32, gap: f32);
    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke);
    fn rect(&mut self, rect: Rect, fill: Color32);
    fn polygon(&mut self, points: Vec<Pos2>, fill: Color32);
    fn text(&mut self, anchor: Pos2, align: Align2, text: &str, size: f32, color: Color32);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Curve {
        from: Pos2,
        control: Pos2,
        to: Pos2,
        stroke: Stroke,
    },
    DashedLine {
        from: Pos2,
        to: Pos2,
        stroke: Stroke,
        dash: f32,
        gap: f32,
    },
    Circle {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
    Rect {
        rect: Rect,
        fill: Color32,
    },
    Polygon {
        points: Vec<Pos2>,
        fill: Color32,
    },
    Text {
        anchor: Pos2,
        align: Align2,
        text: String,
        size: f32,
        color: Color32,
    },
}

/// Retained display list. Painting into it records commands which can be
/// replayed onto any other surface as often as needed.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn replay(&self, target: &mut impl DrawingSurface) {
        for command in &self.commands {
            match command {
                DrawCommand::Curve {
                    from,
                    control,
                    to,
                    stroke,
                } => target.curve(*from, *control, *to, *stroke),
                DrawCommand::DashedLine {
                    from,
                    to,
                    stroke,
                    dash,
                    gap,
                } => target.dashed_line(*from, *to, *stroke, *dash, *gap),
                DrawCommand::Circle {
                    center,
                    radius,
                    fill,
                    stroke,
                } => target.circle(*center, *radius, *fill, *stroke),
                DrawCommand::Rect { rect, fill } => target.rect(*rect, *fill),
                DrawCommand::Polygon { points, fill } => target.polygon(points.clone(), *fill),
                DrawCommand::Text {
                    anchor,
                    align,
                    text,
                    size,
                    color,
                } => target.text(*anchor, *align, text, *size, *color),
            }
        }
    }
}

impl DrawingSurface for Scene {
    fn curve(&mut self, from: Pos2, control: Pos2, to: Pos2, stroke: Stroke) {
        self.commands.push(DrawCommand::Curve {
            from,
            control,
            to,
            stroke,
        });
    }

    fn dashed_line(&mut self, from: Pos2, to: Pos2, stroke: Stroke, dash: f32, gap: f32) {
        self.commands.push(DrawCommand::DashedLine {
            from,
            to,
            stroke,
            dash,
            gap,
        });
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            fill,
            stroke,
        });
    }

    fn rect(&mut self, rect: Rect, fill: Color32) {
        self.commands.push(DrawCommand::Rect { rect, fill });
    }

    fn polygon(&mut self, points: Vec<Pos2>, fill: Color32) {
        self.commands.push(DrawCommand::Polygon { points, fill });
    }

    fn text(&mut self, anchor: Pos2, align: Align2, text: &str, size: f32, color: Color32) {
        self.commands.push(DrawCommand::Text {
            anchor,
            align,
            text: text.to_owned(),
            size,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn replay_reproduces_commands() {
        let mut scene = Scene::default();
        scene.circle(pos2(1.0, 2.0), 3.0, Color32::RED, Stroke::NONE);
        scene.text(pos2(0.0, 0.0), Align2::CENTER_CENTER, "hi", 12.0, Color32::WHITE);

        let mut copy = Scene::default();
        scene.replay(&mut copy);
        assert_eq!(copy.commands(), scene.commands());
        assert_eq!(copy.texts().collect::<Vec<_>>(), vec!["hi"]);
    }
}
