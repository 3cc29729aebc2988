use eframe::egui::{Pos2, Rect, Vec2, vec2};

const TOOLTIP_OFFSET: f32 = 14.0;

/// Screen geometry of one painted node, recorded in draw order.
#[derive(Clone, Debug, PartialEq)]
pub struct HitTarget {
    pub id: String,
    pub center: Pos2,
    pub radius: f32,
    pub tooltip: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorKind {
    #[default]
    Default,
    PointingHand,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoverState {
    pub target: Option<HitTarget>,
    pub cursor: CursorKind,
}

/// Nearest target whose center lies within `hit_radius` of `pointer`.
///
/// Targets are searched from the last drawn to the first, and only a strictly
/// closer candidate replaces an earlier find, so the topmost node wins ties.
pub fn hit_test(targets: &[HitTarget], pointer: Pos2, hit_radius: f32) -> Option<&HitTarget> {
    let mut best: Option<(&HitTarget, f32)> = None;
    for target in targets.iter().rev() {
        let distance = target.center.distance(pointer);
        if distance > hit_radius {
            continue;
        }
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((target, distance));
        }
    }
    best.map(|(target, _)| target)
}

pub fn hover(targets: &[HitTarget], pointer: Option<Pos2>, hit_radius: f32) -> HoverState {
    let target = pointer.and_then(|pointer| hit_test(targets, pointer, hit_radius));
    HoverState {
        cursor: if target.is_some() {
            CursorKind::PointingHand
        } else {
            CursorKind::Default
        },
        target: target.cloned(),
    }
}

/// Top-left corner for a tooltip of `size` near `pointer`, kept inside `container`.
pub fn place_tooltip(pointer: Pos2, size: Vec2, container: Rect) -> Pos2 {
    let mut position = pointer + vec2(TOOLTIP_OFFSET, TOOLTIP_OFFSET);

    if position.x + size.x > container.right() {
        position.x = pointer.x - TOOLTIP_OFFSET - size.x;
    }
    if position.y + size.y > container.bottom() {
        position.y = pointer.y - TOOLTIP_OFFSET - size.y;
    }

    position.x = position.x.min(container.right() - size.x).max(container.left());
    position.y = position.y.min(container.bottom() - size.y).max(container.top());
    position
}

/// Id to hand to the node-selection callback for a click at `pointer`.
///
/// A hit selects (or toggles) that node; a miss while something is selected
/// passes the current selection so the callback clears it.
pub fn click_target(
    targets: &[HitTarget],
    pointer: Pos2,
    hit_radius: f32,
    selected: Option<&str>,
) -> Option<String> {
    match hit_test(targets, pointer, hit_radius) {
        Some(target) => Some(target.id.clone()),
        None => selected.map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    fn target(id: &str, x: f32, y: f32) -> HitTarget {
        HitTarget {
            id: id.to_owned(),
            center: pos2(x, y),
            radius: 8.0,
            tooltip: id.to_owned(),
        }
    }

    #[test]
    fn hit_within_radius_only() {
        let targets = vec![target("n", 100.0, 100.0)];
        assert_eq!(
            hit_test(&targets, pos2(103.0, 100.0), 16.0).map(|t| t.id.as_str()),
            Some("n")
        );
        assert!(hit_test(&targets, pos2(120.0, 100.0), 16.0).is_none());
    }

    #[test]
    fn nearest_wins_and_topmost_breaks_ties() {
        let targets = vec![
            target("bottom", 100.0, 100.0),
            target("top", 100.0, 100.0),
            target("near", 110.0, 100.0),
        ];
        let hit = hit_test(&targets, pos2(101.0, 100.0), 16.0).unwrap();
        assert_eq!(hit.id, "top");

        let hit = hit_test(&targets, pos2(109.0, 100.0), 16.0).unwrap();
        assert_eq!(hit.id, "near");
    }

    #[test]
    fn click_on_empty_space_clears_selection() {
        let targets = vec![target("n", 10.0, 10.0)];
        assert_eq!(
            click_target(&targets, pos2(10.0, 12.0), 16.0, None),
            Some("n".to_owned())
        );
        assert_eq!(
            click_target(&targets, pos2(200.0, 200.0), 16.0, Some("other")),
            Some("other".to_owned())
        );
        assert_eq!(click_target(&targets, pos2(200.0, 200.0), 16.0, None), None);
    }

    #[test]
    fn hover_sets_cursor() {
        let targets = vec![target("n", 10.0, 10.0)];
        let state = hover(&targets, Some(pos2(11.0, 10.0)), 16.0);
        assert_eq!(state.cursor, CursorKind::PointingHand);
        assert_eq!(state.target.map(|t| t.id), Some("n".to_owned()));
        assert_eq!(hover(&targets, None, 16.0), HoverState::default());
    }

    #[test]
    fn tooltip_stays_inside_container() {
        let container = Rect::from_min_max(pos2(0.0, 0.0), pos2(300.0, 200.0));
        let size = vec2(120.0, 60.0);

        assert_eq!(place_tooltip(pos2(10.0, 10.0), size, container), pos2(24.0, 24.0));

        let flipped = place_tooltip(pos2(290.0, 190.0), size, container);
        assert_eq!(flipped, pos2(156.0, 116.0));

        let huge = place_tooltip(pos2(150.0, 100.0), vec2(400.0, 400.0), container);
        assert_eq!(huge, pos2(0.0, 0.0));
    }
}
