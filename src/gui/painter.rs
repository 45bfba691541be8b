use egui::epaint::QuadraticBezierShape;
use egui::{Align2, Color32, FontId, Painter, Pos2, Shape, Stroke, StrokeKind, Vec2};

use mind_loom::graph_utils::graph::DashPattern;
use mind_loom::render::{DisplayList, DrawCommand, LineStroke};

fn stroke(s: &LineStroke) -> Stroke {
    Stroke::new(s.width, s.color)
}

fn polyline(painter: &Painter, points: Vec<Pos2>, s: &LineStroke) {
    if points.len() < 2 {
        return;
    }
    match s.dash {
        DashPattern::Solid => {
            painter.add(Shape::line(points, stroke(s)));
        }
        dash => {
            let (on, off) = dash.intervals().unwrap_or((6.0, 4.0));
            painter.extend(Shape::dashed_line(&points, stroke(s), on, off));
        }
    }
}

fn quadratic_points(from: Pos2, ctrl: Pos2, to: Pos2, segments: usize) -> Vec<Pos2> {
    (0..=segments)
        .map(|i| {
            let t = i as f32 / segments as f32;
            let u = 1.0 - t;
            Pos2::new(
                u * u * from.x + 2.0 * u * t * ctrl.x + t * t * to.x,
                u * u * from.y + 2.0 * u * t * ctrl.y + t * t * to.y,
            )
        })
        .collect()
}

/// Paints a display list into the canvas whose top-left corner is `origin`.
pub fn paint(painter: &Painter, origin: Pos2, list: &DisplayList) {
    let off = origin.to_vec2();
    let at = |p: Pos2| p + off;
    for cmd in &list.commands {
        match cmd {
            DrawCommand::Clear(color) => {
                let rect = egui::Rect::from_min_size(origin, Vec2::new(list.width, list.height));
                painter.rect_filled(rect, 0.0, *color);
            }
            DrawCommand::Line { points, stroke: s } => {
                polyline(painter, points.iter().map(|p| at(*p)).collect(), s);
            }
            DrawCommand::Quadratic { from, ctrl, to, stroke: s } => match s.dash {
                DashPattern::Solid => {
                    painter.add(QuadraticBezierShape::from_points_stroke(
                        [at(*from), at(*ctrl), at(*to)],
                        false,
                        Color32::TRANSPARENT,
                        stroke(s),
                    ));
                }
                _ => polyline(painter, quadratic_points(at(*from), at(*ctrl), at(*to), 24), s),
            },
            DrawCommand::Polygon { points, fill, stroke: s } => {
                let pts = points.iter().map(|p| at(*p)).collect();
                let outline = s.as_ref().map(stroke).unwrap_or(Stroke::NONE);
                painter.add(Shape::convex_polygon(pts, *fill, outline));
            }
            DrawCommand::Circle { center, radius, fill, stroke: s } => {
                if let Some(fill) = fill {
                    painter.circle_filled(at(*center), *radius, *fill);
                }
                if let Some(s) = s {
                    painter.circle_stroke(at(*center), *radius, stroke(s));
                }
            }
            DrawCommand::Rect { rect, fill, stroke: s } => {
                let r = rect.translate(off);
                if let Some(fill) = fill {
                    painter.rect_filled(r, 0.0, *fill);
                }
                if let Some(s) = s {
                    painter.rect_stroke(r, 0.0, stroke(s), StrokeKind::Inside);
                }
            }
            DrawCommand::Text { pos, text, size, color } => {
                painter.text(at(*pos), Align2::CENTER_TOP, text, FontId::proportional(*size), *color);
            }
        }
    }
}
