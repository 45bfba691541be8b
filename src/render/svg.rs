//! SVG backend for display lists (vector export).

use std::fmt::Write;

use egui::{Color32, Pos2};

use super::{DisplayList, DrawCommand, LineStroke};

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn rgb(c: Color32) -> String {
    let [r, g, b, _] = c.to_srgba_unmultiplied();
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

fn alpha(c: Color32) -> f32 {
    c.to_srgba_unmultiplied()[3] as f32 / 255.0
}

fn fill_attr(fill: Option<Color32>) -> String {
    match fill {
        Some(c) => format!(r#"fill="{}" fill-opacity="{:.3}""#, rgb(c), alpha(c)),
        None => r#"fill="none""#.to_string(),
    }
}

fn stroke_attr(stroke: Option<&LineStroke>) -> String {
    let Some(s) = stroke else {
        return String::new();
    };
    let mut out = format!(r#" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.2}""#, rgb(s.color), alpha(s.color), s.width);
    if let Some((dash, gap)) = s.dash.intervals() {
        let _ = write!(out, r#" stroke-dasharray="{} {}""#, dash, gap);
    }
    out
}

fn points_attr(points: &[Pos2]) -> String {
    points.iter().map(|p| format!("{:.2},{:.2}", p.x, p.y)).collect::<Vec<_>>().join(" ")
}

pub fn to_svg(list: &DisplayList) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = list.width,
        h = list.height
    );
    for cmd in &list.commands {
        let _ = match cmd {
            DrawCommand::Clear(c) => writeln!(out, r#"<rect x="0" y="0" width="100%" height="100%" {}/>"#, fill_attr(Some(*c))),
            DrawCommand::Line { points, stroke } => writeln!(
                out,
                r#"<polyline points="{}" fill="none"{}/>"#,
                points_attr(points),
                stroke_attr(Some(stroke))
            ),
            DrawCommand::Quadratic { from, ctrl, to, stroke } => writeln!(
                out,
                r#"<path d="M {:.2} {:.2} Q {:.2} {:.2} {:.2} {:.2}" fill="none"{}/>"#,
                from.x,
                from.y,
                ctrl.x,
                ctrl.y,
                to.x,
                to.y,
                stroke_attr(Some(stroke))
            ),
            DrawCommand::Polygon { points, fill, stroke } => writeln!(
                out,
                r#"<polygon points="{}" {}{}/>"#,
                points_attr(points),
                fill_attr(Some(*fill)),
                stroke_attr(stroke.as_ref())
            ),
            DrawCommand::Circle { center, radius, fill, stroke } => writeln!(
                out,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" {}{}/>"#,
                center.x,
                center.y,
                radius,
                fill_attr(*fill),
                stroke_attr(stroke.as_ref())
            ),
            DrawCommand::Rect { rect, fill, stroke } => writeln!(
                out,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" {}{}/>"#,
                rect.min.x,
                rect.min.y,
                rect.width(),
                rect.height(),
                fill_attr(*fill),
                stroke_attr(stroke.as_ref())
            ),
            DrawCommand::Text { pos, text, size, color } => {
                writeln!(
                    out,
                    r#"<text x="{:.2}" y="{:.2}" font-size="{:.1}" font-family="sans-serif" text-anchor="middle" dominant-baseline="hanging" {}>{}</text>"#,
                    pos.x,
                    pos.y,
                    size,
                    fill_attr(Some(*color)),
                    escape(text)
                )
            }
        };
    }
    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::graph::DashPattern;

    #[test]
    fn writes_one_element_per_command_and_escapes_text() {
        let list = DisplayList {
            width: 200.0,
            height: 100.0,
            commands: vec![
                DrawCommand::Clear(Color32::BLACK),
                DrawCommand::Line {
                    points: vec![Pos2::new(0.0, 0.0), Pos2::new(10.0, 10.0)],
                    stroke: LineStroke { width: 1.0, color: Color32::WHITE, dash: DashPattern::Dashed },
                },
                DrawCommand::Text {
                    pos: Pos2::new(5.0, 5.0),
                    text: "a < b & c".into(),
                    size: 12.0,
                    color: Color32::WHITE,
                },
            ],
        };
        let svg = to_svg(&list);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("stroke-dasharray=\"8 4\""));
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains("#ffffff"));
    }
}
