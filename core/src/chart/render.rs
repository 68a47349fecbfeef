// Rendering adapters: turn a computed frame into output for a surface
use crate::chart::frame::{ChartFrame, Rect};
use std::fmt::Write;
use std::time::Duration;

pub trait Renderer {
    type Output;

    fn render(&self, frame: &ChartFrame) -> Self::Output;
}

/// SVG markup renderer.
///
/// Renders bars at `elapsed` into their animation; `None` draws the final
/// state.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    pub elapsed: Option<Duration>,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(elapsed: Duration) -> Self {
        Self {
            elapsed: Some(elapsed),
        }
    }
}

impl Renderer for SvgRenderer {
    type Output = String;

    fn render(&self, frame: &ChartFrame) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" style="border: 1px solid black">"#,
            w = frame.width,
            h = frame.height
        );

        for bar in &frame.bars {
            let rect: Rect = match self.elapsed {
                Some(elapsed) => bar.at(elapsed),
                None => bar.rect,
            };
            let _ = writeln!(
                out,
                r#"  <rect class="bar" data-name="{}" data-value="{}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
                escape(&bar.name),
                bar.value,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                escape(&bar.fill)
            );
        }

        if let Some(tooltip) = &frame.tooltip {
            let _ = writeln!(
                out,
                r#"  <text class="tooltip" x="{:.2}" y="{:.2}">{}</text>"#,
                tooltip.x,
                tooltip.y,
                escape(&tooltip.text())
            );
        }

        if let Some(message) = &frame.message {
            let _ = writeln!(
                out,
                r#"  <text class="error" x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
                frame.width / 2.0,
                frame.height / 2.0,
                escape(message)
            );
        }

        out.push_str("</svg>\n");
        out
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
