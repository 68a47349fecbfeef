// Render-ready chart geometry
use crate::chart::scale::{BandScale, LinearScale};
use crate::chart::ChartStatus;
use crate::config::ChartConfig;
use crate::sample::{max_value, Sample};
use serde::Serialize;
use std::time::Duration;

/// Tooltip offset from the pointer, in pixels
const TOOLTIP_OFFSET: (f64, f64) = (10.0, -28.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Grow-from-baseline animation of one bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarAnimation {
    pub delay: Duration,
    pub duration: Duration,
}

impl BarAnimation {
    /// Eased progress in `[0, 1]` after `elapsed`
    pub fn progress(&self, elapsed: Duration) -> f64 {
        let Some(running) = elapsed.checked_sub(self.delay) else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = (running.as_secs_f64() / self.duration.as_secs_f64()).min(1.0);
        ease_cubic_in_out(t)
    }

    pub fn end(&self) -> Duration {
        self.delay + self.duration
    }
}

fn ease_cubic_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub index: usize,
    pub name: String,
    pub value: f64,
    /// Final geometry
    pub rect: Rect,
    pub fill: String,
    pub hovered: bool,
    pub animation: BarAnimation,
    /// Pixel y of the value axis origin
    pub baseline: f64,
}

impl Bar {
    /// Geometry `elapsed` after the render started
    pub fn at(&self, elapsed: Duration) -> Rect {
        let height = self.rect.height * self.animation.progress(elapsed);
        Rect {
            x: self.rect.x,
            y: self.baseline - height,
            width: self.rect.width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub index: usize,
    pub label: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
}

impl Tooltip {
    pub fn text(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

/// Pointer currently over a bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Hover {
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub width: f64,
    pub height: f64,
    pub status: ChartStatus,
    pub message: Option<String>,
    pub bars: Vec<Bar>,
    pub tooltip: Option<Tooltip>,
    #[serde(skip)]
    pub value_scale: LinearScale,
    #[serde(skip)]
    pub band_scale: BandScale,
}

impl ChartFrame {
    pub(crate) fn layout(
        samples: &[Sample],
        config: &ChartConfig,
        hover: Option<Hover>,
        status: ChartStatus,
        message: Option<String>,
    ) -> Self {
        let band_scale = BandScale::new(
            samples.len(),
            0.0,
            config.width,
            config.padding_inner,
            config.padding_outer,
        );
        let max = max_value(samples).filter(|m| *m > 0.0).unwrap_or(1.0);
        let value_scale = LinearScale::new(0.0, max, config.height, 0.0);

        let duration = Duration::from_millis(config.duration_ms);
        let stagger = Duration::from_millis(config.stagger_ms);
        let hovered_index = hover.map(|h| h.index);

        let bars = samples
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                let top = value_scale
                    .map(sample.value.max(0.0))
                    .clamp(0.0, config.height);
                let hovered = hovered_index == Some(index);
                Bar {
                    index,
                    name: sample.name.clone(),
                    value: sample.value,
                    rect: Rect {
                        x: band_scale.band_start(index).unwrap_or(0.0),
                        y: top,
                        width: band_scale.band_width(),
                        height: config.height - top,
                    },
                    fill: if hovered {
                        config.hover_color.clone()
                    } else {
                        config.bar_color.clone()
                    },
                    hovered,
                    animation: BarAnimation {
                        delay: stagger * index as u32,
                        duration,
                    },
                    baseline: config.height,
                }
            })
            .collect();

        let tooltip = hover.and_then(|h| {
            samples.get(h.index).map(|s| Tooltip {
                index: h.index,
                label: s.name.clone(),
                value: s.value,
                x: h.x + TOOLTIP_OFFSET.0,
                y: h.y + TOOLTIP_OFFSET.1,
            })
        });

        Self {
            width: config.width,
            height: config.height,
            status,
            message,
            bars,
            tooltip,
            value_scale,
            band_scale,
        }
    }

    /// Time until every bar finished animating
    pub fn animation_end(&self) -> Duration {
        self.bars
            .iter()
            .map(|b| b.animation.end())
            .max()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(format!("c{}", i), *v))
            .collect()
    }

    fn layout(values: &[f64]) -> ChartFrame {
        ChartFrame::layout(
            &samples(values),
            &ChartConfig::default(),
            None,
            ChartStatus::Ready,
            None,
        )
    }

    #[test]
    fn max_value_reaches_top_and_zero_sits_on_baseline() {
        let frame = layout(&[12.0, 5.0, 6.0, 7.0, 10.0, 9.0]);
        assert_eq!(frame.value_scale.map(12.0), 0.0);
        assert_eq!(frame.value_scale.map(0.0), 500.0);
        assert_eq!(frame.bars[0].rect.y, 0.0);
        assert_eq!(frame.bars[0].rect.height, 500.0);
    }

    #[test]
    fn heights_are_monotone_in_value_and_bounded() {
        let values = [3.0, 0.0, 19.0, 7.5, 7.5, 1.0, 12.0, 0.25];
        let frame = layout(&values);
        for a in &frame.bars {
            assert!(a.rect.height >= 0.0 && a.rect.height <= frame.height);
            assert!((a.rect.y + a.rect.height - frame.height).abs() < 1e-9);
            for b in &frame.bars {
                if a.value <= b.value {
                    assert!(a.rect.height <= b.rect.height + 1e-9);
                }
            }
        }
    }

    #[test]
    fn band_positions_follow_input_order() {
        let frame = layout(&[5.0, 1.0, 9.0, 2.0]);
        let names: Vec<_> = frame.bars.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["c0", "c1", "c2", "c3"]);
        assert!(frame.bars.windows(2).all(|w| w[0].rect.x < w[1].rect.x));
    }

    #[test]
    fn all_zero_values_draw_flat_bars() {
        let frame = layout(&[0.0, 0.0]);
        assert!(frame.bars.iter().all(|b| b.rect.height == 0.0));
    }

    #[test]
    fn bars_grow_with_stagger() {
        let frame = layout(&[10.0, 10.0]);
        let config = ChartConfig::default();
        let first = &frame.bars[0];
        let second = &frame.bars[1];

        assert_eq!(first.at(Duration::ZERO).height, 0.0);
        assert_eq!(first.at(Duration::ZERO).y, config.height);

        let mid = Duration::from_millis(config.duration_ms / 2);
        let h1 = first.at(mid).height;
        let h2 = second.at(mid).height;
        assert!(h1 > 0.0 && h1 < first.rect.height);
        assert!(h2 < h1);

        assert_eq!(first.at(frame.animation_end()), first.rect);
        assert_eq!(second.at(frame.animation_end()), second.rect);
        assert_eq!(
            frame.animation_end(),
            Duration::from_millis(config.duration_ms + config.stagger_ms)
        );
    }

    #[test]
    fn hovered_bar_is_recolored_with_tooltip() {
        let config = ChartConfig::default();
        let frame = ChartFrame::layout(
            &samples(&[4.0, 8.0]),
            &config,
            Some(Hover {
                index: 1,
                x: 100.0,
                y: 200.0,
            }),
            ChartStatus::Ready,
            None,
        );
        assert_eq!(frame.bars[0].fill, config.bar_color);
        assert_eq!(frame.bars[1].fill, config.hover_color);
        let tooltip = frame.tooltip.unwrap();
        assert_eq!(tooltip.text(), "c1: 8");
        assert_eq!((tooltip.x, tooltip.y), (110.0, 172.0));
    }
}
