//! Pie and bar charts of a [`MetricSet`], rendered to SVG.
//!
//! plotters is built without a TrueType backend, so text extents are estimated
//! and no system fonts are needed. The browser draws the actual glyphs.

use std::fmt::Display;

use log::debug;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

use crate::metrics::MetricSet;

/// Colour per metric index, shared by both charts.
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(0x08, 0xF7, 0xFE),
    RGBColor(0xFE, 0x53, 0xBB),
    RGBColor(0xF5, 0xD3, 0x00),
    RGBColor(0x00, 0xFF, 0x00),
    RGBColor(0x9D, 0x4E, 0xDD),
    RGBColor(0xFF, 0x6D, 0x00),
];

pub const PIE_SIZE: (u32, u32) = (600, 600);
pub const BAR_SIZE: (u32, u32) = (800, 400);

/// Upper bound of the bar chart's y axis; leaves headroom for the value labels.
pub const BAR_Y_MAX: u32 = 110;

/// Tick count that puts a label on every multiple of ten up to [`BAR_Y_MAX`].
const BAR_Y_LABELS: usize = (BAR_Y_MAX / 10 + 1) as usize;

const FONT: &str = "sans-serif";
const PIE_RADIUS_RATIO: f64 = 0.33;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no metrics to chart")]
    Empty,
    #[error("metric values sum to zero; pie shares are undefined")]
    ZeroTotal,
    #[error("{chart} chart drawing failed: {message}")]
    Draw { chart: &'static str, message: String },
}

/// The two SVG documents shown for a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartPair {
    pub pie: String,
    pub bar: String,
}

/// Colour assigned to the metric at `index`.
pub fn color_for(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

fn draw_failed(chart: &'static str, err: impl Display) -> RenderError {
    RenderError::Draw {
        chart,
        message: err.to_string(),
    }
}

/// Renders both charts; the first failure is returned.
pub fn render_charts(metrics: &MetricSet) -> Result<ChartPair, RenderError> {
    let pie = render_pie(metrics)?;
    let bar = render_bar(metrics)?;
    debug!(
        "rendered charts for {} metrics (pie {} bytes, bar {} bytes)",
        metrics.len(),
        pie.len(),
        bar.len()
    );
    Ok(ChartPair { pie, bar })
}

/// One wedge per metric starting at three o'clock, with the share printed
/// inside and the metric name outside each wedge.
pub fn render_pie(metrics: &MetricSet) -> Result<String, RenderError> {
    if metrics.is_empty() {
        return Err(RenderError::Empty);
    }
    if metrics.total() == 0 {
        return Err(RenderError::ZeroTotal);
    }

    let sizes: Vec<f64> = metrics.iter().map(|(_, value)| f64::from(value)).collect();
    let colors: Vec<RGBColor> = (0..sizes.len()).map(color_for).collect();
    let labels: Vec<&str> = metrics.iter().map(|(name, _)| name).collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PIE_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|err| draw_failed("pie", err))?;

        let center = (PIE_SIZE.0 as i32 / 2, PIE_SIZE.1 as i32 / 2);
        let radius = f64::from(PIE_SIZE.0.min(PIE_SIZE.1)) * PIE_RADIUS_RATIO;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(0.0);
        pie.label_style((FONT, 15).into_font().color(&BLACK));
        pie.label_offset(10.0);
        pie.percentages((FONT, 14).into_font().color(&BLACK));
        root.draw(&pie).map_err(|err| draw_failed("pie", err))?;

        root.present().map_err(|err| draw_failed("pie", err))?;
    }

    Ok(svg)
}

/// One bar per metric on a fixed 0..110 axis, each labelled with its value.
pub fn render_bar(metrics: &MetricSet) -> Result<String, RenderError> {
    if metrics.is_empty() {
        return Err(RenderError::Empty);
    }

    let names: Vec<&str> = metrics.iter().map(|(name, _)| name).collect();
    let count = names.len() as u32;
    let label_for = |value: &SegmentValue<u32>| match value {
        SegmentValue::Exact(index) | SegmentValue::CenterOf(index) => names
            .get(*index as usize)
            .map(|name| name.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, BAR_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|err| draw_failed("bar", err))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d((0u32..count).into_segmented(), 0u32..BAR_Y_MAX)
            .map_err(|err| draw_failed("bar", err))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(names.len())
            .x_label_formatter(&label_for)
            .y_labels(BAR_Y_LABELS)
            .label_style((FONT, 12))
            .draw()
            .map_err(|err| draw_failed("bar", err))?;

        chart
            .draw_series(metrics.iter().enumerate().map(|(index, (_, value))| {
                let index = index as u32;
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(index), 0),
                        (SegmentValue::Exact(index + 1), u32::from(value)),
                    ],
                    color_for(index as usize).filled(),
                );
                bar.set_margin(0, 0, 12, 12);
                bar
            }))
            .map_err(|err| draw_failed("bar", err))?;

        let value_style = (FONT, 14)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(metrics.iter().enumerate().map(|(index, (_, value))| {
                Text::new(
                    format!("{value}%"),
                    (SegmentValue::CenterOf(index as u32), u32::from(value)),
                    value_style.clone(),
                )
            }))
            .map_err(|err| draw_failed("bar", err))?;

        root.present().map_err(|err| draw_failed("bar", err))?;
    }

    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetricSet {
        MetricSet::from_scores([
            ("Smart Driving", 75),
            ("Smooth Turns", 64),
            ("Safe Stops", 92),
            ("Focus While Driving", 41),
            ("Speed Compliance", 88),
            ("Fuel Efficiency", 57),
        ])
    }

    #[test]
    fn bar_chart_labels_every_value() {
        let svg = render_bar(&sample()).unwrap();
        assert!(svg.starts_with("<svg"));
        for label in ["75%", "64%", "92%", "41%", "88%", "57%"] {
            assert!(svg.contains(label), "missing bar label {label}");
        }
    }

    #[test]
    fn pie_chart_prints_one_decimal_shares() {
        let metrics = MetricSet::from_scores([("A", 50), ("B", 25), ("C", 25)]);
        let svg = render_pie(&metrics).unwrap();
        assert!(svg.contains("50.0%"));
        assert_eq!(svg.matches("25.0%").count(), 2);
        for name in ["A", "B", "C"] {
            assert!(svg.contains(name));
        }
    }

    #[test]
    fn both_charts_use_the_palette() {
        let charts = render_charts(&sample()).unwrap();
        for svg in [&charts.pie, &charts.bar] {
            assert!(svg.to_uppercase().contains("#08F7FE"), "first palette colour missing");
            assert!(svg.to_uppercase().contains("#FF6D00"), "last palette colour missing");
        }
    }

    #[test]
    fn empty_metrics_are_rejected() {
        let empty = MetricSet::default();
        assert!(matches!(render_pie(&empty), Err(RenderError::Empty)));
        assert!(matches!(render_bar(&empty), Err(RenderError::Empty)));
        assert!(render_charts(&empty).is_err());
    }

    #[test]
    fn all_zero_metrics_cannot_form_a_pie() {
        let zeros = MetricSet::from_scores([("A", 0), ("B", 0)]);
        assert!(matches!(render_pie(&zeros), Err(RenderError::ZeroTotal)));
    }

    #[test]
    fn palette_wraps_around() {
        assert_eq!(color_for(0), color_for(PALETTE.len()));
    }

    fn tags<'a>(svg: &'a str, name: &str) -> Vec<&'a str> {
        let open = format!("<{name} ");
        svg.match_indices(&open)
            .filter_map(|(start, _)| {
                let rest = &svg[start..];
                rest.find('>').map(|end| &rest[..end])
            })
            .collect()
    }

    fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
        let key = format!(" {name}=\"");
        let start = tag.find(&key)? + key.len();
        let len = tag[start..].find('"')?;
        Some(&tag[start..start + len])
    }

    fn hex(color: RGBColor) -> String {
        format!("#{:02X}{:02X}{:02X}", color.0, color.1, color.2)
    }

    fn palette_fills(svg: &str, tag: &str) -> Vec<String> {
        tags(svg, tag)
            .into_iter()
            .filter_map(|tag| attr(tag, "fill"))
            .map(str::to_uppercase)
            .filter(|fill| fill != "#FFFFFF" && fill != "NONE")
            .collect()
    }

    #[test]
    fn bar_axis_tops_out_at_110() {
        let svg = render_bar(&sample()).unwrap();
        assert!(svg.contains(">110</text>"), "missing 110 tick label");
        assert!(svg.contains(">100</text>"));
        assert!(!svg.contains(">120</text>"));
    }

    #[test]
    fn wedges_and_bars_follow_palette_order() {
        let charts = render_charts(&sample()).unwrap();
        let expected: Vec<String> = PALETTE.iter().copied().map(hex).collect();

        assert_eq!(palette_fills(&charts.pie, "polygon"), expected);
        assert_eq!(palette_fills(&charts.bar, "rect"), expected);
    }

    #[test]
    fn bar_heights_follow_values() {
        let svg = render_bar(&sample()).unwrap();
        let heights: Vec<i64> = tags(&svg, "rect")
            .into_iter()
            .filter(|tag| {
                attr(tag, "fill").is_some_and(|fill| !fill.eq_ignore_ascii_case("#FFFFFF"))
            })
            .filter_map(|tag| attr(tag, "height")?.parse().ok())
            .collect();

        assert_eq!(heights.len(), 6);
        // 92 > 88 > 75 > 64 > 57 > 41
        for (taller, shorter) in [(2, 4), (4, 0), (0, 1), (1, 5), (5, 3)] {
            assert!(heights[taller] > heights[shorter], "{heights:?}");
        }
    }
}
