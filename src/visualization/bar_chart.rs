//! Vertical bar chart with rotated category labels

use super::svg::{estimate_text_width, format_number, SvgDocument, SvgElement, TextAnchor};
use crate::error::{BikeTreeError, Result};

const MARGIN: f64 = 16.0;
const Y_AXIS_WIDTH: f64 = 56.0;
const TICK_LENGTH: f64 = 5.0;
const TARGET_TICKS: f64 = 5.0;

/// Bar chart renderer
#[derive(Debug, Clone)]
pub struct BarChart {
    /// Chart title drawn above the plot area
    pub title: Option<String>,
    /// Height of the plot area in pixels
    pub plot_height: f64,
    /// Horizontal space per bar
    pub bar_slot: f64,
    /// Fraction of the slot filled by the bar
    pub bar_fill: f64,
    /// Font size of tick labels
    pub font_size: f64,
    /// Bar colour
    pub color: String,
}

impl Default for BarChart {
    fn default() -> Self {
        Self {
            title: None,
            plot_height: 320.0,
            bar_slot: 36.0,
            bar_fill: 0.5,
            font_size: 11.0,
            color: "#1f77b4".to_string(),
        }
    }
}

impl BarChart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_plot_height(mut self, height: f64) -> Self {
        self.plot_height = height;
        self
    }

    /// Draw one bar per label, in the given order
    pub fn render(&self, labels: &[String], values: &[f64]) -> Result<SvgDocument> {
        if labels.len() != values.len() {
            return Err(BikeTreeError::ShapeError {
                expected: format!("{} values", labels.len()),
                actual: format!("{} values", values.len()),
            });
        }
        if labels.is_empty() {
            return Err(BikeTreeError::RenderError(
                "bar chart needs at least one bar".to_string(),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(BikeTreeError::RenderError(format!(
                "bar values must be finite and non-negative, got {}",
                bad
            )));
        }

        let max_value = values.iter().cloned().fold(0.0, f64::max);
        let (y_max, step) = nice_axis(max_value);
        let decimals = step_decimals(step);

        let label_area = labels
            .iter()
            .map(|l| estimate_text_width(l, self.font_size))
            .fold(0.0, f64::max)
            + TICK_LENGTH
            + 8.0;
        let title_area = if self.title.is_some() { self.font_size * 2.5 } else { 0.0 };

        let plot_left = MARGIN + Y_AXIS_WIDTH;
        let plot_top = MARGIN + title_area;
        let plot_width = labels.len() as f64 * self.bar_slot;
        let plot_bottom = plot_top + self.plot_height;

        let width = plot_left + plot_width + MARGIN;
        let height = plot_bottom + label_area + MARGIN;

        let y_of = |v: f64| plot_bottom - v / y_max * self.plot_height;

        let mut doc = SvgDocument::new(width, height);
        if let Some(ref title) = self.title {
            doc = doc.with_title(title.clone());
            doc.push(
                SvgElement::text(
                    plot_left + plot_width / 2.0,
                    MARGIN + self.font_size * 1.5,
                    title.clone(),
                    self.font_size * 1.3,
                    TextAnchor::Middle,
                )
                .bold(),
            );
        }

        // Y ticks and labels
        let n_ticks = (y_max / step).round() as usize;
        for i in 0..=n_ticks {
            let v = i as f64 * step;
            let y = y_of(v);
            doc.push(SvgElement::line(plot_left - TICK_LENGTH, y, plot_left, y, "#000000"));
            doc.push(SvgElement::text(
                plot_left - TICK_LENGTH - 3.0,
                y + self.font_size * 0.35,
                format_number(v, decimals),
                self.font_size,
                TextAnchor::End,
            ));
        }

        // Bars and rotated x labels
        for (i, (label, &value)) in labels.iter().zip(values).enumerate() {
            let slot_center = plot_left + (i as f64 + 0.5) * self.bar_slot;
            let bar_width = self.bar_slot * self.bar_fill;
            let top = y_of(value);
            if value > 0.0 {
                doc.push(SvgElement::rect(
                    slot_center - bar_width / 2.0,
                    top,
                    bar_width,
                    plot_bottom - top,
                    &self.color,
                ));
            }
            doc.push(SvgElement::line(
                slot_center,
                plot_bottom,
                slot_center,
                plot_bottom + TICK_LENGTH,
                "#000000",
            ));
            doc.push(
                SvgElement::text(
                    slot_center + self.font_size * 0.35,
                    plot_bottom + TICK_LENGTH + 3.0,
                    label.clone(),
                    self.font_size,
                    TextAnchor::End,
                )
                .rotated(-90.0),
            );
        }

        // Axes frame
        let plot_right = plot_left + plot_width;
        for (x1, y1, x2, y2) in [
            (plot_left, plot_top, plot_left, plot_bottom),
            (plot_left, plot_bottom, plot_right, plot_bottom),
            (plot_right, plot_top, plot_right, plot_bottom),
            (plot_left, plot_top, plot_right, plot_top),
        ] {
            doc.push(SvgElement::line(x1, y1, x2, y2, "#000000"));
        }

        Ok(doc)
    }
}

/// Axis maximum and tick step, both on a 1-2-5 grid
fn nice_axis(max_value: f64) -> (f64, f64) {
    if max_value <= 0.0 {
        return (1.0, 0.2);
    }
    let raw_step = max_value / TARGET_TICKS;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / magnitude;
    let step = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    } * magnitude;
    ((max_value / step).ceil() * step, step)
}

fn step_decimals(step: f64) -> usize {
    if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_nice_axis() {
        assert_eq!(nice_axis(0.0), (1.0, 0.2));
        let (max, step) = nice_axis(0.62);
        assert!((step - 0.2).abs() < 1e-12);
        assert!((max - 0.8).abs() < 1e-12);
        let (max, step) = nice_axis(47.0);
        assert_eq!(step, 10.0);
        assert_eq!(max, 50.0);
    }

    #[test]
    fn test_step_decimals() {
        assert_eq!(step_decimals(10.0), 0);
        assert_eq!(step_decimals(0.2), 1);
        assert_eq!(step_decimals(0.05), 2);
    }

    #[test]
    fn test_render_bars_in_order() {
        let names = labels(&["temp", "hum", "fall"]);
        let doc = BarChart::new()
            .with_title("Feature importance")
            .render(&names, &[0.7, 0.0, 0.3])
            .unwrap();
        let svg = doc.render().unwrap();

        // Zero-height bars are not drawn
        let bars = doc
            .elements()
            .iter()
            .filter(|e| matches!(e, SvgElement::Rect { .. }))
            .count();
        assert_eq!(bars, 2);

        let temp = svg.find(">temp</text>").unwrap();
        let hum = svg.find(">hum</text>").unwrap();
        let fall = svg.find(">fall</text>").unwrap();
        assert!(temp < hum && hum < fall);
        assert!(svg.contains("rotate(-90.0"));
        assert!(svg.contains("<title>Feature importance</title>"));
        assert!(svg.contains(">0.8</text>"));
    }

    #[test]
    fn test_render_rejects_mismatch() {
        let result = BarChart::new().render(&labels(&["a", "b"]), &[1.0]);
        assert!(matches!(result, Err(BikeTreeError::ShapeError { .. })));
    }

    #[test]
    fn test_render_rejects_negative() {
        let result = BarChart::new().render(&labels(&["a"]), &[-0.1]);
        assert!(matches!(result, Err(BikeTreeError::RenderError(_))));
    }

    #[test]
    fn test_render_all_zero() {
        let doc = BarChart::new().render(&labels(&["a", "b"]), &[0.0, 0.0]).unwrap();
        assert!(doc.render().unwrap().contains(">1</text>"));
    }
}
