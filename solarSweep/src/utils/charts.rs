//! Minimal SVG rendering for line and grouped bar charts.

use std::fmt::Write;
use crate::utils::csv_export::escape_html;

const WIDTH: f64 = 860.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 170.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const TICKS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

/// Categories along x, one bar per series in each category. `None` leaves a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub y_label: String,
    pub series: Vec<(String, String)>,
    pub groups: Vec<(String, Vec<Option<f64>>)>,
}

#[derive(Debug, Clone, Copy)]
struct Axis {
    min: f64,
    max: f64,
}

impl Axis {
    fn fit(values: impl Iterator<Item = f64>, include_zero: bool) -> Option<Self> {
        let (mut min, mut max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !min.is_finite() {
            return None;
        }
        if include_zero {
            min = min.min(0.0);
            max = max.max(0.0);
        }
        if (max - min).abs() < f64::EPSILON {
            let pad = if max.abs() > 0.0 { max.abs() * 0.1 } else { 1.0 };
            min -= pad;
            max += pad;
        }
        Some(Self { min, max })
    }

    fn scale(&self, value: f64, from: f64, to: f64) -> f64 {
        from + (value - self.min) / (self.max - self.min) * (to - from)
    }

    fn ticks(&self) -> Vec<f64> {
        (0..=TICKS)
            .map(|i| self.min + (self.max - self.min) * i as f64 / TICKS as f64)
            .collect()
    }
}

fn format_tick(value: f64, span: f64) -> String {
    if span >= 1000.0 || value.abs() >= 10_000.0 {
        format!("{:.3e}", value)
    } else if span >= 10.0 {
        format!("{:.0}", value)
    } else if span >= 1.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.3}", value)
    }
}

fn plot_bounds() -> (f64, f64, f64, f64) {
    (MARGIN_LEFT, WIDTH - MARGIN_RIGHT, HEIGHT - MARGIN_BOTTOM, MARGIN_TOP)
}

fn open_svg(out: &mut String, title: &str, x_label: &str, y_label: &str) -> std::fmt::Result {
    let (left, right, bottom, top) = plot_bounds();
    writeln!(out, "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"sans-serif\" font-size=\"12\">", WIDTH, HEIGHT, WIDTH, HEIGHT)?;
    writeln!(out, "<rect width=\"100%\" height=\"100%\" fill=\"white\"/>")?;
    writeln!(out, "<text x=\"{}\" y=\"28\" text-anchor=\"middle\" font-size=\"16\">{}</text>", WIDTH / 2.0, escape_html(title))?;
    writeln!(out, "<line x1=\"{l}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"black\"/>", l = left, r = right, b = bottom)?;
    writeln!(out, "<line x1=\"{l}\" y1=\"{t}\" x2=\"{l}\" y2=\"{b}\" stroke=\"black\"/>", l = left, t = top, b = bottom)?;
    writeln!(out, "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\">{}</text>", (left + right) / 2.0, HEIGHT - 15.0, escape_html(x_label))?;
    writeln!(out, "<text x=\"20\" y=\"{y}\" text-anchor=\"middle\" transform=\"rotate(-90 20 {y})\">{}</text>", escape_html(y_label), y = (top + bottom) / 2.0)?;
    Ok(())
}

fn y_axis_ticks(out: &mut String, axis: &Axis) -> std::fmt::Result {
    let (left, right, bottom, top) = plot_bounds();
    for tick in axis.ticks() {
        let y = axis.scale(tick, bottom, top);
        writeln!(out, "<line x1=\"{}\" y1=\"{y:.1}\" x2=\"{}\" y2=\"{y:.1}\" stroke=\"#dddddd\"/>", left, right, y = y)?;
        writeln!(out, "<text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>", left - 6.0, y + 4.0, format_tick(tick, axis.max - axis.min))?;
    }
    Ok(())
}

fn legend(out: &mut String, entries: &[(String, String)]) -> std::fmt::Result {
    let x = WIDTH - MARGIN_RIGHT + 20.0;
    for (i, (name, color)) in entries.iter().enumerate() {
        let y = MARGIN_TOP + 10.0 + 20.0 * i as f64;
        writeln!(out, "<rect x=\"{}\" y=\"{}\" width=\"12\" height=\"12\" fill=\"{}\"/>", x, y - 10.0, escape_html(color))?;
        writeln!(out, "<text x=\"{}\" y=\"{}\">{}</text>", x + 18.0, y, escape_html(name))?;
    }
    Ok(())
}

impl LineChart {
    /// Renders the chart, or `None` when no series has a finite point.
    pub fn render(&self) -> Option<String> {
        let series: Vec<&Series> = self.series.iter().filter(|s| !s.points.is_empty()).collect();
        let x_axis = Axis::fit(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)), false)?;
        let y_axis = Axis::fit(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)), false)?;
        self.draw(&series, &x_axis, &y_axis).ok()
    }

    fn draw(&self, series: &[&Series], x_axis: &Axis, y_axis: &Axis) -> Result<String, std::fmt::Error> {
        let (left, right, bottom, top) = plot_bounds();
        let mut out = String::new();
        open_svg(&mut out, &self.title, &self.x_label, &self.y_label)?;
        y_axis_ticks(&mut out, y_axis)?;
        for tick in x_axis.ticks() {
            let x = x_axis.scale(tick, left, right);
            writeln!(out, "<text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\">{}</text>", x, bottom + 18.0, format_tick(tick, x_axis.max - x_axis.min))?;
        }

        for s in series {
            let mut points: Vec<(f64, f64)> = s.points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()).collect();
            points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            let path: Vec<String> = points
                .iter()
                .map(|(x, y)| format!("{:.1},{:.1}", x_axis.scale(*x, left, right), y_axis.scale(*y, bottom, top)))
                .collect();
            let color = escape_html(&s.color);
            writeln!(out, "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"2\" points=\"{}\"/>", color, path.join(" "))?;
            for point in &path {
                if let Some((x, y)) = point.split_once(',') {
                    writeln!(out, "<circle cx=\"{}\" cy=\"{}\" r=\"3\" fill=\"{}\"/>", x, y, color)?;
                }
            }
        }

        let entries: Vec<(String, String)> = series.iter().map(|s| (s.name.clone(), s.color.clone())).collect();
        legend(&mut out, &entries)?;
        writeln!(out, "</svg>")?;
        Ok(out)
    }
}

impl BarChart {
    /// Renders the chart, or `None` when every bar is missing.
    pub fn render(&self) -> Option<String> {
        let values = self.groups.iter().flat_map(|(_, vals)| vals.iter().flatten().copied());
        let y_axis = Axis::fit(values, true)?;
        self.draw(&y_axis).ok()
    }

    fn draw(&self, y_axis: &Axis) -> Result<String, std::fmt::Error> {
        let (left, right, bottom, top) = plot_bounds();
        let mut out = String::new();
        open_svg(&mut out, &self.title, "", &self.y_label)?;
        y_axis_ticks(&mut out, y_axis)?;

        let group_width = (right - left) / self.groups.len().max(1) as f64;
        let bar_width = group_width * 0.8 / self.series.len().max(1) as f64;
        let zero = y_axis.scale(0.0, bottom, top);

        for (g, (category, values)) in self.groups.iter().enumerate() {
            let group_left = left + group_width * g as f64 + group_width * 0.1;
            writeln!(out, "<text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\">{}</text>", group_left + group_width * 0.4, bottom + 18.0, escape_html(category))?;
            for (i, value) in values.iter().enumerate() {
                let (Some(value), Some((_, color))) = (value, self.series.get(i)) else { continue };
                let y = y_axis.scale(*value, bottom, top);
                writeln!(
                    out,
                    "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>",
                    group_left + bar_width * i as f64,
                    y.min(zero),
                    bar_width,
                    (zero - y).abs(),
                    escape_html(color)
                )?;
            }
        }

        legend(&mut out, &self.series)?;
        writeln!(out, "</svg>")?;
        Ok(out)
    }
}
