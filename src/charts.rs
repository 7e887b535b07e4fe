//! SVG charts
//!
//! Charts are plain SVG strings so they render in the server-side HTML
//! without any client script. Geometry lives in small pure functions;
//! `line_chart`, `bar_chart` and `pie_chart` assemble the markup.

use std::f64::consts::PI;
use std::fmt::Write;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 240.0;
const PAD_LEFT: f64 = 56.0;
const PAD_RIGHT: f64 = 16.0;
const PAD_TOP: f64 = 16.0;
const PAD_BOTTOM: f64 = 32.0;

/// Colors cycle through this palette
pub const PALETTE: [&str; 6] = [
    "#f97316", "#0ea5e9", "#22c55e", "#a855f7", "#eab308", "#ef4444",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Minimal XML text/attribute escaping
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Pie slices have no sign; negative and missing shares count as nothing
fn share(value: f64) -> f64 {
    finite(value).max(0.0)
}

/// Round the axis maximum up to 1, 2 or 5 times a power of ten
pub fn nice_max(max: f64) -> f64 {
    let max = share(max);
    if max == 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(max.log10().floor());
    let scaled = max / magnitude;
    let step = if scaled <= 1.0 {
        1.0
    } else if scaled <= 2.0 {
        2.0
    } else if scaled <= 5.0 {
        5.0
    } else {
        10.0
    };
    step * magnitude
}

fn plot_width() -> f64 {
    WIDTH - PAD_LEFT - PAD_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - PAD_TOP - PAD_BOTTOM
}

/// Value range of the y axis. Always includes zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
}

impl Axis {
    pub fn of(series: &[Series]) -> Self {
        let (lo, hi) = series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .map(finite)
            .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let min = if lo < 0.0 { -nice_max(-lo) } else { 0.0 };
        let max = if hi > 0.0 || min == 0.0 { nice_max(hi) } else { 0.0 };
        Self { min, max }
    }

    /// Vertical pixel position of `value`
    pub fn y(&self, value: f64) -> f64 {
        PAD_TOP + plot_height() * (self.max - finite(value)) / (self.max - self.min)
    }
}

/// Plot coordinates for a series on `axis`
pub fn line_points(values: &[f64], axis: Axis) -> Vec<(f64, f64)> {
    let step = if values.len() > 1 {
        plot_width() / (values.len() - 1) as f64
    } else {
        0.0
    };
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = if values.len() == 1 {
                PAD_LEFT + plot_width() / 2.0
            } else {
                PAD_LEFT + step * i as f64
            };
            (x, axis.y(*v))
        })
        .collect()
}

/// Start and end angles (radians, clockwise from 12 o'clock) per slice
pub fn pie_angles(values: &[f64]) -> Vec<(f64, f64)> {
    let total: f64 = values.iter().copied().map(share).sum();
    if total == 0.0 {
        return values.iter().map(|_| (0.0, 0.0)).collect();
    }
    let mut start = 0.0;
    values
        .iter()
        .map(|v| {
            let end = start + share(*v) / total * 2.0 * PI;
            let slice = (start, end);
            start = end;
            slice
        })
        .collect()
}

/// Compact axis label: 1.2k, 3.4M
pub fn format_tick(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 10_000.0 {
        format!("{:.0}k", value / 1_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else if abs >= 10.0 || value == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn open_svg(out: &mut String, class: &str) {
    let _ = write!(
        out,
        r#"<svg class="chart {}" viewBox="0 0 {} {}" role="img" xmlns="http://www.w3.org/2000/svg">"#,
        class, WIDTH, HEIGHT
    );
}

fn empty_chart(class: &str) -> String {
    let mut out = String::new();
    open_svg(&mut out, class);
    let _ = write!(
        out,
        r#"<text x="{}" y="{}" text-anchor="middle" class="chart-empty">No data</text></svg>"#,
        WIDTH / 2.0,
        HEIGHT / 2.0
    );
    out
}

fn axes(out: &mut String, axis: Axis, labels: &[String], label_x: impl Fn(usize) -> f64) {
    for i in 0..=4 {
        let value = axis.min + (axis.max - axis.min) * f64::from(i) / 4.0;
        let y = axis.y(value);
        let _ = write!(
            out,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" class="chart-grid"/><text x="{:.1}" y="{:.1}" text-anchor="end" class="chart-tick">{}</text>"#,
            PAD_LEFT,
            y,
            WIDTH - PAD_RIGHT,
            y,
            PAD_LEFT - 6.0,
            y + 4.0,
            format_tick(value)
        );
    }
    if axis.min < 0.0 {
        let y = axis.y(0.0);
        let _ = write!(
            out,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" class="chart-zero"/>"#,
            PAD_LEFT,
            y,
            WIDTH - PAD_RIGHT,
            y
        );
    }
    // Thin out labels so they don't collide
    let every = labels.len().div_ceil(12).max(1);
    for (i, label) in labels.iter().enumerate().filter(|(i, _)| i % every == 0) {
        let _ = write!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" class="chart-label">{}</text>"#,
            label_x(i),
            HEIGHT - PAD_BOTTOM + 18.0,
            escape(label)
        );
    }
}

fn legend(out: &mut String, series: &[Series]) {
    if series.len() < 2 {
        return;
    }
    for (i, s) in series.iter().enumerate() {
        let x = PAD_LEFT + 140.0 * i as f64;
        let _ = write!(
            out,
            r#"<rect x="{:.1}" y="2" width="10" height="10" fill="{}"/><text x="{:.1}" y="11" class="chart-legend">{}</text>"#,
            x,
            PALETTE[i % PALETTE.len()],
            x + 14.0,
            escape(&s.name)
        );
    }
}

pub fn line_chart(labels: &[String], series: &[Series]) -> String {
    if labels.is_empty() || series.iter().all(|s| s.values.is_empty()) {
        return empty_chart("chart-line");
    }
    let axis = Axis::of(series);
    let mut out = String::new();
    open_svg(&mut out, "chart-line");
    let points = line_points(&vec![0.0; labels.len()], axis);
    axes(&mut out, axis, labels, |i| points[i].0);
    for (i, s) in series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let coords: Vec<String> = line_points(&s.values, axis)
            .iter()
            .map(|(x, y)| format!("{:.1},{:.1}", x, y))
            .collect();
        let _ = write!(
            out,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2" stroke-linejoin="round"><title>{}</title></polyline>"#,
            coords.join(" "),
            color,
            escape(&s.name)
        );
        for (x, y) in line_points(&s.values, axis) {
            let _ = write!(out, r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{}"/>"#, x, y, color);
        }
    }
    legend(&mut out, series);
    out.push_str("</svg>");
    out
}

/// Grouped vertical bars, one group per label
pub fn bar_chart(labels: &[String], series: &[Series]) -> String {
    if labels.is_empty() || series.is_empty() {
        return empty_chart("chart-bar");
    }
    let axis = Axis::of(series);
    let group = plot_width() / labels.len() as f64;
    let bar = (group * 0.8) / series.len() as f64;
    let mut out = String::new();
    open_svg(&mut out, "chart-bar");
    let zero = axis.y(0.0);
    axes(&mut out, axis, labels, |i| {
        PAD_LEFT + group * i as f64 + group / 2.0
    });
    for (si, s) in series.iter().enumerate() {
        let color = PALETTE[si % PALETTE.len()];
        for (li, value) in s.values.iter().take(labels.len()).enumerate() {
            // Bars grow up or down from the zero line
            let top = axis.y(*value);
            let (y, h) = (top.min(zero), (top - zero).abs());
            let x = PAD_LEFT + group * li as f64 + group * 0.1 + bar * si as f64;
            let _ = write!(
                out,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}: {}</title></rect>"#,
                x,
                y,
                bar.max(1.0),
                h,
                color,
                escape(&labels[li]),
                format_tick(*value)
            );
        }
    }
    legend(&mut out, series);
    out.push_str("</svg>");
    out
}

/// Pie with a legend on the right
pub fn pie_chart(slices: &[(String, f64)]) -> String {
    let values: Vec<f64> = slices.iter().map(|(_, v)| *v).collect();
    let total: f64 = values.iter().copied().map(share).sum();
    if total == 0.0 {
        return empty_chart("chart-pie");
    }
    let (cx, cy, r) = (HEIGHT / 2.0, HEIGHT / 2.0, HEIGHT / 2.0 - PAD_TOP);
    let mut out = String::new();
    open_svg(&mut out, "chart-pie");
    for (i, ((label, value), (start, end))) in slices.iter().zip(pie_angles(&values)).enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        if end - start >= 2.0 * PI - 1e-9 {
            let _ = write!(out, r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#, cx, cy, r, color);
        } else if end > start {
            let (x1, y1) = (cx + r * start.sin(), cy - r * start.cos());
            let (x2, y2) = (cx + r * end.sin(), cy - r * end.cos());
            let large = if end - start > PI { 1 } else { 0 };
            let _ = write!(
                out,
                r#"<path d="M{:.1},{:.1} L{:.1},{:.1} A{:.1},{:.1} 0 {} 1 {:.1},{:.1} Z" fill="{}"><title>{}</title></path>"#,
                cx, cy, x1, y1, r, r, large, x2, y2, color,
                escape(label)
            );
        }
        let ly = PAD_TOP + 22.0 * i as f64;
        let _ = write!(
            out,
            r#"<rect x="{:.1}" y="{:.1}" width="12" height="12" fill="{}"/><text x="{:.1}" y="{:.1}" class="chart-legend">{} ({:.0}%)</text>"#,
            HEIGHT + 24.0,
            ly,
            color,
            HEIGHT + 42.0,
            ly + 11.0,
            escape(label),
            share(*value) / total * 100.0
        );
    }
    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("2026-{:02}", i)).collect()
    }

    #[test]
    fn nice_max_steps() {
        assert_eq!(nice_max(0.0), 1.0);
        assert_eq!(nice_max(-3.0), 1.0);
        assert_eq!(nice_max(7.0), 10.0);
        assert_eq!(nice_max(180.0), 200.0);
        assert_eq!(nice_max(4100.0), 5000.0);
        assert_eq!(nice_max(f64::NAN), 1.0);
    }

    #[test]
    fn line_points_span_plot_area() {
        let points = line_points(&[0.0, 50.0, 100.0], Axis { min: 0.0, max: 100.0 });
        assert_eq!(points[0], (PAD_LEFT, PAD_TOP + plot_height()));
        assert_eq!(points[2], (WIDTH - PAD_RIGHT, PAD_TOP));
        assert!((points[1].1 - (PAD_TOP + plot_height() / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn axis_includes_negative_values() {
        let axis = Axis::of(&[Series::new("delta", vec![120.0, -30.0, 45.0])]);
        assert_eq!(axis, Axis { min: -50.0, max: 200.0 });

        let falling = Axis::of(&[Series::new("delta", vec![-3.0, -7.0])]);
        assert_eq!(falling, Axis { min: -10.0, max: 0.0 });

        let flat = Axis::of(&[Series::new("none", vec![0.0, f64::NAN])]);
        assert_eq!(flat, Axis { min: 0.0, max: 1.0 });
    }

    #[test]
    fn negative_points_sit_below_zero() {
        let axis = Axis { min: -100.0, max: 100.0 };
        let points = line_points(&[100.0, 0.0, -100.0], axis);
        assert_eq!(points[0].1, PAD_TOP);
        assert!((points[1].1 - (PAD_TOP + plot_height() / 2.0)).abs() < 1e-9);
        assert_eq!(points[2].1, PAD_TOP + plot_height());
    }

    #[test]
    fn negative_bars_hang_from_zero_line() {
        let svg = bar_chart(&labels(2), &[Series::new("savings", vec![5.0, -5.0])]);
        let axis = Axis { min: -5.0, max: 5.0 };
        let zero = axis.y(0.0);
        let half = plot_height() / 2.0;
        assert!(svg.contains(&format!(r#"y="{:.1}" width"#, zero - half)));
        assert!(svg.contains(&format!(r#"y="{:.1}" width"#, zero)));
        assert!(svg.contains(&format!(r#"height="{:.1}""#, half)));
        assert!(svg.contains("chart-zero"));
    }

    #[test]
    fn pie_ignores_negative_slices() {
        let svg = pie_chart(&[("gas".into(), 3.0), ("refund".into(), -2.0)]);
        assert!(svg.contains("gas (100%)"));
        assert!(svg.contains("refund (0%)"));
    }

    #[test]
    fn pie_angles_cover_full_circle() {
        let angles = pie_angles(&[1.0, 1.0, 2.0]);
        assert_eq!(angles[0], (0.0, PI / 2.0));
        assert!((angles[2].1 - 2.0 * PI).abs() < 1e-9);
        assert_eq!(pie_angles(&[0.0, f64::NAN]), vec![(0.0, 0.0), (0.0, 0.0)]);
    }

    #[test]
    fn empty_inputs_render_placeholder() {
        assert!(line_chart(&[], &[]).contains("No data"));
        assert!(bar_chart(&labels(3), &[]).contains("No data"));
        assert!(pie_chart(&[("gas".into(), 0.0)]).contains("No data"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = bar_chart(
            &["<script>".to_string()],
            &[Series::new("heat & water", vec![3.0])],
        );
        assert!(svg.contains("&lt;script&gt;"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn one_polyline_per_series() {
        let svg = line_chart(
            &labels(6),
            &[
                Series::new("heat", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
                Series::new("water", vec![6.0, 5.0, 4.0, 3.0, 2.0, 1.0]),
            ],
        );
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.starts_with("<svg") && svg.ends_with("</svg>"));
    }

    #[test]
    fn single_slice_is_a_circle() {
        let svg = pie_chart(&[("biomass".into(), 5.0)]);
        assert!(svg.contains("<circle"));
        assert!(svg.contains("(100%)"));
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(1500.0), "1.5k");
        assert_eq!(format_tick(45000.0), "45k");
        assert_eq!(format_tick(2_000_000.0), "2.0M");
    }
}
