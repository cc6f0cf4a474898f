//! SVG-графики истории обучения

use std::fmt::Write;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 540.0;
const MARGIN: f64 = 70.0;

pub struct Series<'a> {
    pub label: &'a str,
    pub values: &'a [f64],
    pub color: &'a str,
}

/// Линейный график по эпохам (ось X - номер эпохи с 1)
pub fn line_chart_svg(title: &str, y_label: &str, series: &[Series<'_>]) -> String {
    let finite = series.iter().flat_map(|s| s.values.iter().copied()).filter(|v| v.is_finite());
    let (mut y_min, mut y_max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !y_min.is_finite() {
        (y_min, y_max) = (0.0, 1.0);
    }
    if (y_max - y_min).abs() < 1e-12 {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let n_points = series.iter().map(|s| s.values.len()).max().unwrap_or(0).max(2);

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let x_of = |i: usize| MARGIN + plot_w * i as f64 / (n_points - 1) as f64;
    let y_of = |v: f64| MARGIN + plot_h * (1.0 - (v - y_min) / (y_max - y_min));

    let mut svg = String::new();
    // write! в String не возвращает ошибок
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="22" font-family="sans-serif">{}</text>"#,
        WIDTH / 2.0,
        MARGIN / 2.0,
        escape(title)
    );

    // Оси
    let _ = writeln!(
        svg,
        r#"<polyline points="{m},{m} {m},{b} {r},{b}" fill="none" stroke="black"/>"#,
        m = MARGIN,
        b = HEIGHT - MARGIN,
        r = WIDTH - MARGIN
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="16" font-family="sans-serif">Epoch</text>"#,
        WIDTH / 2.0,
        HEIGHT - MARGIN / 3.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="{x}" y="{y}" text-anchor="middle" font-size="16" font-family="sans-serif" transform="rotate(-90 {x} {y})">{}</text>"#,
        escape(y_label),
        x = MARGIN / 3.0,
        y = HEIGHT / 2.0
    );
    for (value, anchor) in [(y_max, "end"), (y_min, "end")] {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="{}" font-size="12" font-family="sans-serif">{:.3}</text>"#,
            MARGIN - 6.0,
            y_of(value) + 4.0,
            anchor,
            value
        );
    }
    for epoch in 0..n_points {
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{}" text-anchor="middle" font-size="12" font-family="sans-serif">{}</text>"#,
            x_of(epoch),
            HEIGHT - MARGIN + 18.0,
            epoch + 1
        );
    }

    for (idx, s) in series.iter().enumerate() {
        let points: Vec<String> = s
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| format!("{:.2},{:.2}", x_of(i), y_of(v)))
            .collect();
        let _ = writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            points.join(" "),
            s.color
        );

        // Легенда - левый верхний угол
        let ly = MARGIN + 20.0 + idx as f64 * 20.0;
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{ly}" x2="{}" y2="{ly}" stroke="{}" stroke-width="3"/>"#,
            MARGIN + 10.0,
            MARGIN + 35.0,
            s.color
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="14" font-family="sans-serif">{}</text>"#,
            MARGIN + 42.0,
            ly + 5.0,
            escape(s.label)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_has_one_polyline_per_series() {
        let train = [0.7, 0.5, 0.4];
        let val = [0.72, 0.6, 0.55];
        let svg = line_chart_svg(
            "Model Loss",
            "Loss",
            &[
                Series { label: "Train", values: &train, color: "#1f77b4" },
                Series { label: "Test", values: &val, color: "#ff7f0e" },
            ],
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        // оси + две серии
        assert_eq!(svg.matches("<polyline").count(), 3);
        assert!(svg.contains("Model Loss"));
    }

    #[test]
    fn test_chart_handles_empty_and_flat_series() {
        let flat = [1.0, 1.0];
        let series = [Series { label: "Train", values: &flat, color: "red" }];
        let svg = line_chart_svg("Flat", "Accuracy", &series);
        assert!(!svg.contains("NaN"));
        let series = [Series { label: "Train", values: &[], color: "red" }];
        let svg = line_chart_svg("Empty", "Accuracy", &series);
        assert!(!svg.contains("NaN"));
    }
}
