//! Plotly figure and SVG builders.

use serde_json::{Value as Json, json};

/// One column laid out against the x axis (timestamps or row positions).
#[derive(Debug, Clone)]
pub struct Series {
    pub column: String,
    pub x_title: String,
    pub x: Vec<Json>,
    pub y: Vec<Option<f64>>,
}

impl Series {
    /// Present `(row, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.y
            .iter()
            .enumerate()
            .filter_map(|(row, v)| v.map(|v| (row, v)))
    }

    fn trace(&self) -> Json {
        json!({
            "type": "scatter",
            "mode": "lines+markers",
            "name": self.column,
            "x": self.x,
            "y": self.y,
            "connectgaps": false,
        })
    }

    fn layout(&self, title: String) -> Json {
        json!({
            "title": { "text": title },
            "xaxis": { "title": { "text": self.x_title } },
            "yaxis": { "title": { "text": self.column } },
            "showlegend": true,
        })
    }
}

fn horizontal_line(series: &Series, name: &str, y: f64, dash: &str) -> Json {
    let ends = [series.x.first(), series.x.last()];
    json!({
        "type": "scatter",
        "mode": "lines",
        "name": name,
        "x": ends,
        "y": [y, y],
        "line": { "dash": dash },
    })
}

/// Values with the mean and ±1 standard deviation bands.
pub fn series_figure(series: &Series, mean: f64, std: f64, meta: Json) -> Json {
    json!({
        "data": [
            series.trace(),
            horizontal_line(series, "mean", mean, "solid"),
            horizontal_line(series, "mean + std", mean + std, "dash"),
            horizontal_line(series, "mean - std", mean - std, "dash"),
        ],
        "layout": series.layout(format!("Variability of {}", series.column)),
        "meta": meta,
    })
}

pub fn histogram_figure(series: &Series, meta: Json) -> Json {
    let values: Vec<f64> = series.points().map(|(_, v)| v).collect();
    json!({
        "data": [{
            "type": "histogram",
            "name": series.column,
            "x": values,
        }],
        "layout": {
            "title": { "text": format!("Distribution of {}", series.column) },
            "xaxis": { "title": { "text": series.column } },
            "yaxis": { "title": { "text": "count" } },
            "bargap": 0.05,
        },
        "meta": meta,
    })
}

/// Values with each `(x0, x1)` span shaded.
pub fn gap_figure(series: &Series, spans: &[(Json, Json)], meta: Json) -> Json {
    let shapes: Vec<Json> = spans
        .iter()
        .map(|(x0, x1)| {
            json!({
                "type": "rect",
                "xref": "x",
                "yref": "paper",
                "x0": x0,
                "x1": x1,
                "y0": 0,
                "y1": 1,
                "fillcolor": "rgba(214, 39, 40, 0.2)",
                "line": { "width": 0 },
            })
        })
        .collect();

    let mut layout = series.layout(format!("Missing values in {}", series.column));
    layout["shapes"] = Json::Array(shapes);

    json!({
        "data": [series.trace()],
        "layout": layout,
        "meta": meta,
    })
}

/// Values with flagged rows in a separate marker trace.
pub fn outlier_figure(series: &Series, flagged: &[usize], meta: Json) -> Json {
    let x: Vec<&Json> = flagged.iter().map(|&row| &series.x[row]).collect();
    let y: Vec<Option<f64>> = flagged.iter().map(|&row| series.y[row]).collect();

    json!({
        "data": [
            series.trace(),
            {
                "type": "scatter",
                "mode": "markers",
                "name": "outliers",
                "x": x,
                "y": y,
                "marker": { "color": "red", "size": 10, "symbol": "x" },
            },
        ],
        "layout": series.layout(format!("Outliers in {}", series.column)),
        "meta": meta,
    })
}

// =============================================================================
// SVG
// =============================================================================

const SVG_WIDTH: f64 = 640.0;
const SVG_HEIGHT: f64 = 320.0;
const SVG_MARGIN: f64 = 48.0;

/// A static line chart of `(x, y)` points.
pub fn svg_line_chart(title: &str, points: &[(f64, f64)]) -> String {
    let (x_min, x_max) = extent(points.iter().map(|p| p.0));
    let (y_min, y_max) = extent(points.iter().map(|p| p.1));
    let plot_w = SVG_WIDTH - 2.0 * SVG_MARGIN;
    let plot_h = SVG_HEIGHT - 2.0 * SVG_MARGIN;

    let scale = |value: f64, min: f64, max: f64| {
        if max > min { (value - min) / (max - min) } else { 0.5 }
    };

    let polyline: Vec<String> = points
        .iter()
        .map(|&(x, y)| {
            let px = SVG_MARGIN + scale(x, x_min, x_max) * plot_w;
            let py = SVG_HEIGHT - SVG_MARGIN - scale(y, y_min, y_max) * plot_h;
            format!("{:.1},{:.1}", px, py)
        })
        .collect();

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = SVG_WIDTH,
        h = SVG_HEIGHT
    ));
    svg.push_str(r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);
    svg.push_str(&format!(
        r#"<text x="{x}" y="24" font-family="sans-serif" font-size="16" text-anchor="middle">{title}</text>"#,
        x = SVG_WIDTH / 2.0,
        title = escape_xml(title)
    ));
    svg.push_str(&format!(
        r##"<g stroke="#444444" stroke-width="1"><line x1="{m}" y1="{b}" x2="{r}" y2="{b}"/><line x1="{m}" y1="{m}" x2="{m}" y2="{b}"/></g>"##,
        m = SVG_MARGIN,
        b = SVG_HEIGHT - SVG_MARGIN,
        r = SVG_WIDTH - SVG_MARGIN
    ));
    svg.push_str(&format!(
        r#"<text x="{x}" y="{y}" font-family="sans-serif" font-size="11" text-anchor="end">{label}</text>"#,
        x = SVG_MARGIN - 4.0,
        y = SVG_MARGIN + 4.0,
        label = format_tick(y_max)
    ));
    svg.push_str(&format!(
        r#"<text x="{x}" y="{y}" font-family="sans-serif" font-size="11" text-anchor="end">{label}</text>"#,
        x = SVG_MARGIN - 4.0,
        y = SVG_HEIGHT - SVG_MARGIN,
        label = format_tick(y_min)
    ));
    if !polyline.is_empty() {
        svg.push_str(&format!(
            r##"<polyline fill="none" stroke="#1f77b4" stroke-width="1.5" points="{}"/>"##,
            polyline.join(" ")
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn format_tick(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else {
        String::new()
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> Series {
        Series {
            column: "temp".into(),
            x_title: "row".into(),
            x: (0..4).map(|i| json!(i)).collect(),
            y: vec![Some(1.0), None, Some(3.0), Some(10.0)],
        }
    }

    #[test]
    fn test_series_figure_shape() {
        let figure = series_figure(&series(), 2.0, 1.0, json!({"column": "temp"}));
        assert_eq!(figure["data"].as_array().unwrap().len(), 4);
        assert!(figure["data"][0]["y"][1].is_null());
        assert_eq!(figure["data"][2]["y"][0], json!(3.0));
        assert_eq!(figure["meta"]["column"], "temp");
    }

    #[test]
    fn test_outlier_trace() {
        let figure = outlier_figure(&series(), &[3], json!({}));
        assert_eq!(figure["data"][1]["x"], json!([3]));
        assert_eq!(figure["data"][1]["y"], json!([10.0]));
    }

    #[test]
    fn test_gap_shapes() {
        let figure = gap_figure(&series(), &[(json!(1), json!(1))], json!({}));
        assert_eq!(figure["layout"]["shapes"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_svg() {
        let svg = svg_line_chart("a < b", &[(0.0, 1.0), (1.0, 2.0)]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("a &lt; b"));
        assert!(svg.contains("<polyline"));
        assert!(svg.ends_with("</svg>"));
    }
}
