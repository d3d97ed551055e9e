//! Scatter chart and sample table construction
//!
//! The chart model is serialised as JSON for the browser and can also be
//! rendered server-side as a standalone SVG document.

use crate::catalog::TrackCatalog;
use crate::projection::Projection;
use serde::Serialize;
use std::collections::BTreeMap;
use trackmap_common::features::{CLUSTER_COLUMN, HOVER_FEATURES};
use trackmap_common::{Error, Result};

pub const CHART_TITLE: &str = "PCA projection of tracks (click legend to toggle clusters)";
pub const CHART_WIDTH: u32 = 1200;
pub const CHART_HEIGHT: u32 = 700;
pub const MARKER_SIZE: f64 = 6.0;
pub const MARKER_OPACITY: f64 = 0.7;

/// Qualitative pastel palette, indexed by cluster id
pub const PASTEL: [&str; 11] = [
    "rgb(102, 197, 204)",
    "rgb(246, 207, 113)",
    "rgb(248, 156, 116)",
    "rgb(220, 176, 242)",
    "rgb(135, 197, 95)",
    "rgb(158, 185, 243)",
    "rgb(254, 136, 177)",
    "rgb(201, 219, 116)",
    "rgb(139, 224, 164)",
    "rgb(180, 151, 231)",
    "rgb(179, 179, 179)",
];

pub const SAMPLE_MIN: usize = 3;
pub const SAMPLE_MAX: usize = 30;
pub const SAMPLE_DEFAULT: usize = 8;

pub fn cluster_color(cluster: i64) -> &'static str {
    PASTEL[cluster.rem_euclid(PASTEL.len() as i64) as usize]
}

/// Sample size requested by the user, clamped to the slider range
pub fn clamp_sample_size(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(SAMPLE_DEFAULT)
        .clamp(SAMPLE_MIN, SAMPLE_MAX)
}

#[derive(Debug, Clone, Serialize)]
pub struct HoverField {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterPoint {
    /// Source row index in the dataset
    pub row: usize,
    pub x: f64,
    pub y: f64,
    pub cluster: i64,
    pub hover: Vec<HoverField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub cluster: i64,
    pub color: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterChart {
    pub title: &'static str,
    pub width: u32,
    pub height: u32,
    pub marker_size: f64,
    pub opacity: f64,
    pub points: Vec<ScatterPoint>,
    /// One entry per cluster present in the selection, sorted by id
    pub legend: Vec<LegendEntry>,
}

/// Attach projection coordinates and hover text to each selected row
pub fn build_scatter(
    catalog: &TrackCatalog,
    rows: &[usize],
    projection: &Projection,
) -> Result<ScatterChart> {
    if projection.len() != rows.len() {
        return Err(Error::Internal(format!(
            "projection has {} points for {} rows",
            projection.len(),
            rows.len()
        )));
    }

    let hover_features: Vec<_> = HOVER_FEATURES
        .iter()
        .copied()
        .filter(|f| catalog.has_feature(*f))
        .collect();

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    let mut points = Vec::with_capacity(rows.len());

    for (i, &row) in rows.iter().enumerate() {
        let cluster = catalog.cluster(row).ok_or_else(|| {
            Error::Internal(format!("row {} outside catalog", row))
        })?;
        let (x, y) = projection
            .point(i)
            .ok_or_else(|| Error::Internal(format!("missing projection point {}", i)))?;

        let mut hover = Vec::new();
        if let (Some(column), Some(name)) = (catalog.track_column(), catalog.track_name(row)) {
            hover.push(field(column, name));
        }
        if let (Some(column), Some(name)) = (catalog.artist_column(), catalog.artist_name(row)) {
            hover.push(field(column, name));
        }
        for feature in &hover_features {
            let value = catalog.text(row, feature.column_name()).unwrap_or("");
            hover.push(field(feature.column_name(), value));
        }
        hover.push(field(CLUSTER_COLUMN, &cluster.to_string()));
        hover.push(field("PC1", &format!("{:.3}", x)));
        hover.push(field("PC2", &format!("{:.3}", y)));

        *counts.entry(cluster).or_default() += 1;
        points.push(ScatterPoint {
            row,
            x,
            y,
            cluster,
            hover,
        });
    }

    let legend = counts
        .into_iter()
        .map(|(cluster, count)| LegendEntry {
            cluster,
            color: cluster_color(cluster),
            count,
        })
        .collect();

    Ok(ScatterChart {
        title: CHART_TITLE,
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
        marker_size: MARKER_SIZE,
        opacity: MARKER_OPACITY,
        points,
        legend,
    })
}

fn field(label: &str, value: &str) -> HoverField {
    HoverField {
        label: label.to_string(),
        value: value.to_string(),
    }
}

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 190.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 60.0;

/// Linear map from data range to pixel range, padded by 5%
struct Axis {
    lo: f64,
    hi: f64,
    px_lo: f64,
    px_hi: f64,
}

impl Axis {
    fn fit(values: impl Iterator<Item = f64>, px_lo: f64, px_hi: f64) -> Self {
        let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !lo.is_finite() || !hi.is_finite() {
            lo = -1.0;
            hi = 1.0;
        }
        if hi - lo < f64::EPSILON {
            lo -= 1.0;
            hi += 1.0;
        }
        let pad = (hi - lo) * 0.05;
        Self {
            lo: lo - pad,
            hi: hi + pad,
            px_lo,
            px_hi,
        }
    }

    fn map(&self, v: f64) -> f64 {
        self.px_lo + (v - self.lo) / (self.hi - self.lo) * (self.px_hi - self.px_lo)
    }
}

/// Render the chart as a standalone SVG document
///
/// Points are grouped per cluster (`<g class="cluster" data-cluster="..">`)
/// so the page script can toggle a cluster from its legend entry.
pub fn render_svg(chart: &ScatterChart) -> String {
    let w = chart.width as f64;
    let h = chart.height as f64;
    let plot_right = w - MARGIN_RIGHT;
    let plot_bottom = h - MARGIN_BOTTOM;

    let x_axis = Axis::fit(chart.points.iter().map(|p| p.x), MARGIN_LEFT, plot_right);
    // SVG y grows downward
    let y_axis = Axis::fit(chart.points.iter().map(|p| p.y), plot_bottom, MARGIN_TOP);

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = chart.width,
        h = chart.height
    ));
    svg.push_str(r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);
    svg.push_str(&format!(
        r#"<text class="title" x="{}" y="30" font-size="18">{}</text>"#,
        MARGIN_LEFT,
        escape_xml(chart.title)
    ));
    svg.push_str(&format!(
        r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="#e5ecf6"/>"##,
        MARGIN_LEFT,
        MARGIN_TOP,
        plot_right - MARGIN_LEFT,
        plot_bottom - MARGIN_TOP
    ));
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" font-size="14" text-anchor="middle">PC1</text>"#,
        (MARGIN_LEFT + plot_right) / 2.0,
        h - 20.0
    ));
    svg.push_str(&format!(
        r#"<text x="20" y="{:.1}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {:.1})">PC2</text>"#,
        (MARGIN_TOP + plot_bottom) / 2.0,
        (MARGIN_TOP + plot_bottom) / 2.0
    ));

    if chart.points.is_empty() {
        svg.push_str(&format!(
            r#"<text class="empty" x="{:.1}" y="{:.1}" font-size="16" text-anchor="middle">No tracks match the current filters</text>"#,
            (MARGIN_LEFT + plot_right) / 2.0,
            (MARGIN_TOP + plot_bottom) / 2.0
        ));
    }

    let radius = chart.marker_size / 2.0;
    for entry in &chart.legend {
        svg.push_str(&format!(
            r#"<g class="cluster" data-cluster="{}" fill="{}" fill-opacity="{}">"#,
            entry.cluster, entry.color, chart.opacity
        ));
        for point in chart.points.iter().filter(|p| p.cluster == entry.cluster) {
            let tooltip = point
                .hover
                .iter()
                .map(|f| format!("{}: {}", f.label, f.value))
                .collect::<Vec<_>>()
                .join("\n");
            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="{}"><title>{}</title></circle>"#,
                x_axis.map(point.x),
                y_axis.map(point.y),
                radius,
                escape_xml(&tooltip)
            ));
        }
        svg.push_str("</g>");
    }

    let legend_x = plot_right + 20.0;
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" font-size="14">Cluster</text>"#,
        legend_x,
        MARGIN_TOP + 10.0
    ));
    for (i, entry) in chart.legend.iter().enumerate() {
        let y = MARGIN_TOP + 30.0 + i as f64 * 22.0;
        svg.push_str(&format!(
            r#"<g class="legend-item" data-cluster="{c}" style="cursor:pointer"><rect x="{x:.1}" y="{ry:.1}" width="12" height="12" fill="{color}"/><text x="{tx:.1}" y="{ty:.1}" font-size="13">{c} ({n})</text></g>"#,
            c = entry.cluster,
            x = legend_x,
            ry = y - 10.0,
            color = entry.color,
            tx = legend_x + 18.0,
            ty = y,
            n = entry.count
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn escape_xml(s: &str) -> String {
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

/// First rows of the filtered selection for the table under the chart
#[derive(Debug, Clone, Serialize)]
pub struct SampleTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Columns: track, artist (when present), `Cluster`, then projection features
pub fn sample_table(catalog: &TrackCatalog, rows: &[usize], n: usize) -> SampleTable {
    let mut columns: Vec<String> = Vec::new();
    columns.extend(catalog.track_column().map(str::to_string));
    columns.extend(catalog.artist_column().map(str::to_string));
    columns.push(CLUSTER_COLUMN.to_string());
    columns.extend(catalog.features().iter().map(|f| f.column_name().to_string()));

    let rows = rows
        .iter()
        .take(n)
        .map(|&row| {
            columns
                .iter()
                .map(|column| catalog.text(row, column).unwrap_or("").to_string())
                .collect()
        })
        .collect();

    SampleTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackmap_common::Dataset;

    const CSV: &str = "track_name,artists,tempo,energy,valence,Cluster\n\
                       Song <A>,Band & Co,120,0.5,0.3,0\n\
                       Song B,Solo,130,0.7,0.9,2\n\
                       Song C,Solo,90,0.1,0.2,0\n";

    fn catalog() -> TrackCatalog {
        TrackCatalog::from_dataset(Dataset::from_reader(CSV.as_bytes()).unwrap()).unwrap()
    }

    fn projection() -> Projection {
        Projection {
            pc1: vec![1.0, -0.5, 0.25],
            pc2: vec![0.0, 2.0, -1.0],
        }
    }

    #[test]
    fn test_cluster_color_wraps() {
        assert_eq!(cluster_color(0), PASTEL[0]);
        assert_eq!(cluster_color(11), PASTEL[0]);
        assert_eq!(cluster_color(-1), PASTEL[10]);
    }

    #[test]
    fn test_clamp_sample_size() {
        assert_eq!(clamp_sample_size(None), 8);
        assert_eq!(clamp_sample_size(Some(1)), 3);
        assert_eq!(clamp_sample_size(Some(12)), 12);
        assert_eq!(clamp_sample_size(Some(500)), 30);
    }

    #[test]
    fn test_build_scatter_hover_and_legend() {
        let chart = build_scatter(&catalog(), &[0, 1, 2], &projection()).unwrap();
        assert_eq!(chart.points.len(), 3);
        assert_eq!(chart.title, CHART_TITLE);

        let labels: Vec<&str> = chart.points[0].hover.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["track_name", "artists", "tempo", "energy", "valence", "Cluster", "PC1", "PC2"]
        );
        assert_eq!(chart.points[0].hover[6].value, "1.000");

        let legend: Vec<(i64, usize)> = chart.legend.iter().map(|e| (e.cluster, e.count)).collect();
        assert_eq!(legend, vec![(0, 2), (2, 1)]);
    }

    #[test]
    fn test_build_scatter_length_mismatch() {
        assert!(build_scatter(&catalog(), &[0, 1], &projection()).is_err());
    }

    #[test]
    fn test_render_svg_escapes_and_groups() {
        let chart = build_scatter(&catalog(), &[0, 1, 2], &projection()).unwrap();
        let svg = render_svg(&chart);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Song &lt;A&gt;"));
        assert!(svg.contains("Band &amp; Co"));
        assert!(svg.contains(r#"data-cluster="0""#));
        assert!(svg.contains(r#"data-cluster="2""#));
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn test_render_svg_empty_selection() {
        let chart = build_scatter(&catalog(), &[], &Projection::default()).unwrap();
        let svg = render_svg(&chart);
        assert!(svg.contains("No tracks match"));
        assert_eq!(svg.matches("<circle").count(), 0);
    }

    #[test]
    fn test_sample_table_columns_and_limit() {
        let table = sample_table(&catalog(), &[2, 0, 1], 2);
        assert_eq!(
            table.columns,
            vec!["track_name", "artists", "Cluster", "energy", "valence", "tempo"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], "Song C");
        assert_eq!(table.rows[1][2], "0");
    }
}
