//! SVG area chart of a sample list: one filled series per topology, a
//! fixed 1–10 sequence axis and an auto-scaled value axis.
//!
//! Rendering is a pure function of its inputs; hover tooltips are native
//! SVG `<title>` elements on one invisible band per sample.

pub mod axis;

use std::fmt::Write;
use std::str::FromStr;

use serde::Deserialize;

use crate::controller::{Sample, Topology, TopologyReading};
use axis::{ValueAxis, X_DOMAIN};

/// Which reading field both series plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartMetric {
    ProcessingTime,
    EndToEndTime,
}

impl ChartMetric {
    fn field_suffix(self) -> &'static str {
        match self {
            Self::ProcessingTime => "processingTime",
            Self::EndToEndTime => "endToEndTime",
        }
    }

    /// Key of this metric for one topology, e.g. `global_processingTime`.
    pub fn series_key(self, topology: Topology) -> String {
        format!("{}_{}", topology.key_prefix(), self.field_suffix())
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::ProcessingTime => "Processing time",
            Self::EndToEndTime => "End to end time",
        }
    }

    fn value(self, reading: &TopologyReading) -> f64 {
        match self {
            Self::ProcessingTime => reading.processing_time_ms,
            Self::EndToEndTime => reading.end_to_end_ms,
        }
    }
}

impl FromStr for ChartMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing-time" => Ok(Self::ProcessingTime),
            "end-to-end-time" => Ok(Self::EndToEndTime),
            other => Err(format!("unknown chart '{other}'")),
        }
    }
}

/// Pixel size of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Geometry {
    #[serde(default = "default_side")]
    pub width: u32,
    #[serde(default = "default_side")]
    pub height: u32,
}

fn default_side() -> u32 {
    500
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width: default_side(),
            height: default_side(),
        }
    }
}

// ─── Layout ──────────────────────────────────────────────────────

const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 10.0;
const MARGIN_BOTTOM: f64 = 30.0;

const GRID_COLOUR: &str = "#ccc";
const AXIS_COLOUR: &str = "#666";

struct Plot {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    y: ValueAxis,
}

impl Plot {
    fn new(geometry: Geometry, y: ValueAxis) -> Self {
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: (geometry.width as f64 - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
            height: (geometry.height as f64 - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
            y,
        }
    }

    fn x_step(&self) -> f64 {
        self.width / (X_DOMAIN.1 - X_DOMAIN.0) as f64
    }

    fn x(&self, seq: u32) -> f64 {
        self.left + seq.saturating_sub(X_DOMAIN.0) as f64 * self.x_step()
    }

    fn y(&self, value: f64) -> f64 {
        self.top + self.height - (value / self.y.max).clamp(0.0, 1.0) * self.height
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

// ─── Rendering ───────────────────────────────────────────────────

/// Render `samples` as an SVG document plotting `metric` for both topologies.
pub fn render(samples: &[Sample], metric: ChartMetric, geometry: Geometry) -> String {
    let data_max = samples
        .iter()
        .flat_map(|s| Topology::ALL.into_iter().filter_map(move |t| s.reading(t)))
        .map(|r| metric.value(r))
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
    let plot = Plot::new(geometry, ValueAxis::fit(data_max));

    let mut svg = String::with_capacity(4096);
    // Writing into a String cannot fail.
    let _ = write_document(&mut svg, samples, metric, geometry, &plot);
    svg
}

fn write_document(
    out: &mut String,
    samples: &[Sample],
    metric: ChartMetric,
    geometry: Geometry,
    plot: &Plot,
) -> std::fmt::Result {
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
        w = geometry.width,
        h = geometry.height,
    )?;
    writeln!(out, "<title>{}</title>", metric.title())?;

    writeln!(out, "<defs>")?;
    for topology in Topology::ALL {
        writeln!(
            out,
            r#"<linearGradient id="{id}" x1="0" y1="0" x2="0" y2="1"><stop offset="5%" stop-color="{c}" stop-opacity="0.8"/><stop offset="95%" stop-color="{c}" stop-opacity="0"/></linearGradient>"#,
            id = metric.series_key(topology),
            c = topology.colour(),
        )?;
    }
    writeln!(out, "</defs>")?;

    write_grid(out, plot)?;
    write_axes(out, plot)?;
    for topology in Topology::ALL {
        write_series(out, samples, metric, topology, plot)?;
    }
    write_tooltips(out, samples, metric, plot)?;

    writeln!(out, "</svg>")
}

fn write_grid(out: &mut String, plot: &Plot) -> std::fmt::Result {
    writeln!(
        out,
        r#"<g class="grid" stroke="{GRID_COLOUR}" stroke-dasharray="3 3">"#
    )?;
    for seq in X_DOMAIN.0..=X_DOMAIN.1 {
        let x = plot.x(seq);
        writeln!(
            out,
            r#"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}"/>"#,
            plot.top,
            plot.bottom()
        )?;
    }
    for &tick in &plot.y.ticks {
        let y = plot.y(tick);
        writeln!(
            out,
            r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}"/>"#,
            plot.left,
            plot.left + plot.width
        )?;
    }
    writeln!(out, "</g>")
}

fn write_axes(out: &mut String, plot: &Plot) -> std::fmt::Result {
    let bottom = plot.bottom();

    writeln!(out, r#"<g class="x-axis" fill="{AXIS_COLOUR}" text-anchor="middle">"#)?;
    writeln!(
        out,
        r#"<line x1="{:.1}" y1="{bottom:.1}" x2="{:.1}" y2="{bottom:.1}" stroke="{AXIS_COLOUR}"/>"#,
        plot.left,
        plot.left + plot.width
    )?;
    for seq in X_DOMAIN.0..=X_DOMAIN.1 {
        writeln!(
            out,
            r#"<text class="tick" x="{:.1}" y="{:.1}">{seq}</text>"#,
            plot.x(seq),
            bottom + 18.0
        )?;
    }
    writeln!(out, "</g>")?;

    writeln!(out, r#"<g class="y-axis" fill="{AXIS_COLOUR}" text-anchor="end">"#)?;
    writeln!(
        out,
        r#"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{bottom:.1}" stroke="{AXIS_COLOUR}"/>"#,
        plot.top,
        x = plot.left
    )?;
    for &tick in &plot.y.ticks {
        writeln!(
            out,
            r#"<text class="tick" x="{:.1}" y="{:.1}">{}</text>"#,
            plot.left - 6.0,
            plot.y(tick) + 4.0,
            plot.y.label(tick)
        )?;
    }
    writeln!(out, "</g>")
}

/// Filled area + outline + dots, only where the topology has a reading.
fn write_series(
    out: &mut String,
    samples: &[Sample],
    metric: ChartMetric,
    topology: Topology,
    plot: &Plot,
) -> std::fmt::Result {
    let points: Vec<(f64, f64)> = samples
        .iter()
        .filter_map(|s| {
            s.reading(topology)
                .map(|r| (plot.x(s.fetch_num), plot.y(metric.value(r))))
        })
        .collect();
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Ok(());
    };

    let key = metric.series_key(topology);
    let colour = topology.colour();
    let bottom = plot.bottom();

    writeln!(out, r#"<g class="series" data-key="{key}">"#)?;

    let mut area = format!("M{:.1},{bottom:.1}", first.0);
    let mut line = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        write!(area, " L{x:.1},{y:.1}")?;
        write!(line, "{}{x:.1},{y:.1}", if i == 0 { "" } else { " " })?;
    }
    write!(area, " L{:.1},{bottom:.1} Z", last.0)?;

    writeln!(out, r#"<path d="{area}" fill="url(#{key})" stroke="none"/>"#)?;
    writeln!(
        out,
        r#"<polyline points="{line}" fill="none" stroke="{colour}" stroke-width="2"/>"#
    )?;
    for (x, y) in &points {
        writeln!(
            out,
            r##"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="#fff" stroke="{colour}"/>"##
        )?;
    }
    writeln!(out, "</g>")
}

/// One hover band per sample, centred on its sequence number.
fn write_tooltips(
    out: &mut String,
    samples: &[Sample],
    metric: ChartMetric,
    plot: &Plot,
) -> std::fmt::Result {
    if samples.is_empty() {
        return Ok(());
    }

    let band = plot.x_step();
    writeln!(out, r#"<g class="tooltips" fill="transparent">"#)?;
    for sample in samples {
        let x0 = (plot.x(sample.fetch_num) - band / 2.0).max(plot.left);
        let x1 = (plot.x(sample.fetch_num) + band / 2.0).min(plot.left + plot.width);
        writeln!(
            out,
            r#"<rect x="{x0:.1}" y="{:.1}" width="{:.1}" height="{:.1}"><title>{}</title></rect>"#,
            plot.top,
            (x1 - x0).max(0.0),
            plot.height,
            tooltip_text(sample, metric)
        )?;
    }
    writeln!(out, "</g>")
}

/// `#n`, then per present topology its value and cold-start flag.
pub fn tooltip_text(sample: &Sample, metric: ChartMetric) -> String {
    let mut lines = vec![format!("#{}", sample.fetch_num)];
    for topology in Topology::ALL {
        if let Some(reading) = sample.reading(topology) {
            lines.push(format!(
                "{}: {}",
                topology.label(),
                format_value(metric.value(reading))
            ));
            lines.push(format!("Cold start: {}", reading.cold_start));
        }
    }
    lines.join("\n")
}

/// At most two decimals, trailing zeros trimmed.
fn format_value(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
