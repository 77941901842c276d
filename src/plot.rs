use std::{fs, path::Path};

use ratatui::{prelude::*, widgets::*};

use crate::harness::BoxError;

/// Axis titles and legend of a curve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub x: String,
    pub y: String,
    pub legend: String,
}

impl Labels {
    pub fn new(x: impl Into<String>, y: impl Into<String>, legend: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            legend: legend.into(),
        }
    }
}

/// A line chart whose bounds grow with its data
#[derive(Debug, Clone)]
pub struct Plot {
    labels: Labels,
    x_bounds: Option<[f64; 2]>,
    y_bounds: Option<[f64; 2]>,
    data: Vec<(f64, f64)>,
}

impl Plot {
    pub fn new(labels: Labels) -> Self {
        Self {
            labels,
            x_bounds: None,
            y_bounds: None,
            data: Vec::new(),
        }
    }

    /// Build a plot holding every point of `points`
    pub fn from_points(labels: Labels, points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        points.into_iter().fold(Self::new(labels), |mut plot, point| {
            plot.update(point);
            plot
        })
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.data
    }

    pub fn update(&mut self, point: (f64, f64)) {
        self.x_bounds = Some(widen(self.x_bounds, point.0));
        self.y_bounds = Some(widen(self.y_bounds, point.1));
        self.data.push(point);
    }

    /// Bounds to draw with, never empty
    fn axis_bounds(bounds: Option<[f64; 2]>) -> [f64; 2] {
        match bounds {
            None => [0.0, 1.0],
            Some([lo, hi]) if lo == hi => [lo - 1.0, hi + 1.0],
            Some(bounds) => bounds,
        }
    }
}

fn widen(bounds: Option<[f64; 2]>, value: f64) -> [f64; 2] {
    match bounds {
        None => [value, value],
        Some([lo, hi]) => [lo.min(value), hi.max(value)],
    }
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::from(format!("{v:.2}")).bold())
        .collect()
}

impl Widget for &Plot {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let x_bounds = Plot::axis_bounds(self.x_bounds);
        let y_bounds = Plot::axis_bounds(self.y_bounds);

        let dataset = Dataset::default()
            .name(self.labels.legend.clone())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .cyan()
            .data(&self.data);

        let x_axis = Axis::default()
            .title(self.labels.x.clone())
            .dark_gray()
            .labels(axis_labels(x_bounds))
            .bounds(x_bounds);

        let y_axis = Axis::default()
            .title(self.labels.y.clone())
            .dark_gray()
            .labels(axis_labels(y_bounds))
            .bounds(y_bounds);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(self.labels.legend.clone());

        Chart::new(vec![dataset])
            .block(block)
            .x_axis(x_axis)
            .y_axis(y_axis)
            .legend_position(Some(LegendPosition::TopLeft))
            .render(area, buf);
    }
}

/// Turns a [`Plot`] into an artifact on disk
pub trait Plotter {
    fn plot(&mut self, plot: &Plot, path: &Path) -> Result<(), BoxError>;
}

/// Draws plots off-screen with ratatui and saves them as plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChart {
    width: u16,
    height: u16,
}

impl Default for TextChart {
    fn default() -> Self {
        Self {
            width: 100,
            height: 30,
        }
    }
}

impl TextChart {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Draw `plot` into a `width` by `height` grid of characters, one line per row
    pub fn draw(&self, plot: &Plot) -> String {
        let area = Rect::new(0, 0, self.width, self.height);
        let mut buf = Buffer::empty(area);
        plot.render(area, &mut buf);

        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for y in area.top()..area.bottom() {
            let row: String = (area.left()..area.right())
                .map(|x| buf.get(x, y).symbol())
                .collect();
            out.push_str(row.trim_end());
            out.push('\n');
        }
        out
    }
}

impl Plotter for TextChart {
    fn plot(&mut self, plot: &Plot, path: &Path) -> Result<(), BoxError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.draw(plot))?;
        Ok(())
    }
}
