use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::info;
use thiserror::Error;

use crate::plot::{Labels, Plot, Plotter, TextChart};

use super::BoxError;

/// One sample of the learning curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Interactions learned from when the sample was taken
    pub x: u64,
    /// Mean evaluation return
    pub y: f64,
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("could not write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write metric export")]
    Csv(#[from] csv::Error),
    #[error("could not render {}", path.display())]
    Plot {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

fn create_parent(path: &Path) -> Result<(), RecorderError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| RecorderError::Io {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

struct LogFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Accumulates the learning curve and the textual log of a run
///
/// Lines and points are kept in memory in insertion order. Optionally every line is appended to a
/// log file and every point to a CSV export with a `timestep,reward` header.
pub struct MetricRecorder {
    labels: Labels,
    lines: Vec<String>,
    points: Vec<Point>,
    log_file: Option<LogFile>,
    csv: Option<csv::Writer<File>>,
    plotter: Box<dyn Plotter>,
}

impl MetricRecorder {
    /// A recorder that keeps everything in memory and renders with a [`TextChart`]
    pub fn new(labels: Labels) -> Self {
        Self {
            labels,
            lines: Vec::new(),
            points: Vec::new(),
            log_file: None,
            csv: None,
            plotter: Box::new(TextChart::default()),
        }
    }

    /// Also append every logged line to `path`, truncating it first
    pub fn with_log_path(mut self, path: impl AsRef<Path>) -> Result<Self, RecorderError> {
        let path = path.as_ref();
        create_parent(path)?;
        let file = File::create(path).map_err(|source| RecorderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.log_file = Some(LogFile {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        });
        Ok(self)
    }

    /// Also export every point to a CSV file at `path`, truncating it first
    pub fn with_csv_path(mut self, path: impl AsRef<Path>) -> Result<Self, RecorderError> {
        let path = path.as_ref();
        create_parent(path)?;
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["timestep", "reward"])?;
        writer.flush().map_err(csv::Error::from)?;
        self.csv = Some(writer);
        Ok(self)
    }

    /// Render with `plotter` instead of the default [`TextChart`]
    pub fn with_plotter(mut self, plotter: impl Plotter + 'static) -> Self {
        self.plotter = Box::new(plotter);
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Append a line to the log
    pub fn log_line(&mut self, text: impl Into<String>) -> Result<(), RecorderError> {
        let text = text.into();
        info!("{text}");

        if let Some(LogFile { path, writer }) = &mut self.log_file {
            writeln!(writer, "{text}")
                .and_then(|_| writer.flush())
                .map_err(|source| RecorderError::Io {
                    path: path.clone(),
                    source,
                })?;
        }

        self.lines.push(text);
        Ok(())
    }

    /// Append a point to the learning curve
    ///
    /// Points are never sorted; callers are expected to add them with non-decreasing `x`.
    pub fn add_point(&mut self, x: u64, y: f64) -> Result<(), RecorderError> {
        if let Some(writer) = &mut self.csv {
            writer.write_record([x.to_string(), y.to_string()])?;
            writer.flush().map_err(csv::Error::from)?;
        }

        self.points.push(Point { x, y });
        Ok(())
    }

    /// The whole learning curve as a [`Plot`]
    pub fn plot(&self) -> Plot {
        Plot::from_points(
            self.labels.clone(),
            self.points.iter().map(|p| (p.x as f64, p.y)),
        )
    }

    /// Render every point recorded so far to `path`
    pub fn render(&mut self, path: impl AsRef<Path>) -> Result<(), RecorderError> {
        let path = path.as_ref();
        let plot = self.plot();
        self.plotter
            .plot(&plot, path)
            .map_err(|source| RecorderError::Plot {
                path: path.to_path_buf(),
                source,
            })
    }
}
