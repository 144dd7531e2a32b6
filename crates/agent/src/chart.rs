//! PNG chart of the cycle series.
//!
//! The chart is a plain raster plot: level over time in blue, the alarm
//! threshold in red, failed acquisitions as orange ticks on the time axis.
//! It exists to be attached to notifications, so it carries no text.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use soundwatch_core::Sample;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const BLUE: Rgb<u8> = Rgb([31, 119, 180]);
const RED: Rgb<u8> = Rgb([214, 39, 40]);
const ORANGE: Rgb<u8> = Rgb([255, 127, 14]);

const MARGIN: u32 = 24;

/// Headroom above the threshold so the red line never sits on the border.
const THRESHOLD_HEADROOM: f64 = 1.1;

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Nothing to plot")]
    Empty,

    #[error("Chart image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Renders the cycle series to an image file.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, samples: &[Sample], threshold: f64, path: &Path) -> Result<(), ChartError>;
}

/// [`ChartRenderer`] producing a PNG file.
#[derive(Debug, Clone, Copy)]
pub struct PngChart {
    width: u32,
    height: u32,
}

impl Default for PngChart {
    fn default() -> Self {
        Self::new(800, 400)
    }
}

impl PngChart {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(2 * MARGIN + 2),
            height: height.max(2 * MARGIN + 2),
        }
    }

    /// Draw the series into an in-memory image.
    pub fn draw(&self, samples: &[Sample], threshold: f64) -> Result<RgbImage, ChartError> {
        let (first, last) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ChartError::Empty),
        };

        let mut img = RgbImage::from_pixel(self.width, self.height, WHITE);
        let plot = PlotArea::new(self.width, self.height);

        let peak = samples.iter().map(|s| s.level).fold(0.0_f64, f64::max);
        let y_max = peak.max(threshold * THRESHOLD_HEADROOM).max(1.0);

        let span_ms = last
            .timestamp
            .signed_duration_since(first.timestamp)
            .num_milliseconds();
        let count = samples.len();
        let x_frac = |idx: usize, sample: &Sample| -> f64 {
            if span_ms > 0 {
                let offset = sample
                    .timestamp
                    .signed_duration_since(first.timestamp)
                    .num_milliseconds();
                offset as f64 / span_ms as f64
            } else if count > 1 {
                idx as f64 / (count - 1) as f64
            } else {
                0.5
            }
        };

        // Axes.
        draw_line(&mut img, plot.left, plot.bottom, plot.right, plot.bottom, BLACK);
        draw_line(&mut img, plot.left, plot.top, plot.left, plot.bottom, BLACK);

        // Threshold.
        let threshold_y = plot.y(threshold / y_max);
        draw_line(&mut img, plot.left, threshold_y, plot.right, threshold_y, RED);

        // Series; failures plot at zero.
        let mut previous: Option<(i64, i64)> = None;
        for (idx, sample) in samples.iter().enumerate() {
            let x = plot.x(x_frac(idx, sample));
            let y = plot.y(sample.level.max(0.0) / y_max);
            if let Some((px, py)) = previous {
                draw_line(&mut img, px, py, x, y, BLUE);
            } else {
                put(&mut img, x, y, BLUE);
            }
            if sample.is_failure() {
                draw_line(&mut img, x, plot.bottom - 4, x, plot.bottom + 4, ORANGE);
            }
            previous = Some((x, y));
        }

        Ok(img)
    }
}

impl ChartRenderer for PngChart {
    fn render(&self, samples: &[Sample], threshold: f64, path: &Path) -> Result<(), ChartError> {
        let img = self.draw(samples, threshold)?;
        img.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Pixel bounds of the plotting region.
struct PlotArea {
    left: i64,
    right: i64,
    top: i64,
    bottom: i64,
}

impl PlotArea {
    fn new(width: u32, height: u32) -> Self {
        Self {
            left: i64::from(MARGIN),
            right: i64::from(width - MARGIN),
            top: i64::from(MARGIN),
            bottom: i64::from(height - MARGIN),
        }
    }

    fn x(&self, frac: f64) -> i64 {
        self.left + (frac.clamp(0.0, 1.0) * (self.right - self.left) as f64).round() as i64
    }

    /// `frac = 0` is the bottom edge.
    fn y(&self, frac: f64) -> i64 {
        self.bottom - (frac.clamp(0.0, 1.0) * (self.bottom - self.top) as f64).round() as i64
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(img.width()) && y < i64::from(img.height()) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line, clipped to the image.
fn draw_line(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y) = (x0, y0);
    let mut err = dx + dy;

    loop {
        put(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    use super::*;

    fn series(levels: &[f64]) -> Vec<Sample> {
        let t0: NaiveDateTime = NaiveDate::from_ymd_opt(2026, 4, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| Sample::new(t0 + TimeDelta::seconds(12 * i as i64), level))
            .collect()
    }

    #[test]
    fn empty_series_is_rejected() {
        let err = PngChart::default().draw(&[], 1000.0).unwrap_err();
        assert!(matches!(err, ChartError::Empty));
    }

    #[test]
    fn draws_series_threshold_and_failures() {
        let img = PngChart::new(200, 100)
            .draw(&series(&[1500.0, -1.0, 400.0, 1200.0]), 1000.0)
            .expect("draws");
        assert_eq!(img.dimensions(), (200, 100));
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert!(img.pixels().any(|p| *p == BLUE));
        assert!(img.pixels().any(|p| *p == RED));
        assert!(img.pixels().any(|p| *p == ORANGE));
    }

    #[test]
    fn single_sample_is_plotted() {
        let img = PngChart::new(100, 60)
            .draw(&series(&[500.0]), 1000.0)
            .expect("draws");
        assert!(img.pixels().any(|p| *p == BLUE));
    }

    #[test]
    fn render_writes_a_png() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("chart.png");
        PngChart::default()
            .render(&series(&[10.0, 20.0]), 15.0, &path)
            .expect("renders");
        let bytes = std::fs::read(&path).expect("file exists");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn line_endpoints_are_drawn() {
        let mut img = RgbImage::from_pixel(10, 10, WHITE);
        draw_line(&mut img, 1, 1, 8, 5, BLACK);
        assert_eq!(*img.get_pixel(1, 1), BLACK);
        assert_eq!(*img.get_pixel(8, 5), BLACK);
        // Out of bounds is clipped rather than panicking.
        draw_line(&mut img, -5, -5, 20, 20, BLACK);
    }
}
