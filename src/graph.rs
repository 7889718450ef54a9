#![cfg(feature = "web")]
use plotters::prelude::*;
use std::io::Cursor;

use crate::error::{Result, SweeperError};
use crate::frame::Frame;

/// Columns charted at most
const MAX_SERIES: usize = 2;

/// Configuration options for chart generation
///
/// This structure contains the customizable properties of the bar chart.
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the graph
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the graph in pixels
    pub width: u32,

    /// Height of the graph in pixels
    pub height: u32,
}

impl Default for GraphOptions {
    /// Creates a default configuration for chart generation
    ///
    /// # Returns
    /// * `GraphOptions` - Default configuration with:
    ///   - 800x600 pixel dimensions
    ///   - Row index on the X axis
    fn default() -> Self {
        Self {
            title: "Data Visualization".to_string(),
            x_label: "Row".to_string(),
            y_label: "Value".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// One charted column
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: String,
    /// One entry per row; missing values draw no bar
    pub values: Vec<Option<f64>>,
}

/// The numeric data behind a bar chart
#[derive(Clone, Debug, PartialEq)]
pub struct ChartData {
    pub series: Vec<Series>,
    pub rows: usize,
}

impl ChartData {
    /// Takes the first two numeric columns of `frame`, in frame order
    ///
    /// # Errors
    /// * [`SweeperError::Chart`] if the frame has no numeric column
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let series: Vec<Series> = frame
            .columns()
            .iter()
            .filter(|c| c.is_numeric())
            .take(MAX_SERIES)
            .map(|c| Series {
                name: c.name.clone(),
                values: c.values.iter().map(|v| v.as_number()).collect(),
            })
            .collect();

        if series.is_empty() {
            return Err(SweeperError::Chart("no numeric columns to chart".to_string()));
        }

        Ok(ChartData {
            series,
            rows: frame.height(),
        })
    }

    /// Smallest and largest bar heights, always including zero
    fn value_range(&self) -> (f64, f64) {
        let (lo, hi) = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if lo == hi { (lo, hi + 1.0) } else { (lo, hi) }
    }
}

/// Renders a grouped bar chart as PNG bytes
///
/// Bars for row `i` are grouped around `x = i`, one bar per series.
///
/// # Arguments
/// * `data` - Series extracted with [`ChartData::from_frame`]
/// * `options` - Graph styling options
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
///
/// # Errors
/// * [`SweeperError::Render`] if drawing or PNG encoding fails
///
/// # Implementation Notes
/// * Draws into an in-memory RGB buffer, then encodes it with `image`
pub fn render_bar_chart(data: &ChartData, options: &GraphOptions) -> Result<Vec<u8>> {
    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; width as usize * height as usize * 3];

    draw_bars(data, options, &mut pixels).map_err(|e| SweeperError::Render(e.to_string()))?;

    let image = image::RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| SweeperError::Render("pixel buffer size mismatch".to_string()))?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .map_err(|e| SweeperError::Render(e.to_string()))?;

    Ok(png)
}

fn draw_bars(
    data: &ChartData,
    options: &GraphOptions,
    pixels: &mut [u8],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root =
        BitMapBackend::with_buffer(pixels, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let (min_y, max_y) = data.value_range();
    let x_range = -0.5..(data.rows.max(1) as f64 - 0.5);

    let mut chart = ChartBuilder::on(&root)
        .caption(&options.title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, min_y..max_y)?;

    chart
        .configure_mesh()
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .draw()?;

    let group_width = 0.8;
    let bar_width = group_width / data.series.len() as f64;

    for (s, series) in data.series.iter().enumerate() {
        let color = Palette99::pick(s).to_rgba();
        let offset = -group_width / 2.0 + s as f64 * bar_width;

        chart
            .draw_series(series.values.iter().enumerate().filter_map(|(row, v)| {
                v.map(|v| {
                    let x0 = row as f64 + offset;
                    Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], color.filled())
                })
            }))?
            .label(series.name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
