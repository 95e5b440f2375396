use plotters::prelude::{
    ChartBuilder, Color, IntoDrawingArea, Rectangle, SVGBackend, BLUE, WHITE,
};

use crate::error::{IoError, OchreError, OchreResult};

const CHART_SIZE: (u32, u32) = (800, 600);

/// Renders a histogram of the defined close diffs to an SVG document in
/// memory. Observational only; the caller persists it alongside the feature
/// table.
pub fn render_close_diff_histogram(diffs: &[f64], buckets: usize) -> OchreResult<String> {
    if diffs.is_empty() {
        return Err(IoError::PlotRender("no defined close diffs to plot".to_string()).into());
    }
    if buckets == 0 {
        return Err(IoError::PlotRender("bucket count must be positive".to_string()).into());
    }

    let (min, bucket_width, counts) = bucket_counts(diffs, buckets);
    let span = bucket_width * buckets as f64;
    let y_max = counts.iter().copied().max().unwrap_or(1).max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(to_render_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Close price differences", ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(48)
            .build_cartesian_2d(min..min + span, 0u32..y_max + y_max / 10 + 1)
            .map_err(to_render_error)?;

        chart
            .configure_mesh()
            .x_desc("close diff")
            .y_desc("count")
            .draw()
            .map_err(to_render_error)?;

        chart
            .draw_series(counts.iter().enumerate().map(|(i, &count)| {
                let x0 = min + i as f64 * bucket_width;
                Rectangle::new([(x0, 0u32), (x0 + bucket_width, count)], BLUE.filled())
            }))
            .map_err(to_render_error)?;

        root.present().map_err(to_render_error)?;
    }

    Ok(svg)
}

/// Equal-width bucketing over `[min, max]`; the maximum lands in the last
/// bucket. A zero-width sample still gets one visible bar.
fn bucket_counts(diffs: &[f64], buckets: usize) -> (f64, f64, Vec<u32>) {
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &v in diffs {
        min = min.min(v);
        max = max.max(v);
    }

    let span = if max > min { max - min } else { 1.0 };
    let bucket_width = span / buckets as f64;

    let mut counts = vec![0u32; buckets];
    for &v in diffs {
        let idx = (((v - min) / bucket_width) as usize).min(buckets - 1);
        counts[idx] += 1;
    }

    (min, bucket_width, counts)
}

fn to_render_error(e: impl std::fmt::Display) -> OchreError {
    IoError::PlotRender(e.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_counts_cover_every_value() {
        let diffs = [-1.0, -0.5, 0.0, 0.5, 1.0];
        let (min, width, counts) = bucket_counts(&diffs, 4);

        assert_eq!(min, -1.0);
        assert!((width - 0.5).abs() < 1e-12);
        assert_eq!(counts.iter().sum::<u32>(), diffs.len() as u32);
        // The maximum belongs to the last bucket, not one past it.
        assert_eq!(counts[3], 2);
    }

    #[test]
    fn test_bucket_counts_degenerate_sample() {
        let (_, width, counts) = bucket_counts(&[0.25, 0.25, 0.25], 10);

        assert!(width > 0.0);
        assert_eq!(counts.iter().sum::<u32>(), 3);
        assert_eq!(counts[0], 3);
    }

    #[test]
    fn test_render_produces_svg() {
        let diffs: Vec<f64> = (0..50).map(|i| (i as f64 - 25.0) / 10.0).collect();
        let svg = render_close_diff_histogram(&diffs, 10).expect("render failed");

        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_render_rejects_empty_input() {
        assert!(render_close_diff_histogram(&[], 10).is_err());
        assert!(render_close_diff_histogram(&[1.0], 0).is_err());
    }
}
