use textplots::{Chart, Plot, Shape};

use crate::error::SiglentError;

/// Pick a frequency unit so axis labels stay readable
fn determine_frequency_scale(max_hz: f64) -> (f64, &'static str) {
    if max_hz >= 1e9 {
        (1e-9, "GHz")
    } else if max_hz >= 1e6 {
        (1e-6, "MHz")
    } else if max_hz >= 1e3 {
        (1e-3, "kHz")
    } else {
        (1.0, "Hz")
    }
}

/// Map sample positions onto the x axis. Without a frequency range the
/// sample index is used.
fn build_frame(samples: &[f64], x_range_hz: Option<(f64, f64)>) -> (Vec<(f32, f32)>, f32, f32, String) {
    let last = samples.len().saturating_sub(1).max(1) as f64;

    match x_range_hz {
        Some((start, stop)) => {
            let (scale, unit) = determine_frequency_scale(start.abs().max(stop.abs()));
            let step = (stop - start) / last;
            let frame = samples
                .iter()
                .enumerate()
                .map(|(i, &y)| (((start + step * i as f64) * scale) as f32, y as f32))
                .collect();
            (
                frame,
                (start * scale) as f32,
                (stop * scale) as f32,
                format!("Frequency ({unit})"),
            )
        }
        None => {
            let frame = samples
                .iter()
                .enumerate()
                .map(|(i, &y)| (i as f32, y as f32))
                .collect();
            (frame, 0.0, last as f32, "Sample Index".to_string())
        }
    }
}

/// Draw a trace in the terminal.
///
/// # Arguments
/// * `samples` - Trace amplitudes, usually dBm
/// * `x_range_hz` - Start and stop frequency of the sweep, if known
/// * `title` - Optional title for the plot
/// * `width` - Optional plot width (default: 140)
/// * `height` - Optional plot height (default: 60)
///
/// # Examples
/// ```
/// use siglent_sa::plotting::plot_trace;
///
/// let samples = vec![-90.0, -85.5, -40.2, -86.0, -91.0];
/// plot_trace(&samples, Some((2.4e9, 2.5e9)), Some("2.4 GHz band"), None, None).unwrap();
/// ```
pub fn plot_trace(
    samples: &[f64],
    x_range_hz: Option<(f64, f64)>,
    title: Option<&str>,
    width: Option<usize>,
    height: Option<usize>,
) -> Result<(), SiglentError> {
    if samples.is_empty() {
        return Err(SiglentError::InvalidArgument(
            "Cannot plot empty trace".to_string(),
        ));
    }
    if let Some((start, stop)) = x_range_hz {
        if !(start.is_finite() && stop.is_finite()) || stop <= start {
            return Err(SiglentError::InvalidArgument(format!(
                "Invalid frequency range {start} to {stop} Hz"
            )));
        }
    }

    let width = width.unwrap_or(140);
    let height = height.unwrap_or(60);

    let min_value = samples.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max_value = samples.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let (frame, x_min, x_max, x_label) = build_frame(samples, x_range_hz);

    println!("{}", title.unwrap_or("Trace"));
    println!("X-axis: {x_label} | Y-axis: dBm");
    println!(
        "Range: {} points | Values: {:.2} to {:.2} dBm",
        samples.len(),
        min_value,
        max_value
    );
    println!("{}", "─".repeat(width));

    Chart::new(width as u32, height as u32, x_min, x_max)
        .lineplot(&Shape::Lines(&frame))
        .nice();

    println!("{x_label} →");

    Ok(())
}
