//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Collected by [`process_with_diagnostics`](crate::process_with_diagnostics)
//! alongside the crop result, for parameter tuning and performance work.
//!
//! The pipeline has no platform time source of its own. Callers pass a
//! [`Clock`]; [`NullClock`] records zero durations.
//!
//! Durations serialize as seconds in an `f64`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Rect;

/// Time source for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// Current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] that never advances.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClock;

impl Clock for NullClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, _since: &()) -> Duration {
        Duration::ZERO
    }
}

/// Run `f` and measure how long it took.
pub(crate) fn timed<C: Clock, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let value = f();
    (value, clock.elapsed(&start))
}

/// `Duration` <-> seconds as `f64`.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "stage duration must be a finite, non-negative number of seconds",
            )
        })
    }
}

/// Timing and counts from one pipeline run.
///
/// The blur stage only runs for strategies that smooth their input, so
/// its field is `None` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Intensity conversion.
    pub grayscale: StageDiagnostics,
    /// Gaussian smoothing (contour strategy only).
    pub blur: Option<StageDiagnostics>,
    /// Sobel magnitude.
    pub edge_detection: StageDiagnostics,
    /// Region location, including mask building for the contour strategy.
    pub locate: StageDiagnostics,
    /// Padding and sub-image copy.
    pub crop: StageDiagnostics,
    /// Wall-clock time from validation to the cropped image.
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary of the run.
    pub summary: PipelineSummary,
}

/// One stage's timing and metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock time spent in the stage.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Intensity conversion.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Gaussian smoothing.
    Blur {
        /// Configured kernel size.
        kernel_size: u32,
        /// Equivalent standard deviation.
        sigma: f32,
    },
    /// Sobel magnitude.
    EdgeDetection {
        /// Threshold used for counting.
        threshold: u8,
        /// Pixels whose magnitude exceeds `threshold`.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Region location.
    Locate {
        /// Strategy name.
        strategy: String,
        /// Detection method.
        method: String,
        /// Rectangle before padding.
        rect: Option<Rect>,
    },
    /// Padding and copy.
    Crop {
        /// Rectangle after padding.
        padded: Rect,
    },
}

/// High-level summary of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Output width in pixels.
    pub cropped_width: u32,
    /// Output height in pixels.
    pub cropped_height: u32,
}

impl PipelineDiagnostics {
    /// Render a plain-text table, one row per stage that ran.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("stripcrop stage timing\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let mut stages = vec![("Grayscale", &self.grayscale)];
        if let Some(ref blur) = self.blur {
            stages.push(("Blur", blur));
        }
        stages.push(("Edge Detection", &self.edge_detection));
        stages.push(("Locate", &self.locate));
        stages.push(("Crop", &self.crop));

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Output: {}x{}",
            self.summary.cropped_width, self.summary.cropped_height,
        ));

        lines.join("\n")
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// One-line summary of a stage's metrics.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Grayscale { width, height } => format!("{width}x{height}"),
        StageMetrics::Blur { kernel_size, sigma } => format!("k={kernel_size} sigma={sigma:.2}"),
        StageMetrics::EdgeDetection {
            threshold,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("threshold={threshold} edges={edge_pixel_count} ({density:.1}%)")
        }
        StageMetrics::Locate {
            strategy,
            method,
            rect,
        } => match rect {
            Some(rect) => format!("{strategy} -> {method} {rect}"),
            None => format!("{strategy} -> {method}"),
        },
        StageMetrics::Crop { padded } => format!("padded {padded}"),
    }
}
