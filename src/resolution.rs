//! Vertex resolution: how far the elastic-arms reconstruction and the model
//! prediction land from the true vertex, over all events and per interaction
//! mode.
//!
//! For each method three quantities are summarised:
//! * the residual `reco - true` (mean and RMS, histogrammed in cm),
//! * the absolute residual `|reco - true|` (mean, histogrammed in cm),
//! * the relative residual `(reco - true) / true` (mean only, no RMS).

use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::data::filter::{group_by_mode, select};
use crate::error::AnalysisError;
use crate::metadata::Identification;
use crate::mode::InteractionMode;
use crate::prediction::{Coordinate, CoordinatePredictions};

// ---------------------------------------------------------------------------
// Scalar statistics
// ---------------------------------------------------------------------------

/// Mean and RMS of `reco - truth`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResidualStats {
    pub count: usize,
    pub mean: f64,
    pub rms: f64,
}

impl ResidualStats {
    pub fn of(reco: &[f64], truth: &[f64]) -> Self {
        let res = residuals(reco, truth);
        ResidualStats {
            count: res.len(),
            mean: mean(res.iter().copied()),
            rms: mean(res.iter().map(|r| r * r)).sqrt(),
        }
    }
}

pub fn residuals(reco: &[f64], truth: &[f64]) -> Vec<f64> {
    reco.iter().zip(truth).map(|(r, t)| r - t).collect()
}

pub fn abs_residuals(reco: &[f64], truth: &[f64]) -> Vec<f64> {
    reco.iter().zip(truth).map(|(r, t)| (r - t).abs()).collect()
}

pub fn relative_residuals(reco: &[f64], truth: &[f64]) -> Vec<f64> {
    reco.iter().zip(truth).map(|(r, t)| (r - t) / t).collect()
}

pub fn mean_abs(reco: &[f64], truth: &[f64]) -> f64 {
    mean(abs_residuals(reco, truth).into_iter())
}

/// Mean relative residual. Events with a zero true coordinate produce a
/// non-finite ratio and are left out.
pub fn mean_relative(reco: &[f64], truth: &[f64]) -> f64 {
    mean(
        relative_residuals(reco, truth)
            .into_iter()
            .filter(|v| v.is_finite()),
    )
}

/// NaN for an empty input.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

/// Evenly spaced bin edges `start + i*step` for every edge below `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Binning {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Binning {
    /// `reco - true`, 1 cm bins.
    pub const RESIDUAL: Binning = Binning {
        start: -40.0,
        stop: 40.0,
        step: 1.0,
    };
    /// `|reco - true|`, 1 cm bins.
    pub const ABSOLUTE: Binning = Binning {
        start: 0.0,
        stop: 50.0,
        step: 1.0,
    };
    /// `(reco - true) / true`, 1 % bins out to ±20 %.
    pub const RELATIVE: Binning = Binning {
        start: -0.2,
        stop: 0.2,
        step: 0.01,
    };

    pub fn edges(&self) -> Vec<f64> {
        let span = (self.stop - self.start) / self.step;
        if span.is_nan() || span <= 0.0 {
            return Vec::new();
        }
        let n = span.ceil() as usize;
        (0..n).map(|i| self.start + i as f64 * self.step).collect()
    }
}

/// Bin counts over fixed edges. Each bin is `[lo, hi)` except the last,
/// which also includes its upper edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    /// Values below the first edge, above the last, or not finite.
    pub outside: u64,
}

impl Histogram {
    pub fn fill(binning: Binning, values: &[f64]) -> Self {
        let edges = binning.edges();
        let n_bins = edges.len().saturating_sub(1);
        let mut counts = vec![0u64; n_bins];
        let mut outside = 0u64;

        for &v in values {
            let in_range = n_bins > 0 && v.is_finite() && v >= edges[0] && v <= edges[n_bins];
            if !in_range {
                outside += 1;
                continue;
            }
            let bin = (edges.partition_point(|&e| e <= v) - 1).min(n_bins - 1);
            counts[bin] += 1;
        }

        Histogram {
            edges,
            counts,
            outside,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Per-method and per-sample summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodStats {
    pub residual: ResidualStats,
    pub mean_abs: f64,
    pub mean_relative: f64,
    pub residual_hist: Histogram,
    pub abs_hist: Histogram,
    pub relative_hist: Histogram,
}

impl MethodStats {
    pub fn compute(reco: &[f64], truth: &[f64]) -> Self {
        MethodStats {
            residual: ResidualStats::of(reco, truth),
            mean_abs: mean_abs(reco, truth),
            mean_relative: mean_relative(reco, truth),
            residual_hist: Histogram::fill(Binning::RESIDUAL, &residuals(reco, truth)),
            abs_hist: Histogram::fill(Binning::ABSOLUTE, &abs_residuals(reco, truth)),
            relative_hist: Histogram::fill(Binning::RELATIVE, &relative_residuals(reco, truth)),
        }
    }
}

/// Elastic arms versus model over one event selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub events: usize,
    pub elastic_arms: MethodStats,
    pub model: MethodStats,
}

impl Comparison {
    pub fn compute(truth: &[f64], elastic_arms: &[f64], model: &[f64]) -> Self {
        Comparison {
            events: truth.len(),
            elastic_arms: MethodStats::compute(elastic_arms, truth),
            model: MethodStats::compute(model, truth),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeComparison {
    pub mode: InteractionMode,
    pub stats: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionSummary {
    pub sample: Identification,
    pub coordinate: Coordinate,
    pub all: Comparison,
    /// Only modes with at least one event, ordered by mode code.
    pub per_mode: Vec<ModeComparison>,
}

impl ResolutionSummary {
    /// `modes[i]` is the interaction mode of prediction `i`.
    pub fn compute(
        sample: Identification,
        predictions: &CoordinatePredictions,
        modes: &[i32],
    ) -> Result<Self, AnalysisError> {
        if predictions.len() != modes.len() {
            return Err(AnalysisError::LengthMismatch {
                predictions: predictions.len(),
                modes: modes.len(),
            });
        }
        let groups = group_by_mode(modes)?;

        let all = Comparison::compute(
            &predictions.truth,
            &predictions.elastic_arms,
            &predictions.model,
        );
        info!(
            "{} {}: elastic arms mean {:.2} cm rms {:.2} cm, model mean {:.2} cm rms {:.2} cm",
            sample,
            predictions.coordinate,
            all.elastic_arms.residual.mean,
            all.elastic_arms.residual.rms,
            all.model.residual.mean,
            all.model.residual.rms,
        );

        let per_mode = groups
            .into_iter()
            .map(|(mode, idx)| ModeComparison {
                mode,
                stats: Comparison::compute(
                    &select(&predictions.truth, &idx),
                    &select(&predictions.elastic_arms, &idx),
                    &select(&predictions.model, &idx),
                ),
            })
            .collect();

        Ok(ResolutionSummary {
            sample,
            coordinate: predictions.coordinate,
            all,
            per_mode,
        })
    }

    pub fn file_name(&self) -> String {
        format!("resolution_{}_{}.json", self.sample.label(), self.coordinate)
    }

    /// Write the summary as pretty JSON into `dir`, returning the file path.
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf, AnalysisError> {
        let path = dir.join(self.file_name());
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, text).map_err(|source| AnalysisError::Io {
            path: path.clone(),
            source,
        })?;
        info!("wrote {}", path.display());
        Ok(path)
    }
}

/// Create and return `<base>/resolution/<prefix>`.
pub fn output_dir(base: &Path, prefix: &str) -> Result<PathBuf, AnalysisError> {
    let dir = base.join("resolution").join(prefix);
    std::fs::create_dir_all(&dir).map_err(|source| AnalysisError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Detector, Flux, Horn};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sample() -> Identification {
        Identification {
            detector: Detector::Fd,
            horn: Horn::Fhc,
            flux: Flux::Nonswap,
        }
    }

    #[test]
    fn residual_stats_mean_and_rms() {
        let stats = ResidualStats::of(&[1.0, 3.0, -1.0], &[0.0, 0.0, 0.0]);
        assert_eq!(stats.count, 3);
        assert!(approx(stats.mean, 1.0));
        assert!(approx(stats.rms, (11.0_f64 / 3.0).sqrt()));
    }

    #[test]
    fn empty_stats_are_nan() {
        let stats = ResidualStats::of(&[], &[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.rms.is_nan());
    }

    #[test]
    fn mean_relative_skips_zero_truth() {
        let m = mean_relative(&[11.0, 5.0, 18.0], &[10.0, 0.0, 20.0]);
        assert!(approx(m, (0.1 - 0.1) / 2.0));
        assert!(approx(mean_abs(&[11.0, 5.0], &[10.0, 0.0]), 3.0));
    }

    #[test]
    fn standard_binnings_have_expected_edges() {
        let res = Binning::RESIDUAL.edges();
        assert_eq!(res.len(), 80);
        assert_eq!(res[0], -40.0);
        assert_eq!(res[79], 39.0);

        assert_eq!(Binning::ABSOLUTE.edges().len(), 50);

        let rel = Binning::RELATIVE.edges();
        assert_eq!(rel.len(), 40);
        assert!(approx(rel[39], 0.19));
    }

    #[test]
    fn histogram_bins_are_half_open_except_last() {
        let binning = Binning {
            start: 0.0,
            stop: 3.0,
            step: 1.0,
        };
        // edges 0, 1, 2 -> bins [0,1) and [1,2]
        let hist = Histogram::fill(binning, &[0.0, 0.5, 1.0, 2.0, 2.5, -0.1, f64::NAN]);
        assert_eq!(hist.edges, vec![0.0, 1.0, 2.0]);
        assert_eq!(hist.counts, vec![2, 2]);
        assert_eq!(hist.outside, 3);
        assert_eq!(hist.total(), 4);
    }

    #[test]
    fn degenerate_binning_counts_everything_outside() {
        let binning = Binning {
            start: 1.0,
            stop: 1.0,
            step: 1.0,
        };
        let hist = Histogram::fill(binning, &[1.0, 2.0]);
        assert!(hist.counts.is_empty());
        assert_eq!(hist.outside, 2);
    }

    #[test]
    fn summary_splits_by_mode_and_skips_empty_modes() {
        let preds = CoordinatePredictions {
            coordinate: Coordinate::X,
            truth: vec![100.0, 200.0, 300.0, 400.0],
            elastic_arms: vec![102.0, 198.0, 305.0, 400.0],
            model: vec![101.0, 199.0, 301.0, 399.0],
        };
        let summary = ResolutionSummary::compute(sample(), &preds, &[0, 1, 0, 1]).unwrap();

        assert_eq!(summary.all.events, 4);
        assert!(approx(summary.all.elastic_arms.residual.mean, (2.0 - 2.0 + 5.0 + 0.0) / 4.0));
        assert!(approx(summary.all.model.mean_abs, 1.0));

        let modes: Vec<InteractionMode> = summary.per_mode.iter().map(|m| m.mode).collect();
        assert_eq!(modes, vec![InteractionMode::QE, InteractionMode::Res]);
        let qe = &summary.per_mode[0].stats;
        assert_eq!(qe.events, 2);
        assert!(approx(qe.elastic_arms.residual.mean, 3.5));
        assert_eq!(qe.model.residual_hist.total(), 2);
    }

    #[test]
    fn summary_rejects_length_mismatch() {
        let preds = CoordinatePredictions {
            coordinate: Coordinate::Z,
            truth: vec![1.0],
            elastic_arms: vec![1.0],
            model: vec![1.0],
        };
        let err = ResolutionSummary::compute(sample(), &preds, &[0, 0]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::LengthMismatch { predictions: 1, modes: 2 }
        ));
    }

    #[test]
    fn summary_json_is_written_under_output_dir() {
        let base = tempfile::tempdir().unwrap();
        let dir = output_dir(base.path(), "preds_run1").unwrap();
        assert!(dir.ends_with("resolution/preds_run1"));

        let preds = CoordinatePredictions {
            coordinate: Coordinate::Y,
            truth: vec![10.0, 0.0],
            elastic_arms: vec![11.0, 1.0],
            model: vec![10.5, 0.5],
        };
        let summary = ResolutionSummary::compute(sample(), &preds, &[2, 2]).unwrap();
        let path = summary.write_json(&dir).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "resolution_FD_FHC_numus_Y.json"
        );

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["sample"]["detector"], "FD");
        assert_eq!(json["coordinate"], "Y");
        assert_eq!(json["per_mode"][0]["mode"], "DIS");
        assert_eq!(json["all"]["events"], 2);
    }
}
