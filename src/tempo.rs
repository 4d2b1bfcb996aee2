use crate::error::{CodecError, Result, ensure_same_len};
use crate::grouping::{OnsetGroup, check_partition, unique_sequence};
use crate::interp::{Interpolator, OutOfRange};
use crate::model::notes::NoteColumns;
use crate::monotonize::monotonize;
use log::debug;
use serde::{Deserialize, Serialize};

/// Step (in beats) of the central difference used by [`TempoStrategy::Derivative`].
const DERIVATIVE_STEP: f64 = 0.5;

/// How a beat-period curve is derived from grouped score/performance onsets.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TempoStrategy {
    /// Performed IOI over score IOI per onset group, linearly interpolated between
    /// group onsets and held constant outside.
    #[default]
    Average,

    /// Slope of the linearly interpolated score-time to performance-time map,
    /// sampled with a central difference. Smoother than `Average`.
    Derivative,
}

/// A beat-period curve (seconds per beat) sampled at score times.
#[derive(Debug, Clone)]
pub struct TempoEstimate {
    pub beat_periods: Vec<f64>,
    pub sample_points: Vec<f64>,
    pub groups: Vec<OnsetGroup>,
}

/// Group-level onsets shared by both strategies.
struct AlignedOnsets {
    /// Mean score onset per group plus the closing time.
    score: Vec<f64>,
    /// Monotonized score onsets.
    score_mt: Vec<f64>,
    /// Monotonized performed onsets.
    performed_mt: Vec<f64>,
    groups: Vec<OnsetGroup>,
}

fn align_onsets(
    notes: &NoteColumns,
    groups: Option<&[OnsetGroup]>,
    epsilon: f64,
) -> Result<AlignedOnsets> {
    let n = notes.score_onsets.len();
    ensure_same_len("performed onsets", n, notes.performed_onsets.len())?;
    ensure_same_len("score durations", n, notes.score_durations.len())?;
    ensure_same_len("performed durations", n, notes.performed_durations.len())?;

    if n == 0 {
        return Err(CodecError::DegenerateInput(
            "cannot estimate tempo of an empty note sequence".into(),
        ));
    }

    let score_offsets: Vec<f64> = notes
        .score_onsets
        .iter()
        .zip(&notes.score_durations)
        .map(|(o, d)| o + d)
        .collect();
    let performed_offsets: Vec<f64> = notes
        .performed_onsets
        .iter()
        .zip(&notes.performed_durations)
        .map(|(o, d)| o + d)
        .collect();

    // supplied groups may come in any order; the curve needs them by score onset
    let groups = match groups {
        Some(groups) => {
            check_partition(groups, n)?;
            let mut sorted = groups.to_vec();
            sorted.sort_by(|a, b| {
                a.mean_of(&notes.score_onsets)
                    .total_cmp(&b.mean_of(&notes.score_onsets))
            });
            Some(sorted)
        }
        None => None,
    };

    let score = unique_sequence(
        &notes.score_onsets,
        &score_offsets,
        groups.as_deref(),
        epsilon,
    )?;
    let performed = unique_sequence(
        &notes.performed_onsets,
        &performed_offsets,
        Some(&score.groups),
        epsilon,
    )?;

    let mono = monotonize(&performed.unique_onsets, Some(&score.unique_onsets), true)?;
    let Some(score_mt) = mono.deltas else {
        return Err(CodecError::DegenerateInput(
            "monotonizer returned no score onsets".into(),
        ));
    };

    if mono.values.len() < 2 {
        return Err(CodecError::DegenerateInput(format!(
            "only {} monotonic onset(s) left out of {}, no inter-onset interval to measure",
            mono.values.len(),
            performed.unique_onsets.len()
        )));
    }

    Ok(AlignedOnsets {
        score: score.unique_onsets,
        score_mt,
        performed_mt: mono.values,
        groups: score.groups,
    })
}

impl TempoStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            TempoStrategy::Average => "average",
            TempoStrategy::Derivative => "derivative",
        }
    }

    /// Estimate the beat period at `sample_points` (default: the mean score onset of
    /// every group). Onset groups are computed from the score unless given; given
    /// groups may be in any order and are returned sorted by mean score onset.
    pub fn estimate(
        &self,
        notes: &NoteColumns,
        groups: Option<&[OnsetGroup]>,
        sample_points: Option<&[f64]>,
        epsilon: f64,
    ) -> Result<TempoEstimate> {
        let aligned = align_onsets(notes, groups, epsilon)?;

        let sample_points = match sample_points {
            Some(points) => points.to_vec(),
            None => aligned.score[..aligned.score.len() - 1].to_vec(),
        };

        let beat_periods = match self {
            TempoStrategy::Average => by_average(&aligned, &sample_points)?,
            TempoStrategy::Derivative => by_derivative(&aligned, &sample_points)?,
        };

        if let Some(bad) = beat_periods.iter().position(|bp| !bp.is_finite() || *bp <= 0.0) {
            return Err(CodecError::DegenerateInput(format!(
                "non-positive beat period {} at score time {}",
                beat_periods[bad], sample_points[bad]
            )));
        }

        debug!(
            "Estimated {} beat periods by {} in [{:.4}, {:.4}] s/beat",
            beat_periods.len(),
            self.name(),
            beat_periods.iter().copied().fold(f64::INFINITY, f64::min),
            beat_periods.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        );

        Ok(TempoEstimate {
            beat_periods,
            sample_points,
            groups: aligned.groups,
        })
    }
}

fn by_average(aligned: &AlignedOnsets, sample_points: &[f64]) -> Result<Vec<f64>> {
    let beat_periods: Vec<f64> = aligned
        .performed_mt
        .windows(2)
        .zip(aligned.score_mt.windows(2))
        .map(|(p, s)| (p[1] - p[0]) / (s[1] - s[0]))
        .collect();

    let knots = aligned.score_mt[..aligned.score_mt.len() - 1].to_vec();
    let curve = Interpolator::new(knots, beat_periods)?.with_out_of_range(OutOfRange::Hold);

    Ok(curve.eval_many(sample_points))
}

fn by_derivative(aligned: &AlignedOnsets, sample_points: &[f64]) -> Result<Vec<f64>> {
    let onset_map = Interpolator::new(aligned.score_mt.clone(), aligned.performed_mt.clone())?
        .with_out_of_range(OutOfRange::Extrapolate);

    Ok(sample_points
        .iter()
        .map(|&x| onset_map.derivative(x, DERIVATIVE_STEP))
        .collect())
}
