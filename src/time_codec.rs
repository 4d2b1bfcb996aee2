use crate::error::{CodecError, Result, ensure_same_len};
use crate::grouping::{DEFAULT_ONSET_EPSILON, OnsetGroup, unique_sequence};
use crate::model::notes::NoteColumns;
use crate::model::parameters::ParameterMatrix;
use crate::normalization::{TempoNormalization, TempoScale};
use crate::tempo::TempoStrategy;
use log::debug;

pub const TIMING_PARAMETER: &str = "timing";
pub const ARTICULATION_PARAMETER: &str = "log_articulation";

const TEMPO_COL: usize = 0;
const TIMING_COL: usize = 1;
const ARTICULATION_COL: usize = 2;
const N_TIME_PARAMETERS: usize = 3;

/// Output of [`TimeCodec::encode`].
#[derive(Debug, Clone)]
pub struct TimeEncoding {
    /// Columns: normalized tempo, timing deviation, log articulation.
    pub parameters: ParameterMatrix,
    pub scale: TempoScale,
    pub groups: Vec<OnsetGroup>,
}

/// Performed timing recovered by [`TimeCodec::decode`], in input note order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTiming {
    pub onsets: Vec<f64>,
    pub durations: Vec<f64>,
}

/// Encodes/decodes tempo, timing and articulation.
#[derive(Debug, Clone)]
pub struct TimeCodec {
    normalization: TempoNormalization,
    tempo: TempoStrategy,
    epsilon: f64,
    parameter_names: Vec<String>,
}

impl Default for TimeCodec {
    fn default() -> Self {
        Self::new(TempoNormalization::default(), TempoStrategy::default())
    }
}

impl TimeCodec {
    /// A codec whose parameters are named after the normalization scheme,
    /// followed by `timing` and `log_articulation`.
    pub fn new(normalization: TempoNormalization, tempo: TempoStrategy) -> Self {
        Self {
            normalization,
            tempo,
            epsilon: DEFAULT_ONSET_EPSILON,
            parameter_names: vec![
                normalization.name().to_string(),
                TIMING_PARAMETER.to_string(),
                ARTICULATION_PARAMETER.to_string(),
            ],
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(CodecError::UnknownConfiguration(format!(
                "onset epsilon must be finite and >= 0, got {}",
                epsilon
            )));
        }
        self.epsilon = epsilon;
        Ok(self)
    }

    pub fn with_parameter_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != N_TIME_PARAMETERS {
            return Err(CodecError::UnknownConfiguration(format!(
                "time codec takes exactly {} parameter names, got {:?}",
                N_TIME_PARAMETERS, names
            )));
        }
        self.parameter_names = names;
        Ok(self)
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn normalization(&self) -> TempoNormalization {
        self.normalization
    }

    pub fn tempo_strategy(&self) -> TempoStrategy {
        self.tempo
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn encode(&self, notes: &NoteColumns) -> Result<TimeEncoding> {
        let estimate = self.tempo.estimate(notes, None, None, self.epsilon)?;
        let beat_periods = &estimate.beat_periods;
        let groups = estimate.groups;

        // equivalent onset of each group, anchored at the first performed group
        let mut eq_onsets = Vec::with_capacity(groups.len());
        eq_onsets.push(groups[0].mean_of(&notes.performed_onsets));
        for i in 1..groups.len() {
            let ioi = estimate.sample_points[i] - estimate.sample_points[i - 1];
            eq_onsets.push(eq_onsets[i - 1] + beat_periods[i - 1] * ioi);
        }

        let tempo_params = self.normalization.normalize(beat_periods)?;
        let articulation = encode_articulation(
            &notes.score_durations,
            &notes.performed_durations,
            &groups,
            beat_periods,
        )?;

        let mut parameters = ParameterMatrix::zeros(self.parameter_names.clone(), notes.len());
        for (i, group) in groups.iter().enumerate() {
            for &j in group.indices() {
                parameters.set(j, TEMPO_COL, tempo_params[i]);
                parameters.set(j, TIMING_COL, eq_onsets[i] - notes.performed_onsets[j]);
                parameters.set(j, ARTICULATION_COL, articulation[j]);
            }
        }

        let scale = TempoScale::of_curve(beat_periods);
        debug!(
            "Encoded {} notes in {} onset groups, mean beat period {:.4}",
            notes.len(),
            groups.len(),
            scale.mean_beat_period
        );

        Ok(TimeEncoding {
            parameters,
            scale,
            groups,
        })
    }

    pub fn decode(
        &self,
        score_onsets: &[f64],
        score_durations: &[f64],
        parameters: &ParameterMatrix,
        scale: &TempoScale,
    ) -> Result<DecodedTiming> {
        let n = score_onsets.len();
        ensure_same_len("score durations", n, score_durations.len())?;
        ensure_same_len("time parameter rows", n, parameters.n_rows())?;
        ensure_same_len("time parameter columns", N_TIME_PARAMETERS, parameters.n_cols())?;

        let score_offsets: Vec<f64> = score_onsets
            .iter()
            .zip(score_durations)
            .map(|(o, d)| o + d)
            .collect();
        let score = unique_sequence(score_onsets, &score_offsets, None, self.epsilon)?;
        let iois = score.iois();

        let tempo_column = parameters.column(TEMPO_COL);
        let tempo_params: Vec<f64> = score
            .groups
            .iter()
            .map(|g| g.mean_of(&tempo_column))
            .collect();

        let beat_periods = self.normalization.rescale(&tempo_params, scale)?;
        if let Some(bad) = beat_periods.iter().find(|bp| !bp.is_finite() || **bp <= 0.0) {
            return Err(CodecError::DegenerateInput(format!(
                "tempo parameters rescale to a non-positive beat period ({})",
                bad
            )));
        }

        for j in 0..n {
            for col in [TIMING_COL, ARTICULATION_COL] {
                let value = parameters.get(j, col);
                if !value.is_finite() {
                    return Err(CodecError::DegenerateInput(format!(
                        "note {} has a non-finite {} parameter ({})",
                        j,
                        parameters.names()[col],
                        value
                    )));
                }
            }
        }

        let mut onsets = vec![0.0; n];
        let mut durations = vec![0.0; n];
        let mut eq_onset = 0.0;

        for (i, group) in score.groups.iter().enumerate() {
            for &j in group.indices() {
                onsets[j] = eq_onset - parameters.get(j, TIMING_COL);
                durations[j] = decode_articulation(
                    score_durations[j],
                    parameters.get(j, ARTICULATION_COL),
                    beat_periods[i],
                );
            }
            eq_onset += iois[i] * beat_periods[i];
        }

        let origin = onsets.iter().copied().fold(f64::INFINITY, f64::min);
        for onset in onsets.iter_mut() {
            *onset -= origin;
        }

        Ok(DecodedTiming { onsets, durations })
    }
}

/// `log2` of the ratio between performed duration and the duration implied by the
/// group's beat period. Grace notes are assigned a ratio of 1.
pub fn encode_articulation(
    score_durations: &[f64],
    performed_durations: &[f64],
    groups: &[OnsetGroup],
    beat_periods: &[f64],
) -> Result<Vec<f64>> {
    ensure_same_len("articulation durations", score_durations.len(), performed_durations.len())?;
    ensure_same_len("articulation beat periods", groups.len(), beat_periods.len())?;

    let mut articulation = vec![0.0; score_durations.len()];
    for (group, &bp) in groups.iter().zip(beat_periods) {
        for &j in group.indices() {
            let (sd, pd) = if score_durations[j] == 0.0 {
                (1.0, bp)
            } else {
                (score_durations[j], performed_durations[j])
            };

            let value = (pd / (bp * sd)).log2();
            if !value.is_finite() {
                return Err(CodecError::DegenerateInput(format!(
                    "note {} has no finite articulation (score {}, performed {})",
                    j, score_durations[j], performed_durations[j]
                )));
            }
            articulation[j] = value;
        }
    }

    Ok(articulation)
}

/// Inverse of [`encode_articulation`]; a grace note lasts `2^articulation` beat periods.
pub fn decode_articulation(score_duration: f64, articulation: f64, beat_period: f64) -> f64 {
    let sd = if score_duration == 0.0 {
        1.0
    } else {
        score_duration
    };
    articulation.exp2() * sd * beat_period
}

#[cfg(test)]
mod test {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= TOLERANCE
    }

    fn notes(score: &[(f64, f64)], performed: &[(f64, f64)]) -> NoteColumns {
        NoteColumns {
            score_onsets: score.iter().map(|n| n.0).collect(),
            score_durations: score.iter().map(|n| n.1).collect(),
            performed_onsets: performed.iter().map(|n| n.0).collect(),
            performed_durations: performed.iter().map(|n| n.1).collect(),
            intensities: vec![64; score.len()],
        }
    }

    #[test]
    fn steady_performance_has_flat_parameters() {
        env_logger::try_init().unwrap_or(());

        let score: Vec<(f64, f64)> = (0..6).map(|i| (i as f64, 1.0)).collect();
        let performed: Vec<(f64, f64)> = (0..6).map(|i| (0.6 * i as f64, 0.6)).collect();

        let codec = TimeCodec::default();
        let enc = codec.encode(&notes(&score, &performed)).unwrap();

        assert_eq!(enc.parameters.names()[0], "beat_period");
        assert!(approx_eq(enc.scale.mean_beat_period, 0.6));
        for row in enc.parameters.rows() {
            assert!(approx_eq(row[TEMPO_COL], 0.6));
            assert!(approx_eq(row[TIMING_COL], 0.0));
            assert!(approx_eq(row[ARTICULATION_COL], 0.0));
        }
    }

    #[test]
    fn timing_is_deviation_from_equivalent_onset() {
        let score = [(0.0, 1.0), (0.0, 1.0), (1.0, 1.0), (2.0, 1.0)];
        let performed = [(1.0, 0.5), (1.02, 0.5), (1.5, 0.25), (2.0, 1.0)];

        let enc = TimeCodec::default().encode(&notes(&score, &performed)).unwrap();
        let timing = enc.parameters.column(TIMING_COL);
        let articulation = enc.parameters.column(ARTICULATION_COL);

        // first group's equivalent onset is its mean performed onset
        assert!(approx_eq(timing[0], 0.01));
        assert!(approx_eq(timing[1], -0.01));
        // beat period 0.49 over the first beat puts the second group at 1.5
        assert!(approx_eq(timing[2], 0.0));
        assert!(approx_eq(articulation[2], -1.0));
        assert_eq!(enc.groups.len(), 3);
    }

    #[test]
    fn grace_notes_are_neutral() {
        env_logger::try_init().unwrap_or(());

        let score = [(0.0, 1.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)];
        let performed = [(0.0, 0.5), (0.45, 0.05), (0.5, 0.5), (1.0, 0.5)];

        let codec = TimeCodec::default();
        let enc = codec.encode(&notes(&score, &performed)).unwrap();
        assert_eq!(enc.parameters.get(1, ARTICULATION_COL), 0.0);

        let score_onsets: Vec<f64> = score.iter().map(|n| n.0).collect();
        let score_durations: Vec<f64> = score.iter().map(|n| n.1).collect();
        let dec = codec
            .decode(&score_onsets, &score_durations, &enc.parameters, &enc.scale)
            .unwrap();

        // the grace note lasts exactly one beat period of its group
        let group_bp = enc.parameters.get(1, TEMPO_COL);
        assert!(approx_eq(dec.durations[1], group_bp));
    }

    #[test]
    fn round_trip_every_normalization() {
        env_logger::try_init().unwrap_or(());

        let score = [
            (0.0, 1.0),
            (0.0, 0.5),
            (0.5, 0.5),
            (1.0, 1.0),
            (2.0, 2.0),
            (2.0, 1.0),
            (3.0, 1.0),
            (4.0, 1.0),
        ];
        let performed = [
            (0.10, 0.45),
            (0.12, 0.20),
            (0.38, 0.22),
            (0.64, 0.50),
            (1.22, 1.10),
            (1.20, 0.52),
            (1.80, 0.40),
            (2.45, 0.70),
        ];
        let notes = notes(&score, &performed);

        for normalization in TempoNormalization::ALL {
            for tempo in [TempoStrategy::Average, TempoStrategy::Derivative] {
                let codec = TimeCodec::new(normalization, tempo);
                let enc = codec.encode(&notes).unwrap();
                let dec = codec
                    .decode(
                        &notes.score_onsets,
                        &notes.score_durations,
                        &enc.parameters,
                        &enc.scale,
                    )
                    .unwrap();

                for j in 0..score.len() {
                    assert!(
                        (dec.onsets[j] - (performed[j].0 - 0.10)).abs() < 1e-6,
                        "{}/{} onset {}",
                        normalization.name(),
                        tempo.name(),
                        j
                    );
                    assert!((dec.durations[j] - performed[j].1).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn decoded_onsets_start_at_zero() {
        let score_onsets = [0.0, 1.0, 2.0];
        let score_durations = [1.0, 1.0, 1.0];
        let names = TimeCodec::default().parameter_names().to_vec();
        let params = ParameterMatrix::from_rows(
            names,
            vec![
                vec![0.5, 0.1, 0.0],
                vec![0.5, 0.3, 0.0],
                vec![0.5, -0.2, 1.0],
            ],
        )
        .unwrap();

        let dec = TimeCodec::default()
            .decode(&score_onsets, &score_durations, &params, &TempoScale::new(0.5))
            .unwrap();

        // equivalent onsets 0, 0.5, 1.0 minus timing, shifted by the earliest onset
        assert!(approx_eq(dec.onsets[0], 0.0));
        assert!(approx_eq(dec.onsets[1], 0.3));
        assert!(approx_eq(dec.onsets[2], 1.3));
        assert!(approx_eq(dec.durations[2], 1.0));
    }

    #[test]
    fn decode_rejects_bad_shapes_and_tempi() {
        let codec = TimeCodec::default();
        let params = ParameterMatrix::zeros(codec.parameter_names().to_vec(), 2);

        let err = codec
            .decode(&[0.0, 1.0, 2.0], &[1.0; 3], &params, &TempoScale::new(0.5))
            .unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { .. }));

        // all-zero beat periods
        let err = codec
            .decode(&[0.0, 1.0], &[1.0; 2], &params, &TempoScale::new(0.5))
            .unwrap_err();
        assert!(matches!(err, CodecError::DegenerateInput(_)));
    }

    #[test]
    fn decode_rejects_non_finite_parameters() {
        let codec = TimeCodec::default();
        let names = codec.parameter_names().to_vec();

        for (row, col, value) in [
            (1, TIMING_COL, f64::NAN),
            (0, ARTICULATION_COL, f64::INFINITY),
        ] {
            let mut params = ParameterMatrix::from_rows(
                names.clone(),
                vec![vec![0.5, 0.0, 0.0], vec![0.5, 0.0, 0.0]],
            )
            .unwrap();
            params.set(row, col, value);

            let err = codec
                .decode(&[0.0, 1.0], &[1.0; 2], &params, &TempoScale::new(0.5))
                .unwrap_err();
            assert!(matches!(err, CodecError::DegenerateInput(_)));
        }
    }

    #[test]
    fn parameter_names_must_be_three() {
        let err = TimeCodec::default()
            .with_parameter_names(vec!["tempo".into()])
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownConfiguration(_)));

        let codec = TimeCodec::new(TempoNormalization::LogBeatPeriodRatio, TempoStrategy::Average);
        assert_eq!(codec.parameter_names(), &["log_bpr", "timing", "log_articulation"]);
    }

    #[test]
    fn zero_performed_duration_is_reported() {
        let score = [(0.0, 1.0), (1.0, 1.0)];
        let performed = [(0.0, 0.0), (0.5, 0.5)];

        let err = TimeCodec::default().encode(&notes(&score, &performed)).unwrap_err();
        assert!(matches!(err, CodecError::DegenerateInput(_)));
    }
}
