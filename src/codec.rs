use crate::dynamics::{NotewiseDynamicsCodec, clip_to_midi};
use crate::error::{CodecError, Result, ensure_same_len};
use crate::grouping::OnsetGroup;
use crate::model::config::CodecConfig;
use crate::model::notes::{MatchedNote, NoteColumns, PerformedNote, ScoreNote};
use crate::model::parameters::ParameterMatrix;
use crate::normalization::{TempoNormalization, TempoScale};
use crate::tempo::TempoStrategy;
use crate::time_codec::{ARTICULATION_PARAMETER, TIMING_PARAMETER, TimeCodec};
use crate::util::{parse_normalization, parse_tempo_strategy};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Everything [`PerformanceCodec::decode`] needs besides the score.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EncodedPerformance {
    /// Columns: dynamics parameters, then tempo, timing and articulation.
    pub parameters: ParameterMatrix,
    pub mean_beat_period: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_beat_period: Option<f64>,
    #[serde(default)]
    pub groups: Vec<OnsetGroup>,
}

impl EncodedPerformance {
    pub fn scale(&self) -> TempoScale {
        TempoScale {
            mean_beat_period: self.mean_beat_period,
            std_beat_period: self.std_beat_period,
        }
    }

    pub fn parameter_names(&self) -> &[String] {
        self.parameters.names()
    }
}

/// Splits a matched performance into dynamics and time parameters and puts it back together.
#[derive(Debug, Clone, Default)]
pub struct PerformanceCodec {
    time: TimeCodec,
    dynamics: NotewiseDynamicsCodec,
}

impl PerformanceCodec {
    pub fn new(time: TimeCodec, dynamics: NotewiseDynamicsCodec) -> Self {
        Self { time, dynamics }
    }

    pub fn from_config(config: &CodecConfig) -> Result<Self> {
        let normalization = parse_normalization(&config.normalization)?;
        let tempo = parse_tempo_strategy(&config.tempo)?;

        let mut time = TimeCodec::new(normalization, tempo).with_epsilon(config.epsilon)?;
        if let Some(names) = &config.time_parameter_names {
            time = time.with_parameter_names(names.clone())?;
        }

        if config.dynamics_parameter_name.trim().is_empty() {
            return Err(CodecError::UnknownConfiguration(
                "dynamics parameter name must not be empty".into(),
            ));
        }
        let dynamics = NotewiseDynamicsCodec::new(config.dynamics_parameter_name.clone());

        Ok(Self::new(time, dynamics))
    }

    /// Build a codec from its full list of parameter names, e.g.
    /// `["velocity", "log_bpr", "timing", "log_articulation"]`.
    pub fn from_parameter_names(names: &[&str]) -> Result<Self> {
        let [dynamics, tempo, timing, articulation] = names else {
            return Err(CodecError::UnknownConfiguration(format!(
                "expected [dynamics, tempo, timing, articulation] parameter names, got {:?}",
                names
            )));
        };

        if *dynamics != "velocity" {
            return Err(CodecError::UnknownConfiguration(format!(
                "unknown dynamics parameter '{}'",
                dynamics
            )));
        }
        let Some(normalization) = TempoNormalization::from_name(tempo) else {
            return Err(CodecError::UnknownConfiguration(format!(
                "unknown tempo parameter '{}'",
                tempo
            )));
        };
        if *timing != TIMING_PARAMETER || *articulation != ARTICULATION_PARAMETER {
            return Err(CodecError::UnknownConfiguration(format!(
                "expected '{}' and '{}' after the tempo parameter, got '{}' and '{}'",
                TIMING_PARAMETER, ARTICULATION_PARAMETER, timing, articulation
            )));
        }

        Ok(Self::new(
            TimeCodec::new(normalization, TempoStrategy::default()),
            NotewiseDynamicsCodec::new(*dynamics),
        ))
    }

    pub fn time_codec(&self) -> &TimeCodec {
        &self.time
    }

    pub fn dynamics_codec(&self) -> &NotewiseDynamicsCodec {
        &self.dynamics
    }

    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = self.dynamics.parameter_names();
        names.extend_from_slice(self.time.parameter_names());
        names
    }

    pub fn encode(&self, notes: &[MatchedNote]) -> Result<EncodedPerformance> {
        if notes.is_empty() {
            return Err(CodecError::DegenerateInput(
                "cannot encode an empty performance".into(),
            ));
        }

        let columns = NoteColumns::from_matched(notes);
        let time = self.time.encode(&columns)?;
        let dynamics = self.dynamics.encode(&columns.intensities);
        let parameters = dynamics.hstack(time.parameters)?;

        debug!(
            "Encoded {} notes into {} parameters each",
            parameters.n_rows(),
            parameters.n_cols()
        );

        Ok(EncodedPerformance {
            parameters,
            mean_beat_period: time.scale.mean_beat_period,
            std_beat_period: time.scale.std_beat_period,
            groups: time.groups,
        })
    }

    pub fn decode(
        &self,
        score: &[ScoreNote],
        parameters: &ParameterMatrix,
        scale: &TempoScale,
    ) -> Result<Vec<MatchedNote>> {
        if score.is_empty() {
            return Err(CodecError::DegenerateInput(
                "cannot decode an empty score".into(),
            ));
        }

        let expected = self.parameter_names();
        ensure_same_len("parameter columns", expected.len(), parameters.n_cols())?;
        ensure_same_len("parameter rows", score.len(), parameters.n_rows())?;
        if parameters.names() != expected.as_slice() {
            return Err(CodecError::UnknownConfiguration(format!(
                "parameter columns {:?} do not match codec parameters {:?}",
                parameters.names(),
                expected
            )));
        }

        let n_dynamics = self.dynamics.parameter_names().len();
        let dynamics_params = parameters.select_columns(0..n_dynamics)?;
        let time_params = parameters.select_columns(n_dynamics..parameters.n_cols())?;

        let columns = NoteColumns::from_score(score);
        let timing = self.time.decode(
            &columns.score_onsets,
            &columns.score_durations,
            &time_params,
            scale,
        )?;
        let intensities = self.dynamics.decode(&dynamics_params);

        let clipped = intensities
            .iter()
            .filter(|v| !(1.0..=127.0).contains(*v))
            .count();
        if clipped > 0 {
            warn!("Clipped {} decoded intensities into [1, 127]..!", clipped);
        }

        let performance = score
            .iter()
            .enumerate()
            .map(|(i, note)| {
                let mut note = *note;
                if !(1..=127).contains(&note.pitch) {
                    warn!("Clipping pitch {} of note {} into [1, 127]..!", note.pitch, i);
                    note.pitch = note.pitch.clamp(1, 127);
                }
                MatchedNote::new(
                    note,
                    PerformedNote {
                        onset: timing.onsets[i],
                        duration: timing.durations[i],
                        intensity: clip_to_midi(intensities[i]),
                    },
                )
            })
            .collect();

        Ok(performance)
    }

    /// Decode with the scale stored alongside the parameters.
    pub fn decode_encoded(
        &self,
        score: &[ScoreNote],
        encoded: &EncodedPerformance,
    ) -> Result<Vec<MatchedNote>> {
        self.decode(score, &encoded.parameters, &encoded.scale())
    }
}
