use crate::error::{CodecError, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// An out-of-band scalar needed to undo a tempo normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideParameter {
    MeanBeatPeriod,
    StdBeatPeriod,
}

impl SideParameter {
    pub fn name(&self) -> &'static str {
        match self {
            SideParameter::MeanBeatPeriod => "mean_beat_period",
            SideParameter::StdBeatPeriod => "std_beat_period",
        }
    }
}

/// Scalars produced at encode time and handed back at decode time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TempoScale {
    pub mean_beat_period: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_beat_period: Option<f64>,
}

impl TempoScale {
    pub fn new(mean_beat_period: f64) -> Self {
        Self {
            mean_beat_period,
            std_beat_period: None,
        }
    }

    pub fn with_std(mut self, std_beat_period: f64) -> Self {
        self.std_beat_period = Some(std_beat_period);
        self
    }

    /// Mean and population standard deviation of a beat-period curve.
    pub fn of_curve(beat_periods: &[f64]) -> Self {
        let n = beat_periods.len() as f64;
        let mean = beat_periods.iter().sum::<f64>() / n;
        let var = beat_periods.iter().map(|bp| (bp - mean).powi(2)).sum::<f64>() / n;
        Self::new(mean).with_std(var.sqrt())
    }
}

/// How the beat-period curve is turned into the tempo parameter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TempoNormalization {
    /// Raw beat period.
    #[default]
    #[serde(rename = "beat_period")]
    BeatPeriod,
    /// `log2(bp)`.
    #[serde(rename = "log_bp")]
    LogBeatPeriod,
    /// `(bp - mean) / std`.
    #[serde(rename = "standardized_bp")]
    Standardized,
    /// `bp / mean`.
    #[serde(rename = "bpr")]
    BeatPeriodRatio,
    /// `log2(bp / mean)`.
    #[serde(rename = "log_bpr")]
    LogBeatPeriodRatio,
}

impl TempoNormalization {
    pub const ALL: [TempoNormalization; 5] = [
        TempoNormalization::BeatPeriod,
        TempoNormalization::LogBeatPeriod,
        TempoNormalization::Standardized,
        TempoNormalization::BeatPeriodRatio,
        TempoNormalization::LogBeatPeriodRatio,
    ];

    /// Name of the tempo parameter this scheme produces.
    pub fn name(&self) -> &'static str {
        match self {
            TempoNormalization::BeatPeriod => "beat_period",
            TempoNormalization::LogBeatPeriod => "log_bp",
            TempoNormalization::Standardized => "standardized_bp",
            TempoNormalization::BeatPeriodRatio => "bpr",
            TempoNormalization::LogBeatPeriodRatio => "log_bpr",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.name() == name)
    }

    /// Side parameters [`Self::rescale`] reads from the [`TempoScale`].
    pub fn side_parameters(&self) -> &'static [SideParameter] {
        match self {
            TempoNormalization::BeatPeriod | TempoNormalization::LogBeatPeriod => &[],
            TempoNormalization::Standardized => {
                &[SideParameter::MeanBeatPeriod, SideParameter::StdBeatPeriod]
            }
            TempoNormalization::BeatPeriodRatio | TempoNormalization::LogBeatPeriodRatio => {
                &[SideParameter::MeanBeatPeriod]
            }
        }
    }

    pub fn normalize(&self, beat_periods: &[f64]) -> Result<Vec<f64>> {
        if beat_periods.is_empty() {
            return Err(CodecError::DegenerateInput(
                "cannot normalize an empty tempo curve".into(),
            ));
        }

        let scale = TempoScale::of_curve(beat_periods);
        let mean = scale.mean_beat_period;

        let out = match self {
            TempoNormalization::BeatPeriod => beat_periods.to_vec(),
            TempoNormalization::LogBeatPeriod => beat_periods.iter().map(|bp| bp.log2()).collect(),
            TempoNormalization::Standardized => {
                let std = scale.std_beat_period.unwrap_or(0.0);
                if !(std > 0.0) {
                    return Err(CodecError::DegenerateInput(
                        "constant tempo curve cannot be standardized".into(),
                    ));
                }
                beat_periods.iter().map(|bp| (bp - mean) / std).collect()
            }
            TempoNormalization::BeatPeriodRatio => beat_periods.iter().map(|bp| bp / mean).collect(),
            TempoNormalization::LogBeatPeriodRatio => {
                beat_periods.iter().map(|bp| (bp / mean).log2()).collect()
            }
        };

        debug!("Normalized {} beat periods as '{}'", out.len(), self.name());
        Ok(out)
    }

    pub fn rescale(&self, tempo_params: &[f64], scale: &TempoScale) -> Result<Vec<f64>> {
        let mean = scale.mean_beat_period;

        let out = match self {
            TempoNormalization::BeatPeriod => tempo_params.to_vec(),
            TempoNormalization::LogBeatPeriod => tempo_params.iter().map(|p| p.exp2()).collect(),
            TempoNormalization::Standardized => {
                let Some(std) = scale.std_beat_period else {
                    return Err(CodecError::MissingSideParameter {
                        scheme: self.name(),
                        parameter: SideParameter::StdBeatPeriod.name(),
                    });
                };
                tempo_params.iter().map(|p| p * std + mean).collect()
            }
            TempoNormalization::BeatPeriodRatio => tempo_params.iter().map(|p| p * mean).collect(),
            TempoNormalization::LogBeatPeriodRatio => {
                tempo_params.iter().map(|p| p.exp2() * mean).collect()
            }
        };

        Ok(out)
    }
}
