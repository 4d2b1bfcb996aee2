use crate::model::parameters::ParameterMatrix;
use log::warn;

pub const MAX_INTENSITY: f64 = 127.0;

/// Encodes each note's intensity as a single parameter in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotewiseDynamicsCodec {
    parameter_name: String,
}

impl Default for NotewiseDynamicsCodec {
    fn default() -> Self {
        Self::new("velocity")
    }
}

impl NotewiseDynamicsCodec {
    pub fn new(parameter_name: impl Into<String>) -> Self {
        Self {
            parameter_name: parameter_name.into(),
        }
    }

    pub fn parameter_names(&self) -> Vec<String> {
        vec![self.parameter_name.clone()]
    }

    pub fn encode(&self, intensities: &[u8]) -> ParameterMatrix {
        let mut params = ParameterMatrix::zeros(self.parameter_names(), intensities.len());
        for (i, &v) in intensities.iter().enumerate() {
            params.set(i, 0, v as f64 / MAX_INTENSITY);
        }
        params
    }

    /// Rounded intensities, not yet clipped.
    ///
    /// Parameters whose maximum is at most 1 are taken to be on the normalized scale and
    /// multiplied back by 127; anything larger is taken to already be on the 0-127 scale.
    /// A piece played entirely at intensity 1 or below on the raw scale is misread as
    /// normalized.
    pub fn decode(&self, params: &ParameterMatrix) -> Vec<f64> {
        let values = params.column(0);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max <= 1.0 {
            values
                .iter()
                .map(|p| (p * MAX_INTENSITY).round_ties_even())
                .collect()
        } else {
            warn!(
                "Dynamics parameters exceed 1 (max {:.3}), reading them as raw intensities..!",
                max
            );
            values.iter().map(|p| p.round_ties_even()).collect()
        }
    }
}

/// Clip a decoded value into the MIDI range `[1, 127]`.
pub fn clip_to_midi(value: f64) -> u8 {
    if value.is_nan() {
        return 1;
    }
    value.clamp(1.0, MAX_INTENSITY) as u8
}
