use crate::error::{CodecError, Result};
use crate::normalization::TempoNormalization;
use crate::tempo::TempoStrategy;

pub fn parse_normalization(input: &str) -> Result<TempoNormalization> {
    match input.trim().to_lowercase().as_str() {
        "bp" | "beat_period" | "identity" => Ok(TempoNormalization::BeatPeriod),
        "log" | "log_bp" => Ok(TempoNormalization::LogBeatPeriod),
        "std" | "standardized" | "standardized_bp" => Ok(TempoNormalization::Standardized),
        "bpr" | "ratio" => Ok(TempoNormalization::BeatPeriodRatio),
        "log_bpr" | "log_ratio" => Ok(TempoNormalization::LogBeatPeriodRatio),
        other => Err(CodecError::UnknownConfiguration(format!(
            "unknown tempo normalization '{}', expected one of beat_period|log_bp|standardized_bp|bpr|log_bpr",
            other
        ))),
    }
}

pub fn parse_tempo_strategy(input: &str) -> Result<TempoStrategy> {
    match input.trim().to_lowercase().as_str() {
        "a" | "avg" | "average" => Ok(TempoStrategy::Average),
        "d" | "deriv" | "derivative" => Ok(TempoStrategy::Derivative),
        other => Err(CodecError::UnknownConfiguration(format!(
            "unknown tempo strategy '{}', expected average|derivative",
            other
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!(parse_normalization("LOG_BPR").unwrap(), TempoNormalization::LogBeatPeriodRatio);
        assert_eq!(parse_normalization(" std ").unwrap(), TempoNormalization::Standardized);
        for scheme in TempoNormalization::ALL {
            assert_eq!(parse_normalization(scheme.name()).unwrap(), scheme);
        }

        assert_eq!(parse_tempo_strategy("deriv").unwrap(), TempoStrategy::Derivative);
        assert_eq!(parse_tempo_strategy("average").unwrap(), TempoStrategy::Average);
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(matches!(
            parse_normalization("zscore"),
            Err(CodecError::UnknownConfiguration(_))
        ));
        assert!(matches!(
            parse_tempo_strategy("spline"),
            Err(CodecError::UnknownConfiguration(_))
        ));
    }
}
