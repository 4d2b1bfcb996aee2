use crate::grouping::DEFAULT_ONSET_EPSILON;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "perf_codec",
    about = "Encode a matched performance into expressive parameters, or decode parameters back into a performance."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Tempo normalization: beat_period|log_bp|standardized_bp|bpr|log_bpr.
    #[arg(short, long, global = true, default_value = "beat_period")]
    pub normalization: String,

    /// Tempo estimation strategy: average|derivative.
    #[arg(short, long, global = true, default_value = "average")]
    pub tempo: String,

    /// Tolerance in beats under which score onsets count as simultaneous.
    #[arg(short, long, global = true, default_value_t = DEFAULT_ONSET_EPSILON)]
    pub epsilon: f64,

    /// JSON codec configuration file. Takes precedence over the flags above.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Prints extra information to the terminal.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a JSON array of matched notes into a parameter document.
    Encode {
        /// Path to the matched notes.
        matched: PathBuf,

        /// Where to write the encoded document (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a parameter document against a JSON array of score notes.
    Decode {
        /// Path to the score notes.
        score: PathBuf,

        /// Path to the encoded document.
        encoded: PathBuf,

        /// Where to write the performed notes (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Args {
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            normalization: self.normalization.clone(),
            tempo: self.tempo.clone(),
            epsilon: self.epsilon,
            ..Default::default()
        }
    }
}

/// Settings a [`crate::PerformanceCodec`] is built from. Construct once and reuse for
/// every piece; encode and decode must use the same configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct CodecConfig {
    pub normalization: String,
    pub tempo: String,
    pub epsilon: f64,
    /// Explicit names for the tempo/timing/articulation columns; derived from the
    /// normalization when absent.
    pub time_parameter_names: Option<Vec<String>>,
    pub dynamics_parameter_name: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            normalization: "beat_period".to_string(),
            tempo: "average".to_string(),
            epsilon: DEFAULT_ONSET_EPSILON,
            time_parameter_names: None,
            dynamics_parameter_name: "velocity".to_string(),
        }
    }
}
