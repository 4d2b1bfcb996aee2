use crate::codec::EncodedPerformance;
use crate::model::config::CodecConfig;
use crate::model::notes::{MatchedNote, ScoreNote};
use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P, what: &str) -> Result<T> {
    let text = fs::read_to_string(path.as_ref()).map_err(|e| {
        anyhow!(
            "Failed to read {} file {}: {}",
            what,
            path.as_ref().display(),
            e
        )
    })?;

    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {} file {}", what, path.as_ref().display()))
}

pub fn import_matched_notes<P: AsRef<Path>>(path: P) -> Result<Vec<MatchedNote>> {
    let notes: Vec<MatchedNote> = read_json(path, "matched notes")?;
    check_matched_notes(&notes);
    Ok(notes)
}

/// Score notes for decoding. Matched notes are accepted too; their performed part is ignored.
pub fn import_score_notes<P: AsRef<Path>>(path: P) -> Result<Vec<ScoreNote>> {
    let notes: Vec<ScoreNote> = read_json(path, "score notes")?;
    debug!("Read {} score notes", notes.len());
    Ok(notes)
}

pub fn import_encoded<P: AsRef<Path>>(path: P) -> Result<EncodedPerformance> {
    read_json(path, "encoded performance")
}

pub fn import_codec_config<P: AsRef<Path>>(path: P) -> Result<CodecConfig> {
    read_json(path, "codec config")
}

/// Write `value` as pretty JSON to `path`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;

    match path {
        Some(path) => fs::write(path, text + "\n")
            .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e)),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text)?;
            Ok(())
        }
    }
}

/// Log notes whose attributes fall outside the ranges the codec expects.
fn check_matched_notes(notes: &[MatchedNote]) {
    for (i, note) in notes.iter().enumerate() {
        if note.score.pitch > 127 {
            warn!("Note {} has out-of-range pitch {}..!", i, note.score.pitch);
        }
        if !(1..=127).contains(&note.performance.intensity) {
            warn!(
                "Note {} has out-of-range intensity {}..!",
                i, note.performance.intensity
            );
        }
        if note.score.duration < 0.0 || note.performance.duration < 0.0 {
            warn!(
                "Note {} has a negative duration (score {}, performed {})..!",
                i, note.score.duration, note.performance.duration
            );
        }
    }

    debug!("Read {} matched notes", notes.len());
}
