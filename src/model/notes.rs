use serde::{Deserialize, Serialize};

/// A notated note. Onset and duration are in beats; a duration of 0 marks a
/// grace note.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ScoreNote {
    pub pitch: u8,
    pub onset: f64,
    pub duration: f64,
}

impl ScoreNote {
    pub fn is_grace(&self) -> bool {
        self.duration == 0.0
    }
}

/// A measured note. Onset and duration are in seconds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PerformedNote {
    pub onset: f64,
    pub duration: f64,
    pub intensity: u8,
}

/// A score note together with the performed note aligned to it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MatchedNote {
    #[serde(flatten)]
    pub score: ScoreNote,
    #[serde(rename = "performed")]
    pub performance: PerformedNote,
}

impl MatchedNote {
    pub fn new(score: ScoreNote, performance: PerformedNote) -> Self {
        Self { score, performance }
    }
}

/// Column-wise view over a slice of matched notes, the shape the time and
/// dynamics codecs consume.
#[derive(Debug, Clone, Default)]
pub struct NoteColumns {
    pub score_onsets: Vec<f64>,
    pub score_durations: Vec<f64>,
    pub performed_onsets: Vec<f64>,
    pub performed_durations: Vec<f64>,
    pub intensities: Vec<u8>,
}

impl NoteColumns {
    pub fn from_matched(notes: &[MatchedNote]) -> Self {
        let mut columns = NoteColumns {
            score_onsets: Vec::with_capacity(notes.len()),
            score_durations: Vec::with_capacity(notes.len()),
            performed_onsets: Vec::with_capacity(notes.len()),
            performed_durations: Vec::with_capacity(notes.len()),
            intensities: Vec::with_capacity(notes.len()),
        };

        for note in notes {
            columns.score_onsets.push(note.score.onset);
            columns.score_durations.push(note.score.duration);
            columns.performed_onsets.push(note.performance.onset);
            columns.performed_durations.push(note.performance.duration);
            columns.intensities.push(note.performance.intensity);
        }

        columns
    }

    pub fn from_score(notes: &[ScoreNote]) -> Self {
        NoteColumns {
            score_onsets: notes.iter().map(|n| n.onset).collect(),
            score_durations: notes.iter().map(|n| n.duration).collect(),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.score_onsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.score_onsets.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matched_note_json_shape() {
        let note = MatchedNote::new(
            ScoreNote {
                pitch: 60,
                onset: 1.5,
                duration: 0.5,
            },
            PerformedNote {
                onset: 0.75,
                duration: 0.2,
                intensity: 64,
            },
        );

        let json = serde_json::to_value(note).unwrap();
        assert_eq!(json["pitch"], 60);
        assert_eq!(json["onset"], 1.5);
        assert_eq!(json["performed"]["intensity"], 64);

        let back: MatchedNote = serde_json::from_value(json).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn columns_keep_note_order() {
        let notes = vec![
            MatchedNote::new(
                ScoreNote { pitch: 67, onset: 1.0, duration: 1.0 },
                PerformedNote { onset: 0.5, duration: 0.4, intensity: 70 },
            ),
            MatchedNote::new(
                ScoreNote { pitch: 60, onset: 0.0, duration: 0.0 },
                PerformedNote { onset: 0.0, duration: 0.1, intensity: 50 },
            ),
        ];

        let columns = NoteColumns::from_matched(&notes);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.score_onsets, vec![1.0, 0.0]);
        assert_eq!(columns.intensities, vec![70, 50]);
        assert!(notes[1].score.is_grace());
    }
}
