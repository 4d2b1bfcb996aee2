use crate::error::{CodecError, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Default tolerance (in beats) under which two score onsets are considered simultaneous.
pub const DEFAULT_ONSET_EPSILON: f64 = 1e-6;

/// Indices of the notes sharing one score onset.
///
/// Members are stored in ascending onset order; notes with identical onsets keep the
/// relative order they had in the input (e.g. pitch order within a chord).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct OnsetGroup {
    indices: Vec<usize>,
}

impl OnsetGroup {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Mean of `values` over the members of this group.
    pub fn mean_of(&self, values: &[f64]) -> f64 {
        self.indices.iter().map(|&i| values[i]).sum::<f64>() / self.indices.len() as f64
    }
}

/// Partition `onsets` into groups of simultaneous notes, in ascending onset order.
///
/// A new group starts wherever two consecutive sorted onsets are more than `epsilon`
/// apart, so runs of values closer than `epsilon` end up in the same group.
pub fn group_onsets(onsets: &[f64], epsilon: f64) -> Vec<OnsetGroup> {
    if onsets.is_empty() {
        return Vec::new();
    }

    // sort_by is stable, which keeps chord members in their input order
    let mut order: Vec<usize> = (0..onsets.len()).collect();
    order.sort_by(|&a, &b| onsets[a].total_cmp(&onsets[b]));

    let mut groups: Vec<OnsetGroup> = Vec::new();
    let mut current: Vec<usize> = vec![order[0]];

    for pair in order.windows(2) {
        if onsets[pair[1]] - onsets[pair[0]] > epsilon {
            groups.push(OnsetGroup::new(std::mem::take(&mut current)));
        }
        current.push(pair[1]);
    }
    groups.push(OnsetGroup::new(current));

    debug!(
        "Grouped {} onsets into {} unique onsets (eps={})",
        onsets.len(),
        groups.len(),
        epsilon
    );

    groups
}

/// Check that caller-supplied `groups` partition `0..n` into non-empty groups.
pub fn check_partition(groups: &[OnsetGroup], n: usize) -> Result<()> {
    let mut seen = vec![false; n];
    let mut count = 0;

    for group in groups {
        if group.is_empty() {
            return Err(CodecError::DegenerateInput("empty onset group".into()));
        }
        for &i in group.indices() {
            if i >= n || seen[i] {
                return Err(CodecError::ShapeMismatch {
                    what: "onset group indices",
                    expected: n,
                    found: i,
                });
            }
            seen[i] = true;
            count += 1;
        }
    }

    crate::error::ensure_same_len("onset group coverage", n, count)
}

/// Mean onset of every group.
pub fn unique_onsets(onsets: &[f64], groups: &[OnsetGroup]) -> Vec<f64> {
    groups.iter().map(|g| g.mean_of(onsets)).collect()
}

/// Per-group onset summary of a note sequence.
#[derive(Debug, Clone)]
pub struct UniqueSequence {
    /// Mean onset per group, followed by one closing time so that every group
    /// has an inter-onset interval (the last one running to the end of the piece).
    pub unique_onsets: Vec<f64>,
    pub total_duration: f64,
    pub groups: Vec<OnsetGroup>,
}

impl UniqueSequence {
    pub fn iois(&self) -> Vec<f64> {
        self.unique_onsets.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

/// Summarize a note sequence by onset group.
///
/// The closing time is `max(max(onsets) + f32::EPSILON, max(offsets))`, which keeps it
/// strictly later than the last onset even when every final note has zero length.
pub fn unique_sequence(
    onsets: &[f64],
    offsets: &[f64],
    groups: Option<&[OnsetGroup]>,
    epsilon: f64,
) -> Result<UniqueSequence> {
    if onsets.is_empty() {
        return Err(CodecError::DegenerateInput(
            "cannot summarize an empty note sequence".into(),
        ));
    }
    crate::error::ensure_same_len("offsets", onsets.len(), offsets.len())?;

    let first_time = onsets.iter().copied().fold(f64::INFINITY, f64::min);
    let last_onset = onsets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let last_offset = offsets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let last_time = (last_onset + f32::EPSILON as f64).max(last_offset);

    let groups = match groups {
        Some(groups) => {
            check_partition(groups, onsets.len())?;
            groups.to_vec()
        }
        None => group_onsets(onsets, epsilon),
    };

    let mut unique = unique_onsets(onsets, &groups);
    unique.push(last_time);

    Ok(UniqueSequence {
        unique_onsets: unique,
        total_duration: last_time - first_time,
        groups,
    })
}
