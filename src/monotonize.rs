use crate::error::{CodecError, Result, ensure_same_len};
use crate::interp::Interpolator;
use log::{debug, warn};

/// Padding applied around the sequence in strict mode.
const STRICT_PAD: f64 = f32::EPSILON as f64;
/// Padding applied around the sequence in non-strict mode.
const LOOSE_PAD: f64 = 1e-3;
/// Below this many masked points the sequence is accepted as-is.
const MIN_CHECKED_POINTS: usize = 4;

/// The points of a sequence that survived monotonization.
#[derive(Debug, Clone, PartialEq)]
pub struct Monotonized {
    /// Positions of the retained points in the original input.
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
    /// Retained deltas, when deltas were supplied.
    pub deltas: Option<Vec<f64>>,
}

impl Monotonized {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Sequence padded with a sentinel below its minimum and above its maximum.
struct Padded {
    values: Vec<f64>,
    deltas: Option<Vec<f64>>,
    mask: Vec<bool>,
}

impl Padded {
    fn new(values: &[f64], deltas: Option<&[f64]>, pad: f64) -> Self {
        let values = pad_with_extremes(values, pad);
        let deltas = deltas.map(|d| pad_with_extremes(d, pad));
        let mask = vec![true; values.len()];
        Self {
            values,
            deltas,
            mask,
        }
    }

    fn kept(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect()
    }

    /// Slopes between consecutive kept points (plain differences without deltas).
    fn slopes(&self, kept: &[usize]) -> Vec<f64> {
        kept.windows(2)
            .map(|w| {
                let dv = self.values[w[1]] - self.values[w[0]];
                match &self.deltas {
                    Some(d) => dv / (d[w[1]] - d[w[0]]),
                    None => dv,
                }
            })
            .collect()
    }

    fn is_monotonic(&self, kept: &[usize], strict: bool) -> bool {
        if kept.len() < MIN_CHECKED_POINTS {
            return true;
        }

        let slopes = self.slopes(kept);
        if strict {
            slopes.iter().all(|&s| s > 0.0)
        } else {
            slopes.iter().all(|&s| s >= 0.0)
        }
    }

    /// Index of the interior point whose neighbouring slopes have the smallest product,
    /// i.e. the point sitting at the strongest change of direction.
    fn select_problematic(&self, kept: &[usize]) -> usize {
        let slopes = self.slopes(kept);

        let mut best = 0;
        let mut best_product = f64::INFINITY;
        for (k, pair) in slopes.windows(2).enumerate() {
            let product = pair[0] * pair[1];
            // NaN products win, the same way a NaN would be the argmin
            if product.is_nan() {
                best = k;
                break;
            }
            if product < best_product {
                best_product = product;
                best = k;
            }
        }

        kept[best + 1]
    }

    /// Drop points until the kept sequence is monotonic. The two sentinels are never
    /// selected since only interior points are candidates.
    fn refine(&mut self, strict: bool) -> usize {
        let mut removed = 0;
        loop {
            let kept = self.kept();
            if self.is_monotonic(&kept, strict) {
                return removed;
            }
            let p = self.select_problematic(&kept);
            debug!("Monotonizer dropping point {} (value {})", p - 1, self.values[p]);
            self.mask[p] = false;
            removed += 1;
        }
    }
}

fn pad_with_extremes(values: &[f64], pad: f64) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut padded = Vec::with_capacity(values.len() + 2);
    padded.push(min - pad);
    padded.extend_from_slice(values);
    padded.push(max + pad);
    padded
}

fn validate(values: &[f64], deltas: Option<&[f64]>) -> Result<()> {
    if values.is_empty() {
        return Err(CodecError::DegenerateInput(
            "cannot monotonize an empty sequence".into(),
        ));
    }
    if let Some(deltas) = deltas {
        ensure_same_len("monotonize deltas", values.len(), deltas.len())?;
    }
    Ok(())
}

/// Remove as few points as possible from `values` so that the rest is monotonic
/// with respect to `deltas` (or to position, when no deltas are given).
///
/// The sequence is padded below its minimum and above its maximum before refinement so
/// that both ends are anchored; the padding is stripped again from the result. Points
/// are removed greedily one at a time, and masks of fewer than 4 points are accepted
/// without checking.
pub fn monotonize(values: &[f64], deltas: Option<&[f64]>, strict: bool) -> Result<Monotonized> {
    validate(values, deltas)?;

    let pad = if strict { STRICT_PAD } else { LOOSE_PAD };
    let mut padded = Padded::new(values, deltas, pad);
    let removed = padded.refine(strict);

    if removed > 0 {
        warn!(
            "Removed {} of {} points to obtain a monotonic sequence..!",
            removed,
            values.len()
        );
    }

    let last = padded.values.len() - 1;
    let indices: Vec<usize> = padded
        .kept()
        .into_iter()
        .filter(|&i| i != 0 && i != last)
        .collect();

    Ok(Monotonized {
        values: indices.iter().map(|&i| padded.values[i]).collect(),
        deltas: padded
            .deltas
            .as_ref()
            .map(|d| indices.iter().map(|&i| d[i]).collect()),
        indices: indices.iter().map(|&i| i - 1).collect(),
    })
}

/// Monotonize `values` and fill the removed points back in by linear interpolation
/// (over position) between the retained points, using the padding sentinels as the
/// outermost anchors. The output has the same length as the input.
pub fn monotonize_interpolated(values: &[f64], strict: bool) -> Result<Vec<f64>> {
    validate(values, None)?;

    let pad = if strict { STRICT_PAD } else { LOOSE_PAD };
    let mut padded = Padded::new(values, None, pad);
    padded.refine(strict);

    let kept = padded.kept();
    let xs: Vec<f64> = kept.iter().map(|&i| i as f64).collect();
    let ys: Vec<f64> = kept.iter().map(|&i| padded.values[i]).collect();
    let line = Interpolator::new(xs, ys)?;

    Ok((1..=values.len()).map(|i| line.eval(i as f64)).collect())
}
