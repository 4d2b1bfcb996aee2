use crate::error::{CodecError, Result, ensure_same_len};

/// What a piecewise-linear function returns outside its knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfRange {
    /// Hold the first/last knot value.
    #[default]
    Hold,
    /// Continue the first/last segment.
    Extrapolate,
}

/// Piecewise-linear function through a set of knots with strictly increasing x.
#[derive(Debug, Clone)]
pub struct Interpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    out_of_range: OutOfRange,
}

impl Interpolator {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        ensure_same_len("interpolation knots", xs.len(), ys.len())?;

        if xs.is_empty() {
            return Err(CodecError::DegenerateInput(
                "interpolation needs at least one knot".into(),
            ));
        }
        if xs.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(CodecError::DegenerateInput(
                "interpolation knots must be strictly increasing".into(),
            ));
        }

        Ok(Self {
            xs,
            ys,
            out_of_range: OutOfRange::default(),
        })
    }

    pub fn with_out_of_range(mut self, out_of_range: OutOfRange) -> Self {
        self.out_of_range = out_of_range;
        self
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n == 1 {
            return self.ys[0];
        }

        let below = x < self.xs[0];
        let above = x > self.xs[n - 1];
        if self.out_of_range == OutOfRange::Hold {
            if below {
                return self.ys[0];
            }
            if above {
                return self.ys[n - 1];
            }
        }

        // segment whose left knot is the last one at or before x, clamped so the
        // first/last segments are used for extrapolation
        let seg = match self.xs.iter().rposition(|&k| k <= x) {
            Some(i) => i.min(n - 2),
            None => 0,
        };

        let (x0, x1) = (self.xs[seg], self.xs[seg + 1]);
        let (y0, y1) = (self.ys[seg], self.ys[seg + 1]);
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }

    /// Central finite difference `(f(x + dx) - f(x - dx)) / 2dx`.
    pub fn derivative(&self, x: f64, dx: f64) -> f64 {
        (self.eval(x + dx) - self.eval(x - dx)) / (2.0 * dx)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12
    }

    #[test]
    fn interpolates_between_knots() {
        let f = Interpolator::new(vec![0.0, 1.0, 3.0], vec![0.0, 2.0, 3.0]).unwrap();
        assert!(approx_eq(f.eval(0.5), 1.0));
        assert!(approx_eq(f.eval(1.0), 2.0));
        assert!(approx_eq(f.eval(2.0), 2.5));
        assert!(approx_eq(f.eval(3.0), 3.0));
    }

    #[test]
    fn holds_or_extrapolates_outside() {
        let held = Interpolator::new(vec![0.0, 1.0], vec![1.0, 3.0]).unwrap();
        assert!(approx_eq(held.eval(-1.0), 1.0));
        assert!(approx_eq(held.eval(5.0), 3.0));

        let line = held.with_out_of_range(OutOfRange::Extrapolate);
        assert!(approx_eq(line.eval(-1.0), -1.0));
        assert!(approx_eq(line.eval(2.0), 5.0));
    }

    #[test]
    fn central_difference_of_line() {
        let f = Interpolator::new(vec![0.0, 4.0], vec![0.0, 2.0])
            .unwrap()
            .with_out_of_range(OutOfRange::Extrapolate);
        assert!(approx_eq(f.derivative(0.0, 0.5), 0.5));
        assert!(approx_eq(f.derivative(4.0, 0.5), 0.5));
    }

    #[test]
    fn single_knot_is_constant() {
        let f = Interpolator::new(vec![2.0], vec![0.7]).unwrap();
        assert_eq!(f.eval(-10.0), 0.7);
        assert_eq!(f.eval(10.0), 0.7);
    }

    #[test]
    fn rejects_unsorted_knots() {
        assert!(Interpolator::new(vec![1.0, 0.0], vec![0.0, 1.0]).is_err());
        assert!(Interpolator::new(vec![], vec![]).is_err());
    }
}
