//! Keyframed tuning curves.
//!
//! Movement settings reference two kinds of curves: a scalar rotation-rate
//! curve and a three-component movement curve (x = max acceleration,
//! y = braking deceleration, z = ground friction), both sampled at the mapped
//! speed (0..3). Sampling is piecewise-linear and clamps at the end keys.

use serde::{Deserialize, Serialize};

/// Scalar curve: sorted `(time, value)` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatCurve {
    keys: Vec<(f32, f32)>,
}

impl FloatCurve {
    /// Build a curve from keys; keys are sorted by time.
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// Single-key curve that always returns `value`.
    pub fn constant(value: f32) -> Self {
        Self { keys: vec![(0.0, value)] }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sample at `t`. An empty curve returns 0.
    pub fn value_at(&self, t: f32) -> f32 {
        match sample(&self.keys, t) {
            Sample::Empty => 0.0,
            Sample::Key(v) => *v,
            Sample::Between(a, b, alpha) => a + (b - a) * alpha,
        }
    }
}

/// Three-component curve: sorted `(time, [x, y, z])` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorCurve {
    keys: Vec<(f32, [f32; 3])>,
}

impl VectorCurve {
    pub fn new(mut keys: Vec<(f32, [f32; 3])>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn constant(value: [f32; 3]) -> Self {
        Self { keys: vec![(0.0, value)] }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sample at `t`. An empty curve returns zeros.
    pub fn value_at(&self, t: f32) -> [f32; 3] {
        match sample(&self.keys, t) {
            Sample::Empty => [0.0; 3],
            Sample::Key(v) => *v,
            Sample::Between(a, b, alpha) => {
                [
                    a[0] + (b[0] - a[0]) * alpha,
                    a[1] + (b[1] - a[1]) * alpha,
                    a[2] + (b[2] - a[2]) * alpha,
                ]
            }
        }
    }
}

enum Sample<'a, V> {
    Empty,
    Key(&'a V),
    Between(&'a V, &'a V, f32),
}

fn sample<V>(keys: &[(f32, V)], t: f32) -> Sample<'_, V> {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Sample::Empty,
    };
    if t <= first.0 {
        return Sample::Key(&first.1);
    }
    if t >= last.0 {
        return Sample::Key(&last.1);
    }
    // Keys are sorted; find the surrounding pair.
    for pair in keys.windows(2) {
        let (t0, ref v0) = pair[0];
        let (t1, ref v1) = pair[1];
        if t >= t0 && t <= t1 {
            let span = t1 - t0;
            let alpha = if span > 0.0 { (t - t0) / span } else { 0.0 };
            return Sample::Between(v0, v1, alpha);
        }
    }
    Sample::Key(&last.1)
}
