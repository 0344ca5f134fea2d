//! Affine scales.
//!
//! `LinearScale` is the workhorse every other scale reduces to: an affine
//! map from a data domain to an output range (usually clip space). A
//! degenerate domain is a contract violation and fails at construction —
//! never a silent NaN at apply time.

use crate::{ScaleError, Tick};
use rustc_hash::FxHashMap;

/// `f(x) = slope · x + intercept`, with the domain/range retained for
/// inversion and tick generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    slope: f64,
    intercept: f64,
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Result<Self, ScaleError> {
        let [d0, d1] = domain;
        if d0 == d1 || !d0.is_finite() || !d1.is_finite() {
            return Err(ScaleError::InvalidDomain { lo: d0, hi: d1 });
        }
        let slope = (range[1] - range[0]) / (d1 - d0);
        Ok(Self {
            slope,
            intercept: range[0] - slope * d0,
            domain,
            range,
        })
    }

    /// Map [-1, 1] clip space from the given domain.
    pub fn to_clip(domain: [f64; 2]) -> Result<Self, ScaleError> {
        Self::new(domain, [-1.0, 1.0])
    }

    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// The inverse scale is exactly `LinearScale::new(range, domain)`.
    pub fn invert(&self) -> Result<LinearScale, ScaleError> {
        LinearScale::new(self.range, self.domain)
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    /// Domain-space ticks: a power-of-ten step chosen so the span covers
    /// roughly ten ticks, each tick aligned to a multiple of the step.
    pub fn ticks(&self) -> Vec<Tick> {
        let lo = self.domain[0].min(self.domain[1]);
        let hi = self.domain[0].max(self.domain[1]);
        let step = pow10_step(hi - lo);

        let mut ticks = Vec::new();
        let mut v = (lo / step).ceil() * step;
        while v <= hi {
            ticks.push(Tick {
                position: v,
                label: format_tick(v),
            });
            v += step;
        }
        ticks
    }
}

/// Largest power of ten that yields at least ~10 steps across `span`.
pub(crate) fn pow10_step(span: f64) -> f64 {
    debug_assert!(span > 0.0);
    10f64.powf((span / 10.0).log10().floor())
}

/// Trim trailing zeros so `2.0` renders as `2` but `0.25` stays `0.25`.
pub(crate) fn format_tick(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Ordered categories mapped to evenly spaced band centers through a
/// linear scale over `[0, n]`.
#[derive(Clone, Debug)]
pub struct BandScale {
    categories: Vec<String>,
    index: FxHashMap<String, usize>,
    inner: LinearScale,
}

impl BandScale {
    pub fn new(categories: &[String], range: [f64; 2]) -> Result<Self, ScaleError> {
        let n = categories.len() as f64;
        if categories.is_empty() {
            return Err(ScaleError::InvalidDomain { lo: 0.0, hi: 0.0 });
        }
        let index = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Ok(Self {
            categories: categories.to_vec(),
            index,
            inner: LinearScale::new([0.0, n], range)?,
        })
    }

    /// Band center of a category.
    pub fn apply(&self, category: &str) -> Result<f64, ScaleError> {
        let i = self
            .index
            .get(category)
            .ok_or_else(|| ScaleError::UnknownCategory(category.to_string()))?;
        Ok(self.inner.apply(*i as f64 + 0.5))
    }

    /// Band index as a plain number, for extent derivation.
    pub fn ordinal(&self, category: &str) -> Result<f64, ScaleError> {
        self.index
            .get(category)
            .map(|i| *i as f64 + 0.5)
            .ok_or_else(|| ScaleError::UnknownCategory(category.to_string()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// One tick per category, at its band center.
    pub fn ticks(&self) -> Vec<Tick> {
        self.categories
            .iter()
            .enumerate()
            .map(|(i, c)| Tick {
                position: i as f64 + 0.5,
                label: c.clone(),
            })
            .collect()
    }
}

// ===================================================================
// Tests
// ===================================================================
