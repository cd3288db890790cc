//! Discrete Wavelet Transforms for JPEG 2000
//!
//! Lifting implementations of the reversible 5-3 and irreversible 9-7 filters.
//! A line is transformed in place in its interleaved order. The phase of the
//! line is given by `high_first`: when the first sample sits on an odd
//! reference-grid coordinate it is a high-pass sample, otherwise a low-pass
//! one. Both ends use whole-sample symmetric extension.

use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Wavelet filter family of a tile-component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveletFilter {
    /// Reversible 5-3 integer lifting.
    W5x3,
    /// Irreversible 9-7 floating point lifting.
    W9x7,
}

/// Negative/positive support lengths of a filter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSupports {
    pub low_neg: u32,
    pub low_pos: u32,
    pub high_neg: u32,
    pub high_pos: u32,
}

impl WaveletFilter {
    pub fn is_reversible(self) -> bool {
        self == WaveletFilter::W5x3
    }

    pub fn analysis_supports(self) -> FilterSupports {
        match self {
            WaveletFilter::W5x3 => FilterSupports {
                low_neg: 2,
                low_pos: 2,
                high_neg: 1,
                high_pos: 1,
            },
            WaveletFilter::W9x7 => FilterSupports {
                low_neg: 4,
                low_pos: 4,
                high_neg: 3,
                high_pos: 3,
            },
        }
    }

    /// Supports of the synthesis filters, i.e. the reach of one coefficient
    /// into the reconstructed signal.
    pub fn synthesis_supports(self) -> FilterSupports {
        match self {
            WaveletFilter::W5x3 => FilterSupports {
                low_neg: 1,
                low_pos: 1,
                high_neg: 2,
                high_pos: 2,
            },
            WaveletFilter::W9x7 => FilterSupports {
                low_neg: 3,
                low_pos: 3,
                high_neg: 4,
                high_pos: 4,
            },
        }
    }
}

impl fmt::Display for WaveletFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveletFilter::W5x3 => f.write_str("w5x3"),
            WaveletFilter::W9x7 => f.write_str("w9x7"),
        }
    }
}

impl FromStr for WaveletFilter {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "w5x3" | "5x3" => Ok(WaveletFilter::W5x3),
            "w9x7" | "9x7" => Ok(WaveletFilter::W9x7),
            _ => Err(AnalysisError::InvalidValue {
                parameter: "wavelet filter",
                value: s.to_string(),
            }),
        }
    }
}

/// Number of low-pass samples produced from `len` samples starting at
/// reference-grid coordinate `ulc`.
pub fn low_count(ulc: u32, len: u32) -> u32 {
    ((ulc + len + 1) >> 1) - ((ulc + 1) >> 1)
}

/// Applies one lifting step to the samples at `start`, `start + 2`, ...
/// Needs at least two samples.
fn lift<T: Copy>(line: &mut [T], start: usize, step: impl Fn(T, T, T) -> T) {
    let len = line.len();
    let mut i = start;
    while i < len {
        let left = if i == 0 { line[1] } else { line[i - 1] };
        let right = if i + 1 < len { line[i + 1] } else { line[i - 1] };
        line[i] = step(line[i], left, right);
        i += 2;
    }
}

/// Positions of the first low-pass and first high-pass sample.
fn phase(high_first: bool) -> (usize, usize) {
    if high_first { (1, 0) } else { (0, 1) }
}

pub struct Dwt53;

impl Dwt53 {
    /// Forward 5/3 Reversible Transform (1D, in place)
    pub fn forward(line: &mut [i32], high_first: bool) {
        match line.len() {
            0 => return,
            1 => {
                if high_first {
                    line[0] <<= 1;
                }
                return;
            }
            _ => {}
        }
        let (low, high) = phase(high_first);

        // y[2n+1] = x[2n+1] - floor((x[2n] + x[2n+2]) / 2)
        lift(line, high, |x, l, r| x - ((l + r) >> 1));
        // y[2n] = x[2n] + floor((y[2n-1] + y[2n+1] + 2) / 4)
        lift(line, low, |x, l, r| x + ((l + r + 2) >> 2));
    }

    /// Inverse 5/3 Reversible Transform (1D, in place)
    pub fn inverse(line: &mut [i32], high_first: bool) {
        match line.len() {
            0 => return,
            1 => {
                if high_first {
                    line[0] >>= 1;
                }
                return;
            }
            _ => {}
        }
        let (low, high) = phase(high_first);

        lift(line, low, |x, l, r| x - ((l + r + 2) >> 2));
        lift(line, high, |x, l, r| x + ((l + r) >> 1));
    }
}

pub struct Dwt97;

impl Dwt97 {
    const ALPHA: f32 = -1.586_134_3;
    const BETA: f32 = -0.052_980_12;
    const GAMMA: f32 = 0.882_911_1;
    const DELTA: f32 = 0.443_506_85;
    const KL: f32 = 0.812_893_1;
    const KH: f32 = 1.230_174_1;

    /// Forward 9/7 Irreversible Transform (1D, in place)
    pub fn forward(line: &mut [f32], high_first: bool) {
        match line.len() {
            0 => return,
            1 => {
                if high_first {
                    line[0] *= 2.0;
                }
                return;
            }
            _ => {}
        }
        let (low, high) = phase(high_first);

        lift(line, high, |x, l, r| x + Self::ALPHA * (l + r));
        lift(line, low, |x, l, r| x + Self::BETA * (l + r));
        lift(line, high, |x, l, r| x + Self::GAMMA * (l + r));
        lift(line, low, |x, l, r| x + Self::DELTA * (l + r));

        for v in line.iter_mut().skip(low).step_by(2) {
            *v *= Self::KL;
        }
        for v in line.iter_mut().skip(high).step_by(2) {
            *v *= Self::KH;
        }
    }

    /// Inverse 9/7 Irreversible Transform (1D, in place)
    pub fn inverse(line: &mut [f32], high_first: bool) {
        match line.len() {
            0 => return,
            1 => {
                if high_first {
                    line[0] *= 0.5;
                }
                return;
            }
            _ => {}
        }
        let (low, high) = phase(high_first);

        for v in line.iter_mut().skip(low).step_by(2) {
            *v /= Self::KL;
        }
        for v in line.iter_mut().skip(high).step_by(2) {
            *v /= Self::KH;
        }

        lift(line, low, |x, l, r| x - Self::DELTA * (l + r));
        lift(line, high, |x, l, r| x - Self::GAMMA * (l + r));
        lift(line, low, |x, l, r| x - Self::BETA * (l + r));
        lift(line, high, |x, l, r| x - Self::ALPHA * (l + r));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_53_constant_signal() {
        // A flat signal has no detail: highs are zero, lows keep the value.
        let mut line = vec![7; 9];
        Dwt53::forward(&mut line, false);
        for (i, v) in line.iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(*v, 7);
            } else {
                assert_eq!(*v, 0);
            }
        }
    }

    #[test]
    fn test_53_known_values() {
        let mut line = vec![1, 2, 3, 4];
        Dwt53::forward(&mut line, false);
        // highs: 2 - 2 = 0, 4 - 3 = 1 ; lows: 1 + (0 + 0 + 2) >> 2 = 1, 3 + (0 + 1 + 2) >> 2 = 3
        assert_eq!(line, vec![1, 0, 3, 1]);
    }

    #[test]
    fn test_phase_changes_output() {
        let signal = vec![10, 3, 8, 1, 9, 4, 12];
        let mut even = signal.clone();
        let mut odd = signal.clone();
        Dwt53::forward(&mut even, false);
        Dwt53::forward(&mut odd, true);
        assert_ne!(even, odd);
    }

    #[test]
    fn test_single_sample() {
        let mut low = vec![5];
        Dwt53::forward(&mut low, false);
        assert_eq!(low, vec![5]);

        let mut high = vec![5];
        Dwt53::forward(&mut high, true);
        assert_eq!(high, vec![10]);
        Dwt53::inverse(&mut high, true);
        assert_eq!(high, vec![5]);

        let mut f = vec![3.0f32];
        Dwt97::forward(&mut f, true);
        assert_eq!(f, vec![6.0]);
    }

    #[test]
    fn test_97_reconstruction() {
        for high_first in [false, true] {
            for len in 2..24 {
                let signal: Vec<f32> = (0..len).map(|i| ((i * 37) % 255) as f32 - 128.0).collect();
                let mut line = signal.clone();
                Dwt97::forward(&mut line, high_first);
                Dwt97::inverse(&mut line, high_first);
                for (a, b) in signal.iter().zip(&line) {
                    assert!((a - b).abs() < 1e-2, "len {len}: {a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn test_supports() {
        let s = WaveletFilter::W9x7.synthesis_supports();
        assert_eq!((s.low_neg, s.high_pos), (3, 4));
        let a = WaveletFilter::W5x3.analysis_supports();
        assert_eq!((a.low_neg, a.high_neg), (2, 1));
        assert_eq!("W9X7".parse::<WaveletFilter>().unwrap(), WaveletFilter::W9x7);
        assert!("haar".parse::<WaveletFilter>().is_err());
    }

    #[test]
    fn test_low_count() {
        assert_eq!(low_count(0, 8), 4);
        assert_eq!(low_count(1, 8), 4);
        assert_eq!(low_count(0, 7), 4);
        assert_eq!(low_count(1, 7), 3);
        assert_eq!(low_count(1, 1), 0);
    }

    proptest! {
        #[test]
        fn prop_53_perfect_reconstruction(
            signal in proptest::collection::vec(-(1i32 << 16)..(1i32 << 16), 1..64),
            high_first in any::<bool>(),
        ) {
            let mut line = signal.clone();
            Dwt53::forward(&mut line, high_first);
            Dwt53::inverse(&mut line, high_first);
            prop_assert_eq!(line, signal);
        }
    }
}
