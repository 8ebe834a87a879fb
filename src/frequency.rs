use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use ndarray::prelude::*;

use crate::touchstone::TouchstoneError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FreqUnit {
    Hz,
    KHz,
    MHz,
    GHz,
    THz,
}

impl Default for FreqUnit {
    fn default() -> Self {
        FreqUnit::GHz
    }
}

impl FromStr for FreqUnit {
    type Err = TouchstoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use FreqUnit::*;
        match s.to_ascii_lowercase().as_str() {
            "hz" => Ok(Hz),
            "khz" => Ok(KHz),
            "mhz" => Ok(MHz),
            "ghz" => Ok(GHz),
            "thz" => Ok(THz),
            _ => Err(TouchstoneError::Options(format!(
                "unknown frequency unit '{}'",
                s
            ))),
        }
    }
}

impl FreqUnit {
    pub fn multiplier(self) -> f64 {
        use FreqUnit::*;
        match self {
            Hz => 1.,
            KHz => 1e3,
            MHz => 1e6,
            GHz => 1e9,
            THz => 1e12,
        }
    }

    pub fn label(self) -> &'static str {
        use FreqUnit::*;
        match self {
            Hz => "Hz",
            KHz => "kHz",
            MHz => "MHz",
            GHz => "GHz",
            THz => "THz",
        }
    }
}

impl fmt::Display for FreqUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Mul<f64> for FreqUnit {
    type Output = f64;

    fn mul(self, rhs: f64) -> f64 {
        self.multiplier() * rhs
    }
}

/// A frequency axis. Samples are held in Hz; `unit` is the unit the
/// source file was written in and is kept for display.
#[derive(Clone, PartialEq, Debug)]
pub struct Frequency {
    f: Array1<f64>,
    unit: FreqUnit,
}

impl Frequency {
    /// Linearly spaced axis, `start` and `stop` given in `unit`.
    pub fn new(start: f64, stop: f64, npoints: usize, unit: FreqUnit) -> Self {
        Frequency {
            f: Array::linspace(unit * start, unit * stop, npoints),
            unit,
        }
    }

    pub fn from_hz(freqs: Vec<f64>, unit: FreqUnit) -> Self {
        Frequency {
            f: Array1::from(freqs),
            unit,
        }
    }

    pub fn f(&self) -> ArrayView1<f64> {
        self.f.view()
    }

    pub fn unit(&self) -> FreqUnit {
        self.unit
    }

    pub fn npoints(&self) -> usize {
        self.f.len()
    }

    pub fn start(&self) -> Option<f64> {
        self.f.get(0).copied()
    }

    pub fn stop(&self) -> Option<f64> {
        self.f.len().checked_sub(1).and_then(|i| self.f.get(i)).copied()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_instantiation() {
        let good = Frequency {
            f: array![0., 1., 2., 3., 4., 5.],
            unit: FreqUnit::Hz,
        };
        let test = Frequency::new(0., 5., 6, FreqUnit::Hz);
        assert_eq!(test, good);
    }

    #[test]
    fn test_scaled_axis() {
        let freq = Frequency::new(1., 3., 3, FreqUnit::GHz);
        assert_eq!(freq.f(), array![1e9, 2e9, 3e9]);
        assert_eq!(freq.start(), Some(1e9));
        assert_eq!(freq.stop(), Some(3e9));
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("GHZ".parse::<FreqUnit>().unwrap(), FreqUnit::GHz);
        assert_eq!("khz".parse::<FreqUnit>().unwrap(), FreqUnit::KHz);
        assert!("parsecs".parse::<FreqUnit>().is_err());
        assert_eq!(FreqUnit::MHz.to_string(), "MHz");
    }

    #[test]
    fn test_empty_axis_has_no_bounds() {
        let freq = Frequency::from_hz(vec![], FreqUnit::Hz);
        assert_eq!(freq.npoints(), 0);
        assert_eq!(freq.start(), None);
    }
}
