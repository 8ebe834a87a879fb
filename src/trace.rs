//! Turning complex S-parameter traces into plottable numbers.

use std::fmt;
use std::str::FromStr;

use ndarray::prelude::*;
use num::complex::Complex64;
use thiserror::Error;

use crate::network::Network;

/// Smallest magnitude fed to the logarithm, so `|S| = 0` plots at -320 dB.
const MIN_MAGNITUDE: f64 = 1e-16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    MagDb,
    PhaseDeg,
    Real,
    Imag,
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::MagDb
    }
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 4] = [
        DisplayMode::MagDb,
        DisplayMode::PhaseDeg,
        DisplayMode::Real,
        DisplayMode::Imag,
    ];

    /// Text for the mode selector.
    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::MagDb => "|S| dB",
            DisplayMode::PhaseDeg => "Phase (deg)",
            DisplayMode::Real => "Real",
            DisplayMode::Imag => "Imag",
        }
    }

    /// Text for the y axis.
    pub fn axis_label(self) -> &'static str {
        match self {
            DisplayMode::MagDb => "Magnitude (dB)",
            DisplayMode::PhaseDeg => "Phase (deg)",
            DisplayMode::Real => "Real",
            DisplayMode::Imag => "Imag",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
#[error("unknown display mode '{0}', expected one of db, phase, real, imag")]
pub struct UnknownDisplayMode(String);

impl FromStr for DisplayMode {
    type Err = UnknownDisplayMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "db" | "mag" | "|s| db" => Ok(DisplayMode::MagDb),
            "phase" | "deg" | "phase (deg)" => Ok(DisplayMode::PhaseDeg),
            "real" | "re" => Ok(DisplayMode::Real),
            "imag" | "im" => Ok(DisplayMode::Imag),
            _ => Err(UnknownDisplayMode(s.to_owned())),
        }
    }
}

pub fn format_trace(values: ArrayView1<Complex64>, mode: DisplayMode) -> Array1<f64> {
    match mode {
        DisplayMode::MagDb => values.mapv(|z| 20. * z.norm().max(MIN_MAGNITUDE).log10()),
        DisplayMode::PhaseDeg => values.mapv(|z| z.arg().to_degrees()),
        DisplayMode::Real => values.mapv(|z| z.re),
        DisplayMode::Imag => values.mapv(|z| z.im),
    }
}

/// An `Sij` selection, stored 0-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TraceLabel {
    pub output: usize,
    pub input: usize,
}

impl TraceLabel {
    pub fn new(output: usize, input: usize) -> Self {
        TraceLabel { output, input }
    }

    /// Parses `S21` style labels (single digit ports, 1-indexed), or `S12,3`
    /// for networks with more than nine ports.
    pub fn parse(label: &str) -> Option<Self> {
        let body = label.strip_prefix('S')?;
        let (output, input) = match body.split_once(',') {
            Some((output, input)) => (output.parse::<usize>().ok()?, input.parse::<usize>().ok()?),
            None => {
                let digits: Vec<u32> = body.chars().map(|c| c.to_digit(10)).collect::<Option<_>>()?;
                match digits.as_slice() {
                    [output, input] => (*output as usize, *input as usize),
                    _ => return None,
                }
            }
        };
        if output == 0 || input == 0 {
            return None;
        }
        Some(TraceLabel::new(output - 1, input - 1))
    }

    pub fn label(self, nports: usize) -> String {
        if nports > 9 {
            format!("S{},{}", self.output + 1, self.input + 1)
        } else {
            format!("S{}{}", self.output + 1, self.input + 1)
        }
    }
}

/// All `N²` labels, row-major.
pub fn available_trace_labels(nports: usize) -> Vec<String> {
    (0..nports)
        .flat_map(|i| (0..nports).map(move |j| TraceLabel::new(i, j).label(nports)))
        .collect()
}

/// The first label, used when a network is shown with nothing selected.
pub fn default_selection(nports: usize) -> Vec<String> {
    available_trace_labels(nports).into_iter().take(1).collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    pub label: String,
    pub values: Array1<f64>,
}

/// Everything needed to draw one plot.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotData {
    pub frequency_ghz: Array1<f64>,
    pub y_label: &'static str,
    pub traces: Vec<Trace>,
}

impl PlotData {
    pub const X_LABEL: &'static str = "Frequency (GHz)";

    /// Labels that do not parse or fall outside the network are skipped.
    pub fn build<S: AsRef<str>>(network: &Network, mode: DisplayMode, labels: &[S]) -> Self {
        let mut traces = vec![];
        for label in labels {
            let label = label.as_ref();
            let values = TraceLabel::parse(label).and_then(|t| network.trace(t.output, t.input));
            match values {
                Some(values) => traces.push(Trace {
                    label: label.to_owned(),
                    values: format_trace(values, mode),
                }),
                None => tracing::debug!("skipping trace '{}'", label),
            }
        }

        PlotData {
            frequency_ghz: network.f().mapv(|f| f / 1e9),
            y_label: mode.axis_label(),
            traces,
        }
    }
}
