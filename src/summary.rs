use std::fmt;
use std::path::{Path, PathBuf};

use crate::impedance::ReferenceImpedance;
use crate::loader::{get_frequency_range, get_frequency_unit, get_reference_impedance};
use crate::network::Network;

/// What the UI shows about one loaded file.
///
/// The lightweight scan leaves `frequency_unit` and `reference_impedance`
/// empty and reports the first column exactly as written in the file.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchstoneSummary {
    pub path: PathBuf,
    pub num_ports: usize,
    pub frequency_unit: Option<String>,
    pub frequency_start_hz: f64,
    pub frequency_stop_hz: f64,
    pub point_count: usize,
    pub reference_impedance: Option<ReferenceImpedance>,
}

impl TouchstoneSummary {
    pub fn from_network(path: &Path, network: &Network) -> Self {
        let (start, stop) = get_frequency_range(network);
        TouchstoneSummary {
            path: path.to_path_buf(),
            num_ports: network.nports(),
            frequency_unit: Some(get_frequency_unit(network)),
            frequency_start_hz: start,
            frequency_stop_hz: stop,
            point_count: network.nfreq(),
            reference_impedance: Some(get_reference_impedance(network)),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl fmt::Display for TouchstoneSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "File name        {}", self.file_name())?;
        writeln!(f, "Path             {}", self.path.display())?;
        writeln!(f, "Ports            {}", self.num_ports)?;
        writeln!(
            f,
            "Frequency range  {} Hz → {} Hz",
            format_general(self.frequency_start_hz),
            format_general(self.frequency_stop_hz)
        )?;
        if let Some(unit) = &self.frequency_unit {
            writeln!(f, "Frequency unit   {}", unit)?;
        }
        if let Some(z0) = &self.reference_impedance {
            writeln!(f, "Reference (Ω)    {}", z0)?;
        }
        write!(f, "Points           {}", self.point_count)
    }
}

/// `%g` style: six significant digits, scientific notation outside
/// `1e-4 <= |value| < 1e6`, trailing zeros dropped.
fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0. { "inf" } else { "-inf" }.to_owned();
    }
    if value == 0. {
        return "0".to_owned();
    }

    // rounding first so 999999.5 moves to the next exponent
    let scientific = format!("{:.5e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => return scientific,
    };

    if exponent < -4 || exponent >= 6 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let fixed = format!("{:.*}", (5 - exponent) as usize, value);
        trim_zeros(&fixed).to_owned()
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
