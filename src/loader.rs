//! Strict loader: validates the path, parses the whole network through a
//! [`NetworkReader`] and reduces every failure to a [`LoadError`].

use std::fs::{self, File};
use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::LoadError;
use crate::impedance::ReferenceImpedance;
use crate::network::{Network, NetworkReader, TouchstoneReader};
use crate::summary::TouchstoneSummary;
use crate::touchstone::TouchstoneError;

static SNP_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\.s\d+p$").expect("valid extension pattern"));

/// Metadata read off a parsed network.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchstoneMetadata {
    pub nports: usize,
    pub frequency_unit: String,
    pub frequency_range: (f64, f64),
    pub z0: ReferenceImpedance,
}

pub struct TouchstoneLoader {
    reader: Option<Box<dyn NetworkReader>>,
}

impl Default for TouchstoneLoader {
    fn default() -> Self {
        TouchstoneLoader::new(TouchstoneReader)
    }
}

impl TouchstoneLoader {
    pub fn new<R: NetworkReader + 'static>(reader: R) -> Self {
        TouchstoneLoader {
            reader: Some(Box::new(reader)),
        }
    }

    /// A loader with no parser behind it. Every load fails with
    /// [`LoadError::ParseError`] once the path has been validated.
    pub fn without_reader() -> Self {
        TouchstoneLoader { reader: None }
    }

    pub fn load_network(&self, path: &Path) -> Result<Network, LoadError> {
        validate_path(path)?;

        let reader = self.reader.as_ref().ok_or_else(|| {
            LoadError::parse(
                path,
                "No Touchstone parser is available, cannot parse Touchstone files.",
            )
        })?;

        tracing::debug!("parsing {}", path.display());
        reader.read(path).map_err(|err| map_reader_error(path, err))
    }

    pub fn load_summary(&self, path: &Path) -> Result<TouchstoneSummary, LoadError> {
        let network = self.load_network(path)?;
        let summary = TouchstoneSummary::from_network(path, &network);
        tracing::info!(
            "loaded {}: {} ports, {} points",
            path.display(),
            summary.num_ports,
            summary.point_count
        );
        Ok(summary)
    }
}

/// Loads a network with the built-in Touchstone parser.
pub fn load_network<P: AsRef<Path>>(path: P) -> Result<Network, LoadError> {
    TouchstoneLoader::default().load_network(path.as_ref())
}

/// `.ts`, or `.sNp` in any letter case.
pub fn is_supported_touchstone(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            ext.eq_ignore_ascii_case("ts") || SNP_EXTENSION.is_match(&format!(".{}", ext))
        }
        None => false,
    }
}

/// Checks, in order, that the path exists, is a regular file, has a
/// Touchstone extension and can be opened for reading.
pub fn validate_path(path: &Path) -> Result<(), LoadError> {
    let metadata = fs::metadata(path).map_err(|_| LoadError::not_found(path))?;

    if !metadata.is_file() {
        return Err(LoadError::read(path, "Touchstone path is not a file"));
    }

    if !is_supported_touchstone(path) {
        return Err(LoadError::unsupported(
            path,
            "Unsupported Touchstone file extension. Expected .ts or .sNp pattern.",
        ));
    }

    File::open(path).map_err(|err| LoadError::read(path, err.to_string()))?;
    Ok(())
}

fn map_reader_error(path: &Path, err: TouchstoneError) -> LoadError {
    match err {
        TouchstoneError::Io(ref io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            LoadError::not_found(path)
        }
        TouchstoneError::Io(ref io_err) if io_err.kind() == io::ErrorKind::PermissionDenied => {
            LoadError::read(path, io_err.to_string())
        }
        TouchstoneError::Other(_) => {
            let message = format!(
                "Unexpected error while parsing Touchstone file '{}': {}",
                path.display(),
                err
            );
            LoadError::parse_with_source(path, message, err)
        }
        _ => {
            let message = format!(
                "Failed to parse Touchstone file '{}': {}",
                path.display(),
                err
            );
            LoadError::parse_with_source(path, message, err)
        }
    }
}

pub fn get_nports(network: &Network) -> usize {
    network.nports()
}

pub fn get_frequency_unit(network: &Network) -> String {
    network.frequency().unit().to_string()
}

/// First and last frequency sample in Hz, in file order.
pub fn get_frequency_range(network: &Network) -> (f64, f64) {
    let f = network.frequency();
    f.start().zip(f.stop()).unwrap_or_default()
}

/// The network's z0 as a `[frequency][port]` structure, collapsed to one
/// value when every entry is identical.
pub fn get_reference_impedance(network: &Network) -> ReferenceImpedance {
    ReferenceImpedance::from(network.z0()).collapse_uniform()
}

pub fn extract_metadata(network: &Network) -> TouchstoneMetadata {
    TouchstoneMetadata {
        nports: get_nports(network),
        frequency_unit: get_frequency_unit(network),
        frequency_range: get_frequency_range(network),
        z0: get_reference_impedance(network),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadErrorKind;
    use crate::frequency::{FreqUnit, Frequency};
    use crate::impedance::Nested;
    use ndarray::array;
    use ndarray::prelude::*;
    use num::complex::Complex64;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/touchstone")
            .join(name)
    }

    fn fake_network(_: &Path) -> Result<Network, TouchstoneError> {
        let f = Frequency::from_hz(vec![1e9, 2e9], FreqUnit::GHz);
        let s = Array3::from_elem((2, 2, 2), Complex64::new(0.5, 0.));
        let z0 = Array2::from_elem((2, 2), Complex64::new(50., 0.));
        Network::new(f, s, z0)
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_touchstone(Path::new("a.s2p")));
        assert!(is_supported_touchstone(Path::new("a.S4P")));
        assert!(is_supported_touchstone(Path::new("a.s12p")));
        assert!(is_supported_touchstone(Path::new("a.ts")));
        assert!(!is_supported_touchstone(Path::new("a.txt")));
        assert!(!is_supported_touchstone(Path::new("a.sp")));
        assert!(!is_supported_touchstone(Path::new("a.s2p.bak")));
        assert!(!is_supported_touchstone(Path::new("s2p")));
    }

    #[test]
    fn test_load_network_success() {
        let network = load_network(fixture("valid_2port.s2p")).unwrap();

        assert_eq!(get_nports(&network), 2);
        assert_eq!(get_frequency_unit(&network), "GHz");
        assert_eq!(get_frequency_range(&network), (1e9, 2e9));
        assert_eq!(get_reference_impedance(&network), Nested::Value(Complex64::new(50., 0.)));

        let metadata = extract_metadata(&network);
        assert_eq!(metadata.nports, 2);
        assert_eq!(metadata.frequency_unit.to_lowercase(), "ghz");
        assert_eq!(metadata.frequency_range, (1e9, 2e9));
        assert_eq!(metadata.z0.as_scalar(), Some(&Complex64::new(50., 0.)));
    }

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = load_network(fixture("does_not_exist.s2p")).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::NotFound);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_network(fixture("not_touchstone.txt")).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_directory_is_a_read_error() {
        let err = load_network(fixture("")).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::ReadError);
    }

    #[test]
    fn test_parse_error() {
        let err = load_network(fixture("invalid_2port.s2p")).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::ParseError);
        assert!(err.to_string().contains("invalid_2port.s2p"));
    }

    #[test]
    fn test_nonuniform_reference_impedance_is_kept() {
        let mut network = load_network(fixture("valid_2port.s2p")).unwrap();
        let z0 = array![
            [Complex64::new(50., 0.), Complex64::new(75., 0.)],
            [Complex64::new(50., 0.), Complex64::new(75., 0.)]
        ];
        network.set_z0(z0.clone()).unwrap();

        let expected = ReferenceImpedance::from(z0.view());
        assert_eq!(get_reference_impedance(&network), expected);
    }

    #[test]
    fn test_custom_reader() {
        let loader = TouchstoneLoader::new(fake_network);
        let network = loader.load_network(&fixture("valid_2port.s2p")).unwrap();
        assert_eq!(network.s()[[1, 1, 0]], Complex64::new(0.5, 0.));
    }

    #[test]
    fn test_reader_errors_are_mapped() {
        let path = fixture("valid_2port.s2p");
        let cases = vec![
            (
                TouchstoneError::Io(io::Error::new(io::ErrorKind::NotFound, "gone")),
                LoadErrorKind::NotFound,
            ),
            (
                TouchstoneError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
                LoadErrorKind::ReadError,
            ),
            (
                TouchstoneError::Io(io::Error::new(io::ErrorKind::InvalidData, "not utf-8")),
                LoadErrorKind::ParseError,
            ),
            (
                TouchstoneError::Shape("truncated".to_owned()),
                LoadErrorKind::ParseError,
            ),
            (
                TouchstoneError::Other("index out of range".into()),
                LoadErrorKind::ParseError,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(map_reader_error(&path, err).kind(), kind);
        }
    }

    #[test]
    fn test_unexpected_errors_are_wrapped() {
        let loader = TouchstoneLoader::new(|_: &Path| -> Result<Network, TouchstoneError> {
            Err(TouchstoneError::Other("boom".into()))
        });
        let err = loader
            .load_network(&fixture("valid_2port.s2p"))
            .unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::ParseError);
        assert!(err.to_string().starts_with("Unexpected error"));
    }

    #[test]
    fn test_missing_reader_fails_after_validation() {
        let loader = TouchstoneLoader::without_reader();
        let err = loader
            .load_network(&fixture("valid_2port.s2p"))
            .unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::ParseError);

        let err = loader
            .load_network(&fixture("does_not_exist.s2p"))
            .unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::NotFound);
    }

    #[test]
    fn test_load_summary() {
        let summary = TouchstoneLoader::default()
            .load_summary(&fixture("valid_2port.s2p"))
            .unwrap();
        assert_eq!(summary.num_ports, 2);
        assert_eq!(summary.point_count, 2);
        assert_eq!(summary.frequency_unit.as_deref(), Some("GHz"));
    }
}
