use std::fs;
use std::path::{Path, PathBuf};

use num::complex::Complex64;
use snpviewer::trace::available_trace_labels;
use snpviewer::{
    extract_metadata, load_network, scan_network, DisplayMode, LoadErrorKind, Nested, PlotData,
    TouchstoneLoader,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/touchstone")
        .join(name)
}

#[test]
fn valid_two_port_summary() {
    let network = load_network(fixture("valid_2port.s2p")).unwrap();
    let metadata = extract_metadata(&network);

    assert_eq!(metadata.nports, 2);
    assert_eq!(metadata.frequency_unit, "GHz");
    assert_eq!(metadata.frequency_range, (1e9, 2e9));
    assert_eq!(metadata.z0, Nested::Value(Complex64::new(50., 0.)));
}

#[test]
fn invalid_two_port_is_a_parse_error() {
    for result in vec![
        load_network(fixture("invalid_2port.s2p")).map(|_| ()),
        scan_network(fixture("invalid_2port.s2p")).map(|_| ()),
    ] {
        assert_eq!(result.unwrap_err().kind(), LoadErrorKind::ParseError);
    }
}

#[test]
fn missing_file_is_not_found() {
    let err = load_network(fixture("does_not_exist.s2p")).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::NotFound);
    assert!(err.detail().contains("does_not_exist.s2p"));
}

#[test]
fn wrong_extension_is_unsupported() {
    let err = load_network(fixture("not_touchstone.txt")).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::UnsupportedFormat);
}

#[test]
fn directory_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_network(dir.path()).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::ReadError);

    // a directory with a Touchstone-looking name is still not a file
    let named = dir.path().join("bundle.s2p");
    fs::create_dir(&named).unwrap();
    let err = load_network(&named).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::ReadError);
}

#[cfg(unix)]
#[test]
fn unreadable_file_is_a_read_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.s2p");
    fs::copy(fixture("valid_2port.s2p"), &path).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

    // privileged users can read the file anyway
    if fs::File::open(&path).is_ok() {
        return;
    }
    let err = load_network(&path).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::ReadError);
}

#[test]
fn port_count_matches_extension() {
    let dir = tempfile::tempdir().unwrap();
    for n in 1..=4usize {
        let mut content = String::from("# Hz S RI R 50\n");
        for f in 1..=2 {
            content.push_str(&f.to_string());
            for _ in 0..n * n {
                content.push_str(" 0.5 0");
            }
            content.push('\n');
        }
        let path = dir.path().join(format!("dut.s{}p", n));
        fs::write(&path, content).unwrap();

        assert_eq!(load_network(&path).unwrap().nports(), n);
        assert_eq!(scan_network(&path).unwrap().num_ports, n);
    }
}

#[test]
fn loading_twice_gives_equal_summaries() {
    let loader = TouchstoneLoader::default();
    let path = fixture("valid_2port.s2p");
    assert_eq!(
        loader.load_summary(&path).unwrap(),
        loader.load_summary(&path).unwrap()
    );
    assert_eq!(scan_network(&path).unwrap(), scan_network(&path).unwrap());
}

#[test]
fn version_two_file() {
    let network = load_network(fixture("thru_v2.ts")).unwrap();
    assert_eq!(network.nports(), 2);
    assert_eq!(network.nfreq(), 3);
    assert_eq!(available_trace_labels(network.nports()).len(), 4);

    let plot = PlotData::build(&network, DisplayMode::PhaseDeg, &["S21"]);
    let phase = &plot.traces[0].values;
    assert!((phase[0] + 90.).abs() < 1e-9);
    assert!((phase[1].abs() - 180.).abs() < 1e-9);
    assert!((phase[2] - 90.).abs() < 1e-9);

    // .ts has no port count in its name, so the quick scan refuses it
    let err = scan_network(fixture("thru_v2.ts")).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::UnsupportedFormat);
}

#[test]
fn db_file_clamps_tiny_magnitudes() {
    let network = load_network(fixture("attenuator_1port.s1p")).unwrap();
    assert_eq!(network.f().to_vec(), vec![100e6, 200e6, 300e6]);

    let plot = PlotData::build(&network, DisplayMode::MagDb, &["S11"]);
    let db = &plot.traces[0].values;
    assert!((db[0] + 20.).abs() < 1e-9);
    assert!((db[1] + 40.).abs() < 1e-9);
    assert!((db[2] + 320.).abs() < 1e-9);
    assert_eq!(plot.frequency_ghz.to_vec(), vec![0.1, 0.2, 0.3]);
}

#[test]
fn oversized_port_count_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dut.s5000000000p");
    fs::write(&path, "# Hz S RI R 50\n1 0.5 0\n").unwrap();

    let err = load_network(&path).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::ParseError);
}

#[test]
fn carriage_return_line_endings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mac.s1p");
    fs::write(
        &path,
        "! old mac file\r# Hz S RI R 50\r1 0.5 0\r2 0.5 0\r3 0.5 0\r",
    )
    .unwrap();

    let network = load_network(&path).unwrap();
    assert_eq!(network.f().to_vec(), vec![1., 2., 3.]);

    let summary = scan_network(&path).unwrap();
    assert_eq!(summary.point_count, 3);
    assert_eq!(summary.frequency_start_hz, 1.);
    assert_eq!(summary.frequency_stop_hz, 3.);
}
