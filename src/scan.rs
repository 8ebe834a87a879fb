//! Lightweight loader.
//!
//! Reads only what the summary panel needs: the port count comes from the
//! `.sNp` extension and the frequencies from the first column of each data
//! row. S-parameter columns are never looked at, and the row count is not
//! checked against the port count.

use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::summary::TouchstoneSummary;
use crate::touchstone::lines;

const ROW_PREVIEW: usize = 50;

/// Port count encoded in an `.sNp` extension (case-insensitive). No I/O.
pub fn infer_ports_from_extension(path: &Path) -> Result<usize, LoadError> {
    let suffix = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();

    if !suffix.starts_with(".s") || !suffix.ends_with('p') || suffix.len() < 3 {
        return Err(LoadError::unsupported(
            path,
            "Unsupported file extension. Expected a Touchstone file like .s1p, .s2p, etc.",
        ));
    }

    let port_text = &suffix[2..suffix.len() - 1];
    if port_text.is_empty() || !port_text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LoadError::unsupported(
            path,
            format!("Could not infer port count from extension '{}'.", suffix),
        ));
    }

    match port_text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(LoadError::unsupported(
            path,
            "Port count must be greater than zero.",
        )),
        Err(_) => Err(LoadError::unsupported(
            path,
            format!("Could not infer port count from extension '{}'.", suffix),
        )),
    }
}

/// Summarises a file from its extension and frequency column alone.
pub fn scan_network<P: AsRef<Path>>(path: P) -> Result<TouchstoneSummary, LoadError> {
    let path = path.as_ref();
    if fs::metadata(path).is_err() {
        return Err(LoadError::not_found(path));
    }

    let num_ports = infer_ports_from_extension(path)?;

    let bytes = fs::read(path).map_err(|err| LoadError::read(path, err.to_string()))?;
    let text = decode_dropping_invalid(&bytes);
    let frequencies = scan_frequencies(&text).map_err(|message| LoadError::parse(path, message))?;

    let (start, stop) = match (frequencies.first(), frequencies.last()) {
        (Some(start), Some(stop)) => (*start, *stop),
        _ => {
            return Err(LoadError::parse(
                path,
                "No frequency data rows were found. Verify the file is a valid Touchstone file.",
            ))
        }
    };

    tracing::debug!(
        "scanned {}: {} rows, {} ports from extension",
        path.display(),
        frequencies.len(),
        num_ports
    );

    Ok(TouchstoneSummary {
        path: path.to_path_buf(),
        num_ports,
        frequency_unit: None,
        frequency_start_hz: start,
        frequency_stop_hz: stop,
        point_count: frequencies.len(),
        reference_impedance: None,
    })
}

/// First token of every non-blank, non-comment line, in file order.
fn scan_frequencies(text: &str) -> Result<Vec<f64>, String> {
    let mut frequencies = vec![];
    for raw_line in lines(text) {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('!') || line.starts_with('#') {
            continue;
        }

        let first_token = line.split_whitespace().next().unwrap_or_default();
        match first_token.parse::<f64>() {
            Ok(frequency) => frequencies.push(frequency),
            Err(_) => {
                let preview: String = line.chars().take(ROW_PREVIEW).collect();
                return Err(format!("Invalid data row encountered: '{}...'", preview));
            }
        }
    }
    Ok(frequencies)
}

/// UTF-8 decode that skips undecodable bytes instead of failing.
fn decode_dropping_invalid(mut bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                text.push_str(valid);
                return text;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                text.push_str(&String::from_utf8_lossy(valid));
                let skip = err.error_len().unwrap_or_else(|| rest.len());
                bytes = &rest[skip..];
            }
        }
    }
}
