//! Touchstone text parser.
//!
//! Handles version 1 files (`.sNp`, port count from the extension) and
//! version 2 files (`[Number of Ports]` keyword, usually `.ts`). Only
//! S-parameter network data is read; noise data ends the network block.

use std::fmt;
use std::fs;
use std::path::Path;

use ndarray::prelude::*;
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, space0, space1},
    combinator::{eof, map, peek, value},
    multi::many0,
    number::complete::double,
    sequence::{pair, preceded, terminated},
    IResult,
};
use num::complex::Complex64;
use thiserror::Error;

use crate::frequency::FreqUnit;
use crate::CxArray3;

/// Longest slice of an offending line quoted back in an error.
const LINE_PREVIEW: usize = 50;

#[derive(Debug, Error)]
pub enum TouchstoneError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("invalid option line: {0}")]
    Options(String),

    #[error("invalid keyword: {0}")]
    Keyword(String),

    #[error("{0}")]
    Shape(String),

    #[error("unsupported Touchstone content: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum TouchstoneVersion {
    One,
    Two,
}

impl Default for TouchstoneVersion {
    fn default() -> Self {
        TouchstoneVersion::One
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ParamType {
    S,
    Y,
    Z,
    G,
    H,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ParamFormat {
    DBAngle,
    MagAngle,
    RealImag,
}

impl ParamFormat {
    /// Combines the two numbers stored for one matrix entry. Angles are in degrees.
    pub fn to_complex(self, a: f64, b: f64) -> Complex64 {
        use ParamFormat::*;
        match self {
            RealImag => Complex64::new(a, b),
            MagAngle => Complex64::from_polar(a, b.to_radians()),
            DBAngle => Complex64::from_polar(10f64.powf(a / 20.), b.to_radians()),
        }
    }
}

/// Storage order of the off-diagonal entries in two-port files.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum TwoPortOrder {
    /// `S11 S21 S12 S22`, the only order version 1 allows.
    S21First,
    /// `S11 S12 S21 S22`
    S12First,
}

impl Default for TwoPortOrder {
    fn default() -> Self {
        TwoPortOrder::S21First
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct TouchstoneOptions {
    pub unit: FreqUnit,
    pub param_type: ParamType,
    pub param_format: ParamFormat,
    pub resistance: f64,
}

impl Default for TouchstoneOptions {
    fn default() -> Self {
        TouchstoneOptions {
            unit: FreqUnit::GHz,
            param_type: ParamType::S,
            param_format: ParamFormat::MagAngle,
            resistance: 50.,
        }
    }
}

#[derive(Default)]
pub struct Touchstone {
    filename: String,
    version: TouchstoneVersion,
    comments: Vec<String>,
    num_ports: usize,
    freqs: Vec<f64>,
    num_freq_points: Option<usize>,
    reference: Option<Vec<f64>>,
    options: TouchstoneOptions,
    two_port_order: TwoPortOrder,
    s_params: CxArray3,
}

impl Touchstone {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn version(&self) -> TouchstoneVersion {
        self.version
    }

    pub fn options(&self) -> &TouchstoneOptions {
        &self.options
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn num_ports(&self) -> usize {
        self.num_ports
    }

    /// Frequencies in Hz, in file order.
    pub fn freqs(&self) -> Vec<f64> {
        self.freqs.clone()
    }

    pub fn s_params(&self) -> CxArray3 {
        self.s_params.clone()
    }

    /// Per-port reference resistance: the `[Reference]` keyword when given,
    /// the option line's `R` otherwise.
    pub fn reference(&self) -> Vec<f64> {
        match &self.reference {
            Some(r) => r.clone(),
            None => vec![self.options.resistance; self.num_ports],
        }
    }

    pub fn new(path: &Path) -> Result<Self, TouchstoneError> {
        let ports = ports_from_path(path)?;
        let content = fs::read_to_string(path)?;
        let mut touchstone = Touchstone::parse(&content, ports)?;
        touchstone.filename = path.display().to_string();
        Ok(touchstone)
    }

    /// Parses file contents. `ports` is the count implied by an `.sNp`
    /// extension; version 2 files may leave it out and declare
    /// `[Number of Ports]` instead.
    pub fn parse(content: &str, ports: Option<usize>) -> Result<Self, TouchstoneError> {
        let mut touchstone = Touchstone::default();
        let mut declared_ports: Option<usize> = None;
        let mut options_read = false;
        let mut in_information = false;
        let mut pending_reference = false;
        let mut values: Vec<f64> = vec![];

        for (index, raw_line) in lines(content).enumerate() {
            let line_number = index + 1;
            let line = match raw_line.find('!') {
                Some(idx) => {
                    touchstone
                        .comments
                        .push(raw_line[idx + 1..].trim().to_owned());
                    &raw_line[..idx]
                }
                None => raw_line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('[') {
                let (keyword, argument) = split_keyword(line, line_number)?;

                if in_information {
                    if keyword == "end information" {
                        in_information = false;
                    }
                    continue;
                }

                if pending_reference {
                    return Err(TouchstoneError::Keyword(format!(
                        "[Reference] ended before all {} ports were given",
                        declared_ports.unwrap_or_default()
                    )));
                }

                match keyword.as_str() {
                    "version" => {
                        touchstone.version = match argument {
                            "1.0" | "1.1" => TouchstoneVersion::One,
                            "2.0" | "2.1" => TouchstoneVersion::Two,
                            other => {
                                return Err(TouchstoneError::Unsupported(format!(
                                    "Touchstone version '{}'",
                                    other
                                )))
                            }
                        }
                    }
                    "number of ports" => {
                        let n = parse_count(argument, "[Number of Ports]")?;
                        if n == 0 {
                            return Err(TouchstoneError::Keyword(
                                "[Number of Ports] must be greater than zero".to_owned(),
                            ));
                        }
                        declared_ports = Some(n);
                    }
                    "two-port data order" => {
                        touchstone.two_port_order = match argument {
                            "12_21" => TwoPortOrder::S12First,
                            "21_12" => TwoPortOrder::S21First,
                            other => {
                                return Err(TouchstoneError::Keyword(format!(
                                    "[Two-Port Data Order] '{}'",
                                    other
                                )))
                            }
                        }
                    }
                    "number of frequencies" => {
                        touchstone.num_freq_points =
                            Some(parse_count(argument, "[Number of Frequencies]")?);
                    }
                    "number of noise frequencies" => {
                        tracing::debug!("ignoring noise frequency count on line {}", line_number);
                    }
                    "reference" => {
                        let expected = declared_ports.ok_or_else(|| {
                            TouchstoneError::Keyword(
                                "[Reference] appears before [Number of Ports]".to_owned(),
                            )
                        })?;
                        let reference = parse_numbers(argument, line_number)?;
                        pending_reference = reference.len() < expected;
                        touchstone.reference = Some(reference);
                    }
                    "matrix format" => {
                        if !argument.eq_ignore_ascii_case("full") {
                            return Err(TouchstoneError::Unsupported(format!(
                                "[Matrix Format] {}",
                                argument
                            )));
                        }
                    }
                    "mixed-mode order" => {
                        return Err(TouchstoneError::Unsupported(
                            "mixed-mode parameters".to_owned(),
                        ))
                    }
                    "begin information" => in_information = true,
                    "network data" => {}
                    "noise data" | "end" => break,
                    other => {
                        return Err(TouchstoneError::Keyword(format!(
                            "unknown keyword '[{}]' on line {}",
                            other, line_number
                        )))
                    }
                }
                continue;
            }

            if in_information {
                continue;
            }

            if pending_reference {
                let expected = declared_ports.unwrap_or_default();
                if let Some(reference) = touchstone.reference.as_mut() {
                    reference.extend(parse_numbers(line, line_number)?);
                    pending_reference = reference.len() < expected;
                }
                continue;
            }

            if line.starts_with('#') {
                if options_read {
                    tracing::warn!("ignoring repeated option line {}", line_number);
                } else {
                    touchstone.options = parse_options_line(line)?;
                    options_read = true;
                }
                continue;
            }

            if !options_read {
                tracing::debug!("data before option line, using default options");
                options_read = true;
            }
            values.extend(parse_numbers(line, line_number)?);
        }

        if pending_reference {
            return Err(TouchstoneError::Keyword(
                "[Reference] ended before all ports were given".to_owned(),
            ));
        }

        touchstone.num_ports = match (declared_ports, ports) {
            (Some(declared), Some(from_extension)) => {
                if declared != from_extension {
                    tracing::warn!(
                        "port count mismatch: extension suggests {}, file declares {}",
                        from_extension,
                        declared
                    );
                }
                declared
            }
            (Some(n), None) | (None, Some(n)) => n,
            (None, None) => {
                return Err(TouchstoneError::Keyword(
                    "port count is unknown: expected an .sNp extension or [Number of Ports]"
                        .to_owned(),
                ))
            }
        };

        if let Some(reference) = &touchstone.reference {
            if reference.len() != touchstone.num_ports {
                return Err(TouchstoneError::Keyword(format!(
                    "[Reference] lists {} values for {} ports",
                    reference.len(),
                    touchstone.num_ports
                )));
            }
        }

        if touchstone.options.param_type != ParamType::S {
            return Err(TouchstoneError::Unsupported(format!(
                "{:?} parameters, only S parameters can be read",
                touchstone.options.param_type
            )));
        }

        touchstone.fill_network_data(&values)?;
        Ok(touchstone)
    }

    fn fill_network_data(&mut self, values: &[f64]) -> Result<(), TouchstoneError> {
        let rank = self.num_ports;
        let per_point = rank
            .checked_mul(rank)
            .and_then(|n| n.checked_mul(2))
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| {
                TouchstoneError::Unsupported(format!("{}-port network is too large", rank))
            })?;

        if values.is_empty() {
            return Err(TouchstoneError::Shape("no frequency points found".to_owned()));
        }
        // also rejects a port count the data cannot fill, before allocating
        if values.len() % per_point != 0 {
            return Err(TouchstoneError::Shape(format!(
                "truncated network data: {} values do not fill whole {}-port frequency points of {} values",
                values.len(),
                rank,
                per_point
            )));
        }

        let npoints = values.len() / per_point;
        if let Some(declared) = self.num_freq_points {
            if declared != npoints {
                return Err(TouchstoneError::Shape(format!(
                    "[Number of Frequencies] is {} but {} points were read",
                    declared, npoints
                )));
            }
        }

        let transpose = rank == 2 && self.two_port_order == TwoPortOrder::S21First;
        let format = self.options.param_format;
        let mut s_params = Array3::zeros((npoints, rank, rank));
        self.freqs = Vec::with_capacity(npoints);

        for (f, point) in values.chunks_exact(per_point).enumerate() {
            self.freqs.push(self.options.unit * point[0]);
            for (k, pair) in point[1..].chunks_exact(2).enumerate() {
                let (row, col) = if transpose {
                    (k % rank, k / rank)
                } else {
                    (k / rank, k % rank)
                };
                s_params[[f, row, col]] = format.to_complex(pair[0], pair[1]);
            }
        }

        tracing::debug!("read {} frequency points for {} ports", npoints, rank);
        self.s_params = s_params;
        Ok(())
    }
}

/// Port count implied by the extension: `Some(n)` for `.sNp`, `None` for `.ts`.
pub fn ports_from_path(path: &Path) -> Result<Option<usize>, TouchstoneError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if extension == "ts" {
        return Ok(None);
    }
    let digits = extension
        .strip_prefix('s')
        .and_then(|e| e.strip_suffix('p'))
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()));
    if let Some(rank) = digits.and_then(|d| d.parse::<usize>().ok()) {
        if rank > 0 {
            return Ok(Some(rank));
        }
    }
    Err(TouchstoneError::Unsupported(format!(
        "'.{}' is not a Touchstone extension",
        extension
    )))
}

/// Lines split on `\r\n`, `\n` or a bare `\r`.
pub(crate) fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

fn preview(line: &str) -> String {
    line.chars().take(LINE_PREVIEW).collect()
}

fn parse_numbers(line: &str, line_number: usize) -> Result<Vec<f64>, TouchstoneError> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| TouchstoneError::Syntax {
                line: line_number,
                message: format!("invalid number '{}' in '{}'", token, preview(line)),
            })
        })
        .collect()
}

fn parse_count(argument: &str, keyword: &str) -> Result<usize, TouchstoneError> {
    argument
        .parse::<usize>()
        .map_err(|_| TouchstoneError::Keyword(format!("{} '{}'", keyword, argument)))
}

/// Splits `[Keyword] argument` into the lower-cased keyword and the trimmed argument.
fn split_keyword(line: &str, line_number: usize) -> Result<(String, &str), TouchstoneError> {
    match line.find(']') {
        Some(end) => Ok((
            line[1..end].trim().to_ascii_lowercase(),
            line[end + 1..].trim(),
        )),
        None => Err(TouchstoneError::Syntax {
            line: line_number,
            message: format!("unterminated keyword in '{}'", preview(line)),
        }),
    }
}

#[derive(Clone, Debug)]
enum OptionToken {
    Unit(FreqUnit),
    Type(ParamType),
    Format(ParamFormat),
    Resistance(f64),
}

fn parse_options_line(line: &str) -> Result<TouchstoneOptions, TouchstoneError> {
    let (rest, tokens) =
        options_line(line).map_err(|_| TouchstoneError::Options(preview(line)))?;
    if !rest.trim().is_empty() {
        return Err(TouchstoneError::Options(format!(
            "unrecognised option '{}'",
            preview(rest.trim())
        )));
    }

    let mut options = TouchstoneOptions::default();
    for token in tokens {
        match token {
            OptionToken::Unit(unit) => options.unit = unit,
            OptionToken::Type(param_type) => options.param_type = param_type,
            OptionToken::Format(format) => options.param_format = format,
            OptionToken::Resistance(r) => options.resistance = r,
        }
    }
    Ok(options)
}

fn options_line(input: &str) -> IResult<&str, Vec<OptionToken>> {
    preceded(
        pair(space0, char('#')),
        many0(preceded(space0, option_token)),
    )(input)
}

fn option_token(input: &str) -> IResult<&str, OptionToken> {
    terminated(
        alt((
            map(freq_unit, OptionToken::Unit),
            map(param_format, OptionToken::Format),
            map(resistance, OptionToken::Resistance),
            map(param_type, OptionToken::Type),
        )),
        peek(alt((space1, eof))),
    )(input)
}

fn freq_unit(input: &str) -> IResult<&str, FreqUnit> {
    alt((
        value(FreqUnit::GHz, tag_no_case("ghz")),
        value(FreqUnit::MHz, tag_no_case("mhz")),
        value(FreqUnit::KHz, tag_no_case("khz")),
        value(FreqUnit::THz, tag_no_case("thz")),
        value(FreqUnit::Hz, tag_no_case("hz")),
    ))(input)
}

fn param_format(input: &str) -> IResult<&str, ParamFormat> {
    alt((
        value(ParamFormat::DBAngle, tag_no_case("db")),
        value(ParamFormat::MagAngle, tag_no_case("ma")),
        value(ParamFormat::RealImag, tag_no_case("ri")),
    ))(input)
}

fn resistance(input: &str) -> IResult<&str, f64> {
    preceded(pair(tag_no_case("r"), space1), double)(input)
}

fn param_type(input: &str) -> IResult<&str, ParamType> {
    alt((
        value(ParamType::S, tag_no_case("s")),
        value(ParamType::Y, tag_no_case("y")),
        value(ParamType::Z, tag_no_case("z")),
        value(ParamType::G, tag_no_case("g")),
        value(ParamType::H, tag_no_case("h")),
    ))(input)
}

impl fmt::Debug for Touchstone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Touchstone:")?;
        writeln!(f, "\tFilename: {:?}", self.filename)?;
        writeln!(f, "\tVersion: {:?}", self.version)?;
        writeln!(f, "\tOptions: {:?}", self.options)?;
        writeln!(f, "\tNumber of Ports: {:?}", self.num_ports)?;
        writeln!(f, "\tNumber of Frequency Points: {:?}", self.num_freq_points)?;
        writeln!(f, "\tReference: {:?}", self.reference)?;
        writeln!(f, "\tTwo-Port Order: {:?}", self.two_port_order)?;
        writeln!(f, "\tFreqs: {:?}", self.freqs.len())?;
        writeln!(f, "\tS Parameters: {:?}", self.s_params.shape())?;
        write!(f, "\tComments: {:?}", self.comments)
    }
}
