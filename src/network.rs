use std::path::Path;

use ndarray::prelude::*;
use ndarray::s;
use num::complex::Complex64;

use crate::frequency::Frequency;
use crate::touchstone::{Touchstone, TouchstoneError};
use crate::{CxArray2, CxArray3};

/// An N-port network sampled over frequency.
///
/// `s` is indexed `[frequency, output port, input port]` and `z0`
/// `[frequency, port]`. The constructor rejects any other shape, so every
/// `Network` in circulation has at least one point and one port.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    f: Frequency,
    s: CxArray3,
    z0: CxArray2,
    comments: Vec<String>,
}

impl Network {
    pub fn new(f: Frequency, s: CxArray3, z0: CxArray2) -> Result<Self, TouchstoneError> {
        let (nfreq, outputs, inputs) = s.dim();
        if nfreq == 0 {
            return Err(TouchstoneError::Shape(
                "network has no frequency points".to_owned(),
            ));
        }
        if outputs == 0 || outputs != inputs {
            return Err(TouchstoneError::Shape(format!(
                "S matrix must be square with at least one port, got {}x{}",
                outputs, inputs
            )));
        }
        if f.npoints() != nfreq {
            return Err(TouchstoneError::Shape(format!(
                "{} frequencies for {} S matrices",
                f.npoints(),
                nfreq
            )));
        }
        check_z0(&z0, nfreq, outputs)?;
        Ok(Network {
            f,
            s,
            z0,
            comments: vec![],
        })
    }

    pub fn from_snp(file: &Path) -> Result<Self, TouchstoneError> {
        let touchstone = Touchstone::new(file)?;
        tracing::debug!(
            "{}: Touchstone {:?}, {} ports",
            touchstone.filename(),
            touchstone.version(),
            touchstone.num_ports()
        );
        let freqs = touchstone.freqs();
        let reference = touchstone.reference();
        let z0 = Array2::from_shape_fn((freqs.len(), touchstone.num_ports()), |(_, port)| {
            Complex64::new(reference[port], 0.)
        });
        let network = Network::new(
            Frequency::from_hz(freqs, touchstone.options().unit),
            touchstone.s_params(),
            z0,
        )?;
        Ok(network.with_comments(touchstone.comments().to_vec()))
    }

    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    pub fn nports(&self) -> usize {
        self.s.dim().1
    }

    pub fn nfreq(&self) -> usize {
        self.s.dim().0
    }

    pub fn frequency(&self) -> &Frequency {
        &self.f
    }

    /// Frequency samples in Hz.
    pub fn f(&self) -> ArrayView1<f64> {
        self.f.f()
    }

    pub fn s(&self) -> ArrayView3<Complex64> {
        self.s.view()
    }

    pub fn z0(&self) -> ArrayView2<Complex64> {
        self.z0.view()
    }

    pub fn set_z0(&mut self, z0: CxArray2) -> Result<(), TouchstoneError> {
        check_z0(&z0, self.nfreq(), self.nports())?;
        self.z0 = z0;
        Ok(())
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// `S[output, input]` over all frequencies, 0-based.
    pub fn trace(&self, output: usize, input: usize) -> Option<ArrayView1<Complex64>> {
        let n = self.nports();
        if output < n && input < n {
            Some(self.s.slice(s![.., output, input]))
        } else {
            None
        }
    }
}

fn check_z0(z0: &CxArray2, nfreq: usize, nports: usize) -> Result<(), TouchstoneError> {
    if z0.dim() != (nfreq, nports) {
        return Err(TouchstoneError::Shape(format!(
            "reference impedance has shape {:?}, expected ({}, {})",
            z0.dim(),
            nfreq,
            nports
        )));
    }
    Ok(())
}

/// Turns a file into a [`Network`]. The loader only talks to this trait, so
/// another parser (or a test double) can stand in for the built-in one.
pub trait NetworkReader {
    fn read(&self, path: &Path) -> Result<Network, TouchstoneError>;
}

impl<F> NetworkReader for F
where
    F: Fn(&Path) -> Result<Network, TouchstoneError>,
{
    fn read(&self, path: &Path) -> Result<Network, TouchstoneError> {
        self(path)
    }
}

/// The built-in Touchstone parser.
#[derive(Copy, Clone, Debug, Default)]
pub struct TouchstoneReader;

impl NetworkReader for TouchstoneReader {
    fn read(&self, path: &Path) -> Result<Network, TouchstoneError> {
        Network::from_snp(path)
    }
}
