//! Loading and summarising Touchstone (.sNp) network files.
//!
//! Two loaders are provided. The strict loader in [`loader`] validates the
//! path, parses the whole network with [`touchstone`] and maps every failure
//! onto [`LoadError`]. The lightweight loader in [`scan`] only infers the port
//! count from the extension and reads the frequency column.

pub mod error;
pub mod frequency;
pub mod impedance;
pub mod loader;
pub mod network;
pub mod scan;
pub mod summary;
pub mod touchstone;
pub mod trace;

use ndarray::prelude::{Array2, Array3};
use num::complex::Complex64;

pub use crate::error::{LoadError, LoadErrorKind};
pub use crate::frequency::{FreqUnit, Frequency};
pub use crate::impedance::{Nested, ReferenceImpedance};
pub use crate::loader::{extract_metadata, load_network, TouchstoneLoader, TouchstoneMetadata};
pub use crate::network::{Network, NetworkReader, TouchstoneReader};
pub use crate::scan::{infer_ports_from_extension, scan_network};
pub use crate::summary::TouchstoneSummary;
pub use crate::touchstone::{Touchstone, TouchstoneError};
pub use crate::trace::{DisplayMode, PlotData, Trace, TraceLabel};

type CxArray2 = Array2<Complex64>;
type CxArray3 = Array3<Complex64>;
