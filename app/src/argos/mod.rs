//! Argos Translate as the model backend: package index, downloads and
//! installed packages.

mod backend;
mod index;
mod package;

pub use backend::ArgosBackend;
pub use index::{parse_index, IndexEntry};
pub use package::{extract_package, scan_installed};
