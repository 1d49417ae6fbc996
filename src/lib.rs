#![warn(missing_docs)]
#![warn(unsafe_code)]
//! adfsdisc is a library crate for reading Acorn Disc Filing System
//! (ADFS) disc images.
//!
//! The primary entry point is [`disc::Disc::open`], which identifies
//! the image variant, assembles its sector buffer, decodes its
//! catalogue (old or new format), and exposes the resulting file tree
//! through [`disc::Disc`].
use log::error;

pub mod bytes;
pub mod catalogue;
pub mod config;
pub mod disc;
pub mod disc_record;
pub mod error;
pub mod extract;
pub mod format;
pub mod map;
pub mod node;
pub mod track;

pub mod diagnostics;

/// Initialize the module. This should be called before any parsing is
/// performed. Panics on failure or if there are any incompatibilities.
pub fn init() {
    // If we're on a system with a usize < 32 bits then fail. This
    // crate indexes the assembled sector buffer (up to 1.6 MB) with
    // usize throughout.
    if usize::BITS < 32 {
        error!(
            "Architecture usize {} is too small for this library",
            usize::BITS
        );
        panic!(
            "Architecture usize {} is too small for this library",
            usize::BITS
        );
    }
}
