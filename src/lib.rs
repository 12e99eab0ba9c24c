//! # pretext-tpf
//!
//! A library for fitting an assembly TPF to a PretextView-curated AGP.
//!
//! During manual curation, scaffolds are broken, joined, reordered and
//! flipped on a Hi-C contact map. PretextView records the result as an AGP
//! whose coordinates are only accurate to one map texel. The assembly itself
//! is described by a TPF (tiling path file) with exact component coordinates.
//!
//! `pretext-tpf` works out which TPF coordinates each AGP break really
//! meant, cuts the TPF there and lays the pieces out as the AGP describes,
//! producing a corrected TPF ready for the next stage of the pipeline.
//!
//! ## Features
//!
//! - **Tolerant break matching**: AGP breaks snap to the nearest TPF component
//!   end within a few texels
//! - **Artefact filtering**: tiny AGP fragments left by snapping are discarded
//!   and accounted for
//! - **Shrapnel recovery**: TPF components the AGP never mentions are kept
//! - **Haplotig and unloc handling**: tagged fragments are named by size and
//!   split into their own outputs
//! - **Sex chromosome naming**: `X`, `Y`, `Z` and `W` tags name chromosomes
//!   and their unlocs
//! - **Validation**: tagging mistakes and coordinate typos stop the run before
//!   anything is written
//!
//! ## Example
//!
//! ```rust
//! use pretext_tpf::{reconcile, CurationConfig};
//!
//! let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS\n\
//!            ?\tscaffold_2:1-1000\tscaffold_2\tPLUS\n";
//! let agp = "Scaffold_1\t1\t1000\t1\tW\tscaffold_2\t1\t1000\t+\n\
//!            Scaffold_2\t1\t1000\t1\tW\tscaffold_1\t1\t1000\t+\n";
//!
//! let curation = reconcile(tpf, agp, &CurationConfig::default()).unwrap();
//! for scaffold in &curation.main {
//!     println!("{}: {} bp", scaffold.scaffold, scaffold.total_length());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: TPF records, timelines and AGP layout types
//! - [`parsing`]: Parsers for TPF and PretextView AGP text
//! - [`curation`]: Break resolution, reassembly and segregation
//! - [`cli`]: Command-line interface implementation
//! - [`utils`]: Validation errors, limits and formatting

pub mod cli;
pub mod core;
pub mod curation;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::layout::{Layout, LayoutEntry};
pub use core::record::{Component, Gap, TpfRecord};
pub use core::timeline::{TilingPath, Timeline};
pub use core::types::*;
pub use curation::{reconcile, reconcile_files, Curation, CurationConfig, CurationError};
pub use utils::validation::{ErrorCollector, ErrorKind, ErrorRecord};
