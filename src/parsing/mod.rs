//! Parsers for the two documents being reconciled.
//!
//! This module provides parsers for:
//!
//! - **TPF files**: Tiling paths, one timeline of components and gaps per scaffold
//! - **PretextView AGP files**: Curated chromosome layouts with optional tags
//!
//! ## Example
//!
//! ```rust
//! use pretext_tpf::parsing::tpf::parse_tpf_text;
//! use pretext_tpf::utils::validation::ErrorCollector;
//!
//! let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS\n\
//!            GAP\tTYPE-2\t200\n\
//!            ?\tscaffold_1:1201-2000\tscaffold_1\tPLUS\n";
//!
//! let mut errors = ErrorCollector::new();
//! let path = parse_tpf_text(tpf, 32768, &mut errors).unwrap();
//! assert_eq!(path.total_bases, 1800);
//! assert!(errors.is_empty());
//! ```
//!
//! ## AGP Columns
//!
//! | Column | Field | Used for |
//! |--------|-------|----------|
//! | 1 | object (chromosome) | grouping, output naming |
//! | 2-3 | object start/end | fragment-size filter |
//! | 5 | component type | `U`/`N` rows are gaps and skipped |
//! | 6 | scaffold | link to the TPF timeline |
//! | 7-8 | scaffold start/end | break coordinates |
//! | 9 | orientation | reversal |
//! | 10+ | tags | `HAPLOTIG`, `UNLOC`, `X`, `Y`, `Z`, `W` |

use thiserror::Error;

pub mod agp;
pub mod tpf;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Too many records: {0} exceeds maximum allowed (1000000)")]
    TooManyRecords(usize),
}

/// Parse a non-negative coordinate field, naming the line on failure
pub(crate) fn parse_coordinate(field: &str, line_num: usize) -> Result<u64, ParseError> {
    field.trim().parse().map_err(|_| {
        ParseError::InvalidFormat(format!("Invalid coordinate on line {line_num}: '{field}'"))
    })
}
