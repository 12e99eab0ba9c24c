//! Command-line interface for pretext-tpf.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **curate**: Fit a TPF to a PretextView AGP and write the corrected TPF
//! - **check**: Dry run; report discrepancies and validation errors only
//!
//! ## Usage
//!
//! ```text
//! # Write rapid_prtxt.tpf, haps_rapid_prtxt.tpf and dividers.tsv
//! pretext-tpf curate assembly.tpf curated.pretext.agp
//!
//! # Choose output names and validate both TPFs with an external checker
//! pretext-tpf curate assembly.tpf curated.agp -o fixed.tpf --sanity-cmd "perl check_tpf.pl"
//!
//! # JSON statistics for scripting
//! pretext-tpf curate assembly.tpf curated.agp --format json
//!
//! # Look before you leap
//! pretext-tpf check assembly.tpf curated.agp
//! ```

use clap::{Parser, Subcommand};

use crate::core::record::Gap;
use crate::core::timeline::DEFAULT_TEXEL_DIVISOR;
use crate::curation::breaks::DEFAULT_NETSIZE;
use crate::curation::chunks::DEFAULT_CORE_CONTRACTION;
use crate::curation::{CurationConfig, DEFAULT_PREFIX};
use crate::parsing::agp::{FragmentFilter, DEFAULT_LARGE_FRAGMENT_TEXELS, DEFAULT_LOW_CUTOFF};
use crate::utils::validation::ErrorRecord;

pub mod check;
pub mod curate;
pub mod sanity;

#[derive(Parser)]
#[command(name = "pretext-tpf")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Fit an assembly TPF to a PretextView-curated AGP")]
#[command(
    long_about = "pretext-tpf takes the TPF of an assembly and the AGP saved from a PretextView curation session, and rebuilds the TPF to match the curated layout.\n\nIt:\n- Snaps approximate AGP breaks to exact TPF component boundaries\n- Reorders and reorients the resulting pieces into chromosomes\n- Separates haplotigs, names unlocs and sex chromosomes from AGP tags\n- Refuses to write anything when the curation has tagging or coordinate errors"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild a TPF to match a PretextView AGP
    Curate(curate::CurateArgs),

    /// Report what curate would do without writing anything
    Check(check::CheckArgs),
}

/// Tunables shared by every command that runs the reconciliation
#[derive(clap::Args, Debug, Clone)]
pub struct TuningArgs {
    /// Number of texels across the PretextView map
    #[arg(long, default_value_t = DEFAULT_TEXEL_DIVISOR)]
    pub texel_divisor: u64,

    /// Break matching tolerance, in texels
    #[arg(long, default_value_t = DEFAULT_NETSIZE)]
    pub netsize: f64,

    /// AGP fragments larger than this many texels are always kept
    #[arg(long, default_value_t = DEFAULT_LARGE_FRAGMENT_TEXELS)]
    pub large_fragment_texels: f64,

    /// Texels below a scaffold's smallest component a fragment may be and still be kept
    #[arg(long, default_value_t = DEFAULT_LOW_CUTOFF)]
    pub low_cutoff: f64,

    /// Fraction used to contract TPF chunks before matching them to AGP ranges
    #[arg(long, default_value_t = DEFAULT_CORE_CONTRACTION)]
    pub core_contraction: f64,

    /// Prefix for output chromosome names
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,
}

impl TuningArgs {
    pub fn config(&self) -> CurationConfig {
        CurationConfig {
            texel_divisor: self.texel_divisor,
            filter: FragmentFilter {
                large_fragment_texels: self.large_fragment_texels,
                low_cutoff: self.low_cutoff,
            },
            netsize: self.netsize,
            core_contraction: self.core_contraction,
            prefix: self.prefix.clone(),
            join_gap: Gap::new("TYPE-2", 200),
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Print fatal records the way curators are used to reading them
pub(crate) fn print_fatal(records: &[ErrorRecord]) {
    eprintln!("\n{}", "=".repeat(60));
    eprintln!("ERRORS");
    for record in records {
        eprintln!("\n{record}");
    }
    eprintln!("{}", "=".repeat(60));
}
