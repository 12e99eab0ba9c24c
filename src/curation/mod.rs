//! Reconciliation of a TPF with a curated PretextView AGP.
//!
//! The engine runs as a fixed sequence of stages, each consuming the whole
//! output of the one before:
//!
//! 1. **Parse**: TPF timelines ([`crate::parsing::tpf`]) and AGP layout
//!    ([`crate::parsing::agp`]), with the fragment-size filter applied
//! 2. **Resolve breaks**: AGP dividers matched to TPF component ends within
//!    `netsize` texels ([`breaks`])
//! 3. **Split**: each timeline cut into chunks at the resolved breaks ([`chunks`])
//! 4. **Reassemble**: chunks laid out in AGP order and orientation, joined by
//!    gaps ([`reassembly`]), then unreferenced TPF components reinstated
//!    ([`shrapnel`])
//! 5. **Segregate**: haplotigs pulled out, unlocs and sex chromosomes
//!    renamed ([`segregation`])
//! 6. **Report**: count checks, conservation audit and statistics ([`report`])
//!
//! Problems are collected in an [`ErrorCollector`] and checked at three
//! gates: after the TPF is parsed (coordinate typos), after the AGP is parsed
//! (scaffolds missing from the TPF) and once at the end for everything else.
//! A run that trips a gate returns [`CurationError::Fatal`] and produces no
//! output.
//!
//! ## Example
//!
//! ```rust
//! use pretext_tpf::curation::{reconcile, CurationConfig};
//!
//! let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS\n\
//!            ?\tscaffold_1:1001-2000\tscaffold_1\tPLUS\n";
//! let agp = "Chr1\t1\t1000\t1\tW\tscaffold_1\t1\t1000\t+\n\
//!            Chr1\t1001\t1200\t2\tU\t200\tscaffold\tyes\tproximity_ligation\n\
//!            Chr1\t1201\t2200\t3\tW\tscaffold_1\t1001\t2000\t-\n";
//!
//! let curation = reconcile(tpf, agp, &CurationConfig::default()).unwrap();
//! assert_eq!(
//!     curation.main_tpf(),
//!     "?\tscaffold_1:1-1000\tR1\tPLUS\n\
//!      GAP\tTYPE-2\t200\n\
//!      ?\tscaffold_1:1001-2000\tR1\tMINUS\n"
//! );
//! assert_eq!(curation.stats.joins, 1);
//! ```

pub mod breaks;
pub mod chunks;
pub mod reassembly;
pub mod report;
pub mod segregation;
pub mod shrapnel;

use indexmap::IndexMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::record::{Gap, TpfRecord};
use crate::core::timeline::{Timeline, DEFAULT_TEXEL_DIVISOR};
use crate::core::types::SexLetter;
use crate::parsing::agp::{parse_agp_text, FragmentFilter};
use crate::parsing::tpf::parse_tpf_text;
use crate::parsing::ParseError;
use crate::utils::validation::{ErrorCollector, ErrorKind, ErrorRecord};

use breaks::{agp_dividers, dividers_report, resolve_breaks, BreakPoint, DEFAULT_NETSIZE};
use chunks::{split_tiling_path, DEFAULT_CORE_CONTRACTION};
use reassembly::{reassemble, ReassemblyOptions};
use report::{audit_components, count_discrepancies, discrepancy_report, CurationStats, DiscrepancyReport};
use segregation::{segregate, NamedChunk};
use shrapnel::reinstate_shrapnel;

/// Prefix for reassembled chromosome names (`R1`, `R2`, ...)
pub const DEFAULT_PREFIX: &str = "R";

/// Tunable constants of the reconciliation
#[derive(Debug, Clone)]
pub struct CurationConfig {
    /// Number of texels across the PretextView map
    pub texel_divisor: u64,
    /// Size filter for AGP fragments
    pub filter: FragmentFilter,
    /// Break matching tolerance, in texels
    pub netsize: f64,
    /// Contraction applied (twice) to a chunk before matching it to an AGP range
    pub core_contraction: f64,
    /// Prefix for reassembled chromosome names
    pub prefix: String,
    /// Gap inserted at every join
    pub join_gap: Gap,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            texel_divisor: DEFAULT_TEXEL_DIVISOR,
            filter: FragmentFilter::default(),
            netsize: DEFAULT_NETSIZE,
            core_contraction: DEFAULT_CORE_CONTRACTION,
            prefix: DEFAULT_PREFIX.to_string(),
            join_gap: Gap::new("TYPE-2", 200),
        }
    }
}

#[derive(Error, Debug)]
pub enum CurationError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{} fatal problem(s) found; no output written", .0.len())]
    Fatal(Vec<ErrorRecord>),
}

/// The outcome of a successful reconciliation
#[derive(Debug, Clone)]
pub struct Curation {
    /// Final scaffolds of the main TPF
    pub main: Vec<Timeline>,
    /// Haplotig scaffolds, empty if nothing was tagged `HAPLOTIG`
    pub haplotigs: Vec<Timeline>,
    /// Resolved breaks, including synthesized ones
    pub breakpoints: Vec<BreakPoint>,
    pub report: DiscrepancyReport,
    pub stats: CurationStats,
    /// Non-fatal error records
    pub warnings: Vec<ErrorRecord>,
    pub sex_components: IndexMap<String, SexLetter>,
    pub named_haplotigs: Vec<NamedChunk>,
    pub named_unlocs: Vec<NamedChunk>,
}

impl Curation {
    pub fn main_tpf(&self) -> String {
        render(&self.main)
    }

    pub fn haplotig_tpf(&self) -> String {
        render(&self.haplotigs)
    }

    pub fn dividers_report(&self) -> String {
        dividers_report(&self.breakpoints)
    }
}

fn render(timelines: &[Timeline]) -> String {
    timelines
        .iter()
        .flat_map(|t| t.records.iter())
        .map(|r: &TpfRecord| format!("{r}\n"))
        .collect()
}

/// Fail with every fatal record collected so far
fn gate(errors: &ErrorCollector) -> Result<(), CurationError> {
    if errors.has_fatal() {
        Err(CurationError::Fatal(errors.fatal()))
    } else {
        Ok(())
    }
}

/// Read both files and [`reconcile`] them
///
/// # Errors
///
/// Returns `CurationError::Parse` if either file cannot be read or parsed,
/// and `CurationError::Fatal` if validation fails.
pub fn reconcile_files(
    tpf: &Path,
    agp: &Path,
    config: &CurationConfig,
) -> Result<Curation, CurationError> {
    let tpf_text = std::fs::read_to_string(tpf).map_err(ParseError::from)?;
    let agp_text = std::fs::read_to_string(agp).map_err(ParseError::from)?;
    reconcile(&tpf_text, &agp_text, config)
}

/// Fit TPF text to a PretextView AGP.
///
/// # Errors
///
/// Returns `CurationError::Parse` on malformed input, and
/// `CurationError::Fatal` with every fatal record when any validation gate
/// fails.
pub fn reconcile(
    tpf_text: &str,
    agp_text: &str,
    config: &CurationConfig,
) -> Result<Curation, CurationError> {
    let mut errors = ErrorCollector::new();

    let path = parse_tpf_text(tpf_text, config.texel_divisor, &mut errors)?;
    gate(&errors)?;
    info!(
        "TPF: {} scaffolds, {} bp, texel {} bp",
        path.len(),
        path.total_bases,
        path.texel
    );

    let layout = parse_agp_text(agp_text, &path, &config.filter, &mut errors)?;
    if errors.contains(ErrorKind::ScaffoldSyncMismatch) {
        gate(&errors)?;
    }
    info!(
        "AGP: {} chromosomes, {} entries kept, {} discarded",
        layout.chromosomes.len(),
        layout.entry_count(),
        layout.discarded.len()
    );

    let dividers = agp_dividers(&layout);
    let resolution = resolve_breaks(&path, &layout, &dividers, config.netsize);
    let chunks = split_tiling_path(&path, &resolution.breakpoints);
    debug!("Split TPF into {} chunks", chunks.len());

    let options = ReassemblyOptions {
        core_contraction: config.core_contraction,
        prefix: config.prefix.clone(),
        join_gap: config.join_gap.clone(),
    };
    let reassembly = reassemble(&layout, &chunks, &options);
    let shrapnel = reinstate_shrapnel(&path, &reassembly.emitted_regions());

    let mut main = reassembly.records();
    main.extend(shrapnel.records().cloned());

    let segregation = segregate(main, &reassembly, &chunks, &layout, &mut errors);

    let mut report = discrepancy_report(&layout, &resolution);
    report.duplicate_shrapnel.clone_from(&shrapnel.duplicates);
    report.count_mismatches = count_discrepancies(&layout, &reassembly, &chunks, &mut errors);
    let (missing, duplicated) = audit_components(&path, &segregation.main, &segregation.haplotigs);
    report.missing_components = missing;
    report.duplicated_components = duplicated;

    gate(&errors)?;

    let stats = CurationStats::new(
        &path,
        &layout,
        resolution.breakpoints.len(),
        reassembly.joins,
        &segregation.main,
        &segregation.haplotigs,
        segregation.named_unlocs.len(),
    );

    Ok(Curation {
        main: segregation.main,
        haplotigs: segregation.haplotigs,
        breakpoints: resolution.breakpoints,
        report,
        stats,
        warnings: errors.warnings(),
        sex_components: segregation.sex_components,
        named_haplotigs: segregation.named_haplotigs,
        named_unlocs: segregation.named_unlocs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TPF: &str = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS
?\tscaffold_1:1001-2000\tscaffold_1\tPLUS
";

    #[test]
    fn test_typo_stops_at_first_gate() {
        let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS\n?\tscaffold_1:900-2000\tscaffold_1\tPLUS\n";
        let agp = "Chr1\t1\t2000\t1\tW\tscaffold_1\t1\t2000\t+\n";
        match reconcile(tpf, agp, &CurationConfig::default()) {
            Err(CurationError::Fatal(records)) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].kind, ErrorKind::CoordinateTypo);
            }
            other => panic!("expected a fatal typo, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_scaffold_stops_at_second_gate() {
        let agp = "Chr1\t1\t2000\t1\tW\tscaffold_7\t1\t2000\t+\n";
        match reconcile(TPF, agp, &CurationConfig::default()) {
            Err(CurationError::Fatal(records)) => {
                assert_eq!(records[0].kind, ErrorKind::ScaffoldSyncMismatch);
            }
            other => panic!("expected a sync mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_prefix() {
        let agp = "Chr1\t1\t2000\t1\tW\tscaffold_1\t1\t2000\t+\n";
        let config = CurationConfig {
            prefix: "SUPER_".to_string(),
            ..CurationConfig::default()
        };
        let curation = reconcile(TPF, agp, &config).unwrap();
        assert_eq!(curation.main.len(), 1);
        assert_eq!(curation.main[0].scaffold, "SUPER_1");
        assert!(curation.breakpoints.is_empty());
        assert!(curation.haplotig_tpf().is_empty());
    }
}
