use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

use crate::core::layout::Layout;
use crate::core::record::total_length;
use crate::core::timeline::{TilingPath, Timeline};
use crate::curation::breaks::{BreakPoint, BreakResolution};
use crate::curation::chunks::ChunkSet;
use crate::curation::reassembly::Reassembly;
use crate::utils::format::InterventionBand;
use crate::utils::validation::{ErrorCollector, ErrorKind};

/// Layout entries and TPF chunks that failed to line up one-to-one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    /// Chromosome or scaffold name
    pub name: String,
    pub agp_count: usize,
    pub tpf_count: usize,
}

impl std::fmt::Display for CountMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:\tagp count:\t{}\ttpf count:\t{}",
            self.name, self.agp_count, self.tpf_count
        )
    }
}

/// Everything non-fatal a curator should look at after a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscrepancyReport {
    /// Dividers with no matching TPF component and no discard to explain them
    pub synthesized_breaks: Vec<BreakPoint>,

    /// Unmatched dividers explained by a discarded fragment
    pub explained_dividers: Vec<(String, u64)>,

    /// AGP lines dropped by the fragment-size filter
    pub discarded_entries: Vec<String>,

    /// Shrapnel regions dropped because they were already emitted
    pub duplicate_shrapnel: Vec<String>,

    pub count_mismatches: Vec<CountMismatch>,

    /// Input regions found in neither output
    pub missing_components: Vec<String>,

    /// Regions emitted more than once across both outputs
    pub duplicated_components: Vec<String>,
}

impl DiscrepancyReport {
    pub fn is_empty(&self) -> bool {
        self.synthesized_breaks.is_empty()
            && self.discarded_entries.is_empty()
            && self.duplicate_shrapnel.is_empty()
            && self.count_mismatches.is_empty()
            && self.missing_components.is_empty()
            && self.duplicated_components.is_empty()
    }
}

/// Start a report from the break resolution and the layout's discards
pub fn discrepancy_report(layout: &Layout, resolution: &BreakResolution) -> DiscrepancyReport {
    DiscrepancyReport {
        synthesized_breaks: resolution.synthesized().cloned().collect(),
        explained_dividers: resolution.explained.clone(),
        discarded_entries: layout.discarded.iter().map(ToString::to_string).collect(),
        ..DiscrepancyReport::default()
    }
}

/// Compare layout entries with chunks, per chromosome (entries vs chunks
/// placed) and per scaffold (entries vs chunks cut). Each mismatch is
/// recorded as a non-fatal [`ErrorKind::CountDiscrepancy`].
pub fn count_discrepancies(
    layout: &Layout,
    reassembly: &Reassembly,
    chunks: &ChunkSet,
    errors: &mut ErrorCollector,
) -> Vec<CountMismatch> {
    let mut mismatches = Vec::new();

    for (chromosome, entries) in &layout.chromosomes {
        let placed = reassembly.placements_on(chromosome).count();
        if placed != entries.len() {
            mismatches.push(CountMismatch {
                name: chromosome.clone(),
                agp_count: entries.len(),
                tpf_count: placed,
            });
        }
    }

    for (scaffold, entries) in layout.entries_by_scaffold() {
        let cut = chunks.for_scaffold(scaffold).len();
        if cut != entries.len() {
            mismatches.push(CountMismatch {
                name: scaffold.to_string(),
                agp_count: entries.len(),
                tpf_count: cut,
            });
        }
    }

    for mismatch in &mismatches {
        warn!("Possible missed break: {mismatch}");
        errors.push(ErrorKind::CountDiscrepancy, mismatch.to_string());
    }
    mismatches
}

/// Input regions missing from, and regions repeated across, the two outputs
pub fn audit_components(
    path: &TilingPath,
    main: &[Timeline],
    haplotigs: &[Timeline],
) -> (Vec<String>, Vec<String>) {
    let mut seen: IndexMap<String, usize> = IndexMap::new();
    for component in main.iter().chain(haplotigs).flat_map(Timeline::components) {
        *seen.entry(component.region()).or_default() += 1;
    }

    let missing: Vec<String> = path
        .components()
        .map(|c| c.region())
        .filter(|r| !seen.contains_key(r))
        .collect();
    let duplicated: Vec<String> = seen
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(r, _)| r)
        .collect();

    for region in &missing {
        warn!("Component missing from output: {region}");
    }
    for region in &duplicated {
        warn!("Component emitted more than once: {region}");
    }
    (missing, duplicated)
}

/// Summary numbers for a curation run
#[derive(Debug, Clone, Serialize)]
pub struct CurationStats {
    pub input_bases: u64,
    pub output_bases: u64,
    pub haplotig_bases: u64,
    pub texel: u64,

    /// Layout entries revisiting an already placed scaffold
    pub layout_breaks: usize,

    /// Breaks resolved against the TPF
    pub resolved_breaks: usize,

    pub joins: usize,
    pub haplotigs: usize,
    pub unlocs: usize,

    /// `X`, `ZW`, `XY`, ... if any sex chromosome was tagged
    pub sex_chromosomes: Option<String>,

    pub interventions_per_gb: f64,
    pub band: InterventionBand,
}

impl CurationStats {
    #[allow(clippy::cast_precision_loss, clippy::too_many_arguments)]
    pub fn new(
        path: &TilingPath,
        layout: &Layout,
        resolved_breaks: usize,
        joins: usize,
        main: &[Timeline],
        haplotigs: &[Timeline],
        unlocs: usize,
    ) -> Self {
        let layout_breaks = layout_breaks(layout);
        let interventions_per_gb = interventions_per_gb(layout_breaks + joins, path.total_bases);

        Self {
            input_bases: path.total_bases,
            output_bases: main.iter().map(|t| total_length(&t.records)).sum(),
            haplotig_bases: haplotigs.iter().map(|t| total_length(&t.records)).sum(),
            texel: path.texel,
            layout_breaks,
            resolved_breaks,
            joins,
            haplotigs: haplotigs.len(),
            unlocs,
            sex_chromosomes: sex_summary(layout),
            interventions_per_gb,
            band: InterventionBand::from_rate(interventions_per_gb),
        }
    }

    /// Whether both ways of counting breaks agree
    pub fn breaks_agree(&self) -> bool {
        self.layout_breaks == self.resolved_breaks
    }
}

/// Kept entries referencing a scaffold that an earlier entry already placed
pub fn layout_breaks(layout: &Layout) -> usize {
    let mut scaffolds = HashSet::new();
    layout
        .entries()
        .filter(|e| !scaffolds.insert(e.scaffold.as_str()))
        .count()
}

/// `(breaks + joins) / gigabases`, to one decimal place
#[allow(clippy::cast_precision_loss)]
pub fn interventions_per_gb(interventions: usize, total_bases: u64) -> f64 {
    if total_bases == 0 {
        return 0.0;
    }
    let rate = interventions as f64 / (total_bases as f64 / 1e9);
    (rate * 10.0).round() / 10.0
}

/// Short description of the sex chromosome system tagged in the layout
pub fn sex_summary(layout: &Layout) -> Option<String> {
    let letters: Vec<String> = layout
        .sex_chromosomes
        .keys()
        .map(ToString::to_string)
        .collect();
    match letters.as_slice() {
        [one] => Some(one.clone()),
        [_, _] if letters.iter().any(|l| l == "W") => Some("ZW".to_string()),
        [_, _] if letters.iter().any(|l| l == "Y") => Some("XY".to_string()),
        _ => None,
    }
}
