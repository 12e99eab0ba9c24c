use std::collections::HashSet;
use tracing::debug;

use crate::core::layout::Layout;
use crate::core::record::{reverse_complement, Gap, TpfRecord};
use crate::core::types::{Orientation, TagSet};
use crate::curation::chunks::{ChunkKey, ChunkSet};

/// A chunk placed on a chromosome by one AGP entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// AGP chromosome the chunk was placed on
    pub chromosome: String,
    pub chunk: ChunkKey,
    pub orientation: Orientation,

    /// How many AGP entries on this chromosome referenced the chunk's
    /// scaffold up to and including this one
    pub occurrence: usize,

    /// Tags of the AGP entry that placed the chunk
    pub tags: TagSet,

    /// Total component bases of the chunk
    pub length: u64,
}

impl Placement {
    /// `chromosome%occurrence`-style key tying the chunk back to its AGP entry
    pub fn entry_key(&self) -> String {
        format!("{}%{}", self.chromosome, self.occurrence)
    }
}

/// The reassembled records of one AGP chromosome
#[derive(Debug, Clone)]
pub struct ChromosomeAssembly {
    /// AGP chromosome name
    pub source: String,

    /// Prefixed output name (`R1`, `R2`, ...)
    pub name: String,

    /// Components relabeled with `name`, joined by inserted gaps
    pub records: Vec<TpfRecord>,

    /// Indices into [`Reassembly::placements`]
    pub placements: Vec<usize>,
}

/// Chunks laid out in AGP order and orientation
#[derive(Debug, Clone, Default)]
pub struct Reassembly {
    pub chromosomes: Vec<ChromosomeAssembly>,
    pub placements: Vec<Placement>,

    /// Gaps inserted between adjacent chunks
    pub joins: usize,
}

impl Reassembly {
    /// Output name given to an AGP chromosome
    pub fn output_name(&self, source: &str) -> Option<&str> {
        self.chromosomes
            .iter()
            .find(|c| c.source == source)
            .map(|c| c.name.as_str())
    }

    /// Regions of every emitted component
    pub fn emitted_regions(&self) -> HashSet<String> {
        self.chromosomes
            .iter()
            .flat_map(|c| c.records.iter())
            .filter_map(TpfRecord::as_component)
            .map(|c| c.region())
            .collect()
    }

    /// All chromosome records, concatenated in output order
    pub fn records(&self) -> Vec<TpfRecord> {
        self.chromosomes
            .iter()
            .flat_map(|c| c.records.iter().cloned())
            .collect()
    }

    /// Placements of this AGP chromosome, in layout order
    pub fn placements_on<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Placement> {
        self.placements.iter().filter(move |p| p.chromosome == source)
    }
}

/// Settings for laying chunks out along chromosomes
#[derive(Debug, Clone)]
pub struct ReassemblyOptions {
    /// Fraction used (twice) to contract a chunk to its core before matching
    pub core_contraction: f64,
    /// Prefix for output chromosome names
    pub prefix: String,
    /// Gap inserted between adjacent chunks
    pub join_gap: Gap,
}

/// Walk every chromosome's kept AGP entries in order, appending each chunk of
/// the referenced scaffold whose contracted core lies inside the entry's
/// scaffold range. Reverse entries reverse-complement the chunk. Every chunk
/// after the first on a chromosome is preceded by a join gap.
///
/// Chromosomes receiving at least one chunk are named `prefix` + their
/// 1-based position among such chromosomes.
pub fn reassemble(layout: &Layout, chunks: &ChunkSet, options: &ReassemblyOptions) -> Reassembly {
    let mut reassembly = Reassembly::default();

    for (source, entries) in &layout.chromosomes {
        let mut records: Vec<TpfRecord> = Vec::new();
        let mut placed = Vec::new();
        let mut seen_scaffolds: Vec<&str> = Vec::new();

        for entry in entries {
            seen_scaffolds.push(entry.scaffold.as_str());
            let occurrence = seen_scaffolds
                .iter()
                .filter(|s| **s == entry.scaffold)
                .count();
            let tags = layout
                .tags
                .get(&entry.tag_key())
                .cloned()
                .unwrap_or_default();

            for chunk in chunks.for_scaffold(&entry.scaffold) {
                if !chunk.core_within(
                    entry.scaffold_start,
                    entry.scaffold_end,
                    options.core_contraction,
                ) {
                    continue;
                }

                if !records.is_empty() {
                    records.push(TpfRecord::Gap(options.join_gap.clone()));
                    reassembly.joins += 1;
                }

                let chunk_records = chunks.records(chunk);
                if entry.orientation.is_reverse() {
                    records.extend(reverse_complement(chunk_records));
                } else {
                    records.extend(chunk_records.iter().cloned());
                }

                placed.push(reassembly.placements.len());
                reassembly.placements.push(Placement {
                    chromosome: source.clone(),
                    chunk: chunk.key.clone(),
                    orientation: entry.orientation,
                    occurrence,
                    tags: tags.clone(),
                    length: chunk.length,
                });
            }
        }

        if placed.is_empty() {
            debug!("{source} received no chunks");
            continue;
        }

        let name = format!("{}{}", options.prefix, reassembly.chromosomes.len() + 1);
        for component in records.iter_mut().filter_map(TpfRecord::as_component_mut) {
            component.scaffold.clone_from(&name);
        }

        reassembly.chromosomes.push(ChromosomeAssembly {
            source: source.clone(),
            name,
            records,
            placements: placed,
        });
    }

    debug!(
        "Reassembled {} chromosomes from {} placements with {} joins",
        reassembly.chromosomes.len(),
        reassembly.placements.len(),
        reassembly.joins
    );
    reassembly
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::{TilingPath, DEFAULT_TEXEL_DIVISOR};
    use crate::curation::breaks::{agp_dividers, resolve_breaks, DEFAULT_NETSIZE};
    use crate::curation::chunks::{split_tiling_path, DEFAULT_CORE_CONTRACTION};
    use crate::parsing::agp::{parse_agp_text, FragmentFilter};
    use crate::parsing::tpf::parse_tpf_text;
    use crate::utils::validation::ErrorCollector;

    fn options() -> ReassemblyOptions {
        ReassemblyOptions {
            core_contraction: DEFAULT_CORE_CONTRACTION,
            prefix: "R".to_string(),
            join_gap: Gap::new("TYPE-2", 200),
        }
    }

    fn run(tpf: &str, agp: &str) -> (TilingPath, Layout) {
        let mut errors = ErrorCollector::new();
        let path = parse_tpf_text(tpf, DEFAULT_TEXEL_DIVISOR, &mut errors).unwrap();
        let layout = parse_agp_text(agp, &path, &FragmentFilter::default(), &mut errors).unwrap();
        (path, layout)
    }

    #[test]
    fn test_reassemble_reverses_and_joins() {
        let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS\n?\tscaffold_1:1001-2000\tscaffold_1\tPLUS\n";
        let agp = "Chr1\t1\t1000\t1\tW\tscaffold_1\t1\t1000\t+
Chr1\t1001\t1100\t2\tU\t100\tscaffold\tyes\tproximity_ligation
Chr1\t1101\t2100\t3\tW\tscaffold_1\t1001\t2000\t-
";
        let (path, layout) = run(tpf, agp);
        let resolution = resolve_breaks(&path, &layout, &agp_dividers(&layout), DEFAULT_NETSIZE);
        let chunks = split_tiling_path(&path, &resolution.breakpoints);
        let reassembly = reassemble(&layout, &chunks, &options());

        assert_eq!(reassembly.joins, 1);
        assert_eq!(reassembly.chromosomes.len(), 1);
        assert_eq!(reassembly.output_name("Chr1"), Some("R1"));

        let lines: Vec<String> = reassembly.records().iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "?\tscaffold_1:1-1000\tR1\tPLUS",
                "GAP\tTYPE-2\t200",
                "?\tscaffold_1:1001-2000\tR1\tMINUS",
            ]
        );

        assert_eq!(reassembly.placements[1].occurrence, 2);
        assert_eq!(reassembly.placements[1].entry_key(), "Chr1%2");
    }

    #[test]
    fn test_unplaced_chromosome_gets_no_name() {
        let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS\n?\tscaffold_2:1-1000\tscaffold_2\tPLUS\n";
        // Chr1's range misses the core of scaffold_1 entirely
        let agp = "Chr1\t1\t200\t1\tW\tscaffold_1\t1\t200\t+
Chr2\t1\t1000\t1\tW\tscaffold_2\t1\t1000\t+
";
        let (path, layout) = run(tpf, agp);
        let chunks = split_tiling_path(&path, &[]);
        let reassembly = reassemble(&layout, &chunks, &options());

        assert_eq!(reassembly.output_name("Chr1"), None);
        assert_eq!(reassembly.output_name("Chr2"), Some("R1"));
        assert!(reassembly.emitted_regions().contains("scaffold_2:1-1000"));
        assert!(!reassembly.emitted_regions().contains("scaffold_1:1-1000"));
    }
}
