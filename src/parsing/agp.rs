use indexmap::IndexMap;
use tracing::debug;

use crate::core::layout::{Layout, LayoutEntry};
use crate::core::timeline::TilingPath;
use crate::core::types::{Orientation, SexLetter, TagSet};
use crate::parsing::{parse_coordinate, ParseError};
use crate::utils::validation::{check_record_limit, ErrorCollector, ErrorKind};

/// Fragments larger than this many texels are always trusted
pub const DEFAULT_LARGE_FRAGMENT_TEXELS: f64 = 10.0;

/// How many texels below a scaffold's smallest component a fragment may be
pub const DEFAULT_LOW_CUTOFF: f64 = 1.5;

/// Size filter separating genuine AGP fragments from snapping artefacts
#[derive(Debug, Clone, Copy)]
pub struct FragmentFilter {
    pub large_fragment_texels: f64,
    pub low_cutoff: f64,
}

impl Default for FragmentFilter {
    fn default() -> Self {
        Self {
            large_fragment_texels: DEFAULT_LARGE_FRAGMENT_TEXELS,
            low_cutoff: DEFAULT_LOW_CUTOFF,
        }
    }
}

impl FragmentFilter {
    /// Keep a fragment if it is larger than any plausible artefact, or if it is
    /// no more than `low_cutoff` texels smaller than the scaffold's smallest
    /// genuine component.
    #[allow(clippy::cast_precision_loss)]
    pub fn keeps(&self, fragment: u64, smallest_component: u64, texel: u64) -> bool {
        let fragment = fragment as f64;
        let texel = texel as f64;
        fragment > self.large_fragment_texels * texel
            || fragment > smallest_component as f64 - self.low_cutoff * texel
    }
}

/// Component type column values that denote gap rows
fn is_gap_kind(kind: &str) -> bool {
    matches!(kind, "U" | "N")
}

/// Parse PretextView AGP text into a [`Layout`].
///
/// Gap rows are skipped. Each component row is checked against the TPF:
/// scaffolds missing from the TPF are recorded as
/// [`ErrorKind::ScaffoldSyncMismatch`]. Rows surviving the [`FragmentFilter`]
/// become kept entries; the rest are recorded as discards by their low
/// scaffold coordinate. Tags are upper-cased, conflicting tags recorded, and
/// the sex-chromosome assignment validated once the whole file is read.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a row has too few fields or invalid
/// coordinates, and `ParseError::TooManyRecords` if the record limit is exceeded.
pub fn parse_agp_text(
    text: &str,
    tpf: &TilingPath,
    filter: &FragmentFilter,
    errors: &mut ErrorCollector,
) -> Result<Layout, ParseError> {
    let mut layout = Layout::default();
    let mut count = 0usize;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line_num = i + 1;

        if check_record_limit(count).is_some() {
            return Err(ParseError::TooManyRecords(count));
        }
        count += 1;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 5 fields"
            )));
        }
        if is_gap_kind(fields[4]) {
            continue;
        }
        if fields.len() < 9 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 9 fields"
            )));
        }

        let (tags, unknown) = TagSet::from_tokens(fields.iter().skip(9).copied());
        if !unknown.is_empty() {
            debug!("Ignoring unrecognised tags on line {line_num}: {unknown:?}");
        }

        let entry = LayoutEntry {
            chromosome: fields[0].to_string(),
            target_start: parse_coordinate(fields[1], line_num)?,
            target_end: parse_coordinate(fields[2], line_num)?,
            part: fields[3].to_string(),
            scaffold: fields[5].to_string(),
            scaffold_start: parse_coordinate(fields[6], line_num)?,
            scaffold_end: parse_coordinate(fields[7], line_num)?,
            orientation: Orientation::from_agp(fields[8]),
            tags,
            line: line_num,
        };

        let Some(timeline) = tpf.get(&entry.scaffold) else {
            errors.push(
                ErrorKind::ScaffoldSyncMismatch,
                format!(
                    "{} (AGP line {line_num}) is not in the TPF",
                    entry.scaffold
                ),
            );
            continue;
        };

        record_tags(&mut layout, &entry, errors);

        let smallest = timeline.min_component_span().unwrap_or(0);
        if filter.keeps(entry.fragment_size(), smallest, tpf.texel) {
            if !entry.tags.is_empty() {
                layout
                    .tags
                    .entry(entry.tag_key())
                    .or_insert_with(|| entry.tags.clone());
            }
            layout
                .chromosomes
                .entry(entry.chromosome.clone())
                .or_default()
                .push(entry);
        } else {
            debug!(
                "Discarding {}:{}-{} ({} bp) as a likely artefact",
                entry.scaffold,
                entry.scaffold_start,
                entry.scaffold_end,
                entry.fragment_size()
            );
            layout
                .discards
                .entry(entry.scaffold.clone())
                .or_default()
                .push(entry.scaffold_start);
            layout.discarded.push(entry);
        }
    }

    validate_sex_chromosomes(&layout, errors);

    debug!(
        "Parsed {} chromosomes, {} kept entries, {} discarded",
        layout.chromosomes.len(),
        layout.entry_count(),
        layout.discarded.len()
    );

    Ok(layout)
}

/// Track haplotig chromosomes and sex letters, and flag conflicting tags
fn record_tags(layout: &mut Layout, entry: &LayoutEntry, errors: &mut ErrorCollector) {
    if entry.tags.is_haplotig() && entry.tags.is_unloc() {
        errors.push(
            ErrorKind::HaplotigUnlocConflict,
            format!(
                "{} is both 'Haplotig' and 'Unloc' - needs to be one or the other (AGP line {})",
                entry.scaffold, entry.line
            ),
        );
    }

    if entry.tags.is_haplotig() && !layout.haplotig_chromosomes.contains(&entry.chromosome) {
        layout.haplotig_chromosomes.push(entry.chromosome.clone());
    }

    for letter in entry.tags.sex_letters() {
        let chromosomes = layout.sex_chromosomes.entry(letter).or_default();
        if !chromosomes.contains(&entry.chromosome) {
            chromosomes.push(entry.chromosome.clone());
        }
    }
}

/// Check the sex-chromosome tags across the whole layout
pub fn validate_sex_chromosomes(layout: &Layout, errors: &mut ErrorCollector) {
    let letters: Vec<SexLetter> = layout.sex_chromosomes.keys().copied().collect();
    let listed = letters
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    if letters.len() > 2 {
        errors.push(
            ErrorKind::TooManySexChromosomes,
            format!("Too many sex chromosomes - you have {listed}"),
        );
    } else if letters.len() == 2 {
        let has = |letter: SexLetter| letters.contains(&letter);
        let invalid = (has(SexLetter::Z) && has(SexLetter::X))
            || (has(SexLetter::W) && has(SexLetter::X))
            || (has(SexLetter::Z) && has(SexLetter::Y));

        if invalid {
            errors.push(
                ErrorKind::InvalidSexCombination,
                format!("Heterogametic sex but bad combination found {listed}"),
            );
        } else {
            for (letter, chromosomes) in &layout.sex_chromosomes {
                let Some(first) = chromosomes.first() else {
                    continue;
                };
                if layout.haplotig_chromosomes.contains(first) {
                    errors.push(
                        ErrorKind::HeterogameticHaplotigConflict,
                        format!("Haplotig painted into heterogametic sex chromosome {letter} ({first})"),
                    );
                }
            }
        }
    }

    for (letter, chromosomes) in &layout.sex_chromosomes {
        if chromosomes.len() > 1 {
            errors.push(
                ErrorKind::AmbiguousSexAssignment,
                format!(
                    "{letter} chromosome is referenced in {} AGP chromosomes: {}",
                    chromosomes.len(),
                    chromosomes.join(", ")
                ),
            );
        }
    }

    let mut letters_by_chromosome: IndexMap<&str, Vec<SexLetter>> = IndexMap::new();
    for (letter, chromosomes) in &layout.sex_chromosomes {
        for chromosome in chromosomes {
            letters_by_chromosome
                .entry(chromosome.as_str())
                .or_default()
                .push(*letter);
        }
    }
    for (chromosome, letters) in letters_by_chromosome {
        if letters.len() > 1 {
            errors.push(
                ErrorKind::AmbiguousSexAssignment,
                format!(
                    "{chromosome} is referenced as both {} and {} in AGP",
                    letters[0], letters[1]
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::DEFAULT_TEXEL_DIVISOR;
    use crate::parsing::tpf::parse_tpf_text;

    // 3,276,800 bp in total: one texel is 100 bp
    const TPF: &str = "?\tscaffold_1:1-2000000\tscaffold_1\tPLUS
GAP\tTYPE-2\t200
?\tscaffold_1:2000001-3000000\tscaffold_1\tPLUS
?\tscaffold_2:1-276800\tscaffold_2\tPLUS
";

    fn tiling_path() -> TilingPath {
        let mut errors = ErrorCollector::new();
        let path = parse_tpf_text(TPF, DEFAULT_TEXEL_DIVISOR, &mut errors).unwrap();
        assert_eq!(path.texel, 100);
        path
    }

    fn parse(agp: &str) -> (Layout, ErrorCollector) {
        let path = tiling_path();
        let mut errors = ErrorCollector::new();
        let layout = parse_agp_text(agp, &path, &FragmentFilter::default(), &mut errors).unwrap();
        (layout, errors)
    }

    #[test]
    fn test_fragment_filter() {
        let filter = FragmentFilter::default();
        // Larger than 10 texels: always kept
        assert!(filter.keeps(1001, 5_000_000, 100));
        // Small, but within 1.5 texels of the smallest component
        assert!(filter.keeps(900, 1000, 100));
        // Small and well below the smallest component
        assert!(!filter.keeps(500, 1000, 100));
        // Exactly on the boundary is not kept
        assert!(!filter.keeps(850, 1000, 100));
    }

    #[test]
    fn test_parse_agp_text() {
        let agp = "##agp-version 2.1
# DESCRIPTION: Generated by PretextView
Scaffold_1\t1\t2000000\t1\tW\tscaffold_1\t1\t2000000\t+
Scaffold_1\t2000001\t2000200\t2\tU\t200\tscaffold\tyes\tproximity_ligation
Scaffold_1\t2000201\t2276999\t3\tW\tscaffold_2\t1\t276800\t-\tUnloc
Scaffold_2\t1\t1000000\t1\tW\tscaffold_1\t2000001\t3000000\t+
";
        let (layout, errors) = parse(agp);

        assert!(errors.is_empty());
        assert_eq!(layout.chromosomes.len(), 2);
        assert_eq!(layout.chromosomes["Scaffold_1"].len(), 2);

        let unloc = &layout.chromosomes["Scaffold_1"][1];
        assert_eq!(unloc.orientation, Orientation::Minus);
        assert!(unloc.tags.is_unloc());
        assert!(layout
            .tags
            .contains_key(&("scaffold_2".to_string(), 1, 276_800)));

        let by_scaffold = layout.entries_by_scaffold();
        assert_eq!(by_scaffold["scaffold_1"].len(), 2);
    }

    #[test]
    fn test_small_fragments_discarded() {
        let agp = "Scaffold_1\t1\t2000000\t1\tW\tscaffold_1\t1\t2000000\t+
Scaffold_1\t2000001\t2000500\t2\tW\tscaffold_1\t2000001\t2000500\t+
Scaffold_1\t2000501\t3000000\t3\tW\tscaffold_1\t2000501\t3000000\t+
";
        let (layout, _) = parse(agp);
        assert_eq!(layout.chromosomes["Scaffold_1"].len(), 2);
        assert_eq!(layout.discarded.len(), 1);
        assert_eq!(layout.discards["scaffold_1"], vec![2_000_001]);
        assert!(layout.explains_divider("scaffold_1", 2_000_000));
        assert!(!layout.explains_divider("scaffold_1", 2_000_001));
    }

    #[test]
    fn test_missing_scaffold_is_sync_mismatch() {
        let agp = "Scaffold_1\t1\t2000000\t1\tW\tscaffold_9\t1\t2000000\t+\n";
        let (_, errors) = parse(agp);
        assert!(errors.contains(ErrorKind::ScaffoldSyncMismatch));
    }

    #[test]
    fn test_haplotig_unloc_conflict() {
        let agp = "Scaffold_1\t1\t276800\t1\tW\tscaffold_2\t1\t276800\t+\tHaplotig\tUnloc\n";
        let (_, errors) = parse(agp);
        assert!(errors.contains(ErrorKind::HaplotigUnlocConflict));
        assert!(errors.has_fatal());
    }

    #[test]
    fn test_too_many_sex_chromosomes() {
        let agp = "Scaffold_1\t1\t2000000\t1\tW\tscaffold_1\t1\t2000000\t+\tX
Scaffold_2\t1\t1000000\t1\tW\tscaffold_1\t2000001\t3000000\t+\tY
Scaffold_3\t1\t276800\t1\tW\tscaffold_2\t1\t276800\t+\tZ
";
        let (_, errors) = parse(agp);
        assert!(errors.contains(ErrorKind::TooManySexChromosomes));
    }

    #[test]
    fn test_invalid_sex_combination() {
        let agp = "Scaffold_1\t1\t2000000\t1\tW\tscaffold_1\t1\t2000000\t+\tZ
Scaffold_2\t1\t1000000\t1\tW\tscaffold_1\t2000001\t3000000\t+\tX
";
        let (_, errors) = parse(agp);
        assert!(errors.contains(ErrorKind::InvalidSexCombination));
    }

    #[test]
    fn test_valid_pair_with_haplotig_conflict() {
        let agp = "Scaffold_1\t1\t2000000\t1\tW\tscaffold_1\t1\t2000000\t+\tZ
Scaffold_1\t2000001\t2276800\t2\tW\tscaffold_2\t1\t276800\t+\tHaplotig
Scaffold_2\t1\t1000000\t1\tW\tscaffold_1\t2000001\t3000000\t+\tW
";
        let (layout, errors) = parse(agp);
        assert!(!errors.contains(ErrorKind::InvalidSexCombination));
        assert!(errors.contains(ErrorKind::HeterogameticHaplotigConflict));
        assert_eq!(layout.sex_of("Scaffold_2"), Some(SexLetter::W));
    }

    #[test]
    fn test_sex_letter_on_two_chromosomes() {
        let agp = "Scaffold_1\t1\t2000000\t1\tW\tscaffold_1\t1\t2000000\t+\tX
Scaffold_2\t1\t1000000\t1\tW\tscaffold_1\t2000001\t3000000\t+\tX
";
        let (layout, errors) = parse(agp);
        assert_eq!(layout.sex_chromosomes[&SexLetter::X].len(), 2);
        let record = errors
            .records()
            .iter()
            .find(|r| r.kind == ErrorKind::AmbiguousSexAssignment)
            .unwrap();
        assert!(record.messages[0].contains("referenced in 2 AGP chromosomes"));
    }

    #[test]
    fn test_chromosome_with_two_letters() {
        let agp = "Scaffold_1\t1\t2000000\t1\tW\tscaffold_1\t1\t2000000\t+\tX
Scaffold_1\t2000001\t3000000\t2\tW\tscaffold_1\t2000001\t3000000\t+\tY
";
        let (_, errors) = parse(agp);
        assert!(errors.contains(ErrorKind::AmbiguousSexAssignment));
    }
}
