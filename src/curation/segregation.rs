use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::core::layout::Layout;
use crate::core::record::{tidy_gaps, TpfRecord};
use crate::core::timeline::Timeline;
use crate::core::types::{SexLetter, Tag};
use crate::curation::chunks::{ChunkKey, ChunkSet};
use crate::curation::reassembly::Reassembly;
use crate::utils::validation::{ErrorCollector, ErrorKind};

/// A chunk given a new scaffold name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedChunk {
    pub chunk: ChunkKey,
    pub name: String,
    pub length: u64,
}

/// Main and haplotig outputs after pulling tagged chunks apart
#[derive(Debug, Clone, Default)]
pub struct Segregation {
    /// Final scaffolds of the main output, in first-seen order
    pub main: Vec<Timeline>,

    /// Haplotig scaffolds `H_1`, `H_2`, ... in rank order
    pub haplotigs: Vec<Timeline>,

    pub named_haplotigs: Vec<NamedChunk>,
    pub named_unlocs: Vec<NamedChunk>,

    /// Component region -> sex letter, for components placed on a sex chromosome
    pub sex_components: IndexMap<String, SexLetter>,
}

/// Name chunks `<prefix>1`, `<prefix>2`, ... by descending length.
/// Equal lengths keep their input order and still get distinct ranks.
fn rank_by_length(mut chunks: Vec<(ChunkKey, u64)>, prefix: &str) -> Vec<NamedChunk> {
    chunks.sort_by(|a, b| b.1.cmp(&a.1));
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, (chunk, length))| NamedChunk {
            chunk,
            name: format!("{prefix}{}", i + 1),
            length,
        })
        .collect()
}

/// `H_1` for the largest haplotig, `H_2` for the next, ...
pub fn name_haplotigs(chunks: Vec<(ChunkKey, u64)>) -> Vec<NamedChunk> {
    rank_by_length(chunks, "H_")
}

/// `<base>_unloc_1` for the largest unloc sharing `base`, and so on
pub fn name_unlocs(base: &str, chunks: Vec<(ChunkKey, u64)>) -> Vec<NamedChunk> {
    rank_by_length(chunks, &format!("{base}_unloc_"))
}

/// Distinct chunks placed with `tag`, with their lengths, in placement order
fn tagged_chunks(reassembly: &Reassembly, tag: Tag) -> Vec<(ChunkKey, u64)> {
    let mut seen = HashSet::new();
    reassembly
        .placements
        .iter()
        .filter(|p| p.tags.contains(tag) && seen.insert(p.chunk.clone()))
        .map(|p| (p.chunk.clone(), p.length))
        .collect()
}

fn component_regions<'a>(chunks: &ChunkSet<'a>, key: &ChunkKey) -> impl Iterator<Item = String> + 'a {
    chunks
        .records_for(key)
        .iter()
        .filter_map(TpfRecord::as_component)
        .map(|c| c.region())
}

/// Output name of each sex chromosome: the first AGP chromosome carrying each letter
pub fn sex_labels(layout: &Layout, reassembly: &Reassembly) -> HashMap<String, SexLetter> {
    layout
        .sex_chromosomes
        .iter()
        .filter_map(|(letter, chromosomes)| {
            let first = chromosomes.first()?;
            let name = reassembly.output_name(first)?;
            Some((name.to_string(), *letter))
        })
        .collect()
}

/// Separate haplotigs and unlocs from the main output and apply final names.
///
/// `main` is the reassembled output followed by any reinstated shrapnel.
/// Haplotig chunks are removed from it and emitted separately in their
/// original orientation. Unloc components are relabeled
/// `<chromosome or sex letter>_unloc_<rank>`; an unloc that is not at either
/// end of its chromosome is an [`ErrorKind::InternalUnloc`]. Sex chromosome
/// labels are replaced with their letter, then the output is regrouped by
/// label with gaps tidied.
pub fn segregate(
    mut main: Vec<TpfRecord>,
    reassembly: &Reassembly,
    chunks: &ChunkSet,
    layout: &Layout,
    errors: &mut ErrorCollector,
) -> Segregation {
    let mut segregation = Segregation::default();

    // Haplotigs
    segregation.named_haplotigs = name_haplotigs(tagged_chunks(reassembly, Tag::Haplotig));
    let haplotig_regions: HashSet<String> = segregation
        .named_haplotigs
        .iter()
        .flat_map(|h| component_regions(chunks, &h.chunk))
        .collect();
    main.retain(|r| {
        r.as_component()
            .map_or(true, |c| !haplotig_regions.contains(&c.region()))
    });

    for named in &segregation.named_haplotigs {
        let mut records = chunks.records_for(&named.chunk).to_vec();
        for component in records.iter_mut().filter_map(TpfRecord::as_component_mut) {
            component.scaffold.clone_from(&named.name);
        }
        segregation.haplotigs.push(Timeline {
            scaffold: named.name.clone(),
            records,
        });
    }

    // Unlocs, grouped by the sex letter or output name of their chromosome
    let mut unlocs_by_base: IndexMap<String, Vec<(ChunkKey, u64)>> = IndexMap::new();
    let mut seen = HashSet::new();
    for placement in &reassembly.placements {
        if !placement.tags.is_unloc() || !seen.insert(placement.chunk.clone()) {
            continue;
        }
        let base = match layout.sex_of(&placement.chromosome) {
            Some(letter) => letter.to_string(),
            None => match reassembly.output_name(&placement.chromosome) {
                Some(name) => name.to_string(),
                None => continue,
            },
        };
        unlocs_by_base
            .entry(base)
            .or_default()
            .push((placement.chunk.clone(), placement.length));
    }
    for (base, unlocs) in unlocs_by_base {
        segregation.named_unlocs.extend(name_unlocs(&base, unlocs));
    }

    let unloc_names: HashMap<String, &str> = segregation
        .named_unlocs
        .iter()
        .flat_map(|u| component_regions(chunks, &u.chunk).map(move |r| (r, u.name.as_str())))
        .collect();
    check_internal_unlocs(&main, &unloc_names, errors);
    for component in main.iter_mut().filter_map(TpfRecord::as_component_mut) {
        if let Some(name) = unloc_names.get(&component.region()) {
            component.scaffold = (*name).to_string();
        }
    }

    // Sex chromosomes
    let labels = sex_labels(layout, reassembly);
    for component in main.iter_mut().filter_map(TpfRecord::as_component_mut) {
        if let Some(letter) = labels.get(&component.scaffold) {
            component.scaffold = letter.to_string();
        }
    }
    segregation.sex_components = sex_components(layout, reassembly, chunks);

    segregation.main = regroup(main);

    debug!(
        "Segregated {} haplotigs and {} unlocs; {} output scaffolds",
        segregation.named_haplotigs.len(),
        segregation.named_unlocs.len(),
        segregation.main.len()
    );
    segregation
}

/// Flag unlocs sitting strictly inside their chromosome
fn check_internal_unlocs(
    main: &[TpfRecord],
    unloc_names: &HashMap<String, &str>,
    errors: &mut ErrorCollector,
) {
    let mut by_label: IndexMap<&str, Vec<(String, bool)>> = IndexMap::new();
    for component in main.iter().filter_map(TpfRecord::as_component) {
        let region = component.region();
        let is_unloc = unloc_names.contains_key(&region);
        by_label
            .entry(component.scaffold.as_str())
            .or_default()
            .push((region, is_unloc));
    }

    for (label, components) in by_label {
        let first = components.iter().position(|(_, u)| !u);
        let last = components.iter().rposition(|(_, u)| !u);
        let (Some(first), Some(last)) = (first, last) else {
            continue;
        };
        let interior: Vec<&str> = components[first..=last]
            .iter()
            .filter(|(_, u)| *u)
            .map(|(r, _)| r.as_str())
            .collect();

        match interior.as_slice() {
            [] => {}
            [only] => errors.push(ErrorKind::InternalUnloc, format!("{label} {only}")),
            [start, .., end] => {
                errors.push(ErrorKind::InternalUnloc, format!("{label} {start} to {end}"));
            }
        }
    }
}

/// Components of every tagged chunk placed on a sex chromosome
fn sex_components(
    layout: &Layout,
    reassembly: &Reassembly,
    chunks: &ChunkSet,
) -> IndexMap<String, SexLetter> {
    let mut components = IndexMap::new();
    for placement in &reassembly.placements {
        if placement.tags.is_empty() {
            continue;
        }
        let Some(letter) = layout
            .sex_chromosomes
            .iter()
            .find(|(_, chroms)| chroms.first() == Some(&placement.chromosome))
            .map(|(letter, _)| *letter)
        else {
            continue;
        };
        for region in component_regions(chunks, &placement.chunk) {
            components.insert(region, letter);
        }
    }
    components
}

/// Group records by scaffold label in first-seen order. Gaps stay with the
/// label of the component before them; each group is then tidied.
pub fn regroup(records: Vec<TpfRecord>) -> Vec<Timeline> {
    let mut groups: IndexMap<String, Vec<TpfRecord>> = IndexMap::new();
    let mut current: Option<String> = None;

    for record in records {
        match &record {
            TpfRecord::Component(c) => {
                current = Some(c.scaffold.clone());
                groups.entry(c.scaffold.clone()).or_default().push(record);
            }
            TpfRecord::Gap(_) => {
                if let Some(group) = current.as_ref().and_then(|l| groups.get_mut(l)) {
                    group.push(record);
                }
            }
        }
    }

    groups
        .into_iter()
        .map(|(scaffold, mut records)| {
            tidy_gaps(&mut records);
            Timeline { scaffold, records }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{Component, Gap};
    use crate::core::types::Orientation;

    fn key(scaffold: &str) -> ChunkKey {
        ChunkKey {
            scaffold: scaffold.to_string(),
            ordinal: 1,
        }
    }

    fn comp(sequence: &str, label: &str) -> TpfRecord {
        TpfRecord::Component(Component::new(sequence, 1, 100, label, Orientation::Plus))
    }

    fn gap() -> TpfRecord {
        TpfRecord::Gap(Gap::new("TYPE-2", 200))
    }

    #[test]
    fn test_name_haplotigs_by_size() {
        let named = name_haplotigs(vec![
            (key("scaffold_1"), 50),
            (key("scaffold_2"), 200),
            (key("scaffold_3"), 75),
        ]);
        let names: Vec<(&str, u64)> = named.iter().map(|n| (n.name.as_str(), n.length)).collect();
        assert_eq!(names, vec![("H_1", 200), ("H_2", 75), ("H_3", 50)]);
        assert_eq!(named[0].chunk, key("scaffold_2"));
    }

    #[test]
    fn test_name_unlocs_by_size() {
        let named = name_unlocs(
            "Z",
            vec![
                (key("scaffold_1"), 500),
                (key("scaffold_2"), 100),
                (key("scaffold_3"), 900),
            ],
        );
        let names: Vec<(&str, u64)> = named.iter().map(|n| (n.name.as_str(), n.length)).collect();
        assert_eq!(
            names,
            vec![("Z_unloc_1", 900), ("Z_unloc_2", 500), ("Z_unloc_3", 100)]
        );
    }

    #[test]
    fn test_equal_sizes_keep_encounter_order() {
        let named = name_haplotigs(vec![(key("scaffold_1"), 50), (key("scaffold_2"), 50)]);
        assert_eq!(named[0].chunk, key("scaffold_1"));
        assert_eq!(named[1].name, "H_2");
    }

    #[test]
    fn test_regroup_tidies_gaps() {
        let records = vec![
            comp("scaffold_1", "R1"),
            gap(),
            comp("scaffold_2", "R1_unloc_1"),
            gap(),
            gap(),
            comp("scaffold_3", "R2"),
            gap(),
        ];
        let groups = regroup(records);
        let names: Vec<&str> = groups.iter().map(|g| g.scaffold.as_str()).collect();
        assert_eq!(names, vec!["R1", "R1_unloc_1", "R2"]);
        assert!(groups.iter().all(|g| g.records.len() == 1));
    }

    #[test]
    fn test_terminal_unlocs_are_allowed() {
        let mut unloc_names = HashMap::new();
        unloc_names.insert("scaffold_1:1-100".to_string(), "R1_unloc_1");
        unloc_names.insert("scaffold_4:1-100".to_string(), "R1_unloc_2");

        let main = vec![
            comp("scaffold_1", "R1"),
            gap(),
            comp("scaffold_2", "R1"),
            gap(),
            comp("scaffold_3", "R1"),
            gap(),
            comp("scaffold_4", "R1"),
        ];
        let mut errors = ErrorCollector::new();
        check_internal_unlocs(&main, &unloc_names, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_internal_unloc_is_fatal() {
        let mut unloc_names = HashMap::new();
        unloc_names.insert("scaffold_2:1-100".to_string(), "R1_unloc_1");

        let main = vec![
            comp("scaffold_1", "R1"),
            gap(),
            comp("scaffold_2", "R1"),
            gap(),
            comp("scaffold_3", "R1"),
        ];
        let mut errors = ErrorCollector::new();
        check_internal_unlocs(&main, &unloc_names, &mut errors);
        assert!(errors.contains(ErrorKind::InternalUnloc));
        assert!(errors.has_fatal());
        assert_eq!(errors.records()[0].messages, vec!["R1 scaffold_2:1-100"]);
    }
}
