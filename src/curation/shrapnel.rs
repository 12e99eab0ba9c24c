use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::core::record::{tidy_gaps, TpfRecord};
use crate::core::timeline::{TilingPath, Timeline};

/// TPF scaffolds reinstated because the layout left some of their components out
#[derive(Debug, Clone, Default)]
pub struct Shrapnel {
    /// Reinstated groups in output order, components relabeled with the group name
    pub groups: Vec<Timeline>,

    /// Regions dropped because they were already emitted elsewhere
    pub duplicates: Vec<String>,

    /// Original scaffolds that were reinstated, in output order
    pub scaffolds: Vec<String>,
}

impl Shrapnel {
    pub fn records(&self) -> impl Iterator<Item = &TpfRecord> {
        self.groups.iter().flat_map(|g| g.records.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Reinstate every scaffold with a component missing from `emitted`.
///
/// Each such scaffold is appended whole, ordered by the number in its name,
/// minus any component already emitted. A scaffold that lost a duplicate is
/// relabeled `<scaffold>_1`; if losing it leaves a run of gaps inside the
/// scaffold, the pieces either side become `<scaffold>_1_1`, `<scaffold>_1_2`...
pub fn reinstate_shrapnel(path: &TilingPath, emitted: &HashSet<String>) -> Shrapnel {
    let mut scaffolds: Vec<&str> = path
        .timelines
        .values()
        .filter(|t| t.components().any(|c| !emitted.contains(&c.region())))
        .map(|t| t.scaffold.as_str())
        .collect();
    scaffolds.sort_by(|a, b| compare_scaffold_names(a, b));

    let mut shrapnel = Shrapnel::default();
    for scaffold in scaffolds {
        let Some(timeline) = path.get(scaffold) else {
            continue;
        };

        let mut records = Vec::with_capacity(timeline.records.len());
        let mut duplicated = false;
        for record in &timeline.records {
            match record {
                TpfRecord::Component(c) if emitted.contains(&c.region()) => {
                    warn!("Dropping duplicate shrapnel {}", c.region());
                    shrapnel.duplicates.push(c.region());
                    duplicated = true;
                }
                _ => records.push(record.clone()),
            }
        }

        let label = if duplicated {
            format!("{scaffold}_1")
        } else {
            scaffold.to_string()
        };

        let pieces = split_at_gap_runs(records);
        let numbered = pieces.len() > 1;
        for (i, mut piece) in pieces.into_iter().enumerate() {
            tidy_gaps(&mut piece);
            let name = if numbered {
                format!("{label}_{}", i + 1)
            } else {
                label.clone()
            };
            for component in piece.iter_mut().filter_map(TpfRecord::as_component_mut) {
                component.scaffold.clone_from(&name);
            }
            shrapnel.groups.push(Timeline {
                scaffold: name,
                records: piece,
            });
        }
        shrapnel.scaffolds.push(scaffold.to_string());
    }

    debug!(
        "Reinstated {} shrapnel scaffolds as {} groups",
        shrapnel.scaffolds.len(),
        shrapnel.groups.len()
    );
    shrapnel
}

/// Split wherever two or more gaps sit next to each other
fn split_at_gap_runs(records: Vec<TpfRecord>) -> Vec<Vec<TpfRecord>> {
    let mut pieces = vec![Vec::new()];
    let mut gap_run = 0;
    for record in records {
        if record.is_gap() {
            gap_run += 1;
            if gap_run == 2 {
                pieces.push(Vec::new());
            }
        } else {
            gap_run = 0;
        }
        if let Some(piece) = pieces.last_mut() {
            piece.push(record);
        }
    }
    pieces.retain(|p| p.iter().any(|r| !r.is_gap()));
    pieces
}

/// Number following the first `_` of a scaffold name (`scaffold_12` -> 12)
fn scaffold_number(name: &str) -> Option<u64> {
    name.split('_').nth(1)?.parse().ok()
}

/// Order scaffolds by their number, falling back to natural ordering.
/// Names without a number sort after those with one.
pub fn compare_scaffold_names(a: &str, b: &str) -> Ordering {
    match (scaffold_number(a), scaffold_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| natord::compare(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => natord::compare(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::DEFAULT_TEXEL_DIVISOR;
    use crate::parsing::tpf::parse_tpf_text;
    use crate::utils::validation::ErrorCollector;

    const TPF: &str = "?\tscaffold_10:1-100\tscaffold_10\tPLUS
?\tscaffold_2:1-100\tscaffold_2\tPLUS
GAP\tTYPE-2\t200
?\tscaffold_2:301-400\tscaffold_2\tPLUS
GAP\tTYPE-2\t200
?\tscaffold_2:601-700\tscaffold_2\tPLUS
?\tscaffold_3:1-100\tscaffold_3\tPLUS
";

    fn tiling_path() -> TilingPath {
        let mut errors = ErrorCollector::new();
        parse_tpf_text(TPF, DEFAULT_TEXEL_DIVISOR, &mut errors).unwrap()
    }

    fn emitted(regions: &[&str]) -> HashSet<String> {
        regions.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_compare_scaffold_names() {
        let mut names = vec!["scaffold_10", "ctgB", "scaffold_2", "ctgA", "scaffold_2_ctg1"];
        names.sort_by(|a, b| compare_scaffold_names(a, b));
        assert_eq!(
            names,
            vec!["scaffold_2", "scaffold_2_ctg1", "scaffold_10", "ctgA", "ctgB"]
        );
    }

    #[test]
    fn test_nothing_missing() {
        let path = tiling_path();
        let all: HashSet<String> = path.components().map(|c| c.region()).collect();
        assert!(reinstate_shrapnel(&path, &all).is_empty());
    }

    #[test]
    fn test_reinstated_in_numeric_order() {
        let path = tiling_path();
        let shrapnel = reinstate_shrapnel(&path, &emitted(&["scaffold_3:1-100"]));

        assert_eq!(shrapnel.scaffolds, vec!["scaffold_2", "scaffold_10"]);
        assert_eq!(shrapnel.groups[0].records.len(), 5);
        assert!(shrapnel.duplicates.is_empty());
    }

    #[test]
    fn test_duplicate_at_end_is_dropped_and_relabeled() {
        let path = tiling_path();
        let shrapnel = reinstate_shrapnel(
            &path,
            &emitted(&["scaffold_2:601-700", "scaffold_3:1-100", "scaffold_10:1-100"]),
        );

        assert_eq!(shrapnel.duplicates, vec!["scaffold_2:601-700"]);
        assert_eq!(shrapnel.groups.len(), 1);
        let group = &shrapnel.groups[0];
        assert_eq!(group.scaffold, "scaffold_2_1");
        assert_eq!(group.records.len(), 3);
        assert!(group.components().all(|c| c.scaffold == "scaffold_2_1"));
    }

    #[test]
    fn test_internal_duplicate_splits_scaffold() {
        let path = tiling_path();
        let shrapnel = reinstate_shrapnel(
            &path,
            &emitted(&["scaffold_2:301-400", "scaffold_3:1-100", "scaffold_10:1-100"]),
        );

        let names: Vec<&str> = shrapnel.groups.iter().map(|g| g.scaffold.as_str()).collect();
        assert_eq!(names, vec!["scaffold_2_1_1", "scaffold_2_1_2"]);
        assert!(shrapnel.groups.iter().all(|g| g.records.len() == 1));
    }
}
