use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::layout::Layout;
use crate::core::timeline::{TilingPath, Timeline};

/// Texel multiple within which a TPF component end may match an AGP divider
pub const DEFAULT_NETSIZE: f64 = 3.0;

/// Where a break coordinate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakSource {
    /// A TPF component ends within tolerance of the divider
    Matched,
    /// Nothing in the TPF matched; placed one past the divider
    Synthesized,
}

/// An AGP divider resolved to a TPF coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakPoint {
    pub scaffold: String,
    /// Scaffold-local end coordinate of the AGP fragment
    pub divider: u64,
    /// TPF coordinate after which the timeline is cut
    pub coordinate: u64,
    pub source: BreakSource,
}

/// Scaffold -> ascending, de-duplicated AGP fragment end coordinates
pub type Dividers = IndexMap<String, Vec<u64>>;

/// Result of matching every divider against the TPF
#[derive(Debug, Clone, Default)]
pub struct BreakResolution {
    /// Resolved breaks, excluding those at a scaffold's natural end
    pub breakpoints: Vec<BreakPoint>,

    /// Unmatched dividers explained by a discarded artefact fragment
    pub explained: Vec<(String, u64)>,
}

impl BreakResolution {
    pub fn synthesized(&self) -> impl Iterator<Item = &BreakPoint> {
        self.breakpoints
            .iter()
            .filter(|b| b.source == BreakSource::Synthesized)
    }
}

/// Collect the scaffold-local end of every kept AGP entry, per scaffold
pub fn agp_dividers(layout: &Layout) -> Dividers {
    let mut dividers = Dividers::new();
    for entry in layout.entries() {
        dividers
            .entry(entry.scaffold.clone())
            .or_default()
            .push(entry.scaffold_end);
    }
    for coords in dividers.values_mut() {
        coords.sort_unstable();
        coords.dedup();
    }
    dividers
}

/// End coordinate of the component closest to `divider`, if any lies strictly
/// within `tolerance`. Ties keep the first component in timeline order.
#[allow(clippy::cast_precision_loss)]
pub fn nearest_component_end(timeline: &Timeline, divider: u64, tolerance: f64) -> Option<u64> {
    let mut best: Option<(u64, u64)> = None;
    for component in timeline.components() {
        let distance = component.end.abs_diff(divider);
        if (distance as f64) < tolerance && best.map_or(true, |(_, d)| distance < d) {
            best = Some((component.end, distance));
        }
    }
    best.map(|(end, _)| end)
}

/// Resolve every divider to a TPF break coordinate.
///
/// Dividers with no component end within `netsize` texels are discrepancies:
/// those explained by a discarded fragment starting at `divider + 1` are set
/// aside, the rest get a synthesized break at `divider + 1`. Breaks landing on
/// the scaffold's natural end are dropped.
#[allow(clippy::cast_precision_loss)]
pub fn resolve_breaks(
    path: &TilingPath,
    layout: &Layout,
    dividers: &Dividers,
    netsize: f64,
) -> BreakResolution {
    let tolerance = netsize * path.texel as f64;
    let mut resolution = BreakResolution::default();

    for (scaffold, coords) in dividers {
        let Some(timeline) = path.get(scaffold) else {
            continue;
        };
        let natural_end = timeline.max_end();

        for &divider in coords {
            let breakpoint = match nearest_component_end(timeline, divider, tolerance) {
                Some(coordinate) => BreakPoint {
                    scaffold: scaffold.clone(),
                    divider,
                    coordinate,
                    source: BreakSource::Matched,
                },
                None if layout.explains_divider(scaffold, divider) => {
                    debug!("{scaffold}:{divider} unmatched, explained by a discarded fragment");
                    resolution.explained.push((scaffold.clone(), divider));
                    continue;
                }
                None => {
                    warn!("Break missing from input TPF? {scaffold}\t{divider}");
                    BreakPoint {
                        scaffold: scaffold.clone(),
                        divider,
                        coordinate: divider + 1,
                        source: BreakSource::Synthesized,
                    }
                }
            };

            if Some(breakpoint.coordinate) == natural_end {
                continue;
            }
            resolution.breakpoints.push(breakpoint);
        }
    }

    debug!(
        "Resolved {} breaks ({} synthesized)",
        resolution.breakpoints.len(),
        resolution.synthesized().count()
    );
    resolution
}

/// Tab-separated `scaffold, AGP divider, TPF coordinate` for each break
pub fn dividers_report(breakpoints: &[BreakPoint]) -> String {
    let mut out = String::from("#scaffold\tAGP\tTPF\n");
    for b in breakpoints {
        out.push_str(&format!("{}\t{}\t{}\n", b.scaffold, b.divider, b.coordinate));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::DEFAULT_TEXEL_DIVISOR;
    use crate::parsing::agp::{parse_agp_text, FragmentFilter};
    use crate::parsing::tpf::parse_tpf_text;
    use crate::utils::validation::ErrorCollector;

    fn parse(tpf: &str, agp: &str) -> (TilingPath, Layout) {
        let mut errors = ErrorCollector::new();
        let path = parse_tpf_text(tpf, DEFAULT_TEXEL_DIVISOR, &mut errors).unwrap();
        let layout = parse_agp_text(agp, &path, &FragmentFilter::default(), &mut errors).unwrap();
        assert!(!errors.has_fatal());
        (path, layout)
    }

    #[test]
    fn test_dividers_sorted_and_deduplicated() {
        let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS\n?\tscaffold_1:1001-2000\tscaffold_1\tPLUS\n";
        let agp = "Chr1\t1\t1000\t1\tW\tscaffold_1\t1001\t2000\t+
Chr1\t1001\t2000\t2\tW\tscaffold_1\t1\t1000\t+
Chr2\t1\t1000\t1\tW\tscaffold_1\t1\t1000\t-
";
        let (_, layout) = parse(tpf, agp);
        let dividers = agp_dividers(&layout);
        assert_eq!(dividers["scaffold_1"], vec![1000, 2000]);
    }

    #[test]
    fn test_nearest_prefers_closest_then_first() {
        let tpf = "?\tscaffold_1:1-998\tscaffold_1\tPLUS
?\tscaffold_1:999-1002\tscaffold_1\tPLUS
?\tscaffold_1:1003-1005\tscaffold_1\tPLUS
";
        let (path, _) = parse(tpf, "");
        let timeline = path.get("scaffold_1").unwrap();

        // 998 and 1002 are both 2 away from 1000: first in scan order wins
        assert_eq!(nearest_component_end(timeline, 1000, 3.0), Some(998));
        // 1002 is 1 away, 1005 is 2 away
        assert_eq!(nearest_component_end(timeline, 1003, 3.0), Some(1002));
        // Distance must be strictly less than the tolerance
        assert_eq!(nearest_component_end(timeline, 995, 3.0), None);
    }

    #[test]
    fn test_resolve_breaks_end_to_end() {
        let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS
GAP\tTYPE-2\t200
?\tscaffold_1:1001-2000\tscaffold_1\tPLUS
";
        let agp = "Chr1\t1\t1000\t1\tW\tscaffold_1\t1\t1001\t+
Chr1\t1001\t1100\t2\tU\t100\tscaffold\tyes\tproximity_ligation
Chr1\t1101\t2100\t3\tW\tscaffold_1\t1002\t2000\t-
";
        let (path, layout) = parse(tpf, agp);
        let dividers = agp_dividers(&layout);
        let resolution = resolve_breaks(&path, &layout, &dividers, DEFAULT_NETSIZE);

        // 2000 is the natural end of scaffold_1 and is dropped
        assert_eq!(resolution.breakpoints.len(), 1);
        let b = &resolution.breakpoints[0];
        assert_eq!((b.divider, b.coordinate), (1001, 1000));
        assert_eq!(b.source, BreakSource::Matched);
    }

    #[test]
    fn test_unmatched_divider_is_synthesized() {
        let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS\n?\tscaffold_1:1001-2000\tscaffold_1\tPLUS\n";
        let agp = "Chr1\t1\t500\t1\tW\tscaffold_1\t1\t500\t+
Chr1\t501\t2000\t2\tW\tscaffold_1\t501\t2000\t+
";
        let (path, layout) = parse(tpf, agp);
        let dividers = agp_dividers(&layout);
        let resolution = resolve_breaks(&path, &layout, &dividers, DEFAULT_NETSIZE);

        let synthesized: Vec<_> = resolution.synthesized().collect();
        assert_eq!(synthesized.len(), 1);
        assert_eq!(synthesized[0].coordinate, 501);
        assert!(resolution.explained.is_empty());
    }

    #[test]
    fn test_dividers_report() {
        let report = dividers_report(&[BreakPoint {
            scaffold: "scaffold_1".to_string(),
            divider: 1001,
            coordinate: 1000,
            source: BreakSource::Matched,
        }]);
        assert_eq!(report, "#scaffold\tAGP\tTPF\nscaffold_1\t1001\t1000\n");
    }
}
