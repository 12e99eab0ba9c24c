use indexmap::IndexMap;
use std::collections::HashMap;

use crate::core::types::{Orientation, SexLetter, TagSet};

/// One component row of a PretextView AGP: a scaffold range placed on a chromosome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    /// Target chromosome (AGP object), e.g. `Scaffold_1`
    pub chromosome: String,
    pub target_start: u64,
    pub target_end: u64,
    pub part: String,
    pub scaffold: String,
    pub scaffold_start: u64,
    pub scaffold_end: u64,
    pub orientation: Orientation,
    pub tags: TagSet,

    /// 1-based line number in the input AGP
    pub line: usize,
}

impl LayoutEntry {
    /// Size of the fragment in target space (`target_end - target_start`)
    pub fn fragment_size(&self) -> u64 {
        self.target_end.saturating_sub(self.target_start)
    }

    /// Key used to find this entry's tags again from a scaffold range
    pub fn tag_key(&self) -> TagKey {
        (self.scaffold.clone(), self.scaffold_start, self.scaffold_end)
    }
}

impl std::fmt::Display for LayoutEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\tW\t{}\t{}\t{}\t{}",
            self.chromosome,
            self.target_start,
            self.target_end,
            self.part,
            self.scaffold,
            self.scaffold_start,
            self.scaffold_end,
            self.orientation.agp_token()
        )?;
        for tag in self.tags.iter() {
            write!(f, "\t{tag}")?;
        }
        Ok(())
    }
}

/// (scaffold, scaffold start, scaffold end)
pub type TagKey = (String, u64, u64);

/// A parsed AGP, split into entries that drive the reassembly and those
/// discarded as snapping artefacts
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Kept entries per chromosome, in input order
    pub chromosomes: IndexMap<String, Vec<LayoutEntry>>,

    /// Entries dropped by the fragment-size filter, in input order
    pub discarded: Vec<LayoutEntry>,

    /// Low scaffold coordinates of discarded entries, per scaffold
    pub discards: IndexMap<String, Vec<u64>>,

    /// Tags of kept entries keyed by scaffold range
    pub tags: HashMap<TagKey, TagSet>,

    /// Chromosomes referencing each sex letter, in first-seen order
    pub sex_chromosomes: IndexMap<SexLetter, Vec<String>>,

    /// Chromosomes carrying at least one haplotig-tagged entry
    pub haplotig_chromosomes: Vec<String>,
}

impl Layout {
    /// All kept entries, chromosome by chromosome
    pub fn entries(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.chromosomes.values().flatten()
    }

    /// Kept entries grouped by the scaffold they reference, in first-seen order
    pub fn entries_by_scaffold(&self) -> IndexMap<&str, Vec<&LayoutEntry>> {
        let mut by_scaffold: IndexMap<&str, Vec<&LayoutEntry>> = IndexMap::new();
        for entry in self.entries() {
            by_scaffold
                .entry(entry.scaffold.as_str())
                .or_default()
                .push(entry);
        }
        by_scaffold
    }

    /// Whether `divider + 1` is the start of a discarded fragment on this scaffold
    pub fn explains_divider(&self, scaffold: &str, divider: u64) -> bool {
        self.discards
            .get(scaffold)
            .is_some_and(|lows| lows.contains(&(divider + 1)))
    }

    /// The sex letter a chromosome was assigned, if any
    pub fn sex_of(&self, chromosome: &str) -> Option<SexLetter> {
        self.sex_chromosomes
            .iter()
            .find(|(_, chroms)| chroms.iter().any(|c| c == chromosome))
            .map(|(letter, _)| *letter)
    }

    pub fn entry_count(&self) -> usize {
        self.chromosomes.values().map(Vec::len).sum()
    }
}
