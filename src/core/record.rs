use serde::{Deserialize, Serialize};

use crate::core::types::Orientation;

/// One sequence component of a TPF, e.g. `?  scaffold_1:1-1000  scaffold_1  PLUS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Accession column (usually `?`)
    pub accession: String,

    /// Sequence the region is drawn from (part of the region before `:`)
    pub sequence: String,

    /// 1-based inclusive start
    pub start: u64,

    /// 1-based inclusive end
    pub end: u64,

    /// Scaffold label column; rewritten as the component moves through curation
    pub scaffold: String,

    pub orientation: Orientation,

    /// 1-based line number in the input TPF
    #[serde(default)]
    pub line: usize,
}

impl Component {
    pub fn new(
        sequence: impl Into<String>,
        start: u64,
        end: u64,
        scaffold: impl Into<String>,
        orientation: Orientation,
    ) -> Self {
        Self {
            accession: "?".to_string(),
            sequence: sequence.into(),
            start,
            end,
            scaffold: scaffold.into(),
            orientation,
            line: 0,
        }
    }

    /// The region key `sequence:start-end`, which identifies a component
    pub fn region(&self) -> String {
        format!("{}:{}-{}", self.sequence, self.start, self.end)
    }

    /// Number of bases covered
    pub fn length(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }

    /// Copy of this component under a different scaffold label
    #[must_use]
    pub fn relabeled(&self, scaffold: impl Into<String>) -> Self {
        Self {
            scaffold: scaffold.into(),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.accession,
            self.region(),
            self.scaffold,
            self.orientation
        )
    }
}

/// A gap line, e.g. `GAP  TYPE-2  200`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub kind: String,
    pub size: u64,
}

impl Gap {
    pub fn new(kind: impl Into<String>, size: u64) -> Self {
        Self {
            kind: kind.into(),
            size,
        }
    }
}

impl std::fmt::Display for Gap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GAP\t{}\t{}", self.kind, self.size)
    }
}

/// A single TPF line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TpfRecord {
    Component(Component),
    Gap(Gap),
}

impl TpfRecord {
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap(_))
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Self::Component(c) => Some(c),
            Self::Gap(_) => None,
        }
    }

    pub fn as_component_mut(&mut self) -> Option<&mut Component> {
        match self {
            Self::Component(c) => Some(c),
            Self::Gap(_) => None,
        }
    }
}

impl std::fmt::Display for TpfRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Component(c) => c.fmt(f),
            Self::Gap(g) => g.fmt(f),
        }
    }
}

/// Reverse a run of records and flip every component's orientation
pub fn reverse_complement(records: &[TpfRecord]) -> Vec<TpfRecord> {
    records
        .iter()
        .rev()
        .map(|record| match record {
            TpfRecord::Component(c) => TpfRecord::Component(Component {
                orientation: c.orientation.flipped(),
                ..c.clone()
            }),
            TpfRecord::Gap(g) => TpfRecord::Gap(g.clone()),
        })
        .collect()
}

/// Drop leading and trailing gaps and collapse runs of identical adjacent gaps
pub fn tidy_gaps(records: &mut Vec<TpfRecord>) {
    while records.first().is_some_and(TpfRecord::is_gap) {
        records.remove(0);
    }
    while records.last().is_some_and(TpfRecord::is_gap) {
        records.pop();
    }
    records.dedup_by(|b, a| a.is_gap() && a == b);
}

/// Total bases across the components of a run of records
pub fn total_length(records: &[TpfRecord]) -> u64 {
    records
        .iter()
        .filter_map(TpfRecord::as_component)
        .map(Component::length)
        .sum()
}
