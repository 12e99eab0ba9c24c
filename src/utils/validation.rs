//! Centralized validation: input limits and the curation error taxonomy.
//!
//! Every validation problem found while reconciling a TPF with an AGP is
//! recorded in an [`ErrorCollector`] as an [`ErrorRecord`] of some
//! [`ErrorKind`]. Parsing-stage problems (coordinate typos, scaffolds missing
//! from the TPF) are checked straight away; everything else accumulates so a
//! single run reports as many independent problems as possible before the
//! final gate refuses to write output.

use serde::Serialize;

/// Maximum number of records accepted from a single input file (DOS protection)
pub const MAX_RECORDS: usize = 1_000_000;

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count >= MAX_RECORDS {
        Some(format!(
            "Too many records: adding another would exceed maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}

/// Kinds of problems the curation pipeline can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Non-monotonic or inverted coordinates in the TPF
    CoordinateTypo,
    /// A scaffold referenced by the AGP is absent from the TPF
    ScaffoldSyncMismatch,
    /// One AGP entry tagged both `HAPLOTIG` and `UNLOC`
    HaplotigUnlocConflict,
    /// More than two distinct sex letters referenced
    TooManySexChromosomes,
    /// A disallowed heterogametic letter pair (ZX, WX, ZY)
    InvalidSexCombination,
    /// A sex letter on several chromosomes, or a chromosome with several letters
    AmbiguousSexAssignment,
    /// A haplotig painted into a heterogametic sex chromosome
    HeterogameticHaplotigConflict,
    /// An unloc found strictly inside a chromosome
    InternalUnloc,
    /// Chunk and layout-entry counts disagree; reported, never fatal
    CountDiscrepancy,
}

impl ErrorKind {
    pub fn is_fatal(self) -> bool {
        !matches!(self, Self::CountDiscrepancy)
    }

    /// What the curator should fix before rerunning
    pub fn remedy(self) -> &'static str {
        match self {
            Self::CoordinateTypo => "PLEASE FIX TPF COORDINATES AND RERUN",
            Self::ScaffoldSyncMismatch => "AGP AND TPF ARE NOT IN SYNC",
            Self::InternalUnloc => "PLEASE MOVE UNLOCS TO CHROMOSOME ENDS AND RERUN",
            Self::CountDiscrepancy => "A BREAK MAY HAVE BEEN MISSED",
            Self::HaplotigUnlocConflict
            | Self::TooManySexChromosomes
            | Self::InvalidSexCombination
            | Self::AmbiguousSexAssignment
            | Self::HeterogameticHaplotigConflict => "PLEASE FIX AGP TAGS AND RERUN",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CoordinateTypo => "coordinate typo",
            Self::ScaffoldSyncMismatch => "scaffold sync mismatch",
            Self::HaplotigUnlocConflict => "haplotig/unloc conflict",
            Self::TooManySexChromosomes => "too many sex chromosomes",
            Self::InvalidSexCombination => "invalid sex chromosome combination",
            Self::AmbiguousSexAssignment => "ambiguous sex chromosome assignment",
            Self::HeterogameticHaplotigConflict => "haplotig in heterogametic sex chromosome",
            Self::InternalUnloc => "internal unloc",
            Self::CountDiscrepancy => "count discrepancy",
        };
        write!(f, "{name}")
    }
}

/// All messages recorded for one kind of problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub messages: Vec<String>,
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}:", self.kind)?;
        for message in &self.messages {
            writeln!(f, "  {message}")?;
        }
        write!(f, ">>> {} <<<", self.kind.remedy())
    }
}

/// Accumulates error records for one run, in first-reported kind order
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    records: Vec<ErrorRecord>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the record of this kind, creating it if needed
    pub fn push(&mut self, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        match self.records.iter_mut().find(|r| r.kind == kind) {
            Some(record) => record.messages.push(message),
            None => self.records.push(ErrorRecord {
                kind,
                messages: vec![message],
            }),
        }
    }

    pub fn has_fatal(&self) -> bool {
        self.records.iter().any(|r| r.kind.is_fatal())
    }

    /// Whether any message of this kind has been recorded
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.records.iter().any(|r| r.kind == kind)
    }

    /// Records that abort the run
    pub fn fatal(&self) -> Vec<ErrorRecord> {
        self.records
            .iter()
            .filter(|r| r.kind.is_fatal())
            .cloned()
            .collect()
    }

    /// Records that are reported but never abort
    pub fn warnings(&self) -> Vec<ErrorRecord> {
        self.records
            .iter()
            .filter(|r| !r.kind.is_fatal())
            .cloned()
            .collect()
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_record_limit() {
        assert!(check_record_limit(0).is_none());
        assert!(check_record_limit(MAX_RECORDS - 1).is_none());
        assert!(check_record_limit(MAX_RECORDS).is_some());
    }

    #[test]
    fn test_collector_groups_by_kind() {
        let mut errors = ErrorCollector::new();
        errors.push(ErrorKind::CountDiscrepancy, "Scaffold_1: 2 vs 1");
        errors.push(ErrorKind::HaplotigUnlocConflict, "scaffold_3");
        errors.push(ErrorKind::CountDiscrepancy, "Scaffold_2: 3 vs 2");

        assert_eq!(errors.records().len(), 2);
        assert_eq!(errors.records()[0].messages.len(), 2);
        assert!(errors.has_fatal());
        assert_eq!(errors.fatal().len(), 1);
        assert_eq!(errors.warnings()[0].kind, ErrorKind::CountDiscrepancy);
    }

    #[test]
    fn test_count_discrepancy_is_not_fatal() {
        let mut errors = ErrorCollector::new();
        errors.push(ErrorKind::CountDiscrepancy, "scaffold_1");
        assert!(!errors.has_fatal());
        assert!(errors.contains(ErrorKind::CountDiscrepancy));
    }

    #[test]
    fn test_record_display_includes_remedy() {
        let record = ErrorRecord {
            kind: ErrorKind::TooManySexChromosomes,
            messages: vec!["X Y Z".to_string()],
        };
        let text = record.to_string();
        assert!(text.contains("X Y Z"));
        assert!(text.contains("PLEASE FIX AGP TAGS AND RERUN"));
    }
}
