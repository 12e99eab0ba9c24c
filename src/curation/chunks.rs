use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;

use crate::core::record::{total_length, TpfRecord};
use crate::core::timeline::{TilingPath, Timeline};
use crate::curation::breaks::BreakPoint;

/// Fraction by which chunk ends are contracted before matching AGP ranges
pub const DEFAULT_CORE_CONTRACTION: f64 = 0.7;

/// Identifies a chunk: the `ordinal`-th piece of `scaffold` (1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChunkKey {
    pub scaffold: String,
    pub ordinal: usize,
}

impl std::fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%{}", self.scaffold, self.ordinal)
    }
}

/// A contiguous run of a scaffold's timeline between two breaks.
/// Always starts and ends on a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub key: ChunkKey,

    /// Index range into the parent timeline's records
    pub range: Range<usize>,

    /// Start of the first component
    pub first_start: u64,

    /// End of the last component
    pub last_end: u64,

    /// Total component bases
    pub length: u64,
}

impl Chunk {
    /// Bounds of the chunk's core after contracting both ends inwards by
    /// `factor * round(factor * span)`, rounded to two decimals
    #[allow(clippy::cast_precision_loss)]
    pub fn core_bounds(&self, factor: f64) -> (f64, f64) {
        let span = self.last_end.saturating_sub(self.first_start) as f64;
        let contraction = round2(span * factor) * factor;
        (
            round2(self.first_start as f64 + contraction),
            round2(self.last_end as f64 - contraction),
        )
    }

    /// Whether the contracted core lies strictly inside `[lo, hi]`
    #[allow(clippy::cast_precision_loss)]
    pub fn core_within(&self, lo: u64, hi: u64, factor: f64) -> bool {
        let (core_lo, core_hi) = self.core_bounds(factor);
        core_lo > lo as f64 && core_hi < hi as f64
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// All chunks of a tiling path, borrowing their records from it
#[derive(Debug, Clone)]
pub struct ChunkSet<'a> {
    path: &'a TilingPath,
    chunks: IndexMap<String, Vec<Chunk>>,
}

impl<'a> ChunkSet<'a> {
    pub fn for_scaffold(&self, scaffold: &str) -> &[Chunk] {
        self.chunks.get(scaffold).map_or(&[], Vec::as_slice)
    }

    pub fn get(&self, key: &ChunkKey) -> Option<&Chunk> {
        self.for_scaffold(&key.scaffold)
            .iter()
            .find(|c| c.key.ordinal == key.ordinal)
    }

    /// The TPF records making up a chunk
    pub fn records(&self, chunk: &Chunk) -> &'a [TpfRecord] {
        self.path
            .get(&chunk.key.scaffold)
            .map_or(&[], |timeline| &timeline.records[chunk.range.clone()])
    }

    /// Records of the chunk with this key, or nothing if the key is unknown
    pub fn records_for(&self, key: &ChunkKey) -> &'a [TpfRecord] {
        self.get(key).map_or(&[], |chunk| self.records(chunk))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values().flatten()
    }

    /// Number of chunks produced from each scaffold
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.chunks.iter().map(|(s, c)| (s.as_str(), c.len()))
    }

    pub fn len(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split every timeline after each component whose end is a resolved break
/// coordinate. A scaffold with no breaks becomes a single chunk.
pub fn split_tiling_path<'a>(path: &'a TilingPath, breakpoints: &[BreakPoint]) -> ChunkSet<'a> {
    let mut cuts: IndexMap<&str, HashSet<u64>> = IndexMap::new();
    for b in breakpoints {
        cuts.entry(b.scaffold.as_str())
            .or_default()
            .insert(b.coordinate);
    }

    let empty = HashSet::new();
    let chunks = path
        .timelines
        .iter()
        .map(|(scaffold, timeline)| {
            let scaffold_cuts = cuts.get(scaffold.as_str()).unwrap_or(&empty);
            (scaffold.clone(), split_timeline(timeline, scaffold_cuts))
        })
        .collect();

    ChunkSet { path, chunks }
}

/// Split one timeline at the given component end coordinates
pub fn split_timeline(timeline: &Timeline, cuts: &HashSet<u64>) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut start = 0;

    for (i, record) in timeline.records.iter().enumerate() {
        if let TpfRecord::Component(c) = record {
            if cuts.contains(&c.end) {
                push_chunk(timeline, start..i + 1, &mut chunks);
                start = i + 1;
            }
        }
    }
    push_chunk(timeline, start..timeline.records.len(), &mut chunks);

    chunks
}

/// Trim gaps from both ends of the range and record it if anything remains
fn push_chunk(timeline: &Timeline, mut range: Range<usize>, chunks: &mut Vec<Chunk>) {
    let records = &timeline.records;
    while range.start < range.end && records[range.start].is_gap() {
        range.start += 1;
    }
    while range.end > range.start && records[range.end - 1].is_gap() {
        range.end -= 1;
    }

    let slice = &records[range.clone()];
    let (Some(first), Some(last)) = (
        slice.first().and_then(TpfRecord::as_component),
        slice.last().and_then(TpfRecord::as_component),
    ) else {
        return;
    };

    chunks.push(Chunk {
        key: ChunkKey {
            scaffold: timeline.scaffold.clone(),
            ordinal: chunks.len() + 1,
        },
        first_start: first.start,
        last_end: last.end,
        length: total_length(slice),
        range,
    });
}
