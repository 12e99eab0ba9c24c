use indexmap::IndexMap;

use crate::core::record::{Component, TpfRecord};

/// Default number of texels across a PretextView map
pub const DEFAULT_TEXEL_DIVISOR: u64 = 32_768;

/// The ordered TPF lines belonging to one scaffold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub scaffold: String,
    pub records: Vec<TpfRecord>,
}

impl Timeline {
    pub fn new(scaffold: impl Into<String>) -> Self {
        Self {
            scaffold: scaffold.into(),
            records: Vec::new(),
        }
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.records.iter().filter_map(TpfRecord::as_component)
    }

    /// Highest component end coordinate, i.e. the natural end of the scaffold
    pub fn max_end(&self) -> Option<u64> {
        self.components().map(|c| c.end).max()
    }

    /// Shortest component, measured as `end - start`
    pub fn min_component_span(&self) -> Option<u64> {
        self.components()
            .map(|c| c.end.saturating_sub(c.start))
            .min()
    }

    pub fn total_length(&self) -> u64 {
        self.components().map(Component::length).sum()
    }
}

/// A parsed TPF: one timeline per scaffold in file order, plus the texel size
#[derive(Debug, Clone)]
pub struct TilingPath {
    pub timelines: IndexMap<String, Timeline>,

    /// Total bases across all components
    pub total_bases: u64,

    /// Size of one PretextView texel in bases; never less than 1
    pub texel: u64,
}

impl TilingPath {
    #[must_use]
    pub fn new(timelines: IndexMap<String, Timeline>, texel_divisor: u64) -> Self {
        let total_bases = timelines.values().map(Timeline::total_length).sum();
        let texel = texel_size(total_bases, texel_divisor);
        Self {
            timelines,
            total_bases,
            texel,
        }
    }

    pub fn get(&self, scaffold: &str) -> Option<&Timeline> {
        self.timelines.get(scaffold)
    }

    pub fn contains(&self, scaffold: &str) -> bool {
        self.timelines.contains_key(scaffold)
    }

    pub fn max_end(&self, scaffold: &str) -> Option<u64> {
        self.get(scaffold).and_then(Timeline::max_end)
    }

    /// All components in file order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.timelines.values().flat_map(Timeline::components)
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }
}

/// `round(total / divisor)`, clamped to at least one base
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn texel_size(total_bases: u64, divisor: u64) -> u64 {
    if divisor == 0 {
        return 1;
    }
    let texel = (total_bases as f64 / divisor as f64).round() as u64;
    texel.max(1)
}
