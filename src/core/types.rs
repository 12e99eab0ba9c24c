use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Strand of a component, as written in the TPF (`PLUS`/`MINUS`) or AGP (`+`/`-`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Plus,
    Minus,
    /// Unoriented (`?` in TPF, `?`/`0`/`na` in AGP)
    Unknown,
}

impl Orientation {
    /// Parse a TPF orientation token (`PLUS`, `MINUS`, anything else is unknown)
    pub fn from_tpf(token: &str) -> Self {
        match token.to_uppercase().as_str() {
            "PLUS" => Self::Plus,
            "MINUS" => Self::Minus,
            _ => Self::Unknown,
        }
    }

    /// Parse an AGP orientation token (`+`, `-`, anything else is unknown)
    pub fn from_agp(token: &str) -> Self {
        match token {
            "+" => Self::Plus,
            "-" => Self::Minus,
            _ => Self::Unknown,
        }
    }

    /// Swap `PLUS` and `MINUS`; unknown orientation is left alone
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Plus => Self::Minus,
            Self::Minus => Self::Plus,
            Self::Unknown => Self::Unknown,
        }
    }

    pub fn is_reverse(self) -> bool {
        matches!(self, Self::Minus)
    }

    /// Token used when writing the layout side (`+`/`-`/`?`)
    pub fn agp_token(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Unknown => "?",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plus => write!(f, "PLUS"),
            Self::Minus => write!(f, "MINUS"),
            Self::Unknown => write!(f, "?"),
        }
    }
}

/// Sex chromosome letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SexLetter {
    X,
    Y,
    Z,
    W,
}

impl SexLetter {
    pub const ALL: [SexLetter; 4] = [Self::X, Self::Y, Self::Z, Self::W];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "X" => Some(Self::X),
            "Y" => Some(Self::Y),
            "Z" => Some(Self::Z),
            "W" => Some(Self::W),
            _ => None,
        }
    }
}

impl std::fmt::Display for SexLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
            Self::W => "W",
        };
        write!(f, "{letter}")
    }
}

/// A curation tag attached to an AGP line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// Alternate haplotype, removed from the primary assembly
    Haplotig,
    /// Unlocalized: belongs to the chromosome, position unknown
    Unloc,
    /// Belongs to the given sex chromosome
    Sex(SexLetter),
}

impl Tag {
    /// Parse an already upper-cased tag token. Unrecognised tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "HAPLOTIG" => Some(Self::Haplotig),
            "UNLOC" => Some(Self::Unloc),
            other => SexLetter::parse(other).map(Self::Sex),
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Haplotig => write!(f, "HAPLOTIG"),
            Self::Unloc => write!(f, "UNLOC"),
            Self::Sex(letter) => write!(f, "{letter}"),
        }
    }
}

/// The set of tags on one AGP line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag set from raw trailing AGP tokens, upper-casing each one.
    /// Returns the set and any tokens that were not recognised.
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> (Self, Vec<String>) {
        let mut set = BTreeSet::new();
        let mut unknown = Vec::new();
        for token in tokens {
            let upper = token.to_uppercase();
            match Tag::parse(&upper) {
                Some(tag) => {
                    set.insert(tag);
                }
                None => unknown.push(upper),
            }
        }
        (Self(set), unknown)
    }

    pub fn insert(&mut self, tag: Tag) {
        self.0.insert(tag);
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.0.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_haplotig(&self) -> bool {
        self.contains(Tag::Haplotig)
    }

    pub fn is_unloc(&self) -> bool {
        self.contains(Tag::Unloc)
    }

    pub fn sex_letters(&self) -> impl Iterator<Item = SexLetter> + '_ {
        self.0.iter().filter_map(|t| match t {
            Tag::Sex(letter) => Some(*letter),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
