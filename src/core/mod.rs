//! Core data types for TPF/AGP reconciliation.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Component`], [`Gap`], [`TpfRecord`]: Individual lines of a tiling path (TPF)
//! - [`Timeline`], [`TilingPath`]: Per-scaffold ordered TPF lines and the whole file
//! - [`LayoutEntry`], [`Layout`]: Chromosome layout rows from a PretextView AGP
//! - [`Orientation`], [`Tag`], [`TagSet`], [`SexLetter`]: Strand and curation tags
//!
//! ## Coordinates
//!
//! TPF coordinates are exact, 1-based and inclusive. AGP coordinates written by
//! PretextView are only accurate to one texel (`total bases / 32768`), so every
//! comparison between the two is made with a texel-scaled tolerance.
//!
//! | Source | Example | Accuracy |
//! |--------|---------|----------|
//! | TPF    | `scaffold_1:1-1000` | exact |
//! | AGP    | `scaffold_1  1  1003` | about one texel |
//!
//! [`Component`]: record::Component
//! [`Gap`]: record::Gap
//! [`TpfRecord`]: record::TpfRecord
//! [`Timeline`]: timeline::Timeline
//! [`TilingPath`]: timeline::TilingPath
//! [`LayoutEntry`]: layout::LayoutEntry
//! [`Layout`]: layout::Layout
//! [`Orientation`]: types::Orientation
//! [`Tag`]: types::Tag
//! [`TagSet`]: types::TagSet
//! [`SexLetter`]: types::SexLetter

pub mod layout;
pub mod record;
pub mod timeline;
pub mod types;
