//! Immutable sound catalog
//!
//! Name to clip/volume lookup built once at startup and read-only
//! thereafter, so both engines can share it without synchronization.
//! BGM and SE each own their own catalog instance.

use crate::error::{Error, Result};
use rand::Rng;
use std::collections::HashMap;
use uuid::Uuid;

/// Opaque handle to a decoded audio buffer owned by the host engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipId(Uuid);

impl ClipId {
    /// Generate a fresh handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded clip: opaque handle plus its natural duration in seconds
///
/// The subsystem never touches samples; the handle only identifies the
/// buffer to the host engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    pub duration: f64,
}

impl Clip {
    pub fn new(duration: f64) -> Self {
        Self {
            id: ClipId::new(),
            duration,
        }
    }
}

/// One catalog entry: unique name, clip, and its base playback volume
#[derive(Debug, Clone, PartialEq)]
pub struct SoundEntry {
    pub name: String,
    pub clip: Clip,
    pub base_volume: f32,
}

impl SoundEntry {
    /// Base volume is clamped to [0.0, 1.0]
    pub fn new(name: impl Into<String>, clip: Clip, base_volume: f32) -> Self {
        Self {
            name: name.into(),
            clip,
            base_volume: base_volume.clamp(0.0, 1.0),
        }
    }
}

/// Immutable name-to-entry mapping
///
/// Lookups are case-sensitive exact matches. Construction fails on a
/// duplicate name; an absent name at lookup time is a reported
/// [`Error::NotFound`], never a silent no-op.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<SoundEntry>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(entries: impl IntoIterator<Item = SoundEntry>) -> Result<Self> {
        let entries: Vec<SoundEntry> = entries.into_iter().collect();
        let mut by_name = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if by_name.insert(entry.name.clone(), idx).is_some() {
                return Err(Error::DuplicateName(entry.name.clone()));
            }
        }
        Ok(Self { entries, by_name })
    }

    /// Catalog with no entries; every lookup reports `NotFound`
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Result<&SoundEntry> {
        self.by_name
            .get(name)
            .map(|&idx| &self.entries[idx])
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Uniformly random entry, or `None` when the catalog is empty
    pub fn choose<R: Rng>(&self, rng: &mut R) -> Option<&SoundEntry> {
        if self.entries.is_empty() {
            return None;
        }
        Some(&self.entries[rng.gen_range(0..self.entries.len())])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
