use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::limits::*;

/// One bookable inventory unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Max concurrent bookings. 0 means permanently full.
    pub capacity: u32,
}

impl SlotDefinition {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            capacity,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }
}

/// A recorded label that fans out to several canonical slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    pub label: String,
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    EmptyName,
    NameTooLong(String),
    TooManySlots(usize),
    DuplicateSlot(String),
    /// A recorded name claimed by two different entries.
    DuplicateAlias { name: String, first: String, second: String },
    EmptyExpansion(String),
    UnknownExpansionTarget { label: String, slot: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::EmptyName => write!(f, "slot names and aliases must not be empty"),
            CatalogError::NameTooLong(name) => {
                write!(f, "name longer than {MAX_NAME_LEN} bytes: {name}")
            }
            CatalogError::TooManySlots(n) => {
                write!(f, "{n} slots configured, at most {MAX_SLOTS} allowed")
            }
            CatalogError::DuplicateSlot(name) => write!(f, "duplicate canonical slot: {name}"),
            CatalogError::DuplicateAlias {
                name,
                first,
                second,
            } => write!(f, "name '{name}' maps to both '{first}' and '{second}'"),
            CatalogError::EmptyExpansion(label) => {
                write!(f, "expansion '{label}' lists no slots")
            }
            CatalogError::UnknownExpansionTarget { label, slot } => {
                write!(f, "expansion '{label}' refers to unknown slot '{slot}'")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// The slot list plus its alias and expansion tables.
///
/// Only explicit entries collapse names: "사이드배너1" and "사이드배너2" stay
/// separate slots however similar they look.
#[derive(Debug, Clone)]
pub struct SlotCatalog {
    slots: Vec<SlotDefinition>,
    expansions: Vec<Expansion>,
    /// Recorded name → indices into `slots`.
    lookup: HashMap<String, Vec<usize>>,
}

impl SlotCatalog {
    pub fn new(slots: Vec<SlotDefinition>, expansions: Vec<Expansion>) -> Result<Self, CatalogError> {
        if slots.len() > MAX_SLOTS {
            return Err(CatalogError::TooManySlots(slots.len()));
        }

        let mut lookup: HashMap<String, Vec<usize>> = HashMap::new();
        // Which entry claimed a recorded name, for error messages.
        let mut owner: HashMap<String, String> = HashMap::new();

        for (idx, slot) in slots.iter().enumerate() {
            let name = check_name(&slot.name)?;
            if lookup.contains_key(name) {
                return Err(CatalogError::DuplicateSlot(name.to_string()));
            }
            lookup.insert(name.to_string(), vec![idx]);
            owner.insert(name.to_string(), name.to_string());
            if slot.capacity == 0 {
                warn!("slot '{name}' has capacity 0 and will always be full");
            }
        }

        for (idx, slot) in slots.iter().enumerate() {
            let canonical = slot.name.trim();
            for alias in &slot.aliases {
                let alias = check_name(alias)?;
                if alias == canonical {
                    continue;
                }
                if let Some(first) = owner.get(alias) {
                    if first == canonical && lookup.get(alias) == Some(&vec![idx]) {
                        continue;
                    }
                    return Err(CatalogError::DuplicateAlias {
                        name: alias.to_string(),
                        first: first.clone(),
                        second: canonical.to_string(),
                    });
                }
                lookup.insert(alias.to_string(), vec![idx]);
                owner.insert(alias.to_string(), canonical.to_string());
            }
        }

        for expansion in &expansions {
            let label = check_name(&expansion.label)?;
            if expansion.slots.is_empty() {
                return Err(CatalogError::EmptyExpansion(label.to_string()));
            }
            if let Some(first) = owner.get(label) {
                return Err(CatalogError::DuplicateAlias {
                    name: label.to_string(),
                    first: first.clone(),
                    second: format!("expansion '{label}'"),
                });
            }
            let mut targets = Vec::with_capacity(expansion.slots.len());
            for target in &expansion.slots {
                let idx = slots
                    .iter()
                    .position(|s| s.name.trim() == target.trim())
                    .ok_or_else(|| CatalogError::UnknownExpansionTarget {
                        label: label.to_string(),
                        slot: target.clone(),
                    })?;
                if !targets.contains(&idx) {
                    targets.push(idx);
                }
            }
            lookup.insert(label.to_string(), targets);
            owner.insert(label.to_string(), format!("expansion '{label}'"));
        }

        Ok(Self {
            slots,
            expansions,
            lookup,
        })
    }

    /// Canonical slots a recorded name counts against. Empty when unrecognised.
    pub fn normalize(&self, raw: &str) -> BTreeSet<&str> {
        self.resolve(raw)
            .iter()
            .map(|&idx| self.slots[idx].name.trim())
            .collect()
    }

    /// Index form of `normalize`, in declaration order.
    pub(crate) fn resolve(&self, raw: &str) -> &[usize] {
        self.lookup.get(raw.trim()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn index_of(&self, canonical: &str) -> Option<usize> {
        let canonical = canonical.trim();
        self.slots.iter().position(|s| s.name.trim() == canonical)
    }

    pub(crate) fn slot_at(&self, idx: usize) -> &SlotDefinition {
        &self.slots[idx]
    }

    pub fn is_known(&self, raw: &str) -> bool {
        !self.resolve(raw).is_empty()
    }

    /// Canonical slot by its canonical name only (aliases are not followed).
    pub fn get(&self, canonical: &str) -> Option<&SlotDefinition> {
        self.index_of(canonical).map(|idx| &self.slots[idx])
    }

    pub fn capacity_of(&self, canonical: &str) -> Option<u32> {
        self.get(canonical).map(|s| s.capacity)
    }

    /// Slots in declaration order.
    pub fn slots(&self) -> &[SlotDefinition] {
        &self.slots
    }

    pub fn expansions(&self) -> &[Expansion] {
        &self.expansions
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn check_name(raw: &str) -> Result<&str, CatalogError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CatalogError::NameTooLong(name.to_string()));
    }
    Ok(name)
}
