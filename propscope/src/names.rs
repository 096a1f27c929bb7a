//! Name translator
//!
//! A [`NameMapping`] relates the canonical name of every property of a type
//! to its storage identifier, in both directions. Either form is accepted as
//! input; a canonical match takes precedence over a storage match.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::warn;

use crate::{
    delegate::DelegateFamily,
    fields::PropertySet,
    utils::error::{ProbeError, ProbeResult},
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct GatedAlias {
    suspected: DelegateFamily,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMapping {
    type_name: String,
    to_storage: HashMap<String, String>,
    to_canonical: HashMap<String, String>,
    ambiguous_canonical: BTreeMap<String, BTreeSet<String>>,
    ambiguous_storage: BTreeMap<String, BTreeSet<String>>,
    gated: HashMap<String, GatedAlias>,
}

fn claim(
    map: &mut HashMap<String, String>,
    ambiguous: &mut BTreeMap<String, BTreeSet<String>>,
    key: &str,
    value: &str,
) {
    match map.get(key) {
        Some(existing) if existing != value => {
            let candidates = ambiguous.entry(key.to_string()).or_default();
            candidates.insert(existing.clone());
            candidates.insert(value.to_string());
        }
        Some(_) => {}
        None => {
            map.insert(key.to_string(), value.to_string());
        }
    }
}

impl NameMapping {
    pub fn build(properties: &PropertySet) -> Self {
        let mut mapping = NameMapping {
            type_name: properties.type_name().to_string(),
            ..Default::default()
        };

        for property in properties {
            claim(
                &mut mapping.to_storage,
                &mut mapping.ambiguous_canonical,
                &property.canonical_name,
                &property.storage_name,
            );
            claim(
                &mut mapping.to_canonical,
                &mut mapping.ambiguous_storage,
                &property.storage_name,
                &property.canonical_name,
            );
        }

        for property in properties {
            let (Some(alias), Some(suspected)) = (&property.alias, property.suspected) else {
                continue;
            };
            if mapping.to_storage.contains_key(alias) || mapping.to_canonical.contains_key(alias) {
                continue;
            }
            mapping.gated.insert(
                alias.clone(),
                GatedAlias { suspected },
            );
        }

        let ambiguous = mapping.ambiguous_canonical.iter().chain(&mapping.ambiguous_storage);
        for (name, candidates) in ambiguous {
            warn!(
                "Name '{}' of {} maps to several fields: {:?}",
                name, mapping.type_name, candidates
            );
        }

        mapping
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of distinct canonical names.
    pub fn len(&self) -> usize {
        self.to_storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_storage.is_empty()
    }

    pub fn is_canonical(&self, name: &str) -> bool {
        self.to_storage.contains_key(name)
    }

    pub fn is_storage(&self, name: &str) -> bool {
        self.to_canonical.contains_key(name)
    }

    /// Normalizes `name` (canonical or storage form) to its storage identifier.
    pub fn to_storage_name(&self, name: &str) -> ProbeResult<String> {
        if let Some(storage) = self.to_storage.get(name) {
            self.check_unambiguous(&self.ambiguous_canonical, name)?;
            return Ok(storage.clone());
        }
        if self.to_canonical.contains_key(name) {
            self.check_unambiguous(&self.ambiguous_storage, name)?;
            return Ok(name.to_string());
        }
        Err(self.miss(name))
    }

    /// Normalizes `name` (canonical or storage form) to its canonical name.
    pub fn to_canonical_name(&self, name: &str) -> ProbeResult<String> {
        if self.to_storage.contains_key(name) {
            self.check_unambiguous(&self.ambiguous_canonical, name)?;
            return Ok(name.to_string());
        }
        if let Some(canonical) = self.to_canonical.get(name) {
            self.check_unambiguous(&self.ambiguous_storage, name)?;
            return Ok(canonical.clone());
        }
        Err(self.miss(name))
    }

    fn check_unambiguous(
        &self,
        ambiguous: &BTreeMap<String, BTreeSet<String>>,
        name: &str,
    ) -> ProbeResult<()> {
        match ambiguous.get(name) {
            Some(candidates) => Err(ProbeError::AmbiguousField {
                type_name: self.type_name.clone(),
                field: name.to_string(),
                candidates: candidates.iter().cloned().collect(),
            }),
            None => Ok(()),
        }
    }

    fn miss(&self, name: &str) -> ProbeError {
        match self.gated.get(name) {
            Some(gated) => ProbeError::CapabilityRequired {
                type_name: self.type_name.clone(),
                field: name.to_string(),
                suspected: gated.suspected,
            },
            None => ProbeError::UnknownField {
                type_name: self.type_name.clone(),
                field: name.to_string(),
            },
        }
    }
}
