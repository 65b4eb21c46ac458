// SPDX-License-Identifier: MIT

//! Explicit-sharing cache (§9 GLOSSARY): an id→string interner.
//!
//! The cyclic module-import graph the compiler produces shares strings by
//! id rather than by pointer, so no ownership cycle is ever formed and
//! diffs can ship integer ids instead of repeating strings on the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

pub type InternId = u32;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplicitSharingCache {
    strings: Vec<String>,
    index: HashMap<String, InternId>,
}

impl ExplicitSharingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `s`, interning it if this is the first occurrence.
    pub fn intern(&mut self, s: &str) -> InternId {
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = self.strings.len() as InternId;
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), id);
        id
    }

    pub fn get(&self, id: InternId) -> Option<&str> {
        self.strings.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

// Wire representation is just the ordered string table; the id→string
// index is a read-side accelerator rebuilt on deserialize, not part of
// the wire economy this type exists to provide.
impl Serialize for ExplicitSharingCache {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.strings.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExplicitSharingCache {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings = Vec::<String>::deserialize(deserializer)?;
        let index = strings.iter().enumerate().map(|(i, s)| (s.clone(), i as InternId)).collect();
        Ok(Self { strings, index })
    }
}

#[cfg(test)]
#[path = "interner_tests.rs"]
mod tests;
