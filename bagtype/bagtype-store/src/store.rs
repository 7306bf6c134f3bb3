//! The typestore: a registry mapping canonical type names to descriptors.

use std::collections::{BTreeMap, HashSet};

use bagtype_core::{Descriptor, TypeName, TypeSysError};
use bagtype_idl::parse_idl_bundle;
use bagtype_msg::parse_msg_bundle;
use log::trace;

use crate::builtin::{Preset, catalog};
use crate::normalize::normalize;
use crate::{emit, hash};

/// Which grammar to parse registration text with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Msg,
    Idl,
}

/// Registry of canonical descriptors with hashing and emission.
///
/// Registered descriptors are immutable; a store is safe to share for
/// concurrent reads. Registration requires `&mut self`, so mutation is
/// serialized by the borrow checker.
#[derive(Debug, Clone, Default)]
pub struct Typestore {
    types: BTreeMap<String, Descriptor>,
}

impl Typestore {
    /// Create a store seeded with the given catalog.
    pub fn new(preset: Preset) -> Self {
        let mut types = BTreeMap::new();
        for desc in catalog(preset) {
            types.insert(desc.name.to_string(), desc);
        }
        Self { types }
    }

    /// Register a descriptor. Re-registering an identical descriptor is a
    /// no-op; a differing one fails with
    /// [`TypeSysError::TypeConflict`] — field order is part of identity.
    pub fn register(&mut self, desc: Descriptor) -> Result<(), TypeSysError> {
        match self.types.get(desc.name.as_str()) {
            Some(existing) if *existing == desc => Ok(()),
            Some(_) => Err(TypeSysError::TypeConflict {
                name: desc.name.to_string(),
            }),
            None => {
                trace!("registering type {}", desc.name);
                self.types.insert(desc.name.to_string(), desc);
                Ok(())
            }
        }
    }

    /// Parse definition text and register the primary type plus every
    /// dependency found in the bundle. All-or-nothing: a parse error or
    /// conflict anywhere leaves the store unchanged.
    ///
    /// `primary` names the first MSG section when it has no `MSG:` header;
    /// IDL sections are self-naming.
    pub fn register_text(
        &mut self,
        format: SchemaFormat,
        text: &str,
        primary: Option<&str>,
    ) -> Result<Vec<TypeName>, TypeSysError> {
        let primary_name = primary.map(TypeName::parse).transpose()?;
        let raws = match format {
            SchemaFormat::Msg => parse_msg_bundle(text, primary_name.as_ref())?,
            SchemaFormat::Idl => parse_idl_bundle(text)?,
        };

        // Namerefs resolve against the bundle's own members plus everything
        // already registered.
        let mut known: Vec<TypeName> = raws.iter().map(|r| r.name.clone()).collect();
        for name in self.types.keys() {
            known.push(TypeName::parse(name)?);
        }

        let mut descriptors = Vec::with_capacity(raws.len());
        for raw in raws {
            descriptors.push(normalize(raw, &known)?);
        }
        for desc in &descriptors {
            if let Some(existing) = self.types.get(desc.name.as_str())
                && existing != desc
            {
                return Err(TypeSysError::TypeConflict {
                    name: desc.name.to_string(),
                });
            }
        }

        let mut names = Vec::with_capacity(descriptors.len());
        for desc in descriptors {
            names.push(desc.name.clone());
            self.types.insert(desc.name.to_string(), desc);
        }
        trace!("registered {} types from text", names.len());
        Ok(names)
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.types.get(name)
    }

    /// Look up a descriptor, canonicalizing two-segment names.
    pub fn lookup(&self, name: &str) -> Result<&Descriptor, TypeSysError> {
        let canonical = TypeName::parse(name)?;
        self.types
            .get(canonical.as_str())
            .ok_or_else(|| TypeSysError::UnknownType {
                name: canonical.to_string(),
            })
    }

    /// Registered names in deterministic (sorted) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Transitive dependency closure in postorder: dependencies before
    /// dependents, the named root last. Reference cycles are rejected.
    pub fn closure(&self, name: &str) -> Result<Vec<&Descriptor>, TypeSysError> {
        let root = self.lookup(name)?;
        let mut order = Vec::new();
        let mut done: HashSet<&str> = HashSet::new();
        let mut visiting: HashSet<String> = HashSet::new();
        self.visit(root.name.as_str(), &mut order, &mut done, &mut visiting)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        order: &mut Vec<&'a Descriptor>,
        done: &mut HashSet<&'a str>,
        visiting: &mut HashSet<String>,
    ) -> Result<(), TypeSysError> {
        if done.contains(name) {
            return Ok(());
        }
        if !visiting.insert(name.to_string()) {
            return Err(TypeSysError::CyclicType {
                name: name.to_string(),
            });
        }
        let desc = self
            .types
            .get(name)
            .ok_or_else(|| TypeSysError::UnknownType {
                name: name.to_string(),
            })?;
        for dep in desc.named_deps() {
            self.visit(dep.as_str(), order, done, visiting)?;
        }
        visiting.remove(name);
        done.insert(desc.name.as_str());
        order.push(desc);
        Ok(())
    }

    /// wire1-compatible MD5 definition hash, as a 32-hex string.
    pub fn md5(&self, name: &str) -> Result<String, TypeSysError> {
        hash::md5_of(self, name)
    }

    /// Structural hash: `RIHS01_` followed by 64 hex digits.
    pub fn rihs01(&self, name: &str) -> Result<String, TypeSysError> {
        hash::rihs01_of(self, name)
    }

    /// Render the descriptor back to MSG text with appended dependency
    /// definitions.
    pub fn emit_msg(&self, name: &str) -> Result<String, TypeSysError> {
        emit::emit_msg(self, name)
    }
}
