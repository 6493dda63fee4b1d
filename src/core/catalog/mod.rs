//! XLIFF 1.2 catalog model.
//!
//! A catalog is read into a [`CatalogDocument`] that keeps enough structure
//! to render unrecognized content back in place: body order, unknown
//! attributes, and opaque element trees.

pub mod path;
pub mod reader;
pub mod writer;
pub mod xml;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::key::plural_form_id;
pub use xml::{XmlElement, XmlNode};

pub const PLURAL_RESTYPE: &str = "x-gettext-plurals";
pub const NOTE_AUTHOR: &str = "l10nguy";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unable to read catalog file \"{}\".", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Catalog file \"{}\" is empty.", path.display())]
    Empty { path: PathBuf },
    #[error("Catalog file \"{}\" contains malformed XML ({reason}).", path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("Catalog \"{}\" contains group nodes that are currently unsupported.", path.display())]
    UnsupportedStructure { path: PathBuf },
    #[error("Unable to write catalog file \"{}\".", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// The catalog file the error is about.
    pub fn path(&self) -> &Path {
        match self {
            CatalogError::Unreadable { path, .. }
            | CatalogError::Empty { path }
            | CatalogError::Malformed { path, .. }
            | CatalogError::UnsupportedStructure { path }
            | CatalogError::Write { path, .. } => path,
        }
    }
}

/// Raw `<file>` metadata. `None` means the attribute was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogMetadata {
    pub product_name: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub original: Option<String>,
    pub datatype: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogDocument {
    pub metadata: CatalogMetadata,
    /// `<file>` attributes other than the metadata ones.
    pub file_attributes: Vec<(String, String)>,
    /// Non-body children of `<file>`, such as `<header>`.
    pub file_children: Vec<XmlNode>,
    pub body: Vec<BodyNode>,
    pub units: IndexMap<String, CatalogUnit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyNode {
    Unit(String),
    Opaque(XmlNode),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogUnit {
    Single(TransUnit),
    Plural(PluralGroup),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransUnit {
    pub source: Option<String>,
    pub target: Option<String>,
    /// `state` attribute of `<target>`.
    pub state: Option<String>,
    /// Unit attributes other than `id` and `xml:space`.
    pub attributes: Vec<(String, String)>,
    pub source_attributes: Vec<(String, String)>,
    /// `<target>` attributes other than `state`.
    pub target_attributes: Vec<(String, String)>,
    pub children: Vec<UnitChild>,
    pub has_source: bool,
    pub has_target: bool,
    /// Notes generated for this unit, written after the children.
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitChild {
    Source,
    Target,
    Opaque(XmlNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub from: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluralGroup {
    pub restype: String,
    pub attributes: Vec<(String, String)>,
    pub forms: BTreeMap<usize, TransUnit>,
    pub children: Vec<GroupChild>,
}

impl Default for PluralGroup {
    fn default() -> Self {
        Self {
            restype: PLURAL_RESTYPE.to_string(),
            attributes: Vec::new(),
            forms: BTreeMap::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupChild {
    Form(usize),
    Opaque(XmlNode),
}

impl CatalogDocument {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Every concrete unit, plural forms expanded to `<base>[<n>]`.
    pub fn concrete_units(&self) -> Vec<(String, &TransUnit)> {
        let mut units = Vec::new();
        for (id, unit) in &self.units {
            match unit {
                CatalogUnit::Single(unit) => units.push((id.clone(), unit)),
                CatalogUnit::Plural(group) => {
                    for (index, form) in &group.forms {
                        units.push((plural_form_id(id, *index), form));
                    }
                }
            }
        }
        units
    }

    /// Look up a concrete id, resolving `<base>[<n>]` into plural forms.
    pub fn find_unit(&self, id: &str) -> Option<&TransUnit> {
        if let Some(CatalogUnit::Single(unit)) = self.units.get(id) {
            return Some(unit);
        }
        let (base, index) = crate::core::key::split_plural_form(id)?;
        match self.units.get(base)? {
            CatalogUnit::Plural(group) => group.forms.get(&index),
            CatalogUnit::Single(_) => None,
        }
    }
}
