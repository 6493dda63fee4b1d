//! Canonical catalog rendering and in-place edits.

use std::{fs, path::Path};

use crate::{
    core::{
        catalog::{
            BodyNode, CatalogDocument, CatalogError, CatalogMetadata, CatalogUnit, GroupChild,
            PluralGroup, TransUnit, UnitChild,
            xml::{escape, format_attributes, indent, render_node},
        },
        key::{plural_form_id, split_plural_form},
    },
    utils::natural_cmp,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const XLIFF_OPEN: &str = r#"<xliff xmlns="urn:oasis:names:tc:xliff:document:1.2" version="1.2">"#;

/// `<file>` metadata with defaults applied for one package and locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub product_name: String,
    pub source_language: String,
    pub target_language: Option<String>,
    pub original: String,
    pub datatype: String,
}

impl ResolvedMetadata {
    pub fn resolve(metadata: &CatalogMetadata, package_key: &str, locale: &str) -> Self {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        let source_language = non_empty(&metadata.source_language).unwrap_or_else(|| "en".to_string());
        let target_language = metadata.target_language.clone().or_else(|| {
            (!source_language.eq_ignore_ascii_case(locale)).then(|| locale.to_string())
        });

        Self {
            product_name: non_empty(&metadata.product_name)
                .unwrap_or_else(|| package_key.to_string()),
            source_language,
            target_language,
            original: metadata.original.clone().unwrap_or_default(),
            datatype: metadata
                .datatype
                .clone()
                .unwrap_or_else(|| "plaintext".to_string()),
        }
    }

    /// Whether units written for `locale` get a `<target>`.
    pub fn writes_target(&self, locale: &str) -> bool {
        self.target_language.as_deref().is_some_and(|t| !t.is_empty())
            || !self.source_language.eq_ignore_ascii_case(locale)
    }

    fn attributes(&self) -> Vec<(String, String)> {
        let mut attributes = vec![
            ("original".to_string(), self.original.clone()),
            ("product-name".to_string(), self.product_name.clone()),
            ("source-language".to_string(), self.source_language.clone()),
            ("datatype".to_string(), self.datatype.clone()),
        ];
        if let Some(target) = self.target_language.as_ref().filter(|t| !t.is_empty()) {
            attributes.push(("target-language".to_string(), target.clone()));
        }
        attributes
    }
}

/// Renders documents in the canonical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogRenderer {
    pub tab_width: usize,
    pub order_by_id: bool,
}

impl Default for CatalogRenderer {
    fn default() -> Self {
        Self {
            tab_width: 2,
            order_by_id: false,
        }
    }
}

impl CatalogRenderer {
    pub fn new(tab_width: usize, order_by_id: bool) -> Self {
        Self {
            tab_width,
            order_by_id,
        }
    }

    fn indent(&self, level: usize) -> String {
        indent(level, self.tab_width)
    }

    pub fn render(&self, document: &CatalogDocument, metadata: &ResolvedMetadata) -> String {
        let mut file_attributes = metadata.attributes();
        merge_attributes(&mut file_attributes, &document.file_attributes);

        let mut lines = vec![
            XML_DECLARATION.to_string(),
            XLIFF_OPEN.to_string(),
            format!("{}<file {}>", self.indent(1), format_attributes(&file_attributes)),
        ];
        for child in &document.file_children {
            render_node(child, 2, self.tab_width, &mut lines);
        }
        lines.push(format!("{}<body>", self.indent(2)));

        let mut rendered: Vec<&str> = Vec::new();
        for node in &document.body {
            match node {
                BodyNode::Opaque(node) => render_node(node, 3, self.tab_width, &mut lines),
                BodyNode::Unit(_) if self.order_by_id => {}
                BodyNode::Unit(id) => {
                    if rendered.contains(&id.as_str()) {
                        continue;
                    }
                    if let Some(unit) = document.units.get(id) {
                        self.render_unit(id, unit, &mut lines);
                        rendered.push(id);
                    }
                }
            }
        }

        let mut remaining: Vec<&String> = document
            .units
            .keys()
            .filter(|id| !rendered.contains(&id.as_str()))
            .collect();
        remaining.sort_by(|a, b| natural_cmp(a, b));
        for id in remaining {
            self.render_unit(id, &document.units[id], &mut lines);
        }

        lines.push(format!("{}</body>", self.indent(2)));
        lines.push(format!("{}</file>", self.indent(1)));
        lines.push("</xliff>".to_string());

        let mut output = lines.join("\n");
        output.push('\n');
        output
    }

    fn render_unit(&self, id: &str, unit: &CatalogUnit, lines: &mut Vec<String>) {
        match unit {
            CatalogUnit::Single(unit) => self.render_trans_unit(id, unit, 3, lines),
            CatalogUnit::Plural(group) => self.render_plural_group(id, group, lines),
        }
    }

    fn render_plural_group(&self, id: &str, group: &PluralGroup, lines: &mut Vec<String>) {
        let mut attributes = vec![
            ("id".to_string(), id.to_string()),
            ("restype".to_string(), group.restype.clone()),
        ];
        merge_attributes(&mut attributes, &group.attributes);
        lines.push(format!(
            "{}<group {}>",
            self.indent(3),
            format_attributes(&attributes)
        ));

        let mut rendered: Vec<usize> = Vec::new();
        for child in &group.children {
            match child {
                GroupChild::Opaque(node) => render_node(node, 4, self.tab_width, lines),
                GroupChild::Form(_) if self.order_by_id => {}
                GroupChild::Form(index) => {
                    if let Some(form) = group.forms.get(index)
                        && !rendered.contains(index)
                    {
                        self.render_trans_unit(&plural_form_id(id, *index), form, 4, lines);
                        rendered.push(*index);
                    }
                }
            }
        }
        for (index, form) in &group.forms {
            if !rendered.contains(index) {
                self.render_trans_unit(&plural_form_id(id, *index), form, 4, lines);
            }
        }

        lines.push(format!("{}</group>", self.indent(3)));
    }

    fn render_trans_unit(&self, id: &str, unit: &TransUnit, level: usize, lines: &mut Vec<String>) {
        let mut attributes = vec![
            ("id".to_string(), id.to_string()),
            ("xml:space".to_string(), "preserve".to_string()),
        ];
        merge_attributes(&mut attributes, &unit.attributes);
        lines.push(format!(
            "{}<trans-unit {}>",
            self.indent(level),
            format_attributes(&attributes)
        ));

        let default_children;
        let children = if unit.children.is_empty() {
            default_children = if unit.target.as_deref().is_some_and(|t| !t.is_empty()) {
                vec![UnitChild::Source, UnitChild::Target]
            } else {
                vec![UnitChild::Source]
            };
            &default_children
        } else {
            &unit.children
        };

        let inner = self.indent(level + 1);
        for child in children {
            match child {
                UnitChild::Source => lines.push(format!(
                    "{}<source{}>{}</source>",
                    inner,
                    optional_attributes(&unit.source_attributes),
                    escape(unit.source.as_deref().unwrap_or_default())
                )),
                UnitChild::Target => {
                    let target = unit.target.as_deref().unwrap_or_default();
                    if !unit.has_target && target.is_empty() {
                        continue;
                    }
                    let mut attributes = Vec::new();
                    if let Some(state) = &unit.state {
                        attributes.push(("state".to_string(), state.clone()));
                    }
                    merge_attributes(&mut attributes, &unit.target_attributes);
                    lines.push(format!(
                        "{}<target{}>{}</target>",
                        inner,
                        optional_attributes(&attributes),
                        escape(target)
                    ));
                }
                UnitChild::Opaque(node) => render_node(node, level + 1, self.tab_width, lines),
            }
        }

        for note in &unit.notes {
            let attributes: Vec<(String, String)> = note
                .from
                .iter()
                .map(|from| ("from".to_string(), from.clone()))
                .collect();
            lines.push(format!(
                "{}<note{}>{}</note>",
                inner,
                optional_attributes(&attributes),
                escape(&note.content)
            ));
        }

        lines.push(format!("{}</trans-unit>", self.indent(level)));
    }

    /// Render the catalog at `path` and compare it with what is on disk.
    ///
    /// Returns `true` when the file is already canonical. A dirty file is
    /// rewritten when `apply` is set.
    pub fn check_format(
        &self,
        path: &Path,
        package_key: &str,
        locale: &str,
        apply: bool,
    ) -> Result<bool, CatalogError> {
        let document = CatalogDocument::load(path)?;
        let metadata = ResolvedMetadata::resolve(&document.metadata, package_key, locale);
        let rendered = self.render(&document, &metadata);
        let current = fs::read(path).unwrap_or_default();

        if rendered.as_bytes() == current.as_slice() {
            return Ok(true);
        }
        if apply {
            persist(path, &rendered)?;
        }
        Ok(false)
    }
}

/// Append attributes whose names are not present yet.
fn merge_attributes(attributes: &mut Vec<(String, String)>, unknown: &[(String, String)]) {
    for (name, value) in unknown {
        if !attributes.iter().any(|(existing, _)| existing == name) {
            attributes.push((name.clone(), value.clone()));
        }
    }
}

fn optional_attributes(attributes: &[(String, String)]) -> String {
    if attributes.is_empty() {
        String::new()
    } else {
        format!(" {}", format_attributes(attributes))
    }
}

/// Write the whole file, creating parent directories as needed.
pub fn persist(path: &Path, contents: &str) -> Result<(), CatalogError> {
    let write_error = |source| CatalogError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, contents).map_err(write_error)
}

impl CatalogDocument {
    /// Add a unit unless its id is already present.
    ///
    /// `<base>[<n>]` ids become forms of the plural group `<base>`, created
    /// on demand. A plain id naming an existing plural group fills form 0.
    /// Returns whether the document changed.
    pub fn insert_unit(&mut self, id: &str, unit: TransUnit) -> bool {
        if id.is_empty() {
            return false;
        }

        if let Some((base, index)) = split_plural_form(id) {
            let entry = self
                .units
                .entry(base.to_string())
                .or_insert_with(|| CatalogUnit::Plural(PluralGroup::default()));
            return match entry {
                CatalogUnit::Plural(group) => insert_form(group, index, unit),
                CatalogUnit::Single(_) => false,
            };
        }

        match self.units.get_mut(id) {
            Some(CatalogUnit::Plural(group)) => insert_form(group, 0, unit),
            Some(CatalogUnit::Single(_)) => false,
            None => {
                self.units.insert(id.to_string(), CatalogUnit::Single(unit));
                true
            }
        }
    }

    /// Remove a unit, or a single plural form. A plural group left without
    /// forms is removed too. Returns whether the document changed.
    pub fn remove_unit(&mut self, id: &str) -> bool {
        if let Some((base, index)) = split_plural_form(id)
            && let Some(CatalogUnit::Plural(group)) = self.units.get_mut(base)
        {
            if group.forms.remove(&index).is_none() {
                return false;
            }
            group
                .children
                .retain(|child| !matches!(child, GroupChild::Form(i) if *i == index));
            if group.forms.is_empty() {
                self.drop_unit(base);
            }
            return true;
        }

        if self.units.contains_key(id) {
            self.drop_unit(id);
            return true;
        }
        false
    }

    fn drop_unit(&mut self, id: &str) {
        self.units.shift_remove(id);
        self.body
            .retain(|node| !matches!(node, BodyNode::Unit(unit) if unit == id));
    }
}

fn insert_form(group: &mut PluralGroup, index: usize, unit: TransUnit) -> bool {
    if group.forms.contains_key(&index) {
        return false;
    }
    group.forms.insert(index, unit);
    group.children.push(GroupChild::Form(index));
    true
}
