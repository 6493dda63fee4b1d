//! Catalog file reader.

use std::{fs, io::ErrorKind, path::Path};

use crate::core::{
    catalog::{
        BodyNode, CatalogDocument, CatalogError, CatalogMetadata, CatalogUnit, GroupChild,
        PLURAL_RESTYPE, PluralGroup, TransUnit, UnitChild,
        xml::{XmlElement, XmlNode, parse_document},
    },
    key::split_plural_form,
};

const METADATA_ATTRIBUTES: [&str; 5] = [
    "product-name",
    "source-language",
    "target-language",
    "original",
    "datatype",
];

impl CatalogDocument {
    /// Read a catalog file. A file that does not exist reads as an empty
    /// document so callers can create it.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(CatalogError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(path, &contents)
    }

    /// Parse catalog text. `path` is only used in error messages.
    pub fn parse(path: &Path, contents: &str) -> Result<Self, CatalogError> {
        if contents.trim().is_empty() {
            return Err(CatalogError::Empty {
                path: path.to_path_buf(),
            });
        }

        let root = parse_document(contents).map_err(|reason| CatalogError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;

        let mut document = CatalogDocument::default();
        let Some(file) = root.child_elements().find(|e| e.name == "file") else {
            return Ok(document);
        };

        document.metadata = CatalogMetadata {
            product_name: file.attribute("product-name").map(str::to_string),
            source_language: file.attribute("source-language").map(str::to_string),
            target_language: file.attribute("target-language").map(str::to_string),
            original: file.attribute("original").map(str::to_string),
            datatype: file.attribute("datatype").map(str::to_string),
        };
        document.file_attributes = file.attributes_except(&METADATA_ATTRIBUTES);

        for child in file.child_elements().filter(|e| e.name != "body") {
            document.file_children.push(XmlNode::Element(child.clone()));
        }

        let Some(body) = file.child_elements().find(|e| e.name == "body") else {
            return Ok(document);
        };

        for node in &body.children {
            match node {
                XmlNode::Text(_) => {}
                XmlNode::Comment(_) => document.body.push(BodyNode::Opaque(node.clone())),
                XmlNode::Element(element) => read_body_element(&mut document, element, path)?,
            }
        }

        Ok(document)
    }
}

fn read_body_element(
    document: &mut CatalogDocument,
    element: &XmlElement,
    path: &Path,
) -> Result<(), CatalogError> {
    let opaque = || BodyNode::Opaque(XmlNode::Element(element.clone()));

    let Some(id) = element.attribute("id") else {
        document.body.push(opaque());
        return Ok(());
    };
    if document.units.contains_key(id) {
        document.body.push(opaque());
        return Ok(());
    }

    let unit = match element.name.as_str() {
        "trans-unit" => CatalogUnit::Single(read_trans_unit(element)),
        "group" if element.attribute("restype") == Some(PLURAL_RESTYPE) => {
            CatalogUnit::Plural(read_plural_group(element, id, path)?)
        }
        _ => {
            document.body.push(opaque());
            return Ok(());
        }
    };

    document.units.insert(id.to_string(), unit);
    document.body.push(BodyNode::Unit(id.to_string()));
    Ok(())
}

fn read_trans_unit(element: &XmlElement) -> TransUnit {
    let mut unit = TransUnit {
        attributes: element.attributes_except(&["id", "xml:space"]),
        ..Default::default()
    };

    for node in &element.children {
        match node {
            XmlNode::Text(_) => {}
            XmlNode::Element(child) if child.name == "source" => {
                unit.has_source = true;
                unit.source = Some(child.direct_text());
                unit.source_attributes = child.attributes.clone();
                unit.children.push(UnitChild::Source);
            }
            XmlNode::Element(child) if child.name == "target" => {
                unit.has_target = true;
                unit.target = Some(child.direct_text());
                unit.state = child.attribute("state").map(str::to_string);
                unit.target_attributes = child.attributes_except(&["state"]);
                unit.children.push(UnitChild::Target);
            }
            other => unit.children.push(UnitChild::Opaque(other.clone())),
        }
    }

    unit
}

fn read_plural_group(
    element: &XmlElement,
    id: &str,
    path: &Path,
) -> Result<PluralGroup, CatalogError> {
    let unsupported = || CatalogError::UnsupportedStructure {
        path: path.to_path_buf(),
    };

    let mut group = PluralGroup {
        restype: PLURAL_RESTYPE.to_string(),
        attributes: element.attributes_except(&["id", "restype"]),
        ..Default::default()
    };

    for node in &element.children {
        match node {
            XmlNode::Text(_) => {}
            XmlNode::Element(child) if child.name == "group" => return Err(unsupported()),
            XmlNode::Element(child) if child.name == "trans-unit" => {
                let index = child
                    .attribute("id")
                    .and_then(split_plural_form)
                    .filter(|(base, _)| *base == id)
                    .map(|(_, index)| index)
                    .ok_or_else(unsupported)?;
                if group.forms.contains_key(&index) {
                    return Err(unsupported());
                }
                group.forms.insert(index, read_trans_unit(child));
                group.children.push(GroupChild::Form(index));
            }
            other => group.children.push(GroupChild::Opaque(other.clone())),
        }
    }

    Ok(group)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::core::catalog::*;

    fn parse(text: &str) -> Result<CatalogDocument, CatalogError> {
        CatalogDocument::parse(&PathBuf::from("/p/de/Main.xlf"), text)
    }

    const CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff xmlns="urn:oasis:names:tc:xliff:document:1.2" version="1.2">
  <file original="" product-name="Acme.Site" source-language="en" datatype="plaintext" target-language="de" tool="x">
    <header>
      <note>Keep me</note>
    </header>
    <body>
      <trans-unit id="cards.title" xml:space="preserve" approved="yes">
        <source>Hello {name}</source>
        <target state="translated" xml:lang="de">Hallo {name}</target>
        <note>Context</note>
      </trans-unit>
      <group id="cards.count" restype="x-gettext-plurals">
        <trans-unit id="cards.count[0]" xml:space="preserve">
          <source>One card</source>
        </trans-unit>
        <trans-unit id="cards.count[1]" xml:space="preserve">
          <source>{count} cards</source>
        </trans-unit>
      </group>
      <group id="misc">
        <trans-unit id="misc.a">
          <source>A</source>
        </trans-unit>
      </group>
    </body>
  </file>
</xliff>
"#;

    #[test]
    fn test_parse_metadata_and_file_structure() {
        let document = parse(CATALOG).unwrap();

        assert_eq!(document.metadata.product_name.as_deref(), Some("Acme.Site"));
        assert_eq!(document.metadata.source_language.as_deref(), Some("en"));
        assert_eq!(document.metadata.target_language.as_deref(), Some("de"));
        assert_eq!(document.metadata.original.as_deref(), Some(""));
        assert_eq!(document.metadata.datatype.as_deref(), Some("plaintext"));
        assert_eq!(
            document.file_attributes,
            vec![("tool".to_string(), "x".to_string())]
        );
        assert_eq!(document.file_children.len(), 1);
    }

    #[test]
    fn test_parse_trans_unit() {
        let document = parse(CATALOG).unwrap();
        let Some(CatalogUnit::Single(unit)) = document.units.get("cards.title") else {
            panic!("expected a single unit");
        };

        assert_eq!(unit.source.as_deref(), Some("Hello {name}"));
        assert_eq!(unit.target.as_deref(), Some("Hallo {name}"));
        assert_eq!(unit.state.as_deref(), Some("translated"));
        assert_eq!(
            unit.attributes,
            vec![("approved".to_string(), "yes".to_string())]
        );
        assert_eq!(
            unit.target_attributes,
            vec![("xml:lang".to_string(), "de".to_string())]
        );
        assert!(unit.has_source && unit.has_target);
        assert_eq!(unit.children.len(), 3);
        assert!(matches!(unit.children[2], UnitChild::Opaque(_)));
    }

    #[test]
    fn test_parse_body_order_and_plural_group() {
        let document = parse(CATALOG).unwrap();

        assert_eq!(document.body.len(), 3);
        assert_eq!(document.body[0], BodyNode::Unit("cards.title".to_string()));
        assert_eq!(document.body[1], BodyNode::Unit("cards.count".to_string()));
        assert!(matches!(document.body[2], BodyNode::Opaque(_)));

        let Some(CatalogUnit::Plural(group)) = document.units.get("cards.count") else {
            panic!("expected a plural group");
        };
        assert_eq!(group.forms.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(group.forms[&1].source.as_deref(), Some("{count} cards"));

        let ids: Vec<_> = document.concrete_units().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["cards.title", "cards.count[0]", "cards.count[1]"]);
    }

    #[test]
    fn test_malformed_plural_group_is_unsupported() {
        let text = r#"<xliff><file><body>
<group id="cards" restype="x-gettext-plurals"><trans-unit id="other[0]"><source>x</source></trans-unit></group>
</body></file></xliff>"#;
        assert!(matches!(
            parse(text),
            Err(CatalogError::UnsupportedStructure { .. })
        ));

        let nested = r#"<xliff><file><body>
<group id="cards" restype="x-gettext-plurals"><group id="inner"/></group>
</body></file></xliff>"#;
        let error = parse(nested).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Catalog \"/p/de/Main.xlf\" contains group nodes that are currently unsupported."
        );
    }

    #[test]
    fn test_empty_and_malformed_files() {
        assert!(matches!(parse("  \n"), Err(CatalogError::Empty { .. })));
        assert!(matches!(
            parse("<xliff><file>"),
            Err(CatalogError::Malformed { .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_keep_first_unit() {
        let text = r#"<xliff><file><body>
<trans-unit id="a"><source>first</source></trans-unit>
<trans-unit id="a"><source>second</source></trans-unit>
</body></file></xliff>"#;
        let document = parse(text).unwrap();
        assert_eq!(document.units.len(), 1);
        assert_eq!(document.find_unit("a").unwrap().source.as_deref(), Some("first"));
        assert!(matches!(document.body[1], BodyNode::Opaque(_)));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let document = CatalogDocument::load(&dir.path().join("nope.xlf")).unwrap();
        assert!(document.is_empty());
        assert_eq!(document.metadata, CatalogMetadata::default());
    }
}
