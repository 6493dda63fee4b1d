//! Minimal XML tree used for catalog files.
//!
//! Only what catalogs need is modelled: elements with ordered attributes,
//! text, and comments. CDATA sections are folded into text. Declarations,
//! processing instructions and doctypes are dropped.

use quick_xml::{Reader, events::Event};

use crate::utils::natural_cmp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attributes minus the given names, in document order.
    pub fn attributes_except(&self, known: &[&str]) -> Vec<(String, String)> {
        self.attributes
            .iter()
            .filter(|(key, _)| !known.contains(&key.as_str()))
            .cloned()
            .collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated direct text children, without descending into elements.
    pub fn direct_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Parse a whole document and return its root element.
///
/// The error is a human readable reason, suitable for embedding in a
/// malformed-catalog message.
pub fn parse_document(text: &str) -> Result<XmlElement, String> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| format!("{} at byte {}", e, position))?;

        match event {
            Event::Start(start) => {
                let element = element_from(&start)?;
                if stack.is_empty() && root.is_some() {
                    return Err("extra content at the end of the document".to_string());
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, XmlNode::Element(element))?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err("unexpected closing tag".to_string());
                };
                attach(&mut stack, &mut root, XmlNode::Element(element))?;
            }
            Event::Text(raw) => {
                let text = raw.unescape().map_err(|e| e.to_string())?;
                match stack.last_mut() {
                    Some(parent) => push_text(parent, &text),
                    None if text.trim().is_empty() => {}
                    None => return Err("text outside of the root element".to_string()),
                }
            }
            Event::CData(raw) => {
                let text = String::from_utf8_lossy(&raw.into_inner()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &text);
                }
            }
            Event::Comment(raw) => {
                let text = String::from_utf8_lossy(&raw).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Comment(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("premature end of data in tag {}", open.name));
    }
    root.ok_or_else(|| "document is empty".to_string())
}

fn element_from(start: &quick_xml::events::BytesStart<'_>) -> Result<XmlElement, String> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| e.to_string())?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    node: XmlNode,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match node {
        XmlNode::Element(element) if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        _ => Err("extra content at the end of the document".to_string()),
    }
}

fn push_text(parent: &mut XmlElement, text: &str) {
    if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}

/// Escape `&`, `<`, `>` and `"` for text and attribute values.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `name="value"` pairs joined by spaces, in the given order.
pub fn format_attributes(attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .map(|(name, value)| format!("{}=\"{}\"", name, escape(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical rendering of a preserved node, one output line per entry.
///
/// Attributes are sorted naturally, whitespace-only text is dropped, an
/// element holding a single text node is written on one line and
/// everything else nests one level deeper per child.
pub fn render_node(node: &XmlNode, level: usize, tab_width: usize, lines: &mut Vec<String>) {
    let indent = indent(level, tab_width);
    match node {
        XmlNode::Text(text) => {
            let text = text.trim();
            if !text.is_empty() {
                lines.push(format!("{}{}", indent, escape(text)));
            }
        }
        XmlNode::Comment(text) => lines.push(format!("{}<!--{}-->", indent, text)),
        XmlNode::Element(element) => {
            let mut attributes = element.attributes.clone();
            attributes.sort_by(|(a, _), (b, _)| natural_cmp(a, b));
            let attributes = if attributes.is_empty() {
                String::new()
            } else {
                format!(" {}", format_attributes(&attributes))
            };

            let children: Vec<&XmlNode> = element
                .children
                .iter()
                .filter(|child| !matches!(child, XmlNode::Text(text) if text.trim().is_empty()))
                .collect();

            match children.as_slice() {
                [] => lines.push(format!("{}<{}{}/>", indent, element.name, attributes)),
                [XmlNode::Text(text)] => lines.push(format!(
                    "{}<{}{}>{}</{}>",
                    indent,
                    element.name,
                    attributes,
                    escape(text.trim()),
                    element.name
                )),
                children => {
                    lines.push(format!("{}<{}{}>", indent, element.name, attributes));
                    for child in children {
                        render_node(child, level + 1, tab_width, lines);
                    }
                    lines.push(format!("{}</{}>", indent, element.name));
                }
            }
        }
    }
}

pub fn indent(level: usize, tab_width: usize) -> String {
    " ".repeat(level * tab_width)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::core::catalog::xml::*;

    #[test]
    fn test_parse_document_tree() {
        let root = parse_document(
            r#"<?xml version="1.0"?>
<a x="1"><!-- hi --><b>one &amp; two</b><c/><d><![CDATA[<raw>]]></d></a>"#,
        )
        .unwrap();

        assert_eq!(root.name, "a");
        assert_eq!(root.attribute("x"), Some("1"));
        assert_eq!(root.children[0], XmlNode::Comment(" hi ".to_string()));
        let names: Vec<_> = root.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
        let b = root.child_elements().next().unwrap();
        assert_eq!(b.direct_text(), "one & two");
        let d = root.child_elements().nth(2).unwrap();
        assert_eq!(d.direct_text(), "<raw>");
    }

    #[test]
    fn test_parse_document_errors() {
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a>").is_err());
        assert!(parse_document("<a/><b/>").is_err());
        assert!(parse_document("   ").is_err());
        assert!(parse_document("<a x=\"1\" x=\"2\"/>").is_err());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a & <b> "c" 'd'"#), "a &amp; &lt;b&gt; &quot;c&quot; 'd'");
    }

    #[test]
    fn test_render_node_canonical() {
        let root = parse_document(
            r#"<header>
  <tool tool-version="1" Tool-id="x" />
  <note>  spaced  </note>
  <!--keep-->
</header>"#,
        )
        .unwrap();

        let mut lines = Vec::new();
        render_node(&XmlNode::Element(root), 1, 2, &mut lines);
        assert_eq!(
            lines,
            vec![
                "  <header>",
                "    <tool Tool-id=\"x\" tool-version=\"1\"/>",
                "    <note>spaced</note>",
                "    <!--keep-->",
                "  </header>",
            ]
        );
    }

    #[test]
    fn test_render_mixed_content() {
        let root = parse_document("<p>Hello <b>world</b> again</p>").unwrap();
        let mut lines = Vec::new();
        render_node(&XmlNode::Element(root), 0, 2, &mut lines);
        assert_eq!(lines, vec!["<p>", "  Hello", "  <b>world</b>", "  again", "</p>"]);
    }
}
