//! A small element tree built from quick-xml events.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str::FromStr;

#[derive(Debug, Clone, Default)]
pub(crate) struct XmlNode {
    pub name: String,
    attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    text: String,
}

impl XmlNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute parsed as `V`; `None` when missing or malformed.
    pub fn parse_attr<V: FromStr>(&self, name: &str) -> Option<V> {
        self.attr(name).and_then(|v| v.trim().parse().ok())
    }

    pub fn attr_or<V: FromStr>(&self, name: &str, default: V) -> V {
        self.parse_attr(name).unwrap_or(default)
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Character data directly inside this element, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }
}

fn start_node(e: &BytesStart<'_>) -> Result<XmlNode, String> {
    let mut node = XmlNode {
        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attr in e.attributes() {
        let attr = attr.map_err(|e| format!("bad attribute: {e}"))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| format!("bad attribute value for `{key}`: {e}"))?;
        node.attrs.push((key, value.into_owned()));
    }
    Ok(node)
}

/// Parses `text` and returns its root element.
pub(crate) fn parse_document(text: &str) -> Result<XmlNode, String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let finished = match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(start_node(&e)?);
                None
            }
            Ok(Event::Empty(e)) => Some(start_node(&e)?),
            Ok(Event::End(_)) => stack.pop(),
            Ok(Event::Text(t)) => {
                let t = t.unescape().map_err(|e| format!("bad text: {e}"))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t);
                }
                None
            }
            Ok(Event::CData(c)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
                None
            }
            Ok(Event::Eof) => break,
            Ok(_) => None,
            Err(e) => {
                return Err(format!(
                    "error at position {}: {e}",
                    reader.error_position()
                ))
            }
        };

        if let Some(node) = finished {
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None if root.is_none() => root = Some(node),
                None => return Err("more than one root element".into()),
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document inside <{}>", open.name));
    }
    root.ok_or_else(|| "document has no root element".into())
}
