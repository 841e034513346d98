use std::fs;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, info, warn};

use crate::collab::{SchemaValidator, StylesheetProcessor};
use crate::error::{Error, Result};
use crate::json::JsonDocument;
use crate::tree::{Mapping, Node};
use crate::xpath;

/// Tree-store key holding an element's attributes.
pub const ATTRIBUTES_KEY: &str = "@attributes";
/// Tree-store key holding an element's text when it also has attributes or children.
pub const TEXT_KEY: &str = "#text";

#[derive(Debug, Clone, PartialEq)]
pub struct XmlOpts {
    /// Name of the root element of a fresh document.
    pub root_name: String,
    /// Spaces per nesting level in pretty output.
    pub indent: usize,
}

impl Default for XmlOpts {
    fn default() -> Self {
        Self {
            root_name: "library".to_string(),
            indent: 2,
        }
    }
}

/// An XML element. Text is stored unescaped; same-named siblings are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text_content(&self) -> String {
        xpath::string_value(self)
    }
}

/// Handle to an element: the child-index path from the root element.
///
/// Handles order by document position. Structural edits (deletes) may leave
/// older handles pointing elsewhere or nowhere; a dangling handle yields
/// [`Error::StaleElement`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementRef(Vec<usize>);

impl ElementRef {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    fn child(&self, index: usize) -> Self {
        let mut p = self.0.clone();
        p.push(index);
        Self(p)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: Element,
    opts: XmlOpts,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// An empty `<library/>` document.
    pub fn new() -> Self {
        Self::with_opts(XmlOpts::default())
    }

    pub fn with_opts(opts: XmlOpts) -> Self {
        Self {
            root: Element::new(opts.root_name.clone()),
            opts,
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, XmlOpts::default())
    }

    pub fn parse_with(text: &str, opts: XmlOpts) -> Result<Self> {
        let root = parse_element_tree(text)?;
        Ok(Self { root, opts })
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let doc = Self::parse(&text)?;
        info!(path = %path.display(), root = %doc.root.name, "loaded xml document");
        Ok(doc)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        fs::write(path, self.serialize(true)?)?;
        info!(path = %path.display(), "saved xml document");
        Ok(())
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn opts(&self) -> &XmlOpts {
        &self.opts
    }

    pub fn element(&self, r: &ElementRef) -> Option<&Element> {
        xpath::resolve(&self.root, &r.0)
    }

    pub fn element_mut(&mut self, r: &ElementRef) -> Option<&mut Element> {
        let mut cur = &mut self.root;
        for &i in &r.0 {
            cur = cur.children.get_mut(i)?;
        }
        Some(cur)
    }

    /// Appends `<book>` with `title`, `author`, `year` and `publisher` children.
    pub fn add_book(&mut self, title: &str, author: &str, year: &str, publisher: &str) -> ElementRef {
        let mut book = Element::new("book");
        for (name, value) in [
            ("title", title),
            ("author", author),
            ("year", year),
            ("publisher", publisher),
        ] {
            let mut field = Element::new(name);
            field.text = value.to_string();
            book.children.push(field);
        }
        self.root.children.push(book);
        debug!(%title, "added book");
        ElementRef::root().child(self.root.children.len() - 1)
    }

    pub fn add_element(&mut self, parent: &ElementRef, name: &str, value: Option<&str>) -> Result<ElementRef> {
        check_name(name)?;
        let el = self.element_mut(parent).ok_or(Error::StaleElement)?;
        let mut child = Element::new(name);
        if let Some(v) = value {
            child.text = v.to_string();
        }
        el.children.push(child);
        let index = el.children.len() - 1;
        Ok(parent.child(index))
    }

    /// Sets (or overwrites) an attribute on an existing element.
    pub fn add_attribute(&mut self, element: &ElementRef, name: &str, value: &str) -> Result<()> {
        check_name(name)?;
        let el = self.element_mut(element).ok_or(Error::StaleElement)?;
        el.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Elements matching `query`, in document order.
    pub fn query(&self, query: &str) -> Result<Vec<ElementRef>> {
        let q = xpath::parse(query)?;
        let hits: Vec<ElementRef> = xpath::evaluate(&self.root, &q)
            .into_iter()
            .map(ElementRef)
            .collect();
        debug!(%query, matches = hits.len(), "xpath query");
        Ok(hits)
    }

    /// Removes every element matching `query`; returns how many were removed.
    /// The root element is never removed.
    pub fn delete_elements(&mut self, query: &str) -> Result<usize> {
        let hits = self.query(query)?;
        let mut removed = 0;
        // Walk back to front so pending handles stay valid.
        for r in hits.into_iter().rev() {
            let Some((&last, parent)) = r.0.split_last() else {
                warn!(%query, "query matched the root element; skipped");
                continue;
            };
            let parent = ElementRef(parent.to_vec());
            if let Some(p) = self.element_mut(&parent)
                && last < p.children.len()
            {
                p.children.remove(last);
                removed += 1;
            }
        }
        debug!(%query, removed, "deleted elements");
        Ok(removed)
    }

    pub fn serialize(&self, pretty: bool) -> Result<String> {
        let mut writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', self.opts.indent)
        } else {
            Writer::new(Vec::new())
        };
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_element(&mut writer, &self.root)?;
        let mut out = String::from_utf8(writer.into_inner())
            .map_err(|e| Error::MalformedXml(e.to_string()))?;
        if pretty {
            out.push('\n');
        }
        Ok(out)
    }

    pub fn display_xml(&self) -> Result<String> {
        self.serialize(true)
    }

    // -------- tree-store conversion --------

    /// The root element's content as a tree-store mapping (the root name is
    /// dropped). Repeated sibling names collect into list-shaped mappings.
    pub fn to_tree_store(&self) -> Mapping {
        match element_to_node(&self.root) {
            Node::Mapping(m) => m,
            scalar @ Node::Scalar(_) => std::iter::once((TEXT_KEY, scalar)).collect(),
        }
    }

    pub fn from_tree_store(map: &Mapping) -> Result<Self> {
        Self::from_tree_store_with(map, XmlOpts::default())
    }

    pub fn from_tree_store_with(map: &Mapping, opts: XmlOpts) -> Result<Self> {
        let mut root = Element::new(opts.root_name.clone());
        fill_element(&mut root, map)?;
        Ok(Self { root, opts })
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        JsonDocument::from_root(self.to_tree_store()).serialize(pretty)
    }

    pub fn save_to_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json(false)?)?;
        info!(path = %path.display(), "saved xml document as json");
        Ok(())
    }

    /// Replaces this document's content with the tree read from a JSON file.
    pub fn load_from_json(&mut self, path: &Path) -> Result<()> {
        let json = JsonDocument::load_from_path(path)?;
        let mut root = Element::new(self.opts.root_name.clone());
        fill_element(&mut root, json.root())?;
        self.root = root;
        Ok(())
    }

    // -------- collaborators --------

    pub fn validate_against(&self, validator: &dyn SchemaValidator, schema: &Path) -> Result<bool> {
        let valid = validator.validate(&self.serialize(false)?, schema)?;
        debug!(schema = %schema.display(), valid, "schema validation");
        Ok(valid)
    }

    /// Runs the stylesheet over this document and writes the result to `output`.
    pub fn transform_with(
        &self,
        processor: &dyn StylesheetProcessor,
        stylesheet: &Path,
        output: &Path,
    ) -> Result<()> {
        let bytes = processor.transform(&self.serialize(false)?, stylesheet)?;
        fs::write(output, bytes)?;
        info!(stylesheet = %stylesheet.display(), output = %output.display(), "transformed xml");
        Ok(())
    }
}

pub(crate) fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start) && chars.all(is_name_char)
}

fn check_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::MalformedXml(e.to_string()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let mut el = Element::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        el.attributes.insert(key, value);
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None if root.is_none() => *root = Some(el),
        None => {
            return Err(Error::MalformedXml(format!(
                "more than one root element (found <{}>)",
                el.name
            )));
        }
    }
    Ok(())
}

fn parse_element_tree(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if root.is_some() && stack.is_empty() {
                    return Err(Error::MalformedXml("more than one root element".into()));
                }
                stack.push(element_from_start(&e)?);
            }
            Event::Empty(e) => {
                let el = element_from_start(&e)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                let mut el = stack
                    .pop()
                    .ok_or_else(|| Error::MalformedXml("unexpected closing tag".into()))?;
                // text around child elements is layout; leaf text is kept verbatim
                if !el.children.is_empty() {
                    el.text = el.text.trim().to_string();
                }
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(t) => {
                let txt = t.unescape()?;
                match stack.last_mut() {
                    Some(el) => el.text.push_str(&txt),
                    None if txt.trim().is_empty() => {}
                    None => {
                        return Err(Error::MalformedXml("text outside the root element".into()));
                    }
                }
            }
            Event::CData(c) => {
                let txt = utf8(&c)?;
                match stack.last_mut() {
                    Some(el) => el.text.push_str(txt),
                    None => {
                        return Err(Error::MalformedXml("cdata outside the root element".into()));
                    }
                }
            }
            Event::Eof => break,
            // declaration, comments, processing instructions, doctype
            _ => {}
        }
    }
    if let Some(open) = stack.last() {
        return Err(Error::MalformedXml(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| Error::MalformedXml("no root element".into()))
}

fn write_element<W: Write>(w: &mut Writer<W>, el: &Element) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attributes {
        let escaped = escape(v.as_str());
        start.push_attribute((k.as_bytes(), escaped.as_bytes()));
    }
    if el.text.is_empty() && el.children.is_empty() {
        w.write_event(Event::Empty(start))?;
        return Ok(());
    }
    w.write_event(Event::Start(start))?;
    if !el.text.is_empty() {
        w.write_event(Event::Text(BytesText::from_escaped(escape(el.text.as_str()))))?;
    }
    for child in &el.children {
        write_element(w, child)?;
    }
    w.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}

fn element_to_node(el: &Element) -> Node {
    if el.attributes.is_empty() && el.children.is_empty() {
        return if el.text.is_empty() {
            Node::Mapping(Mapping::new())
        } else {
            Node::from(el.text.clone())
        };
    }
    let mut m = Mapping::new();
    if !el.attributes.is_empty() {
        let attrs: Mapping = el
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        m.insert(ATTRIBUTES_KEY, attrs);
    }
    if !el.text.is_empty() {
        m.insert(TEXT_KEY, el.text.clone());
    }
    let mut groups: IndexMap<&str, Vec<Node>> = IndexMap::new();
    for child in &el.children {
        groups
            .entry(child.name.as_str())
            .or_default()
            .push(element_to_node(child));
    }
    for (name, mut nodes) in groups {
        let node = if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Node::Mapping(Mapping::from_list(nodes))
        };
        m.insert(name, node);
    }
    Node::Mapping(m)
}

fn fill_element(el: &mut Element, map: &Mapping) -> Result<()> {
    for (key, value) in map {
        match key.as_str() {
            ATTRIBUTES_KEY => {
                let Some(attrs) = value.as_mapping() else {
                    warn!(element = %el.name, "'@attributes' is not a mapping; skipped");
                    continue;
                };
                for (name, v) in attrs {
                    check_name(name)?;
                    match v {
                        Node::Scalar(s) => {
                            el.attributes.insert(name.clone(), s.to_string());
                        }
                        Node::Mapping(_) => {
                            warn!(element = %el.name, attribute = %name, "nested attribute value skipped");
                        }
                    }
                }
            }
            TEXT_KEY => match value {
                Node::Scalar(s) => el.text.push_str(&s.to_string()),
                Node::Mapping(_) => {
                    warn!(element = %el.name, "'#text' is not a scalar; skipped");
                }
            },
            name => {
                check_name(name)?;
                match value {
                    Node::Mapping(items) if items.is_list() => {
                        for item in items.values() {
                            el.children.push(build_element(name, item)?);
                        }
                    }
                    _ => el.children.push(build_element(name, value)?),
                }
            }
        }
    }
    Ok(())
}

fn build_element(name: &str, node: &Node) -> Result<Element> {
    let mut el = Element::new(name);
    match node {
        Node::Scalar(s) => el.text = s.to_string(),
        Node::Mapping(m) => fill_element(&mut el, m)?,
    }
    Ok(el)
}
