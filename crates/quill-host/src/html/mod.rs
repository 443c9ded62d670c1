//! Parsed HTML documents and node-set handles.
//!
//! `scraper` does the parsing; the resulting tree is flattened into an
//! arena whose node ids follow document order, which is what selection,
//! navigation and the node-set handles index into.

mod render;
mod select;

use std::rc::Rc;

use scraper::{ElementRef, Html, Node};
use url::Url;

use crate::error::HostResult;

pub(crate) use select::SelectorList;

/// Index of a node inside its [`Document`]. Ids increase in document order.
pub(crate) type NodeId = usize;

/// Tags whose text content is kept as raw data rather than rendered text.
const DATA_TAGS: &[&str] = &["script", "style"];

#[derive(Debug)]
pub(crate) enum NodeData {
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    /// Raw contents of a data-only tag.
    Data(String),
    Comment(String),
}

#[derive(Debug)]
pub(crate) struct Element {
    /// Lower-cased tag name.
    pub(crate) name: String,
    pub(crate) attrs: Vec<(String, String)>,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c.eq_ignore_ascii_case(class))
    }
}

#[derive(Debug)]
pub(crate) struct DomNode {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

/// A parsed document flattened into an arena.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<DomNode>,
    base_uri: String,
}

impl Document {
    pub(crate) const ROOT: NodeId = 0;

    /// Parses a complete document.
    pub fn parse(html: &str, base_uri: Option<&str>) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self::empty();
        for child in parsed.tree.root().children() {
            match child.value() {
                Node::Doctype(doctype) => {
                    doc.push(Self::ROOT, NodeData::Doctype(doctype.name().to_owned()));
                },
                Node::Comment(comment) => {
                    doc.push(Self::ROOT, NodeData::Comment(String::from(&**comment)));
                },
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        let id = doc.push_element(Self::ROOT, element);
                        doc.import_children(id, element);
                    }
                },
                _ => {},
            }
        }
        doc.resolve_base(base_uri);
        tracing::debug!(nodes = doc.nodes.len(), "parsed html document");
        doc
    }

    /// Parses a body fragment into an `html > head + body` shell.
    pub fn parse_fragment(html: &str, base_uri: Option<&str>) -> Self {
        let parsed = Html::parse_fragment(html);
        let mut doc = Self::empty();
        let html_id = doc.push(Self::ROOT, element_data("html"));
        doc.push(html_id, element_data("head"));
        let body = doc.push(html_id, element_data("body"));
        doc.import_children(body, parsed.root_element());
        doc.resolve_base(base_uri);
        tracing::debug!(nodes = doc.nodes.len(), "parsed html fragment");
        doc
    }

    fn empty() -> Self {
        Self {
            nodes: vec![DomNode {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            base_uri: String::new(),
        }
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DomNode {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn push_element(&mut self, parent: NodeId, element: ElementRef<'_>) -> NodeId {
        let value = element.value();
        let data = NodeData::Element(Element {
            name: value.name().to_ascii_lowercase(),
            attrs: value
                .attrs()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_owned()))
                .collect(),
        });
        self.push(parent, data)
    }

    fn import_children(&mut self, parent: NodeId, element: ElementRef<'_>) {
        let raw = self
            .element(parent)
            .is_some_and(|e| DATA_TAGS.contains(&e.name.as_str()));
        for child in element.children() {
            match child.value() {
                Node::Text(text) if raw => {
                    self.push(parent, NodeData::Data(String::from(&**text)));
                },
                Node::Text(text) => {
                    self.push(parent, NodeData::Text(String::from(&**text)));
                },
                Node::Comment(comment) => {
                    self.push(parent, NodeData::Comment(String::from(&**comment)));
                },
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        let id = self.push_element(parent, child_element);
                        self.import_children(id, child_element);
                    }
                },
                _ => {},
            }
        }
    }

    /// A `<base href>` in the document wins over the supplied URI, resolved against it.
    fn resolve_base(&mut self, supplied: Option<&str>) {
        let supplied = supplied.unwrap_or_default();
        let tag_href = self
            .find_element(Self::ROOT, "base")
            .and_then(|id| self.element(id))
            .and_then(|e| e.attr("href"))
            .map(str::to_owned);
        self.base_uri = match tag_href {
            Some(href) => Url::parse(supplied)
                .and_then(|base| base.join(&href))
                .map_or(href, String::from),
            None => supplied.to_owned(),
        };
    }

    pub(crate) fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Resolves `value` against the base URI. Unresolvable values give an empty string.
    pub(crate) fn absolute_url(&self, value: &str) -> String {
        if let Ok(url) = Url::parse(value) {
            return url.into();
        }
        Url::parse(&self.base_uri)
            .and_then(|base| base.join(value))
            .map(String::from)
            .unwrap_or_default()
    }

    pub(crate) fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id]
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub(crate) fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
    }

    /// Element children of `id`'s parent, `id` included.
    pub(crate) fn element_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(parent) => self.element_children(parent).collect(),
            None => vec![id],
        }
    }

    pub(crate) fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings(id);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings.get(pos.checked_add(1)?).copied()
    }

    pub(crate) fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings(id);
        let pos = siblings.iter().position(|s| *s == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// `id` and every node below it, in document order.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev());
        }
        out
    }

    pub(crate) fn find_element(&self, from: NodeId, name: &str) -> Option<NodeId> {
        self.subtree(from)
            .into_iter()
            .find(|id| self.element(*id).is_some_and(|e| e.name == name))
    }
}

fn element_data(name: &str) -> NodeData {
    NodeData::Element(Element {
        name: name.to_owned(),
        attrs: Vec::new(),
    })
}

/// What an HTML handle stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Document,
    Element,
    Elements,
}

/// The resource behind an HTML handle: some nodes of a shared document.
#[derive(Debug, Clone)]
pub struct HtmlSet {
    doc: Rc<Document>,
    nodes: Vec<NodeId>,
    shape: Shape,
}

impl HtmlSet {
    pub fn document(doc: Document) -> Self {
        Self {
            doc: Rc::new(doc),
            nodes: vec![Document::ROOT],
            shape: Shape::Document,
        }
    }

    fn element(&self, id: NodeId) -> Self {
        Self {
            doc: Rc::clone(&self.doc),
            nodes: vec![id],
            shape: Shape::Element,
        }
    }

    /// Number of nodes in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn select(&self, selector: &str) -> HostResult<Self> {
        let list = SelectorList::parse(selector)?;
        let mut found: Vec<NodeId> = self
            .nodes
            .iter()
            .flat_map(|scope| list.select(&self.doc, *scope))
            .collect();
        found.sort_unstable();
        found.dedup();
        Ok(Self {
            doc: Rc::clone(&self.doc),
            nodes: found,
            shape: Shape::Elements,
        })
    }

    pub fn first(&self) -> Option<Self> {
        match self.shape {
            Shape::Document => Some(self.clone()),
            Shape::Elements => self.nodes.first().map(|id| self.element(*id)),
            Shape::Element => {
                let id = *self.nodes.first()?;
                self.doc.element_siblings(id).first().map(|s| self.element(*s))
            },
        }
    }

    pub fn last(&self) -> Option<Self> {
        match self.shape {
            Shape::Document => Some(self.clone()),
            Shape::Elements => self.nodes.last().map(|id| self.element(*id)),
            Shape::Element => {
                let id = *self.nodes.first()?;
                self.doc.element_siblings(id).last().map(|s| self.element(*s))
            },
        }
    }

    pub fn next(&self) -> Option<Self> {
        let id = *self.nodes.first()?;
        self.doc.next_element_sibling(id).map(|s| self.element(s))
    }

    pub fn previous(&self) -> Option<Self> {
        let id = *self.nodes.first()?;
        self.doc.previous_element_sibling(id).map(|s| self.element(s))
    }

    /// Splits the set into single-element handles.
    pub fn array(&self) -> Vec<Self> {
        self.nodes
            .iter()
            .filter(|id| self.doc.is_element(**id))
            .map(|id| self.element(*id))
            .collect()
    }

    pub fn body(&self) -> Option<Self> {
        let html = self
            .doc
            .element_children(Document::ROOT)
            .find(|id| self.doc.element(*id).is_some_and(|e| e.name == "html"))?;
        self.doc
            .element_children(html)
            .find(|id| self.doc.element(*id).is_some_and(|e| e.name == "body"))
            .map(|id| self.element(id))
    }

    pub fn base_uri(&self) -> String {
        self.doc.base_uri().to_owned()
    }

    pub fn text(&self) -> String {
        self.join(" ", |id| render::text(&self.doc, id))
    }

    pub fn own_text(&self) -> String {
        self.join(" ", |id| render::own_text(&self.doc, id))
    }

    pub fn data(&self) -> String {
        self.join("\n", |id| render::data(&self.doc, id))
    }

    pub fn html(&self) -> String {
        self.join("\n", |id| render::inner_html(&self.doc, id))
    }

    pub fn outer_html(&self) -> String {
        self.join("\n", |id| render::outer_html(&self.doc, id))
    }

    /// Value of the attribute on the first element in the set that has it,
    /// even when that value is empty.
    ///
    /// An `abs:` prefix resolves the value against the document's base URI.
    pub fn attr(&self, name: &str) -> String {
        let (name, absolute) = match name.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("abs:") => (&name[4..], true),
            _ => (name, false),
        };
        self.elements()
            .find_map(|e| e.attr(name))
            .map(|value| {
                if absolute {
                    self.doc.absolute_url(value)
                } else {
                    value.to_owned()
                }
            })
            .unwrap_or_default()
    }

    pub fn id(&self) -> String {
        self.first_element()
            .and_then(|e| e.attr("id"))
            .unwrap_or_default()
            .to_owned()
    }

    pub fn tag_name(&self) -> String {
        self.first_element()
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }

    pub fn class_name(&self) -> String {
        self.first_element()
            .and_then(|e| e.attr("class"))
            .unwrap_or_default()
            .to_owned()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.elements().any(|e| e.has_class(class))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        let name = name
            .get(..4)
            .filter(|p| p.eq_ignore_ascii_case("abs:"))
            .map_or(name, |_| &name[4..]);
        self.elements().any(|e| e.attr(name).is_some())
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(|id| self.doc.element(*id))
    }

    fn first_element(&self) -> Option<&Element> {
        self.elements().next()
    }

    fn join(&self, separator: &str, render: impl Fn(NodeId) -> String) -> String {
        self.nodes
            .iter()
            .map(|id| render(*id))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> HtmlSet {
        HtmlSet::document(Document::parse(html, None))
    }

    #[test]
    fn node_ids_follow_document_order() {
        let set = doc("<ul><li>A</li><li>B</li></ul>").select("li").unwrap();
        let texts: Vec<String> = set.array().iter().map(HtmlSet::text).collect();
        assert_eq!(texts, vec!["A", "B"]);
    }

    #[test]
    fn sibling_navigation_stops_at_edges() {
        let items = doc("<ul><li>A</li><li>B</li></ul>").select("li").unwrap();
        let first = items.first().unwrap();
        assert!(first.previous().is_none());
        let last = items.last().unwrap();
        assert!(last.next().is_none());
        assert_eq!(first.next().unwrap().text(), "B");
        assert_eq!(last.previous().unwrap().text(), "A");
    }

    #[test]
    fn set_attr_takes_first_present_value_even_if_empty() {
        let links = doc(r#"<a>x</a><a title="">y</a><a title="z">z</a>"#)
            .select("a")
            .unwrap();
        assert_eq!(links.attr("title"), "");
        assert!(links.has_attr("title"));
        let titled = doc(r#"<a>x</a><a title="z">z</a>"#).select("a").unwrap();
        assert_eq!(titled.attr("title"), "z");
    }

    #[test]
    fn element_first_and_last_are_siblings() {
        let second = doc("<p>1</p><p>2</p><p>3</p>").select("p:eq(1)").unwrap();
        let second = second.first().unwrap();
        assert_eq!(second.first().unwrap().text(), "1");
        assert_eq!(second.last().unwrap().text(), "3");
    }

    #[test]
    fn empty_set_has_no_first() {
        let none = doc("<p>x</p>").select("span").unwrap();
        assert!(none.is_empty());
        assert!(none.first().is_none());
        assert!(none.next().is_none());
    }

    #[test]
    fn script_contents_are_data_not_text() {
        let set = doc("<div>shown<script>var x = 1;</script></div>")
            .select("div")
            .unwrap();
        assert_eq!(set.text(), "shown");
        assert_eq!(set.data(), "var x = 1;");
    }

    #[test]
    fn base_tag_overrides_supplied_uri() {
        let html = r#"<head><base href="/root/"></head><a href="page">x</a>"#;
        let set = HtmlSet::document(Document::parse(html, Some("https://example.com/a/b")));
        assert_eq!(set.base_uri(), "https://example.com/root/");
        let link = set.select("a").unwrap();
        assert_eq!(link.attr("href"), "page");
        assert_eq!(link.attr("abs:href"), "https://example.com/root/page");
    }

    #[test]
    fn supplied_uri_resolves_relative_links() {
        let set = HtmlSet::document(Document::parse(
            r#"<a href="../c">x</a>"#,
            Some("https://example.com/a/b/"),
        ));
        let link = set.select("a").unwrap();
        assert_eq!(link.attr("ABS:href"), "https://example.com/a/c");
        assert!(link.has_attr("abs:href"));
    }

    #[test]
    fn unresolvable_abs_attr_is_empty() {
        let link = doc(r#"<a href="rel">x</a>"#).select("a").unwrap();
        assert_eq!(link.attr("abs:href"), "");
        assert_eq!(link.attr("missing"), "");
    }

    #[test]
    fn identity_accessors() {
        let el = doc(r#"<DIV id="main" class="Big  red" data-x="1"></DIV>"#)
            .select("div")
            .unwrap();
        assert_eq!(el.id(), "main");
        assert_eq!(el.tag_name(), "div");
        assert_eq!(el.class_name(), "Big  red");
        assert!(el.has_class("big"));
        assert!(!el.has_class("blue"));
        assert!(el.has_attr("DATA-X"));
    }

    #[test]
    fn fragment_lands_in_body() {
        let set = HtmlSet::document(Document::parse_fragment("<b>bold</b> text", None));
        let body = set.body().unwrap();
        assert_eq!(body.tag_name(), "body");
        assert_eq!(body.html(), "<b>bold</b> text");
        assert_eq!(set.select("b").unwrap().text(), "bold");
    }
}
