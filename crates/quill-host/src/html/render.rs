//! Text extraction and markup serialization.

use super::{Document, NodeData, NodeId};

/// Elements that start on a new line when rendered, so their text is
/// separated from neighbouring text by a space.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "center", "dd",
    "details", "dialog", "dir", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "legend",
    "li", "main", "menu", "nav", "ol", "p", "pre", "section", "summary", "table", "tbody", "td",
    "tfoot", "th", "thead", "title", "tr", "ul",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

/// Appends `text` collapsing whitespace runs to one space.
fn push_normalised(out: &mut String, text: &str) {
    for c in text.chars() {
        if is_html_whitespace(c) {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

fn push_separator(out: &mut String) {
    if !out.is_empty() && !out.ends_with(' ') {
        out.push(' ');
    }
}

fn inside_pre(doc: &Document, id: NodeId) -> bool {
    let mut current = Some(id);
    while let Some(node) = current {
        if doc.element(node).is_some_and(|e| e.name == "pre") {
            return true;
        }
        current = doc.parent(node);
    }
    false
}

/// Rendered text of the subtree: whitespace collapsed and trimmed.
pub(super) fn text(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    collect_text(doc, id, inside_pre(doc, id), &mut out);
    out.trim_matches(is_html_whitespace).to_owned()
}

fn collect_text(doc: &Document, id: NodeId, preserve: bool, out: &mut String) {
    let node = doc.node(id);
    match &node.data {
        NodeData::Text(text) if preserve => out.push_str(text),
        NodeData::Text(text) => push_normalised(out, text),
        NodeData::Element(element) => {
            let block = BLOCK_TAGS.contains(&element.name.as_str());
            if block {
                push_separator(out);
            }
            let preserve = preserve || element.name == "pre";
            for child in &node.children {
                collect_text(doc, *child, preserve, out);
            }
            if block {
                push_separator(out);
            }
        },
        NodeData::Document => {
            for child in &node.children {
                collect_text(doc, *child, preserve, out);
            }
        },
        NodeData::Doctype(_) | NodeData::Data(_) | NodeData::Comment(_) => {},
    }
}

/// Text of the node's direct text children only.
pub(super) fn own_text(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in &doc.node(id).children {
        match &doc.node(*child).data {
            NodeData::Text(text) => push_normalised(&mut out, text),
            NodeData::Element(element) if element.name == "br" => push_separator(&mut out),
            _ => {},
        }
    }
    out.trim_matches(is_html_whitespace).to_owned()
}

/// Raw contents of data nodes (script and style bodies) in the subtree.
pub(super) fn data(doc: &Document, id: NodeId) -> String {
    doc.subtree(id)
        .into_iter()
        .filter_map(|n| match &doc.node(n).data {
            NodeData::Data(data) => Some(data.as_str()),
            _ => None,
        })
        .collect()
}

pub(super) fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in &doc.node(id).children {
        write_node(doc, *child, &mut out);
    }
    out
}

pub(super) fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    let node = doc.node(id);
    match &node.data {
        NodeData::Document => {
            for child in &node.children {
                write_node(doc, *child, out);
            }
        },
        NodeData::Doctype(name) => {
            out.push_str("<!doctype ");
            out.push_str(name);
            out.push('>');
        },
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (key, value) in &element.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape(value, true, out);
                out.push('"');
            }
            out.push('>');
            if VOID_TAGS.contains(&element.name.as_str()) {
                return;
            }
            for child in &node.children {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        },
        NodeData::Text(text) => escape(text, false, out),
        NodeData::Data(data) => out.push_str(data),
        NodeData::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        },
    }
}

fn escape(text: &str, in_attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '<' if !in_attribute => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Document, HtmlSet};

    fn select(html: &str, selector: &str) -> HtmlSet {
        HtmlSet::document(Document::parse(html, None))
            .select(selector)
            .unwrap()
    }

    #[test]
    fn text_collapses_whitespace_and_trims() {
        let p = select("<p>Hello <b>there</b> now! </p>", "p");
        assert_eq!(p.text(), "Hello there now!");
    }

    #[test]
    fn own_text_skips_descendants() {
        let p = select("<p>Hello <b>there</b> now! </p>", "p");
        assert_eq!(p.own_text(), "Hello now!");
    }

    #[test]
    fn block_elements_separate_words() {
        let div = select("<div><p>one</p><p>two</p>three<br>four</div>", "div");
        assert_eq!(div.text(), "one two three four");
    }

    #[test]
    fn non_breaking_space_survives() {
        let p = select("<p>a&nbsp;b</p>", "p");
        assert_eq!(p.text(), "a\u{a0}b");
        assert_eq!(p.html(), "a&nbsp;b");
    }

    #[test]
    fn pre_keeps_whitespace() {
        let pre = select("<pre>a  b\n c</pre>", "pre");
        assert_eq!(pre.text(), "a  b\n c");
    }

    #[test]
    fn serializes_markup() {
        let div = select(r#"<div class="x"><img src="a.png"><span>1 &lt; 2</span></div>"#, "div");
        assert_eq!(div.html(), r#"<img src="a.png"><span>1 &lt; 2</span>"#);
        assert_eq!(
            div.outer_html(),
            r#"<div class="x"><img src="a.png"><span>1 &lt; 2</span></div>"#
        );
    }

    #[test]
    fn node_set_text_joins_members() {
        let items = select("<ul><li>A</li><li> </li><li>B</li></ul>", "li");
        assert_eq!(items.text(), "A B");
        assert_eq!(items.outer_html(), "<li>A</li>\n<li> </li>\n<li>B</li>");
    }
}
