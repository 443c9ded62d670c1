//! CSS selector parsing and matching.
//!
//! Supports the jQuery-flavoured grammar plugin authors expect: the usual
//! type/id/class/attribute selectors and combinators, the structural
//! pseudo-classes, and the content filters `:contains`, `:matches`, `:has`,
//! `:lt`, `:gt` and `:eq`.

use regex::Regex;

use super::{Document, NodeData, NodeId, render};
use crate::error::{HostError, HostResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

impl Combinator {
    fn is_sibling(self) -> bool {
        matches!(self, Self::Adjacent | Self::Sibling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    NotEquals,
    Prefix,
    Suffix,
    Contains,
}

#[derive(Debug)]
enum Simple {
    Tag(String),
    /// `*|name`: the local name under any namespace prefix.
    TagAnyNamespace(String),
    Id(String),
    Class(String),
    HasAttr(String),
    AttrPrefix(String),
    Attr {
        name: String,
        op: AttrOp,
        /// Lower-cased; comparisons are case-insensitive.
        value: String,
    },
    AttrRegex {
        name: String,
        pattern: Regex,
    },
    IndexLessThan(usize),
    IndexGreaterThan(usize),
    IndexEquals(usize),
    Has(SelectorList),
    Not(SelectorList),
    Contains(String),
    ContainsOwn(String),
    ContainsData(String),
    Matches(Regex),
    MatchesOwn(Regex),
    Nth {
        a: i64,
        b: i64,
        from_end: bool,
        of_type: bool,
    },
    OnlyChild,
    OnlyOfType,
    Empty,
    Root,
}

/// A sequence of simple selectors without combinators. Empty matches any element.
#[derive(Debug, Default)]
struct Compound(Vec<Simple>);

#[derive(Debug)]
struct Complex {
    /// A combinator before the first compound, relating it to the scope (`> p`).
    leading: Option<Combinator>,
    compounds: Vec<Compound>,
    /// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

/// A comma-separated selector group.
#[derive(Debug)]
pub(crate) struct SelectorList(Vec<Complex>);

impl SelectorList {
    pub(crate) fn parse(selector: &str) -> HostResult<Self> {
        let mut parser = Parser::new(selector, selector);
        let list = parser.parse_list()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(list),
            Some(c) => Err(parser.error(format!("unexpected {c:?}"))),
        }
    }

    /// Elements under `scope` (the scope itself included) that match, in document order.
    pub(crate) fn select(&self, doc: &Document, scope: NodeId) -> Vec<NodeId> {
        self.candidates(doc, scope, true)
            .into_iter()
            .filter(|id| self.matches(doc, *id, scope))
            .collect()
    }

    fn matches(&self, doc: &Document, id: NodeId, scope: NodeId) -> bool {
        self.0.iter().any(|complex| complex.matches(doc, id, scope))
    }

    fn candidates(&self, doc: &Document, scope: NodeId, include_scope: bool) -> Vec<NodeId> {
        let skip = usize::from(!include_scope);
        let mut out: Vec<NodeId> = doc
            .subtree(scope)
            .into_iter()
            .skip(skip)
            .filter(|id| doc.is_element(*id))
            .collect();
        if self.0.iter().any(|c| c.leading.is_some_and(Combinator::is_sibling)) {
            let mut next = doc.next_element_sibling(scope);
            while let Some(sibling) = next {
                out.push(sibling);
                next = doc.next_element_sibling(sibling);
            }
        }
        out
    }
}

impl Complex {
    fn matches(&self, doc: &Document, id: NodeId, scope: NodeId) -> bool {
        let last = self.compounds.len().saturating_sub(1);
        self.match_at(doc, id, scope, last)
    }

    fn match_at(&self, doc: &Document, id: NodeId, scope: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(doc, id, scope) {
            return false;
        }
        let Some(prev) = index.checked_sub(1) else {
            return self.leading_holds(doc, id, scope);
        };
        match self.combinators[prev] {
            Combinator::Descendant => {
                let mut current = doc.parent(id);
                while let Some(ancestor) = current {
                    if self.match_at(doc, ancestor, scope, prev) {
                        return true;
                    }
                    current = doc.parent(ancestor);
                }
                false
            },
            Combinator::Child => doc
                .parent(id)
                .is_some_and(|parent| self.match_at(doc, parent, scope, prev)),
            Combinator::Adjacent => doc
                .previous_element_sibling(id)
                .is_some_and(|sibling| self.match_at(doc, sibling, scope, prev)),
            Combinator::Sibling => {
                let mut current = doc.previous_element_sibling(id);
                while let Some(sibling) = current {
                    if self.match_at(doc, sibling, scope, prev) {
                        return true;
                    }
                    current = doc.previous_element_sibling(sibling);
                }
                false
            },
        }
    }

    fn leading_holds(&self, doc: &Document, id: NodeId, scope: NodeId) -> bool {
        match self.leading {
            None => true,
            Some(Combinator::Descendant) => {
                let mut current = doc.parent(id);
                while let Some(ancestor) = current {
                    if ancestor == scope {
                        return true;
                    }
                    current = doc.parent(ancestor);
                }
                false
            },
            Some(Combinator::Child) => doc.parent(id) == Some(scope),
            Some(Combinator::Adjacent) => doc.previous_element_sibling(id) == Some(scope),
            Some(Combinator::Sibling) => {
                let mut current = doc.previous_element_sibling(id);
                while let Some(sibling) = current {
                    if sibling == scope {
                        return true;
                    }
                    current = doc.previous_element_sibling(sibling);
                }
                false
            },
        }
    }
}

impl Compound {
    fn matches(&self, doc: &Document, id: NodeId, scope: NodeId) -> bool {
        doc.is_element(id) && self.0.iter().all(|s| s.matches(doc, id, scope))
    }
}

impl Simple {
    fn matches(&self, doc: &Document, id: NodeId, scope: NodeId) -> bool {
        let Some(element) = doc.element(id) else {
            return false;
        };
        match self {
            Self::Tag(name) => element.name == *name,
            Self::TagAnyNamespace(local) => {
                element.name == *local
                    || element
                        .name
                        .rsplit_once(':')
                        .is_some_and(|(_, l)| l == local)
            },
            Self::Id(value) => element.attr("id") == Some(value.as_str()),
            Self::Class(class) => element.has_class(class),
            Self::HasAttr(name) => element.attr(name).is_some(),
            Self::AttrPrefix(prefix) => element.attrs.iter().any(|(k, _)| k.starts_with(prefix)),
            Self::Attr { name, op, value } => {
                let actual = element.attr(name).map(|v| v.trim().to_lowercase());
                match (op, actual) {
                    (AttrOp::NotEquals, actual) => actual.as_deref() != Some(value.as_str()),
                    (_, None) => false,
                    (AttrOp::Equals, Some(actual)) => actual == *value,
                    (AttrOp::Prefix, Some(actual)) => actual.starts_with(value.as_str()),
                    (AttrOp::Suffix, Some(actual)) => actual.ends_with(value.as_str()),
                    (AttrOp::Contains, Some(actual)) => actual.contains(value.as_str()),
                }
            },
            Self::AttrRegex { name, pattern } => {
                element.attr(name).is_some_and(|v| pattern.is_match(v))
            },
            Self::IndexLessThan(n) => id != scope && sibling_index(doc, id) < *n,
            Self::IndexGreaterThan(n) => id != scope && sibling_index(doc, id) > *n,
            Self::IndexEquals(n) => id != scope && sibling_index(doc, id) == *n,
            Self::Has(list) => list
                .candidates(doc, id, false)
                .into_iter()
                .any(|candidate| list.matches(doc, candidate, id)),
            Self::Not(list) => !list.matches(doc, id, scope),
            Self::Contains(needle) => render::text(doc, id).to_lowercase().contains(needle),
            Self::ContainsOwn(needle) => render::own_text(doc, id).to_lowercase().contains(needle),
            Self::ContainsData(needle) => render::data(doc, id).to_lowercase().contains(needle),
            Self::Matches(pattern) => pattern.is_match(&render::text(doc, id)),
            Self::MatchesOwn(pattern) => pattern.is_match(&render::own_text(doc, id)),
            Self::Nth {
                a,
                b,
                from_end,
                of_type,
            } => {
                if !has_element_parent(doc, id) {
                    return false;
                }
                let siblings = typed_siblings(doc, id, *of_type);
                let Some(index) = siblings.iter().position(|s| *s == id) else {
                    return false;
                };
                let position = if *from_end {
                    siblings.len().saturating_sub(index)
                } else {
                    index.saturating_add(1)
                };
                i64::try_from(position).is_ok_and(|position| nth_matches(*a, *b, position))
            },
            Self::OnlyChild => has_element_parent(doc, id) && doc.element_siblings(id).len() == 1,
            Self::OnlyOfType => {
                has_element_parent(doc, id) && typed_siblings(doc, id, true).len() == 1
            },
            Self::Empty => doc
                .node(id)
                .children
                .iter()
                .all(|c| matches!(doc.node(*c).data, NodeData::Comment(_))),
            Self::Root => doc.parent(id) == Some(Document::ROOT),
        }
    }
}

fn sibling_index(doc: &Document, id: NodeId) -> usize {
    doc.element_siblings(id)
        .iter()
        .position(|s| *s == id)
        .unwrap_or_default()
}

fn has_element_parent(doc: &Document, id: NodeId) -> bool {
    doc.parent(id).is_some_and(|p| doc.is_element(p))
}

fn typed_siblings(doc: &Document, id: NodeId, of_type: bool) -> Vec<NodeId> {
    let siblings = doc.element_siblings(id);
    if !of_type {
        return siblings;
    }
    let name = doc.element(id).map(|e| e.name.as_str());
    siblings
        .into_iter()
        .filter(|s| doc.element(*s).map(|e| e.name.as_str()) == name)
        .collect()
}

/// Whether 1-based `position` is `a*n + b` for some `n >= 0`.
///
/// Coefficients too large to evaluate match nothing.
fn nth_matches(a: i64, b: i64, position: i64) -> bool {
    let Some(diff) = position.checked_sub(b) else {
        return false;
    };
    if a == 0 {
        return diff == 0;
    }
    diff.checked_rem(a) == Some(0) && diff.checked_div(a).is_some_and(|n| n >= 0)
}

struct Parser<'a> {
    /// The complete selector, for error messages.
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, text: &str) -> Self {
        Self {
            source,
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> HostError {
        HostError::InvalidSelector {
            selector: self.source.to_owned(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos = self.pos.saturating_add(1);
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.advance();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> HostResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {expected:?}")))
        }
    }

    /// Skips whitespace and reports whether any was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.pos > start
    }

    fn combinator_symbol(&mut self) -> Option<Combinator> {
        let combinator = match self.peek()? {
            '>' => Combinator::Child,
            '+' => Combinator::Adjacent,
            '~' => Combinator::Sibling,
            _ => return None,
        };
        self.advance();
        Some(combinator)
    }

    fn parse_list(&mut self) -> HostResult<SelectorList> {
        let mut complexes = vec![self.parse_complex()?];
        loop {
            self.skip_whitespace();
            if !self.eat(',') {
                break;
            }
            complexes.push(self.parse_complex()?);
        }
        Ok(SelectorList(complexes))
    }

    fn parse_complex(&mut self) -> HostResult<Complex> {
        self.skip_whitespace();
        let leading = self.combinator_symbol();
        self.skip_whitespace();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',' | ')') => break,
                Some(_) => match self.combinator_symbol() {
                    Some(c) => c,
                    None if had_whitespace => Combinator::Descendant,
                    None => return Err(self.error(format!("unexpected {:?}", self.peek()))),
                },
            };
            self.skip_whitespace();
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(Complex {
            leading,
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> HostResult<Compound> {
        let mut parts = Vec::new();
        let mut universal = false;

        if self.eat('*') {
            if self.eat('|') {
                let local = self.ident()?.to_ascii_lowercase();
                parts.push(Simple::TagAnyNamespace(local));
            } else {
                universal = true;
            }
        } else if self.peek().is_some_and(is_ident_char) {
            let mut name = self.ident()?.to_ascii_lowercase();
            if self.eat('|') {
                name = format!("{name}:{}", self.ident()?.to_ascii_lowercase());
            }
            parts.push(Simple::Tag(name));
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.advance();
                    parts.push(Simple::Id(self.ident()?));
                },
                Some('.') => {
                    self.advance();
                    parts.push(Simple::Class(self.ident()?));
                },
                Some('[') => {
                    self.advance();
                    parts.push(self.parse_attribute()?);
                },
                Some(':') => {
                    self.advance();
                    parts.push(self.parse_pseudo()?);
                },
                _ => break,
            }
        }

        if parts.is_empty() && !universal {
            return Err(self.error("expected a selector"));
        }
        Ok(Compound(parts))
    }

    fn ident(&mut self) -> HostResult<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.advance();
                match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
            } else if is_ident_char(c) {
                out.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(out)
    }

    fn parse_attribute(&mut self) -> HostResult<Simple> {
        self.skip_whitespace();
        let prefix = self.eat('^');
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '!' | '^' | '$' | '*' | '~' | ']') || c.is_whitespace() {
                break;
            }
            name.push(c);
            self.advance();
        }
        let name = name.to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error("expected an attribute name"));
        }
        self.skip_whitespace();

        if prefix {
            self.expect(']')?;
            return Ok(Simple::AttrPrefix(name));
        }
        if self.eat(']') {
            return Ok(Simple::HasAttr(name));
        }

        let op = match self.bump() {
            Some('=') => None,
            Some('!') => Some(AttrOp::NotEquals),
            Some('^') => Some(AttrOp::Prefix),
            Some('$') => Some(AttrOp::Suffix),
            Some('*') => Some(AttrOp::Contains),
            Some('~') => {
                self.expect('=')?;
                let pattern = self.attribute_value()?;
                let pattern = Regex::new(&pattern).map_err(|e| self.error(e.to_string()))?;
                return Ok(Simple::AttrRegex { name, pattern });
            },
            _ => return Err(self.error("expected an attribute operator")),
        };
        let op = match op {
            None => AttrOp::Equals,
            Some(op) => {
                self.expect('=')?;
                op
            },
        };
        let value = self.attribute_value()?.trim().to_lowercase();
        Ok(Simple::Attr { name, op, value })
    }

    /// Reads a quoted or bare attribute value and the closing `]`.
    fn attribute_value(&mut self) -> HostResult<String> {
        self.skip_whitespace();
        let mut value = String::new();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                loop {
                    match self.bump() {
                        Some('\\') => {
                            if let Some(c) = self.bump() {
                                value.push(c);
                            }
                        },
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                self.skip_whitespace();
            },
            _ => {
                while let Some(c) = self.peek() {
                    if c == ']' {
                        break;
                    }
                    value.push(c);
                    self.advance();
                }
            },
        }
        self.expect(']')?;
        Ok(value)
    }

    fn parse_pseudo(&mut self) -> HostResult<Simple> {
        let name = self.ident()?.to_ascii_lowercase();
        let arg = if self.eat('(') {
            Some(self.balanced_argument()?)
        } else {
            None
        };
        let required = |arg: Option<String>| {
            arg.ok_or_else(|| self.error(format!(":{name} needs an argument")))
        };

        let simple = match name.as_str() {
            "lt" => Simple::IndexLessThan(self.index(&required(arg)?)?),
            "gt" => Simple::IndexGreaterThan(self.index(&required(arg)?)?),
            "eq" => Simple::IndexEquals(self.index(&required(arg)?)?),
            "has" => Simple::Has(self.nested(&required(arg)?)?),
            "not" => Simple::Not(self.nested(&required(arg)?)?),
            "contains" => Simple::Contains(unquote(&required(arg)?).to_lowercase()),
            "containsown" => Simple::ContainsOwn(unquote(&required(arg)?).to_lowercase()),
            "containsdata" => Simple::ContainsData(unquote(&required(arg)?).to_lowercase()),
            "matches" => Simple::Matches(self.regex(&required(arg)?)?),
            "matchesown" => Simple::MatchesOwn(self.regex(&required(arg)?)?),
            "nth-child" | "nth-last-child" | "nth-of-type" | "nth-last-of-type" => {
                let (a, b) = self.nth(&required(arg)?)?;
                Simple::Nth {
                    a,
                    b,
                    from_end: name.contains("last"),
                    of_type: name.ends_with("of-type"),
                }
            },
            "first-child" => first(false, false),
            "last-child" => first(true, false),
            "first-of-type" => first(false, true),
            "last-of-type" => first(true, true),
            "only-child" => Simple::OnlyChild,
            "only-of-type" => Simple::OnlyOfType,
            "empty" => Simple::Empty,
            "root" => Simple::Root,
            other => return Err(self.error(format!("unknown pseudo-class :{other}"))),
        };
        Ok(simple)
    }

    /// Reads up to the matching `)`, honouring nested parentheses and quotes.
    fn balanced_argument(&mut self) -> HostResult<String> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unbalanced parentheses"));
            };
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), '\\') => {
                    out.push(c);
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                    continue;
                },
                (Some(_), _) => {},
                (None, '"' | '\'') => quote = Some(c),
                (None, '(') => depth = depth.saturating_add(1),
                (None, ')') if depth == 0 => return Ok(out),
                (None, ')') => depth = depth.saturating_sub(1),
                (None, _) => {},
            }
            out.push(c);
        }
    }

    fn index(&self, arg: &str) -> HostResult<usize> {
        arg.trim()
            .parse()
            .map_err(|_| self.error(format!("{arg:?} is not an index")))
    }

    fn nested(&self, arg: &str) -> HostResult<SelectorList> {
        let mut parser = Parser::new(self.source, arg);
        let list = parser.parse_list()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(list),
            Some(c) => Err(parser.error(format!("unexpected {c:?}"))),
        }
    }

    fn regex(&self, arg: &str) -> HostResult<Regex> {
        Regex::new(&unquote(arg)).map_err(|e| self.error(e.to_string()))
    }

    fn nth(&self, arg: &str) -> HostResult<(i64, i64)> {
        let expr: String = arg
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let invalid = || self.error(format!("invalid nth expression {arg:?}"));
        match expr.as_str() {
            "odd" => return Ok((2, 1)),
            "even" => return Ok((2, 0)),
            _ => {},
        }
        let Some((a, b)) = expr.split_once('n') else {
            let b = expr.parse().map_err(|_| invalid())?;
            return Ok((0, b));
        };
        let a = match a {
            "" | "+" => 1,
            "-" => -1,
            a => a.parse().map_err(|_| invalid())?,
        };
        let b = if b.is_empty() {
            0
        } else {
            b.parse().map_err(|_| invalid())?
        };
        Ok((a, b))
    }
}

fn first(from_end: bool, of_type: bool) -> Simple {
    Simple::Nth {
        a: 0,
        b: 1,
        from_end,
        of_type,
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_') || !c.is_ascii()
}

fn unquote(arg: &str) -> String {
    let arg = arg.trim();
    ['"', '\'']
        .into_iter()
        .find_map(|quote| arg.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(arg)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::super::{Document, HtmlSet};
    use super::{nth_matches, unquote};
    use crate::error::HostError;

    const PAGE: &str = r#"
        <div id="main" class="content wide">
          <h1>Title</h1>
          <ul class="chapters">
            <li data-id="1"><a href="/c/1" title="First Chapter">One</a></li>
            <li data-id="2" class="new"><a href="/c/2">Two</a></li>
            <li data-id="3"><a href="/c/3.html">Three</a><span>extra</span></li>
            <li></li>
          </ul>
          <p>Intro <b>bold</b></p>
          <p>Outro</p>
          <svg:rect></svg:rect>
        </div>"#;

    fn texts(selector: &str) -> Vec<String> {
        HtmlSet::document(Document::parse(PAGE, None))
            .select(selector)
            .unwrap()
            .array()
            .iter()
            .map(HtmlSet::text)
            .collect()
    }

    fn count(selector: &str) -> usize {
        HtmlSet::document(Document::parse(PAGE, None))
            .select(selector)
            .unwrap()
            .len()
    }

    #[test]
    fn type_id_and_class() {
        assert_eq!(texts("h1"), vec!["Title"]);
        assert_eq!(count("#main"), 1);
        assert_eq!(count("div.content.wide"), 1);
        assert_eq!(count(".missing"), 0);
        assert_eq!(texts("li.new"), vec!["Two"]);
        assert_eq!(count("*"), count("html, head, body, div, h1, ul, li, a, span, p, b, svg|rect"));
    }

    #[test]
    fn attribute_operators() {
        assert_eq!(texts("[title]"), vec!["One"]);
        assert_eq!(texts("a[href=/c/2]"), vec!["Two"]);
        assert_eq!(texts("a[href^=/C/]").len(), 3);
        assert_eq!(texts("a[href$=.html]"), vec!["Three"]);
        assert_eq!(texts("a[title*=chapter]"), vec!["One"]);
        assert_eq!(texts("li[data-id!=2]").len(), 3);
        assert_eq!(texts(r#"a[href~=/c/\d$]"#), vec!["One", "Two"]);
        assert_eq!(count("[^data-]"), 3);
        assert_eq!(texts(r#"a[title="First Chapter"]"#), vec!["One"]);
    }

    #[test]
    fn combinators() {
        assert_eq!(count("div li"), 4);
        assert_eq!(count("div > li"), 0);
        assert_eq!(count("ul > li"), 4);
        assert_eq!(texts("h1 + ul > li.new"), vec!["Two"]);
        assert_eq!(texts("ul ~ p"), vec!["Intro bold", "Outro"]);
        assert_eq!(texts("h1, p b"), vec!["Title", "bold"]);
    }

    #[test]
    fn group_results_stay_in_document_order() {
        assert_eq!(texts("p, h1"), vec!["Title", "Intro bold", "Outro"]);
    }

    #[test]
    fn index_pseudos() {
        assert_eq!(texts("li:lt(2)"), vec!["One", "Two"]);
        assert_eq!(texts("li:gt(1)"), vec!["Threeextra", ""]);
        assert_eq!(texts("li:eq(0)"), vec!["One"]);
    }

    #[test]
    fn content_pseudos() {
        assert_eq!(texts("li:contains(two)"), vec!["Two"]);
        assert_eq!(texts("p:containsOwn(intro)"), vec!["Intro bold"]);
        assert_eq!(count("p:containsOwn(bold)"), 0);
        assert_eq!(texts("li:matches(^T)").len(), 2);
        assert_eq!(texts("p:matchesOwn(^Outro$)"), vec!["Outro"]);
    }

    #[test]
    fn has_and_not() {
        assert_eq!(texts("li:has(span)"), vec!["Threeextra"]);
        assert_eq!(texts("ul:has(> li.new)").len(), 1);
        assert_eq!(count("li:not(.new)"), 3);
        assert_eq!(count("li:not(:has(a))"), 1);
    }

    #[test]
    fn structural_pseudos() {
        assert_eq!(texts("li:first-child"), vec!["One"]);
        assert_eq!(texts("li:last-child"), vec![""]);
        assert_eq!(texts("li:nth-child(2n+1)"), vec!["One", "Threeextra"]);
        assert_eq!(texts("li:nth-child(even)"), vec!["Two", ""]);
        assert_eq!(texts("li:nth-last-child(2)"), vec!["Threeextra"]);
        assert_eq!(texts("p:first-of-type"), vec!["Intro bold"]);
        assert_eq!(texts("p:last-of-type"), vec!["Outro"]);
        assert_eq!(texts("p:nth-of-type(2)"), vec!["Outro"]);
        assert_eq!(texts("p:nth-last-of-type(2)"), vec!["Intro bold"]);
        assert_eq!(count("h1:only-of-type"), 1);
        assert_eq!(count("b:only-child"), 1);
        assert_eq!(count("li:empty"), 1);
        assert_eq!(count(":root"), 1);
        assert_eq!(count("li:nth-child(-n+2)"), 2);
    }

    #[test]
    fn extreme_nth_coefficients_match_nothing() {
        assert_eq!(count("li:nth-child(-9223372036854775808)"), 0);
        assert_eq!(count("li:nth-last-child(-9223372036854775808)"), 0);
        assert_eq!(count("li:nth-child(-9223372036854775808n-9223372036854775808)"), 0);
        assert_eq!(count("li:nth-child(9223372036854775807n+9223372036854775807)"), 0);
        assert_eq!(count("li:nth-child(-9223372036854775808n+1)"), 1);
        assert_eq!(count("li:nth-of-type(-n+9223372036854775807)"), 4);
    }

    #[test]
    fn nth_arithmetic_is_checked() {
        assert!(!nth_matches(0, i64::MIN, 1));
        assert!(!nth_matches(-1, i64::MIN, 0));
        assert!(nth_matches(i64::MIN, 1, 1));
        assert!(nth_matches(2, 1, 5));
        assert!(!nth_matches(2, 1, 4));
        assert!(nth_matches(-1, 3, 2));
        assert!(!nth_matches(-1, 3, 4));
    }

    #[test]
    fn out_of_range_nth_is_rejected() {
        let result = HtmlSet::document(Document::parse(PAGE, None))
            .select("li:nth-child(99999999999999999999)");
        assert!(matches!(result, Err(HostError::InvalidSelector { .. })));
    }

    #[test]
    fn quoted_arguments_are_unwrapped() {
        assert_eq!(unquote(r#" "two" "#), "two");
        assert_eq!(unquote("'two'"), "two");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("\"two'"), "\"two'");
        assert_eq!(texts(r#"li:contains("two")"#), vec!["Two"]);
    }

    #[test]
    fn namespaced_tags() {
        assert_eq!(count("svg|rect"), 1);
        assert_eq!(count("*|rect"), 1);
    }

    #[test]
    fn leading_combinator_is_relative_to_scope() {
        let doc = HtmlSet::document(Document::parse(PAGE, None));
        let ul = doc.select("ul").unwrap();
        assert_eq!(ul.select("> li").unwrap().len(), 4);
        assert_eq!(ul.select("> a").unwrap().len(), 0);
        assert_eq!(ul.select("+ p").unwrap().text(), "Intro bold");
    }

    #[test]
    fn select_includes_the_scope_element() {
        let doc = HtmlSet::document(Document::parse(PAGE, None));
        let ul = doc.select("ul").unwrap();
        assert_eq!(ul.select("ul").unwrap().len(), 1);
    }

    #[test]
    fn invalid_selectors_are_rejected() {
        for bad in ["", "li:bogus", "a[href", "li:eq(x)", "p >", ":has()", "li)"] {
            let result = HtmlSet::document(Document::parse(PAGE, None)).select(bad);
            assert!(
                matches!(result, Err(HostError::InvalidSelector { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
