//! Parsed HTML documents, elements and node-sets.
//!
//! A [`Node`] is a document, a single element or the result of a selection.
//! Selection uses jsoup-style CSS: the usual type, class, id, attribute and
//! combinator selectors plus `:eq(n)`, `:lt(n)`, `:gt(n)`, `:has(..)`,
//! `:not(..)`, `:contains(..)`, `:matches(..)` and the structural pseudos.
//! The node a selection starts from is itself a candidate.

use quill_sys::*;

use crate::{Kind, SysError, ValueRef, utf8};

pub fn parse(data: impl AsRef<[u8]>) -> Result<Node, SysError> {
    let handle = unsafe { quill_html_parse(data.as_ref().to_vec())? };
    Node::expect(handle)
}

/// Parses a document, resolving relative links against `base_uri`. A
/// `<base href>` in the document takes precedence.
pub fn parse_with_uri(data: impl AsRef<[u8]>, base_uri: &str) -> Result<Node, SysError> {
    let handle = unsafe {
        quill_html_parse_with_uri(data.as_ref().to_vec(), base_uri.as_bytes().to_vec())?
    };
    Node::expect(handle)
}

/// Parses a body fragment into a document with `html`, `head` and `body`.
pub fn parse_fragment(data: impl AsRef<[u8]>) -> Result<Node, SysError> {
    let handle = unsafe { quill_html_parse_fragment(data.as_ref().to_vec())? };
    Node::expect(handle)
}

pub fn parse_fragment_with_uri(data: impl AsRef<[u8]>, base_uri: &str) -> Result<Node, SysError> {
    let handle = unsafe {
        quill_html_parse_fragment_with_uri(data.as_ref().to_vec(), base_uri.as_bytes().to_vec())?
    };
    Node::expect(handle)
}

/// Owned handle to HTML nodes. Dropping it releases the handle.
#[derive(Debug)]
pub struct Node {
    value: ValueRef,
}

impl Node {
    /// `Some` if the value is a Node; other values are released.
    #[must_use]
    pub fn from_value(value: ValueRef) -> Option<Self> {
        (value.kind() == Kind::Node).then_some(Self { value })
    }

    fn expect(handle: Handle) -> Result<Self, SysError> {
        let value = ValueRef::from_handle(handle)?;
        let kind = value.kind();
        Self::from_value(value)
            .ok_or_else(|| SysError::ApiError(format!("expected Node handle, found {kind}")))
    }

    /// Navigation results: the host answers with a non-Node value when there is nothing.
    fn optional(handle: Handle) -> Result<Option<Self>, SysError> {
        Ok(Self::from_value(ValueRef::from_handle(handle)?))
    }

    #[must_use]
    pub fn handle(&self) -> Handle {
        self.value.handle()
    }

    #[must_use]
    pub fn into_value(self) -> ValueRef {
        self.value
    }

    /// Matching nodes in document order, without duplicates.
    pub fn select(&self, selector: &str) -> Result<Node, SysError> {
        let handle = unsafe { quill_html_select(self.handle(), selector.as_bytes().to_vec())? };
        Self::expect(handle)
    }

    /// On a node-set its first member; on an element its first element
    /// sibling (possibly itself); on a document the document.
    pub fn first(&self) -> Result<Option<Node>, SysError> {
        Self::optional(unsafe { quill_html_first(self.handle())? })
    }

    /// Mirror of [`Self::first`].
    pub fn last(&self) -> Result<Option<Node>, SysError> {
        Self::optional(unsafe { quill_html_last(self.handle())? })
    }

    pub fn next(&self) -> Result<Option<Node>, SysError> {
        Self::optional(unsafe { quill_html_next(self.handle())? })
    }

    pub fn previous(&self) -> Result<Option<Node>, SysError> {
        Self::optional(unsafe { quill_html_previous(self.handle())? })
    }

    pub fn body(&self) -> Result<Option<Node>, SysError> {
        Self::optional(unsafe { quill_html_body(self.handle())? })
    }

    /// One node per element of the set.
    pub fn array(&self) -> Result<Vec<Node>, SysError> {
        let items = ValueRef::from_handle(unsafe { quill_html_array(self.handle())? })?;
        Ok(items
            .as_array()?
            .into_iter()
            .filter_map(Node::from_value)
            .collect())
    }

    /// Attribute value, or empty. An `abs:` prefix resolves it against the base URI.
    pub fn attr(&self, name: &str) -> Result<String, SysError> {
        utf8(unsafe { quill_html_attr(self.handle(), name.as_bytes().to_vec())? })
    }

    pub fn base_uri(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_html_base_uri(self.handle())? })
    }

    /// Rendered text: whitespace collapsed, block elements separated.
    pub fn text(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_html_text(self.handle())? })
    }

    pub fn own_text(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_html_own_text(self.handle())? })
    }

    /// Contents of `script` and `style` elements.
    pub fn data(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_html_data(self.handle())? })
    }

    /// Inner markup.
    pub fn html(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_html_html(self.handle())? })
    }

    pub fn outer_html(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_html_outer_html(self.handle())? })
    }

    pub fn id(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_html_id(self.handle())? })
    }

    pub fn tag_name(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_html_tag_name(self.handle())? })
    }

    pub fn class_name(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_html_class_name(self.handle())? })
    }

    pub fn has_class(&self, class: &str) -> Result<bool, SysError> {
        let found = unsafe { quill_html_has_class(self.handle(), class.as_bytes().to_vec())? };
        Ok(found != 0)
    }

    pub fn has_attr(&self, name: &str) -> Result<bool, SysError> {
        let found = unsafe { quill_html_has_attr(self.handle(), name.as_bytes().to_vec())? };
        Ok(found != 0)
    }

    pub fn close(self) -> Result<(), SysError> {
        self.value.close()
    }
}
