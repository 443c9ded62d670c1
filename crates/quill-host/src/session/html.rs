//! HTML parse, query and extraction calls.
//!
//! HTML handles are ordinary value handles of kind Node. Navigation that
//! finds nothing returns a handle to a Null value instead.

use super::{Session, optional_utf8, utf8};
use crate::error::{HostError, HostResult};
use crate::html::{Document, HtmlSet};
use crate::value::{Kind, Value};

impl Session {
    /// # Errors
    ///
    /// Never fails for document text; parsing is lenient.
    pub fn html_parse(&mut self, bytes: &[u8]) -> HostResult<u32> {
        self.parse_html(bytes, b"", false)
    }

    /// # Errors
    ///
    /// Fails if `base_uri` is not UTF-8.
    pub fn html_parse_with_uri(&mut self, bytes: &[u8], base_uri: &[u8]) -> HostResult<u32> {
        self.parse_html(bytes, base_uri, false)
    }

    /// # Errors
    ///
    /// Never fails for fragment text; parsing is lenient.
    pub fn html_parse_fragment(&mut self, bytes: &[u8]) -> HostResult<u32> {
        self.parse_html(bytes, b"", true)
    }

    /// # Errors
    ///
    /// Fails if `base_uri` is not UTF-8.
    pub fn html_parse_fragment_with_uri(
        &mut self,
        bytes: &[u8],
        base_uri: &[u8],
    ) -> HostResult<u32> {
        self.parse_html(bytes, base_uri, true)
    }

    /// # Errors
    ///
    /// Fails for non-Node handles and invalid selectors.
    pub fn html_select(&mut self, handle: u32, selector: &[u8]) -> HostResult<u32> {
        let selector = utf8(selector, "selector")?;
        let found = self.with_nodes(handle, |set| set.select(selector))??;
        tracing::debug!(selector, matched = found.len(), "selected html nodes");
        Ok(self.alloc(Value::Node(found)))
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_attr(&self, handle: u32, name: &[u8]) -> HostResult<Vec<u8>> {
        let name = utf8(name, "attribute name")?;
        self.with_nodes(handle, |set| set.attr(name).into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_first(&mut self, handle: u32) -> HostResult<u32> {
        let found = self.with_nodes(handle, HtmlSet::first)?;
        Ok(self.alloc_found(found))
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_last(&mut self, handle: u32) -> HostResult<u32> {
        let found = self.with_nodes(handle, HtmlSet::last)?;
        Ok(self.alloc_found(found))
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_next(&mut self, handle: u32) -> HostResult<u32> {
        let found = self.with_nodes(handle, HtmlSet::next)?;
        Ok(self.alloc_found(found))
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_previous(&mut self, handle: u32) -> HostResult<u32> {
        let found = self.with_nodes(handle, HtmlSet::previous)?;
        Ok(self.alloc_found(found))
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_body(&mut self, handle: u32) -> HostResult<u32> {
        let found = self.with_nodes(handle, HtmlSet::body)?;
        Ok(self.alloc_found(found))
    }

    /// Array of single-element Node values, in document order.
    ///
    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_array(&mut self, handle: u32) -> HostResult<u32> {
        let items = self.with_nodes(handle, |set| {
            set.array()
                .into_iter()
                .map(|node| Value::Node(node).into_slot())
                .collect()
        })?;
        Ok(self.alloc(Value::Array(items)))
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_base_uri(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.with_nodes(handle, |set| set.base_uri().into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_text(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.with_nodes(handle, |set| set.text().into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_own_text(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.with_nodes(handle, |set| set.own_text().into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_data(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.with_nodes(handle, |set| set.data().into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_html(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.with_nodes(handle, |set| set.html().into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_outer_html(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.with_nodes(handle, |set| set.outer_html().into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_id(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.with_nodes(handle, |set| set.id().into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_tag_name(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.with_nodes(handle, |set| set.tag_name().into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_class_name(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.with_nodes(handle, |set| set.class_name().into_bytes())
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_has_class(&self, handle: u32, class: &[u8]) -> HostResult<i32> {
        let class = utf8(class, "class name")?;
        self.with_nodes(handle, |set| i32::from(set.has_class(class)))
    }

    /// # Errors
    ///
    /// Fails for non-Node handles.
    pub fn html_has_attr(&self, handle: u32, name: &[u8]) -> HostResult<i32> {
        let name = utf8(name, "attribute name")?;
        self.with_nodes(handle, |set| i32::from(set.has_attr(name)))
    }

    pub(super) fn parse_html(
        &mut self,
        bytes: &[u8],
        base_uri: &[u8],
        fragment: bool,
    ) -> HostResult<u32> {
        let base_uri = optional_utf8(base_uri, "base uri")?;
        let text = String::from_utf8_lossy(bytes);
        let doc = if fragment {
            Document::parse_fragment(&text, base_uri)
        } else {
            Document::parse(&text, base_uri)
        };
        Ok(self.alloc(Value::Node(HtmlSet::document(doc))))
    }

    /// Handle for a navigation result: the nodes, or Null when there are none.
    fn alloc_found(&mut self, found: Option<HtmlSet>) -> u32 {
        self.alloc(found.map_or(Value::Null, Value::Node))
    }

    fn with_nodes<T>(&self, handle: u32, f: impl FnOnce(&HtmlSet) -> T) -> HostResult<T> {
        let slot = self.slot(handle)?;
        let value = slot.borrow();
        match &*value {
            Value::Node(set) => Ok(f(set)),
            other => Err(HostError::WrongKind {
                expected: Kind::Node,
                found: other.kind(),
            }),
        }
    }
}
