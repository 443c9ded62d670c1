//! JSON parsed by the host.
//!
//! Invalid input does not fail: the result is a Null value and the host
//! logs a warning.

use quill_sys::*;

use crate::{SysError, ValueRef};

pub fn parse(data: impl AsRef<[u8]>) -> Result<ValueRef, SysError> {
    let handle = unsafe { quill_json_parse(data.as_ref().to_vec())? };
    ValueRef::from_handle(handle)
}

pub fn parse_str(text: &str) -> Result<ValueRef, SysError> {
    parse(text.as_bytes())
}
