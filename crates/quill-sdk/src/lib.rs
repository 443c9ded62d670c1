//! Safe guest API for Quill plugins.
//!
//! The host owns every value tree, parsed document and HTTP request. This
//! crate wraps the raw handles from `quill-sys` in owned types that release
//! their host resource on drop:
//!
//! - [`ValueRef`]: dynamic values (null, numbers, strings, arrays, objects, dates)
//! - [`json`]: JSON parsed into a [`ValueRef`]
//! - [`html::Node`]: parsed documents, elements and node-sets with CSS selection
//! - [`net::Request`] / [`net::Response`]: one-shot HTTP exchanges
//!
//! ```rust,no_run
//! use quill_sdk::prelude::*;
//!
//! # fn main() -> Result<(), SysError> {
//! let page = net::Request::get("https://example.com/manga/1")?.html()?;
//! for chapter in page.select("ul.chapters > li a")?.array()? {
//!     sys::print(format!("{}: {}", chapter.text()?, chapter.attr("abs:href")?))?;
//! }
//! # Ok(())
//! # }
//! ```

#![allow(unsafe_code)]
#![allow(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]

use quill_sys::*;
pub use extism_pdk;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

mod value;

pub mod html;
pub mod json;
pub mod net;

pub use value::{Kind, ValueRef};

/// Core error type for SDK operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("Host function call failed: {0}")]
    HostError(#[from] extism_pdk::Error),
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("API logic error: {0}")]
    ApiError(String),
}

/// Decodes text returned by the host.
pub(crate) fn utf8(bytes: Vec<u8>) -> Result<String, SysError> {
    String::from_utf8(bytes).map_err(|e| SysError::ApiError(e.to_string()))
}

/// Persistent preferences, shared with the host application.
pub mod defaults {
    use super::*;

    /// The stored value, or a Null value when the key is unset.
    pub fn get(key: &str) -> Result<ValueRef, SysError> {
        let handle = unsafe { quill_defaults_get(key.as_bytes().to_vec())? };
        ValueRef::from_handle(handle)
    }

    /// Stores a copy of `value`. Storing a Null value unsets the key.
    pub fn set(key: &str, value: &ValueRef) -> Result<(), SysError> {
        unsafe { quill_defaults_set(key.as_bytes().to_vec(), value.handle())? };
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(key: &str) -> Result<T, SysError> {
        let json = get(key)?.to_json()?;
        let parsed = serde_json::from_value(json)?;
        Ok(parsed)
    }

    pub fn set_json<T: Serialize>(key: &str, value: &T) -> Result<(), SysError> {
        let json = serde_json::to_value(value)?;
        set(key, &ValueRef::from_json(&json)?)
    }
}

/// Links into the host application's views.
pub mod deeplink {
    use super::*;

    /// Object value `{ "manga": <id>, "chapter": <id or null> }`.
    pub fn create(manga_id: &str, chapter_id: Option<&str>) -> Result<ValueRef, SysError> {
        let chapter = chapter_id.unwrap_or_default();
        let handle = unsafe {
            quill_deeplink_create(manga_id.as_bytes().to_vec(), chapter.as_bytes().to_vec())?
        };
        ValueRef::from_handle(handle)
    }
}

/// System logging
pub mod sys {
    use super::*;

    pub fn log(level: impl AsRef<[u8]>, message: impl AsRef<[u8]>) -> Result<(), SysError> {
        unsafe { quill_log(level.as_ref().to_vec(), message.as_ref().to_vec())? };
        Ok(())
    }

    /// Logs at `info`.
    pub fn print(message: impl AsRef<[u8]>) -> Result<(), SysError> {
        log("info", message)
    }
}

pub mod prelude {
    pub use crate::html::{self, Node};
    pub use crate::net::{self, HttpMethod, RateLimit, Request, RequestOptions, Response};
    pub use crate::{Kind, SysError, ValueRef, deeplink, defaults, json, sys};
    pub use extism_pdk::plugin_fn;
}
