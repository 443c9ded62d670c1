//! Raw boundary bindings for Quill guests.
//!
//! The host owns every value tree, parsed document and HTTP request; the
//! guest only holds [`Handle`]s. Handles cross as `u32`, booleans as `i32`
//! (non-zero is true), integers as `i64`, floats and dates as `f64`, and
//! strings as UTF-8 byte buffers. In optional string positions an empty
//! buffer means "absent".
//!
//! On `wasm32` every call is an Extism host import. On other targets the
//! same signatures are served in-process by `quill-host`, so guest code
//! and its tests run natively. All ergonomics live in `quill-sdk`.

#![allow(unsafe_code)]
#![allow(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]

/// Host resource identifier.
pub type Handle = u32;

#[cfg(target_arch = "wasm32")]
mod wasm;
#[cfg(target_arch = "wasm32")]
pub use wasm::*;

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(not(target_arch = "wasm32"))]
pub use native::*;
