//! One guest session: every resource the guest holds a handle to.
//!
//! Methods are named after the boundary calls they serve, without the
//! `quill_` prefix, and take the same raw arguments: handles as `u32`,
//! booleans as `i32`, strings as UTF-8 bytes where an empty buffer stands
//! for "absent" in optional positions.

mod html;
mod net;
mod sys;
mod value;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config::{HostConfig, RateLimitConfig};
use crate::error::{HostError, HostResult};
use crate::net::{RateLimiter, RequestState, ReqwestTransport, Transport};
use crate::table::HandleTable;
use crate::value::{Kind, Slot, Value};

/// What a handle names.
#[derive(Debug)]
enum Resource {
    /// Value trees and HTML nodes.
    Value(Slot),
    Request(Box<RequestState>),
}

/// Host-side state of a guest.
pub struct Session {
    config: HostConfig,
    resources: HandleTable<Resource>,
    defaults: BTreeMap<String, Slot>,
    /// Built lazily from `config` unless one was installed.
    transport: Option<Box<dyn Transport>>,
    limiter: RateLimiter,
}

impl Session {
    #[must_use]
    pub fn new(config: HostConfig) -> Self {
        Self {
            defaults: seed_defaults(&config),
            limiter: RateLimiter::new(config.rate_limit),
            config,
            resources: HandleTable::default(),
            transport: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Replaces the configuration, reseeding defaults and the rate limit.
    ///
    /// Live handles survive. An installed transport is kept; the default one
    /// is rebuilt with the new settings on the next send.
    pub fn configure(&mut self, config: HostConfig) {
        self.defaults = seed_defaults(&config);
        self.limiter = RateLimiter::new(config.rate_limit);
        self.config = config;
        if self.transport.is_some() {
            tracing::debug!("host configuration replaced, keeping installed transport");
        }
    }

    pub fn set_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport = Some(transport);
    }

    /// The throttle currently applied to sends, if any.
    #[must_use]
    pub fn rate_limit(&self) -> Option<RateLimitConfig> {
        self.limiter.limit()
    }

    /// Number of handles the guest has not released yet.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.resources.len()
    }

    fn alloc(&mut self, value: Value) -> u32 {
        self.alloc_slot(value.into_slot())
    }

    fn alloc_slot(&mut self, slot: Slot) -> u32 {
        let kind = slot.borrow().kind();
        let handle = self.resources.insert(Resource::Value(slot));
        tracing::debug!(handle, %kind, "allocated handle");
        handle
    }

    fn release(&mut self, handle: u32) -> HostResult<()> {
        self.resources.remove(handle)?;
        tracing::debug!(handle, "released handle");
        Ok(())
    }

    fn slot(&self, handle: u32) -> HostResult<Slot> {
        match self.resources.get(handle)? {
            Resource::Value(slot) => Ok(Rc::clone(slot)),
            Resource::Request(_) => Err(HostError::InvalidHandle(handle)),
        }
    }

    fn request(&mut self, handle: u32) -> HostResult<&mut RequestState> {
        match self.resources.get_mut(handle)? {
            Resource::Request(request) => Ok(request.as_mut()),
            Resource::Value(_) => Err(HostError::InvalidHandle(handle)),
        }
    }

    fn transport(&mut self) -> HostResult<&dyn Transport> {
        if self.transport.is_none() {
            self.transport = Some(Box::new(ReqwestTransport::new(&self.config)?));
        }
        self.transport
            .as_deref()
            .ok_or_else(|| HostError::Transport("no transport available".into()))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

fn seed_defaults(config: &HostConfig) -> BTreeMap<String, Slot> {
    config
        .defaults
        .iter()
        .map(|(k, v)| (k.clone(), Value::from_json(v).into_slot()))
        .collect()
}

/// Fails with [`HostError::WrongKind`] unless the slot holds `expected`.
fn expect_kind(slot: &Slot, expected: Kind) -> HostResult<()> {
    let found = slot.borrow().kind();
    if found == expected {
        Ok(())
    } else {
        Err(HostError::WrongKind { expected, found })
    }
}

fn utf8<'a>(bytes: &'a [u8], what: &'static str) -> HostResult<&'a str> {
    std::str::from_utf8(bytes).map_err(|_| HostError::InvalidUtf8(what))
}

/// Optional string argument: an empty buffer means absent.
fn optional_utf8<'a>(bytes: &'a [u8], what: &'static str) -> HostResult<Option<&'a str>> {
    if bytes.is_empty() {
        Ok(None)
    } else {
        utf8(bytes, what).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_seed_the_store() {
        let config = HostConfig::from_toml_str("[defaults]\nlanguage = \"en\"").unwrap();
        let mut session = Session::new(config);
        let handle = session.defaults_get(b"language").unwrap();
        assert_eq!(session.value_read_string(handle).unwrap(), b"en");
    }

    #[test]
    fn configure_reseeds_and_keeps_handles() {
        let mut session = Session::default();
        let handle = session.value_create_int(7);
        session.configure(HostConfig::from_toml_str("[defaults]\nx = 1").unwrap());
        assert_eq!(session.value_read_int(handle).unwrap(), 7);
        let x = session.defaults_get(b"x").unwrap();
        assert_eq!(session.value_read_int(x).unwrap(), 1);
    }

    #[test]
    fn requests_are_not_values() {
        let mut session = Session::default();
        let request = session.net_init(0).unwrap();
        assert_eq!(session.value_type_of(request).unwrap(), Kind::Null as i32);
        assert!(matches!(
            session.array_len(request),
            Err(HostError::InvalidHandle(_))
        ));
    }

    #[test]
    fn optional_strings_treat_empty_as_absent() {
        assert_eq!(optional_utf8(b"", "tz").unwrap(), None);
        assert_eq!(optional_utf8(b"UTC", "tz").unwrap(), Some("UTC"));
        assert!(matches!(
            optional_utf8(&[0xff], "tz"),
            Err(HostError::InvalidUtf8("tz"))
        ));
    }
}
