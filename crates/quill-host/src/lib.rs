//! Quill reference host.
//!
//! Serves the Quill boundary calls in-process so that guests built for
//! native targets (unit tests, desktop tooling) run without a WASM runtime.
//! Each thread owns one [`Session`]; `quill-sys` routes every call to it.
//!
//! # Example
//!
//! ```rust,no_run
//! use quill_host::net::{HttpResponse, StaticTransport};
//! use quill_host::{HostConfig, install_transport, configure};
//!
//! # fn main() -> Result<(), quill_host::HostError> {
//! configure(HostConfig::from_toml_str("user_agent = \"tests\"")?);
//! install_transport(
//!     StaticTransport::new().route("https://example.com/", HttpResponse::new(200, "ok")),
//! );
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]

pub mod config;
pub mod error;
pub mod html;
pub mod logging;
pub mod net;
mod session;
mod table;
pub mod value;

use std::cell::RefCell;

pub use config::{HostConfig, RateLimitConfig};
pub use error::{HostError, HostResult};
pub use logging::{LogConfig, LogFormat};
pub use net::Transport;
pub use session::Session;
pub use value::Kind;

thread_local! {
    static SESSION: RefCell<Session> = RefCell::new(Session::default());
}

/// Runs `f` against the current thread's session.
///
/// # Panics
///
/// Panics if called re-entrantly from inside `f`.
pub fn with_session<R>(f: impl FnOnce(&mut Session) -> R) -> R {
    SESSION.with(|session| f(&mut session.borrow_mut()))
}

/// Applies `config` to the current thread's session.
pub fn configure(config: HostConfig) {
    with_session(|session| session.configure(config));
}

/// Routes the current thread's HTTP requests through `transport`.
pub fn install_transport(transport: impl Transport + 'static) {
    with_session(|session| session.set_transport(Box::new(transport)));
}

/// Replaces the current thread's session with a fresh one, dropping every handle.
pub fn reset() {
    with_session(|session| *session = Session::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_are_per_thread() {
        let handle = with_session(|s| s.value_create_int(1));
        let other = std::thread::spawn(move || with_session(|s| s.value_read_int(handle).is_err()))
            .join()
            .unwrap();
        assert!(other);
        assert_eq!(with_session(|s| s.value_read_int(handle).unwrap()), 1);
    }

    #[test]
    fn reset_drops_handles() {
        with_session(|s| s.value_create_null());
        reset();
        assert_eq!(with_session(|s| s.live_handles()), 0);
    }

    #[test]
    fn configure_applies_to_the_session() {
        configure(HostConfig::from_toml_str("timeout_secs = 7").unwrap());
        assert_eq!(with_session(|s| s.config().timeout_secs), 7);
    }
}
