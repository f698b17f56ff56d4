//! Network policy for the enclave: the build-time allowlist, the single
//! sanctioned egress channel, and reachability probing over it.
//!
//! The enclave has no direct network access; every outbound connection goes
//! through the host's forwarding channel, and this crate gates that channel
//! on the compiled-in allowlist. Enforcement is structural, not advisory: a
//! connect to a non-allowed domain fails closed here before any DNS query
//! or byte leaves the enclave, so a misconfigured host cannot silently
//! widen egress.

#![deny(clippy::all, unsafe_code)]

mod allowlist;
mod channel;
mod error;

pub use allowlist::Allowlist;
pub use channel::{
	EgressChannel, DEFAULT_PROBE_PORT, DEFAULT_PROBE_TIMEOUT_MS,
};
pub use error::EgressError;
