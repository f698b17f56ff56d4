//! Egress channel errors.

use std::net::AddrParseError;

use hickory_resolver::ResolveError;

/// Errors from the egress channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EgressError {
	/// The domain is not in the compiled-in allowlist. The connection was
	/// refused before any bytes left the enclave.
	DomainNotAllowed(String),
	/// An allowlist entry is not a plain domain name or IP literal.
	InvalidAllowlistEntry(String),
	/// DNS resolution error.
	DnsResolution(String),
	/// Parsing error with an address.
	ParseError(String),
	/// Error variant encapsulating OS IO errors.
	IoError(String),
}

impl From<std::io::Error> for EgressError {
	fn from(err: std::io::Error) -> Self {
		Self::IoError(format!("{err:?}"))
	}
}

impl From<AddrParseError> for EgressError {
	fn from(err: AddrParseError) -> Self {
		Self::ParseError(format!("{err:?}"))
	}
}

impl From<ResolveError> for EgressError {
	fn from(err: ResolveError) -> Self {
		Self::DnsResolution(format!("{err:?}"))
	}
}
