//! Attestation flow errors.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::NsmResponse;

/// Errors from requesting an attestation document.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum AttestError {
	/// The platform measurement subsystem refused or failed to produce a
	/// document. Expected when running outside a measured environment.
	/// Non-fatal and retryable.
	AttestationUnavailable(String),
	/// The NSM answered with a response that does not match the request.
	UnexpectedNsmResponse(NsmResponse),
}
