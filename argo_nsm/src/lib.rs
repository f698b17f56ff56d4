//! Attestation document issuance for the enclave.
//!
//! Binds the enclave's ephemeral public key into a platform-signed
//! attestation document via the Nitro Secure Module. Documents are issued
//! fresh on every request; nothing is cached, so a document only speaks for
//! the identity at issuance time.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod types;

mod error;
mod nsm;

pub use error::AttestError;
pub use nsm::{Nsm, NsmProvider};

#[cfg(any(feature = "mock", test))]
pub mod mock;

/// Request a fresh attestation document with `public_key` bound into the
/// document's public key field.
///
/// Returns the raw platform-signed document bytes; transport encoding (hex)
/// is left to the boundary layer.
pub fn attestation_doc(
	attestor: &dyn NsmProvider,
	public_key: &[u8],
) -> Result<Vec<u8>, AttestError> {
	let request = types::NsmRequest::Attestation {
		user_data: None,
		nonce: None,
		public_key: Some(public_key.to_vec()),
	};

	let fd = attestor.nsm_init();
	let response = attestor.nsm_process_request(fd, request);
	attestor.nsm_exit(fd);

	match response {
		types::NsmResponse::Attestation { document } => Ok(document),
		types::NsmResponse::Error(code) => {
			Err(AttestError::AttestationUnavailable(code))
		}
		resp => Err(AttestError::UnexpectedNsmResponse(resp)),
	}
}
