//! Borsh friendly mirrors of the Nitro Secure Module request and response
//! types the attestation flow uses.

use aws_nitro_enclaves_nsm_api as nsm;
use borsh::{BorshDeserialize, BorshSerialize};
use serde_bytes::ByteBuf;

/// Requests this enclave makes to the Nitro Secure Module.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum NsmRequest {
	/// Request a fresh attestation document.
	Attestation {
		/// Arbitrary user data to bind into the document.
		user_data: Option<Vec<u8>>,
		/// Verifier supplied nonce to bind into the document.
		nonce: Option<Vec<u8>>,
		/// Public key to bind into the document.
		public_key: Option<Vec<u8>>,
	},
	/// Read a platform configuration register.
	DescribePcr {
		/// Index of the PCR to read.
		index: u16,
	},
}

/// Responses from the Nitro Secure Module.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum NsmResponse {
	/// A COSE Sign1 structure containing the attestation document, signed
	/// by the platform's measurement root (not by any enclave key).
	Attestation {
		/// DER encoded COSE Sign1.
		document: Vec<u8>,
	},
	/// Contents of a platform configuration register.
	DescribePcr {
		/// Whether the register is locked.
		lock: bool,
		/// The register value.
		data: Vec<u8>,
	},
	/// The NSM driver returned an error code.
	Error(String),
}

impl From<NsmRequest> for nsm::api::Request {
	fn from(request: NsmRequest) -> Self {
		match request {
			NsmRequest::Attestation { user_data, nonce, public_key } => {
				Self::Attestation {
					user_data: user_data.map(ByteBuf::from),
					nonce: nonce.map(ByteBuf::from),
					public_key: public_key.map(ByteBuf::from),
				}
			}
			NsmRequest::DescribePcr { index } => Self::DescribePCR { index },
		}
	}
}

impl From<nsm::api::Response> for NsmResponse {
	fn from(response: nsm::api::Response) -> Self {
		match response {
			nsm::api::Response::Attestation { document } => {
				Self::Attestation { document }
			}
			nsm::api::Response::DescribePCR { lock, data } => {
				Self::DescribePcr { lock, data }
			}
			nsm::api::Response::Error(code) => Self::Error(format!("{code:?}")),
			other => Self::Error(format!("unexpected response: {other:?}")),
		}
	}
}
