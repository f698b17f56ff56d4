//! Canonical encoding and signing of intent messages.
//!
//! An [`IntentMessage`] is the unit the enclave signs and a remote verifier
//! independently reconstructs. Both sides must produce identical bytes for
//! the same logical message, so the canonical encoding is fixed: borsh, i.e.
//! a one byte intent tag, the timestamp as an 8 byte little-endian u64, and
//! the data as a 4 byte little-endian length prefix followed by the raw
//! bytes. Any change here breaks every deployed verifier.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use argo_identity::{EphemeralPair, PublicVerifier, SIGNATURE_LEN};
use borsh::{BorshDeserialize, BorshSerialize};

mod scope;
pub use scope::IntentScope;

const MEGABYTE: usize = 1024 * 1024;
/// Upper bound on the `data` field of an [`IntentMessage`].
pub const MAX_DATA_LEN: usize = MEGABYTE;

/// Errors from encoding, decoding and signing intent messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
	/// The intent tag is not part of the [`IntentScope`] enumeration.
	UnknownIntent(u8),
	/// The symbolic intent name is not part of the [`IntentScope`]
	/// enumeration.
	UnknownIntentName(String),
	/// The `data` field exceeds [`MAX_DATA_LEN`]. Holds the offending
	/// length.
	OversizedData(usize),
	/// The message could not be canonically encoded. Indicates a bug rather
	/// than bad input.
	Encode,
	/// The byte string is not a canonical encoding of any intent message:
	/// truncated, mis-length-prefixed, or carrying trailing bytes.
	Decode,
	/// The identity failed to produce a signature.
	Signing,
	/// The signature did not verify against the canonical encoding and the
	/// given public key.
	FailedSignatureVerification,
}

/// A message the enclave attests to by signature.
#[derive(
	Debug,
	Clone,
	PartialEq,
	Eq,
	BorshSerialize,
	BorshDeserialize,
	serde::Serialize,
	serde::Deserialize,
)]
pub struct IntentMessage {
	/// Semantic category of the message.
	pub intent: IntentScope,
	/// Unix timestamp in milliseconds at which the result was produced.
	pub timestamp_ms: u64,
	/// Application-defined payload bytes. Hex encoded in transport JSON.
	#[serde(with = "hex::serde")]
	pub data: Vec<u8>,
}

impl IntentMessage {
	/// Construct a message, enforcing the payload size bound up front.
	pub fn new(
		intent: IntentScope,
		timestamp_ms: u64,
		data: Vec<u8>,
	) -> Result<Self, IntentError> {
		if data.len() > MAX_DATA_LEN {
			return Err(IntentError::OversizedData(data.len()));
		}
		Ok(Self { intent, timestamp_ms, data })
	}

	/// The canonical byte encoding of this message.
	pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, IntentError> {
		if self.data.len() > MAX_DATA_LEN {
			return Err(IntentError::OversizedData(self.data.len()));
		}
		borsh::to_vec(self).map_err(|_| IntentError::Encode)
	}

	/// Strict inverse of [`Self::to_canonical_bytes`]. Every byte must be
	/// consumed; a truncated or mis-length-prefixed input fails rather than
	/// silently decoding to wrong values.
	pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, IntentError> {
		let msg =
			Self::try_from_slice(bytes).map_err(|_| IntentError::Decode)?;
		if msg.data.len() > MAX_DATA_LEN {
			return Err(IntentError::OversizedData(msg.data.len()));
		}
		Ok(msg)
	}
}

/// An [`IntentMessage`] together with the enclave's signature over its
/// canonical encoding. Only ever constructed whole: if any step of signing
/// fails, no partial response exists.
#[derive(
	Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct SignedResponse {
	/// The signed message.
	pub response: IntentMessage,
	/// Ed25519 signature over `response`'s canonical encoding. Hex encoded
	/// in transport JSON.
	#[serde(with = "hex::serde")]
	pub signature: [u8; SIGNATURE_LEN],
}

impl SignedResponse {
	/// Verify the signature against the canonical encoding of `response`
	/// and `verifier`'s public key.
	pub fn verify(&self, verifier: &PublicVerifier) -> Result<(), IntentError> {
		let canonical = self.response.to_canonical_bytes()?;
		verifier
			.verify(&canonical, &self.signature)
			.map_err(|_| IntentError::FailedSignatureVerification)
	}
}

/// Canonically encode and sign `(intent, timestamp_ms, data)` with the
/// enclave identity.
///
/// All-or-nothing: validation and encoding happen before the key is
/// touched, and any failure returns an error with no signature produced.
/// Calling twice with identical arguments returns byte-identical
/// signatures.
pub fn sign_intent(
	pair: &EphemeralPair,
	intent: IntentScope,
	timestamp_ms: u64,
	data: Vec<u8>,
) -> Result<SignedResponse, IntentError> {
	let response = IntentMessage::new(intent, timestamp_ms, data)?;
	let canonical = response.to_canonical_bytes()?;
	let signature =
		pair.sign(&canonical).map_err(|_| IntentError::Signing)?;

	Ok(SignedResponse { response, signature })
}

#[cfg(test)]
mod tests {
	use super::*;

	const TIMESTAMP_MS: u64 = 1_700_000_000_000;

	fn alice_payload() -> Vec<u8> {
		br#"{"name":"alice"}"#.to_vec()
	}

	#[test]
	fn canonical_bytes_match_the_agreed_layout() {
		let msg = IntentMessage::new(
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap();

		let mut expected = vec![0x00];
		expected.extend_from_slice(&TIMESTAMP_MS.to_le_bytes());
		expected.extend_from_slice(
			&u32::try_from(alice_payload().len()).unwrap().to_le_bytes(),
		);
		expected.extend_from_slice(&alice_payload());

		assert_eq!(msg.to_canonical_bytes().unwrap(), expected);
	}

	#[test]
	fn canonical_round_trip_reproduces_the_message() {
		let msg = IntentMessage::new(
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap();

		let bytes = msg.to_canonical_bytes().unwrap();
		assert_eq!(IntentMessage::from_canonical_bytes(&bytes).unwrap(), msg);
	}

	#[test]
	fn truncated_bytes_fail_decoding() {
		let bytes = IntentMessage::new(
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap()
		.to_canonical_bytes()
		.unwrap();

		for cut in 0..bytes.len() {
			assert_eq!(
				IntentMessage::from_canonical_bytes(&bytes[..cut]).unwrap_err(),
				IntentError::Decode,
				"decoding unexpectedly succeeded at length {cut}"
			);
		}
	}

	#[test]
	fn trailing_bytes_fail_decoding() {
		let mut bytes = IntentMessage::new(
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap()
		.to_canonical_bytes()
		.unwrap();
		bytes.push(0xff);

		assert_eq!(
			IntentMessage::from_canonical_bytes(&bytes).unwrap_err(),
			IntentError::Decode
		);
	}

	#[test]
	fn bad_length_prefix_fails_decoding() {
		let mut bytes = IntentMessage::new(
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap()
		.to_canonical_bytes()
		.unwrap();
		// Claim one more data byte than is present.
		let len = u32::try_from(alice_payload().len()).unwrap() + 1;
		bytes[9..13].copy_from_slice(&len.to_le_bytes());

		assert_eq!(
			IntentMessage::from_canonical_bytes(&bytes).unwrap_err(),
			IntentError::Decode
		);
	}

	#[test]
	fn unknown_intent_tag_fails_decoding() {
		let mut bytes = IntentMessage::new(
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap()
		.to_canonical_bytes()
		.unwrap();
		bytes[0] = 0x09;

		assert_eq!(
			IntentMessage::from_canonical_bytes(&bytes).unwrap_err(),
			IntentError::Decode
		);
	}

	#[test]
	fn signed_scenario_verifies_and_round_trips() {
		let pair = EphemeralPair::generate().unwrap();

		let signed = sign_intent(
			&pair,
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap();

		assert!(signed.verify(&pair.verifier()).is_ok());

		let canonical = signed.response.to_canonical_bytes().unwrap();
		let decoded = IntentMessage::from_canonical_bytes(&canonical).unwrap();
		assert_eq!(decoded.intent, IntentScope::ProcessData);
		assert_eq!(decoded.timestamp_ms, TIMESTAMP_MS);
		assert_eq!(decoded.data, alice_payload());
	}

	#[test]
	fn signing_is_deterministic() {
		let pair = EphemeralPair::generate().unwrap();

		let a = sign_intent(
			&pair,
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap();
		let b = sign_intent(
			&pair,
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap();

		assert_eq!(a.signature, b.signature);
		assert_eq!(a, b);
	}

	#[test]
	fn oversized_data_is_rejected_before_signing() {
		let pair = EphemeralPair::generate().unwrap();
		let oversized = vec![0u8; MAX_DATA_LEN + 1];

		assert_eq!(
			sign_intent(
				&pair,
				IntentScope::ProcessData,
				TIMESTAMP_MS,
				oversized
			)
			.unwrap_err(),
			IntentError::OversizedData(MAX_DATA_LEN + 1)
		);
	}

	#[test]
	fn max_size_data_is_accepted() {
		let msg = IntentMessage::new(
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			vec![0u8; MAX_DATA_LEN],
		)
		.unwrap();
		assert!(msg.to_canonical_bytes().is_ok());
	}

	#[test]
	fn tampered_response_fails_verification() {
		let pair = EphemeralPair::generate().unwrap();

		let mut signed = sign_intent(
			&pair,
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap();
		signed.response.data = br#"{"name":"mallory"}"#.to_vec();

		assert_eq!(
			signed.verify(&pair.verifier()).unwrap_err(),
			IntentError::FailedSignatureVerification
		);
	}

	#[test]
	fn transport_json_uses_integer_tag_and_hex_fields() {
		let pair = EphemeralPair::generate().unwrap();
		let signed = sign_intent(
			&pair,
			IntentScope::ProcessData,
			TIMESTAMP_MS,
			alice_payload(),
		)
		.unwrap();

		let json: serde_json::Value = serde_json::to_value(&signed).unwrap();
		assert_eq!(json["response"]["intent"], 0);
		assert_eq!(json["response"]["timestamp_ms"], TIMESTAMP_MS);
		assert_eq!(
			json["response"]["data"],
			hex::encode(alice_payload()).as_str()
		);
		assert_eq!(
			json["signature"],
			hex::encode(signed.signature).as_str()
		);

		let back: SignedResponse = serde_json::from_value(json).unwrap();
		assert_eq!(back, signed);
	}
}
