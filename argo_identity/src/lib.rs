//! The enclave's ephemeral Ed25519 identity.
//!
//! A keypair is generated once at process start and lives only in memory.
//! There is intentionally no way to serialize, persist or otherwise export
//! the private half; when the process exits the identity is gone.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

use std::time::{SystemTime, UNIX_EPOCH};

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

/// Length of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;
/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Errors from identity creation and use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
	/// The OS randomness source was unavailable while generating the
	/// keypair. Fatal at boot; the process must not serve requests without
	/// an identity.
	CryptoInit,
	/// The system clock reads before the unix epoch.
	SystemClock,
	/// Signing failed. Should not happen once an identity exists, but is
	/// reported as a distinct condition rather than a panic.
	Signing,
	/// The public key bytes could not be decoded.
	InvalidPublicKey,
	/// The signature bytes were not `SIGNATURE_LEN` long.
	InvalidSignatureLen,
	/// The signature did not verify against the message and public key.
	FailedSignatureVerification,
}

/// The enclave's ephemeral signing keypair.
///
/// Exists once per process lifetime and is immutable after creation, so
/// concurrent readers need no locking.
pub struct EphemeralPair {
	signing: SigningKey,
	created_at_ms: u64,
}

impl EphemeralPair {
	/// Generate a fresh keypair from the OS randomness source.
	pub fn generate() -> Result<Self, IdentityError> {
		let mut seed = Zeroizing::new([0u8; 32]);
		OsRng
			.try_fill_bytes(seed.as_mut())
			.map_err(|_| IdentityError::CryptoInit)?;

		let created_at_ms = unix_ms()?;
		Ok(Self { signing: SigningKey::from_bytes(&seed), created_at_ms })
	}

	/// The raw public key bytes.
	#[must_use]
	pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
		self.signing.verifying_key().to_bytes()
	}

	/// Lowercase hex encoding of the public key. Stable for the lifetime of
	/// the process.
	#[must_use]
	pub fn public_key_hex(&self) -> String {
		hex::encode(self.public_key_bytes())
	}

	/// Unix timestamp in milliseconds at which this pair was created.
	#[must_use]
	pub fn created_at_ms(&self) -> u64 {
		self.created_at_ms
	}

	/// Sign `message`, returning the raw 64 byte signature. Ed25519 is
	/// deterministic: identical `(key, message)` inputs always produce
	/// byte-identical signatures.
	pub fn sign(
		&self,
		message: &[u8],
	) -> Result<[u8; SIGNATURE_LEN], IdentityError> {
		self.signing
			.try_sign(message)
			.map(|sig| sig.to_bytes())
			.map_err(|_| IdentityError::Signing)
	}

	/// The verify-side counterpart of this pair.
	#[must_use]
	pub fn verifier(&self) -> PublicVerifier {
		PublicVerifier { verifying: self.signing.verifying_key() }
	}
}

/// Verify-side Ed25519 public key.
#[derive(Debug)]
pub struct PublicVerifier {
	verifying: VerifyingKey,
}

impl PublicVerifier {
	/// Deserialize from the raw public key bytes.
	pub fn from_bytes(
		bytes: &[u8; PUBLIC_KEY_LEN],
	) -> Result<Self, IdentityError> {
		Ok(Self {
			verifying: VerifyingKey::from_bytes(bytes)
				.map_err(|_| IdentityError::InvalidPublicKey)?,
		})
	}

	/// Deserialize from a hex encoded public key.
	pub fn from_hex(hex_str: &str) -> Result<Self, IdentityError> {
		let bytes: [u8; PUBLIC_KEY_LEN] = hex::decode(hex_str)
			.map_err(|_| IdentityError::InvalidPublicKey)?
			.try_into()
			.map_err(|_| IdentityError::InvalidPublicKey)?;
		Self::from_bytes(&bytes)
	}

	/// Verify `signature` over `message` against this public key.
	///
	/// Returns Ok if the signature is good.
	pub fn verify(
		&self,
		message: &[u8],
		signature: &[u8],
	) -> Result<(), IdentityError> {
		let signature: &[u8; SIGNATURE_LEN] = signature
			.try_into()
			.map_err(|_| IdentityError::InvalidSignatureLen)?;
		self.verifying
			.verify(message, &ed25519_dalek::Signature::from_bytes(signature))
			.map_err(|_| IdentityError::FailedSignatureVerification)
	}
}

fn unix_ms() -> Result<u64, IdentityError> {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map_err(|_| IdentityError::SystemClock)
		.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
