//! The intent tag shared between the enclave and the remote verifier.

use std::{fmt, str::FromStr};

use borsh::{BorshDeserialize, BorshSerialize};

use crate::IntentError;

/// Semantic category of a signed message. The integer value of each variant
/// is part of the wire format: the remote verifier interprets the same tag,
/// so variants are append-only and values are never reused.
///
/// This enum is the single definition of the tag<->name mapping. Anything
/// that needs to turn a raw tag or a symbolic name into a scope goes through
/// [`TryFrom<u8>`] or [`FromStr`] here rather than re-deriving the mapping.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum IntentScope {
	/// A result produced by the enclave's application logic.
	ProcessData = 0,
}

impl IntentScope {
	/// The wire tag for this scope.
	#[must_use]
	pub fn tag(self) -> u8 {
		self as u8
	}
}

impl TryFrom<u8> for IntentScope {
	type Error = IntentError;

	fn try_from(tag: u8) -> Result<Self, Self::Error> {
		match tag {
			0 => Ok(Self::ProcessData),
			other => Err(IntentError::UnknownIntent(other)),
		}
	}
}

impl fmt::Display for IntentScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ProcessData => write!(f, "ProcessData"),
		}
	}
}

impl FromStr for IntentScope {
	type Err = IntentError;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		match name {
			"ProcessData" => Ok(Self::ProcessData),
			_ => Err(IntentError::UnknownIntentName(name.to_string())),
		}
	}
}

// In transport JSON the scope appears as its integer tag, never as a name.
impl serde::Serialize for IntentScope {
	fn serialize<S: serde::Serializer>(
		&self,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		serializer.serialize_u8(self.tag())
	}
}

impl<'de> serde::Deserialize<'de> for IntentScope {
	fn deserialize<D: serde::Deserializer<'de>>(
		deserializer: D,
	) -> Result<Self, D::Error> {
		// UFCS: `u8` also has a `deserialize` from `BorshDeserialize`.
		let tag = <u8 as serde::Deserialize>::deserialize(deserializer)?;
		Self::try_from(tag).map_err(|_| {
			serde::de::Error::custom(format!("unknown intent tag {tag}"))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tag_mapping_is_bidirectional() {
		assert_eq!(IntentScope::try_from(0).unwrap(), IntentScope::ProcessData);
		assert_eq!(IntentScope::ProcessData.tag(), 0);
	}

	#[test]
	fn unknown_tag_is_rejected() {
		assert_eq!(
			IntentScope::try_from(7).unwrap_err(),
			IntentError::UnknownIntent(7)
		);
	}

	#[test]
	fn name_mapping_round_trips() {
		let scope: IntentScope = "ProcessData".parse().unwrap();
		assert_eq!(scope, IntentScope::ProcessData);
		assert_eq!(scope.to_string(), "ProcessData");

		assert!("process_data".parse::<IntentScope>().is_err());
	}

	#[test]
	fn serde_renders_the_integer_tag() {
		let json = serde_json::to_string(&IntentScope::ProcessData).unwrap();
		assert_eq!(json, "0");

		let scope: IntentScope = serde_json::from_str("0").unwrap();
		assert_eq!(scope, IntentScope::ProcessData);

		assert!(serde_json::from_str::<IntentScope>("9").is_err());
	}
}
