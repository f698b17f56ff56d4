//! Mock Nitro Secure Module for development and tests.

use std::{
	collections::BTreeMap,
	time::{SystemTime, UNIX_EPOCH},
};

use aws_nitro_enclaves_nsm_api::api::{AttestationDoc, Digest};
use serde_bytes::ByteBuf;

use crate::{
	types::{NsmRequest, NsmResponse},
	NsmProvider,
};

/// PCR value reported by the mock: all zero, exactly what an unmeasured
/// environment reads. A verifier must never accept a zero PCR set as proof
/// of code identity.
pub const MOCK_PCR: [u8; 48] = [0; 48];

/// Module identifier reported by the mock.
pub const MOCK_MODULE_ID: &str = "i-0000000000000000-enc0000000000000000";

/// Number of measurement registers the mock reports (PCR0, PCR1, PCR2).
pub const MOCK_PCR_COUNT: u16 = 3;

/// Mock NSM provider. Produces a bare, *unsigned* CBOR attestation document
/// with all-zero measurements: structurally decodable, but impossible to
/// mistake for a production artifact since it carries no COSE signature and
/// a zero PCR set.
pub struct MockNsm;

impl NsmProvider for MockNsm {
	fn nsm_process_request(
		&self,
		_fd: i32,
		request: NsmRequest,
	) -> NsmResponse {
		match request {
			NsmRequest::Attestation { user_data, nonce, public_key } => {
				let pcrs: BTreeMap<usize, ByteBuf> = (0..MOCK_PCR_COUNT)
					.map(|i| (usize::from(i), ByteBuf::from(MOCK_PCR.to_vec())))
					.collect();

				let doc = AttestationDoc {
					module_id: MOCK_MODULE_ID.to_string(),
					digest: Digest::SHA384,
					timestamp: unix_ms(),
					pcrs,
					certificate: ByteBuf::from(vec![]),
					cabundle: vec![],
					public_key: public_key.map(ByteBuf::from),
					user_data: user_data.map(ByteBuf::from),
					nonce: nonce.map(ByteBuf::from),
				};

				NsmResponse::Attestation { document: doc.to_binary() }
			}
			NsmRequest::DescribePcr { index } => {
				if index < MOCK_PCR_COUNT {
					NsmResponse::DescribePcr {
						lock: true,
						data: MOCK_PCR.to_vec(),
					}
				} else {
					NsmResponse::Error(format!("no such PCR: {index}"))
				}
			}
		}
	}

	fn nsm_init(&self) -> i32 {
		0
	}

	fn nsm_exit(&self, _fd: i32) {}
}

fn unix_ms() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
		.unwrap_or(0)
}
