//! # Verifier Codec
//!
//! Byte layout of the four verifier operations. Every fixed-width read or
//! write the election performs against the verifier lives here.
//!
//! ## Request Layout
//!
//! | Operation         | Selector      | Body                                  |
//! |-------------------|---------------|---------------------------------------|
//! | `check_generator` | `f8 f3 b5 38` | generator bytes                       |
//! | `verify_register` | `f3 5a 29 13` | digest (56) ‖ proof                   |
//! | `verify_cast`     | `c7 41 4c ec` | count (u32 BE) ‖ keys (96 each) ‖ proof |
//! | `verify_tally`    | `97 54 bb 37` | claimed (u32 BE) ‖ blob               |
//!
//! ## Response Layout
//!
//! Responses are 32-byte big-endian words. Booleans occupy the last byte of
//! a word whose other 31 bytes are zero. `verify_cast` returns an ABI dynamic
//! array: `[valid][offset = 0x40][n][n flag bytes, zero padded]`.
//!
//! Counts that the proof system itself reads (the registration proof header
//! and the encrypted-votes blob header) are little-endian.

use crate::domain::{
    Address, CastOutput, Digest, VotingKey, BYTES_PER_ADDRESS, BYTES_PER_DIGEST,
    BYTES_PER_VOTING_KEY,
};
use thiserror::Error;

/// `check_generator` selector.
pub const SELECTOR_CHECK_GENERATOR: [u8; 4] = [0xf8, 0xf3, 0xb5, 0x38];
/// `verify_register` selector.
pub const SELECTOR_VERIFY_REGISTER: [u8; 4] = [0xf3, 0x5a, 0x29, 0x13];
/// `verify_cast` selector.
pub const SELECTOR_VERIFY_CAST: [u8; 4] = [0xc7, 0x41, 0x4c, 0xec];
/// `verify_tally` selector.
pub const SELECTOR_VERIFY_TALLY: [u8; 4] = [0x97, 0x54, 0xbb, 0x37];

/// ABI word width.
pub const WORD_SIZE: usize = 32;

/// Width of a 32-bit count header.
pub const COUNT_SIZE: usize = 4;

/// Dynamic-array offset expected in word 1 of a cast response.
const CAST_OUTPUTS_OFFSET: u8 = 0x40;

/// Codec errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer ends before a required field.
    #[error("Buffer too short: need {needed} bytes, got {got}")]
    TooShort {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        got: usize,
    },

    /// A word that must hold a small value has non-zero high bytes.
    #[error("Word {index} is not canonical")]
    NonCanonicalWord {
        /// Word index in the response.
        index: usize,
    },

    /// A boolean word holds something other than 0 or 1.
    #[error("Word {index} is not a boolean: low byte 0x{byte:02x}")]
    InvalidBool {
        /// Word index in the response.
        index: usize,
        /// Offending low byte.
        byte: u8,
    },

    /// The dynamic-array offset is not 0x40.
    #[error("Bad dynamic offset 0x{0:02x}")]
    BadOffset(u8),

    /// A cast output flag is neither 0x00 nor 0x01.
    #[error("Invalid output flag 0x{byte:02x} at position {position}")]
    InvalidFlag {
        /// Position in the output array.
        position: usize,
        /// Offending byte.
        byte: u8,
    },

    /// A declared count does not fit the buffer.
    #[error("Count {count} overflows a buffer of {len} bytes")]
    CountOverflow {
        /// Declared count.
        count: u64,
        /// Buffer length.
        len: usize,
    },

    /// The selector matches no verifier operation.
    #[error("Unknown selector {0:02x?}")]
    UnknownSelector([u8; 4]),
}

// =============================================================================
// WORD HELPERS
// =============================================================================

fn word(buf: &[u8], index: usize) -> Result<&[u8], CodecError> {
    let start = index * WORD_SIZE;
    buf.get(start..start + WORD_SIZE).ok_or(CodecError::TooShort {
        needed: start + WORD_SIZE,
        got: buf.len(),
    })
}

/// Encodes a boolean as a 32-byte word.
#[must_use]
pub fn encode_bool_word(value: bool) -> [u8; WORD_SIZE] {
    let mut out = [0u8; WORD_SIZE];
    out[WORD_SIZE - 1] = u8::from(value);
    out
}

/// Decodes the boolean held in word `index`.
pub fn decode_bool_word(buf: &[u8], index: usize) -> Result<bool, CodecError> {
    let w = word(buf, index)?;
    if w[..WORD_SIZE - 1].iter().any(|&b| b != 0) {
        return Err(CodecError::NonCanonicalWord { index });
    }
    match w[WORD_SIZE - 1] {
        0 => Ok(false),
        1 => Ok(true),
        byte => Err(CodecError::InvalidBool { index, byte }),
    }
}

/// Encodes a u32 as a 32-byte big-endian word.
#[must_use]
pub fn encode_u32_word(value: u32) -> [u8; WORD_SIZE] {
    let mut out = [0u8; WORD_SIZE];
    out[WORD_SIZE - COUNT_SIZE..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Decodes the u32 held in word `index`. High 28 bytes must be zero.
pub fn decode_u32_word(buf: &[u8], index: usize) -> Result<u32, CodecError> {
    let w = word(buf, index)?;
    if w[..WORD_SIZE - COUNT_SIZE].iter().any(|&b| b != 0) {
        return Err(CodecError::NonCanonicalWord { index });
    }
    let mut be = [0u8; COUNT_SIZE];
    be.copy_from_slice(&w[WORD_SIZE - COUNT_SIZE..]);
    Ok(u32::from_be_bytes(be))
}

fn read_u32_be(buf: &[u8]) -> Result<u32, CodecError> {
    let head = buf.get(..COUNT_SIZE).ok_or(CodecError::TooShort {
        needed: COUNT_SIZE,
        got: buf.len(),
    })?;
    let mut be = [0u8; COUNT_SIZE];
    be.copy_from_slice(head);
    Ok(u32::from_be_bytes(be))
}

fn split_selector(input: &[u8]) -> Result<([u8; 4], &[u8]), CodecError> {
    if input.len() < 4 {
        return Err(CodecError::TooShort {
            needed: 4,
            got: input.len(),
        });
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&input[..4]);
    Ok((selector, &input[4..]))
}

// =============================================================================
// KEY BUFFER
// =============================================================================

/// Serializes keys as `count (u32 BE) ‖ keys`.
///
/// The verifier echoes these four header bytes as the low bytes of the
/// response's array-length word, so the header must be big-endian.
#[must_use]
pub fn encode_key_buffer(keys: &[VotingKey]) -> Vec<u8> {
    let mut out = Vec::with_capacity(COUNT_SIZE + keys.len() * BYTES_PER_VOTING_KEY);
    out.extend_from_slice(&(keys.len() as u32).to_be_bytes());
    for key in keys {
        out.extend_from_slice(key.as_bytes());
    }
    out
}

/// Parses a key buffer, returning the keys and the unconsumed tail.
pub fn decode_key_buffer(buf: &[u8]) -> Result<(Vec<VotingKey>, &[u8]), CodecError> {
    let count = read_u32_be(buf)?;
    let overflow = CodecError::CountOverflow {
        count: u64::from(count),
        len: buf.len(),
    };
    let end = (count as usize)
        .checked_mul(BYTES_PER_VOTING_KEY)
        .and_then(|n| n.checked_add(COUNT_SIZE))
        .ok_or_else(|| overflow.clone())?;
    let body = buf.get(COUNT_SIZE..end).ok_or(overflow)?;

    let keys = body
        .chunks_exact(BYTES_PER_VOTING_KEY)
        .filter_map(VotingKey::from_slice)
        .collect();
    Ok((keys, &buf[end..]))
}

// =============================================================================
// REGISTER BATCH
// =============================================================================

/// Key/address pairs carried by a registration proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterBatch {
    /// Pairs in proof order.
    pub pairs: Vec<(Address, VotingKey)>,
    /// True if the proof ended before `count` pairs were read.
    pub truncated: bool,
}

/// Reads up to `count` key/address pairs from a registration proof.
///
/// Layout after the 4-byte header: `count` 96-byte keys, then `count` 20-byte
/// addresses in matching order. Reading stops at the first pair that does not
/// fit inside `proof`.
#[must_use]
pub fn decode_register_batch(proof: &[u8], count: u32) -> RegisterBatch {
    let count = count as usize;
    let addr_base = count
        .checked_mul(BYTES_PER_VOTING_KEY)
        .and_then(|n| n.checked_add(COUNT_SIZE));

    let mut pairs = Vec::new();
    let mut truncated = false;
    for i in 0..count {
        let key_start = COUNT_SIZE + i * BYTES_PER_VOTING_KEY;
        let key = proof
            .get(key_start..key_start + BYTES_PER_VOTING_KEY)
            .and_then(VotingKey::from_slice);
        let address = addr_base.and_then(|base| {
            let start = base.checked_add(i * BYTES_PER_ADDRESS)?;
            proof
                .get(start..start.checked_add(BYTES_PER_ADDRESS)?)
                .and_then(Address::from_slice)
        });

        match (key, address) {
            (Some(key), Some(address)) => pairs.push((address, key)),
            _ => {
                truncated = true;
                break;
            }
        }
    }
    RegisterBatch { pairs, truncated }
}

/// Builds a registration proof body: little-endian header, keys, then
/// addresses.
///
/// `trailer` stands in for the proof-system payload that follows.
#[must_use]
pub fn encode_register_batch(pairs: &[(Address, VotingKey)], trailer: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        COUNT_SIZE + pairs.len() * (BYTES_PER_VOTING_KEY + BYTES_PER_ADDRESS) + trailer.len(),
    );
    out.extend_from_slice(&(pairs.len() as u32).to_le_bytes());
    for (_, key) in pairs {
        out.extend_from_slice(key.as_bytes());
    }
    for (address, _) in pairs {
        out.extend_from_slice(address.as_bytes());
    }
    out.extend_from_slice(trailer);
    out
}

// =============================================================================
// REQUESTS
// =============================================================================

/// `check_generator` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckGeneratorRequest {
    /// Generator element bytes.
    pub generator: Vec<u8>,
}

impl CheckGeneratorRequest {
    /// Selector plus generator bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.generator.len());
        out.extend_from_slice(&SELECTOR_CHECK_GENERATOR);
        out.extend_from_slice(&self.generator);
        out
    }

    /// Parses a body (selector already stripped).
    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            generator: body.to_vec(),
        })
    }
}

/// `verify_register` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyRegisterRequest {
    /// Registration commitment.
    pub digest: Digest,
    /// Registration proof.
    pub proof: Vec<u8>,
}

impl VerifyRegisterRequest {
    /// Selector, digest, proof.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + BYTES_PER_DIGEST + self.proof.len());
        out.extend_from_slice(&SELECTOR_VERIFY_REGISTER);
        out.extend_from_slice(self.digest.as_bytes());
        out.extend_from_slice(&self.proof);
        out
    }

    /// Parses a body (selector already stripped).
    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        let digest = body
            .get(..BYTES_PER_DIGEST)
            .and_then(Digest::from_slice)
            .ok_or(CodecError::TooShort {
                needed: BYTES_PER_DIGEST,
                got: body.len(),
            })?;
        Ok(Self {
            digest,
            proof: body[BYTES_PER_DIGEST..].to_vec(),
        })
    }
}

/// `verify_cast` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyCastRequest {
    /// Confirmed keys in canonical order.
    pub keys: Vec<VotingKey>,
    /// Cast proof.
    pub proof: Vec<u8>,
}

impl VerifyCastRequest {
    /// Selector, key buffer, proof.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = SELECTOR_VERIFY_CAST.to_vec();
        out.extend_from_slice(&encode_key_buffer(&self.keys));
        out.extend_from_slice(&self.proof);
        out
    }

    /// Parses a body (selector already stripped).
    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        let (keys, proof) = decode_key_buffer(body)?;
        Ok(Self {
            keys,
            proof: proof.to_vec(),
        })
    }
}

/// `verify_tally` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyTallyRequest {
    /// Claimed result.
    pub claimed: u32,
    /// Stored encrypted votes.
    pub blob: Vec<u8>,
}

impl VerifyTallyRequest {
    /// Selector, claimed (big-endian), blob.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.blob.len());
        out.extend_from_slice(&SELECTOR_VERIFY_TALLY);
        out.extend_from_slice(&self.claimed.to_be_bytes());
        out.extend_from_slice(&self.blob);
        out
    }

    /// Parses a body (selector already stripped).
    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        let head = body.get(..COUNT_SIZE).ok_or(CodecError::TooShort {
            needed: COUNT_SIZE,
            got: body.len(),
        })?;
        let mut be = [0u8; COUNT_SIZE];
        be.copy_from_slice(head);
        Ok(Self {
            claimed: u32::from_be_bytes(be),
            blob: body[COUNT_SIZE..].to_vec(),
        })
    }
}

/// Any verifier request, dispatched on its selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifierRequest {
    /// `check_generator`.
    CheckGenerator(CheckGeneratorRequest),
    /// `verify_register`.
    VerifyRegister(VerifyRegisterRequest),
    /// `verify_cast`.
    VerifyCast(VerifyCastRequest),
    /// `verify_tally`.
    VerifyTally(VerifyTallyRequest),
}

impl VerifierRequest {
    /// Parses a full call input.
    pub fn decode(input: &[u8]) -> Result<Self, CodecError> {
        let (selector, body) = split_selector(input)?;
        match selector {
            SELECTOR_CHECK_GENERATOR => CheckGeneratorRequest::decode(body).map(Self::CheckGenerator),
            SELECTOR_VERIFY_REGISTER => VerifyRegisterRequest::decode(body).map(Self::VerifyRegister),
            SELECTOR_VERIFY_CAST => VerifyCastRequest::decode(body).map(Self::VerifyCast),
            SELECTOR_VERIFY_TALLY => VerifyTallyRequest::decode(body).map(Self::VerifyTally),
            other => Err(CodecError::UnknownSelector(other)),
        }
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// `check_generator` response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckGeneratorResponse {
    /// Generator accepted.
    pub valid: bool,
}

impl CheckGeneratorResponse {
    /// One bool word.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_bool_word(self.valid).to_vec()
    }

    /// Parses one bool word.
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            valid: decode_bool_word(buf, 0)?,
        })
    }
}

/// `verify_register` response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyRegisterResponse {
    /// Proof accepted.
    pub valid: bool,
    /// Number of registrations carried by the proof.
    pub count: u32,
}

impl VerifyRegisterResponse {
    /// Bool word, then count word.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = encode_bool_word(self.valid).to_vec();
        out.extend_from_slice(&encode_u32_word(self.count));
        out
    }

    /// Parses two words.
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            valid: decode_bool_word(buf, 0)?,
            count: decode_u32_word(buf, 1)?,
        })
    }
}

/// `verify_cast` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyCastResponse {
    /// Proof accepted as a whole.
    pub valid: bool,
    /// Per-voter outputs, aligned with the request's key order.
    pub outputs: Vec<CastOutput>,
}

impl VerifyCastResponse {
    /// Bool word, offset word, length word, padded flag bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let n = self.outputs.len();
        let padded = n.div_ceil(WORD_SIZE) * WORD_SIZE;
        let mut out = Vec::with_capacity(3 * WORD_SIZE + padded);
        out.extend_from_slice(&encode_bool_word(self.valid));
        out.extend_from_slice(&encode_u32_word(u32::from(CAST_OUTPUTS_OFFSET)));
        out.extend_from_slice(&encode_u32_word(n as u32));
        out.extend(self.outputs.iter().map(|o| o.to_byte()));
        out.resize(3 * WORD_SIZE + padded, 0);
        out
    }

    /// Parses the dynamic array response.
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let valid = decode_bool_word(buf, 0)?;

        let offset = decode_u32_word(buf, 1)?;
        if offset != u32::from(CAST_OUTPUTS_OFFSET) {
            return Err(CodecError::BadOffset(offset.min(0xff) as u8));
        }

        let n = decode_u32_word(buf, 2)?;
        let start = 3 * WORD_SIZE;
        let flags = start
            .checked_add(n as usize)
            .and_then(|end| buf.get(start..end))
            .ok_or(CodecError::CountOverflow {
                count: u64::from(n),
                len: buf.len(),
            })?;

        let outputs = flags
            .iter()
            .enumerate()
            .map(|(position, &byte)| {
                CastOutput::from_byte(byte).ok_or(CodecError::InvalidFlag { position, byte })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { valid, outputs })
    }

    /// Canonical positions flagged invalid.
    #[must_use]
    pub fn invalid_positions(&self) -> Vec<u32> {
        self.outputs
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.is_valid())
            .map(|(i, _)| i as u32)
            .collect()
    }
}

/// `verify_tally` response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyTallyResponse {
    /// Claimed result matches the encrypted votes.
    pub valid: bool,
}

impl VerifyTallyResponse {
    /// One bool word.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_bool_word(self.valid).to_vec()
    }

    /// Parses one bool word.
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            valid: decode_bool_word(buf, 0)?,
        })
    }
}
