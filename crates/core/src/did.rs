//! `did:key` codec.
//!
//! Extracts the raw Ed25519 public key from a `did:key:z...` identifier. The
//! `z` is the multibase tag for base58btc; the decoded payload starts with
//! the two-byte multicodec marker `0xED 0x01` followed by the 32 key bytes.

use crate::errors::DidError;

/// Literal prefix every decodable identifier must carry.
pub const DID_KEY_PREFIX: &str = "did:key:z";

/// Multicodec tag for an Ed25519 public key (varint 0xed).
pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

const ED25519_KEY_LEN: usize = 32;

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Default display width used by [`truncate_did`].
pub const DEFAULT_TRUNCATE_LEN: usize = 24;

/// Decode a base58btc string into big-endian bytes.
///
/// Each leading `'1'` contributes one leading zero byte.
fn base58_decode(input: &str) -> Result<Vec<u8>, DidError> {
    // Little-endian accumulator: bytes[0] is the least significant byte.
    let mut bytes: Vec<u8> = Vec::with_capacity(input.len());
    for c in input.chars() {
        let digit = BASE58_ALPHABET
            .iter()
            .position(|&a| a as char == c)
            .ok_or(DidError::InvalidBase58Char(c))?;
        let mut carry = digit as u32;
        for byte in bytes.iter_mut() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let leading_ones = input.chars().take_while(|&c| c == '1').count();
    bytes.extend(std::iter::repeat(0u8).take(leading_ones));
    bytes.reverse();
    Ok(bytes)
}

/// Encode big-endian bytes as base58btc.
fn base58_encode(input: &[u8]) -> String {
    let leading_zeros = input.iter().take_while(|&&b| b == 0).count();
    // Little-endian base-58 digits.
    let mut digits: Vec<u8> = Vec::with_capacity(input.len() * 138 / 100 + 1);
    for &byte in input {
        let mut carry = u32::from(byte);
        for digit in digits.iter_mut() {
            carry += u32::from(*digit) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }
    let mut out = String::with_capacity(leading_zeros + digits.len());
    out.extend(std::iter::repeat('1').take(leading_zeros));
    out.extend(
        digits
            .iter()
            .rev()
            .map(|&d| BASE58_ALPHABET[d as usize] as char),
    );
    out
}

/// Extract the Ed25519 public key from a `did:key:z...` identifier as 64
/// lowercase hex characters.
pub fn did_key_to_public_key_hex(did: &str) -> Result<String, DidError> {
    let encoded = did
        .strip_prefix(DID_KEY_PREFIX)
        .ok_or_else(|| DidError::UnsupportedPrefix(did.to_string()))?;
    let decoded = base58_decode(encoded)?;

    if decoded.len() < ED25519_MULTICODEC.len() + ED25519_KEY_LEN
        || decoded[..2] != ED25519_MULTICODEC
    {
        // An empty payload reads as a single zero byte.
        let found = match decoded.len() {
            0 => "00".to_string(),
            n => hex::encode(&decoded[..n.min(2)]),
        };
        return Err(DidError::InvalidMulticodec { found });
    }

    Ok(hex::encode(&decoded[2..2 + ED25519_KEY_LEN]))
}

/// Build a `did:key:z...` identifier from a 32-byte Ed25519 public key given
/// as hex.
pub fn public_key_hex_to_did_key(public_key_hex: &str) -> Result<String, DidError> {
    let key = hex::decode(public_key_hex).map_err(|e| DidError::InvalidHex(e.to_string()))?;
    if key.len() != ED25519_KEY_LEN {
        return Err(DidError::InvalidKeyLength(key.len()));
    }
    let mut payload = Vec::with_capacity(ED25519_MULTICODEC.len() + ED25519_KEY_LEN);
    payload.extend_from_slice(&ED25519_MULTICODEC);
    payload.extend_from_slice(&key);
    Ok(format!("{}{}", DID_KEY_PREFIX, base58_encode(&payload)))
}

/// Make a DID safe to embed in a Git ref path: every character outside
/// `[A-Za-z0-9]` becomes `_`.
pub fn sanitize_did_for_ref(did: &str) -> String {
    did.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Shorten a DID for display, keeping the method prefix (through the second
/// `:`) and both ends of the method-specific id around an ellipsis.
pub fn truncate_did(did: &str, max_len: usize) -> String {
    let chars: Vec<char> = did.chars().collect();
    if chars.len() <= max_len {
        return did.to_string();
    }

    let prefix_end = chars
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c == ':')
        .nth(1)
        .map(|(i, _)| i + 1)
        .unwrap_or(0);

    let remaining = max_len as isize - prefix_end as isize - 3;
    if remaining <= 0 {
        let keep = max_len.saturating_sub(3);
        return chars[..keep].iter().collect::<String>() + "...";
    }

    let remaining = remaining as usize;
    let tail = remaining / 2;
    let head = remaining - tail;
    let id = &chars[prefix_end..];

    let mut out: String = chars[..prefix_end].iter().collect();
    out.extend(&id[..head.min(id.len())]);
    out.push('\u{2026}');
    out.extend(&id[id.len().saturating_sub(tail)..]);
    out
}
