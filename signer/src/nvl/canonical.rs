//! Canonical signing payload for NVL blocks.
//!
//! Signer and authority must hash identical bytes, so the payload is produced
//! here and nowhere else. The layout is compact JSON with lexicographically
//! ordered keys:
//!
//! ```text
//! {"blocks":[..],"header":{"coiinSupply":..,"priorBlock":..,"publicKey":..,"timestamp":..,"type":..},"version":..}
//! ```
//!
//! `coiinSupply` is present only when non-empty and the seal is never part of
//! it. Strings are escaped like the authority's encoder does, which on top of
//! the usual JSON escapes writes `<`, `>`, `&`, U+2028 and U+2029 as `\uXXXX`.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

use super::block::Block;

#[derive(Serialize)]
struct SigningHeader<'a> {
    #[serde(rename = "coiinSupply", skip_serializing_if = "is_empty")]
    coiin_supply: &'a str,
    #[serde(rename = "priorBlock")]
    prior_block: &'a str,
    #[serde(rename = "publicKey")]
    public_key: &'a str,
    timestamp: &'a str,
    #[serde(rename = "type")]
    block_type: &'a str,
}

// Field order is the byte order of the payload. Keep it sorted.
#[derive(Serialize)]
struct SigningPayload<'a> {
    blocks: &'a [String],
    header: SigningHeader<'a>,
    version: &'a str,
}

fn is_empty(value: &&str) -> bool {
    value.is_empty()
}

/// Bytes that get hashed and signed for `block`.
pub fn signing_bytes(block: &Block) -> Vec<u8> {
    let payload = SigningPayload {
        blocks: &block.blocks,
        header: SigningHeader {
            coiin_supply: &block.header.coiin_supply,
            prior_block: &block.header.prior_block,
            public_key: &block.header.public_key,
            timestamp: &block.header.timestamp,
            block_type: block.header.block_type.as_str(),
        },
        version: &block.version,
    };
    to_authority_json(&payload).expect("assert: signing payload only holds strings")
}

/// Compact JSON in the authority's escaping dialect.
pub fn to_authority_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::with_capacity(256);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AuthorityFormatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

pub(crate) fn to_authority_json_string<T: Serialize + ?Sized>(value: &T) -> String {
    let bytes = to_authority_json(value).expect("assert: block only holds strings");
    String::from_utf8(bytes).expect("assert: serde_json emits utf-8")
}

/// Compact output, plus the HTML-safe escapes.
struct AuthorityFormatter;

impl Formatter for AuthorityFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            let escaped: &[u8] = match ch {
                '<' => b"\\u003c",
                '>' => b"\\u003e",
                '&' => b"\\u0026",
                '\u{2028}' => b"\\u2028",
                '\u{2029}' => b"\\u2029",
                _ => continue,
            };
            writer.write_all(&fragment.as_bytes()[start..index])?;
            writer.write_all(escaped)?;
            start = index.saturating_add(ch.len_utf8());
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}
