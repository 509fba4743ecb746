// crates/adapters/src/codec.rs
//! JSON body codec.
//!
//! Sinks always emit newline-delimited JSON. Sources also accept a single
//! top-level JSON array.
use common::*;
use serde_json::Deserializer;

/// Decode a JSON array or JSON lines body.
///
/// A body starting with `[` is always taken as one array, so JSON lines whose
/// records are themselves arrays (`[1,2]\n[3,4]`) fail to decode.
pub fn decode_json(body: &[u8]) -> Result<Vec<Record>> {
    let first = body.iter().find(|b| !b.is_ascii_whitespace());

    if first == Some(&b'[') {
        let records: Vec<Record> = serde_json::from_slice(body)?;
        return Ok(records);
    }

    let records = Deserializer::from_slice(body)
        .into_iter::<Record>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

pub fn encode_json(records: &[Record]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(records.len() * 64);
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }
    Ok(buf)
}
