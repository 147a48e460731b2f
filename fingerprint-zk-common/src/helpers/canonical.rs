//! Byte-stable JSON encoding for audit artifacts.

use serde::{
    ser::{Error, Serializer},
    Serialize,
};
use sha2::{Digest, Sha256};

/// Serializes the wrapped value with object keys in lexicographic order,
/// regardless of struct field order.
#[derive(Serialize)]
pub struct SerializeWithSortedKeys<T: Serialize>(#[serde(serialize_with = "sorted_keys")] pub T);

fn sorted_keys<T: Serialize, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    // serde_json::Map is a BTreeMap unless `preserve_order` is enabled
    serde_json::to_value(value)
        .map_err(Error::custom)?
        .serialize(serializer)
}

/// Pretty JSON with sorted keys and a trailing newline.
pub fn to_canonical_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(&SerializeWithSortedKeys(value))?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn sha256_hex<T: AsRef<[u8]>>(data: T) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}
