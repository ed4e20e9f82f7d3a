//! Key encoding for document trees.
//!
//! Surrogate ids are `u64` big-endian so iteration follows insertion order.
//! Natural keys are `i64` with the sign bit flipped, then big-endian, so
//! negative keys sort before positive ones.

/// Size of an encoded key in bytes.
pub const KEY_SIZE: usize = 8;

/// Encode a store-assigned document id.
pub fn encode_doc_id(id: u64) -> [u8; KEY_SIZE] {
    id.to_be_bytes()
}

/// Decode a store-assigned document id.
pub fn decode_doc_id(bytes: &[u8]) -> Option<u64> {
    let bytes: [u8; KEY_SIZE] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Encode a natural key.
pub fn encode_natural_key(key: i64) -> [u8; KEY_SIZE] {
    ((key as u64) ^ (1 << 63)).to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_key_order() {
        let keys = [i64::MIN, -5, -1, 0, 1, 7, i64::MAX];
        let encoded: Vec<_> = keys.iter().map(|k| encode_natural_key(*k)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
        sorted.dedup();
        assert_eq!(sorted.len(), keys.len());
    }

    #[test]
    fn test_doc_id_decode_rejects_wrong_length() {
        assert_eq!(decode_doc_id(&encode_doc_id(42)), Some(42));
        assert_eq!(decode_doc_id(&[1, 2, 3]), None);
    }
}
