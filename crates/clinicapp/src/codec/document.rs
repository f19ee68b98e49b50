use crate::error::{ClinicError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decode a JSON document into `T`. Any syntax or shape mismatch is a
/// [`ClinicError::Format`].
pub fn decode_document<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| ClinicError::Format(format!("not a readable document: {}", e)))
}

/// Encode `value` as pretty-printed JSON with a trailing newline.
pub fn encode_document<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut bytes =
        serde_json::to_vec_pretty(value).map_err(|e| ClinicError::Encode(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    #[test]
    fn nested_records_round_trip() {
        let mut doc: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        doc.insert(
            "visits".to_string(),
            vec![json!({"id": 1, "note": "first"}), json!({"id": 2, "tags": ["a"]})],
        );

        let bytes = encode_document(&doc).unwrap();
        let decoded: BTreeMap<String, Vec<Value>> = decode_document(&bytes).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn truncated_json_is_a_format_error() {
        let result: Result<Vec<Value>> = decode_document(b"[{\"id\": 1");
        assert!(matches!(result, Err(ClinicError::Format(_))));
    }

    #[test]
    fn wrong_shape_is_a_format_error() {
        let result: Result<Vec<Value>> = decode_document(b"{\"id\": 1}");
        assert!(matches!(result, Err(ClinicError::Format(_))));
    }
}
