//! Value-to-bytes conversion for storage.

use crate::error::{Error, Result};
use serde::Serialize;
use std::borrow::Cow;

/// A value in its storable form.
///
/// Conversion precedence mirrors what callers expect from a cache facade:
/// raw text is stored verbatim, raw bytes are stored verbatim, and anything
/// else goes through [`Payload::json`] for a structured textual encoding.
///
/// Unlike the classic "marshal and ignore the error" shortcut, JSON
/// conversion here is explicitly fallible: a value that cannot be encoded
/// produces [`Error::SerializationError`] instead of an empty payload.
///
/// # Example
///
/// ```
/// use store_kit::Payload;
///
/// let p: Payload = "hello".into();
/// assert_eq!(p.to_text(), "hello");
///
/// let p = Payload::json(&vec![1, 2, 3]).unwrap();
/// assert_eq!(p.to_text(), "[1,2,3]");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Raw text, stored verbatim.
    Text(String),
    /// Raw bytes, stored verbatim.
    Bytes(Vec<u8>),
}

impl Payload {
    /// Encode an arbitrary serializable value as a JSON text payload.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if the value cannot be encoded
    /// (for example a map with non-string keys).
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_string(value)
            .map(Payload::Text)
            .map_err(|e| Error::SerializationError(format!("JSON encoding failed: {}", e)))
    }

    /// The byte representation written to the store.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Text(s) => s.into_bytes(),
            Payload::Bytes(b) => b,
        }
    }

    /// The textual form returned to callers of `fetch`.
    ///
    /// Byte payloads that are not valid UTF-8 are rendered lossily; the
    /// verbatim bytes remain available through the store itself.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Payload::Text(s) => Cow::Borrowed(s),
            Payload::Bytes(b) => String::from_utf8_lossy(b),
        }
    }

    /// Number of bytes this payload occupies once stored.
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(s) => s.len(),
            Payload::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(b)
    }
}

impl From<&[u8]> for Payload {
    fn from(b: &[u8]) -> Self {
        Payload::Bytes(b.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_text_stored_verbatim() {
        let p: Payload = "hello".into();
        assert_eq!(p.clone().into_bytes(), b"hello".to_vec());
        assert_eq!(p.to_text(), "hello");
    }

    #[test]
    fn test_bytes_stored_verbatim() {
        let p: Payload = vec![0x01, 0x02].into();
        assert_eq!(p.into_bytes(), vec![0x01, 0x02]);
    }

    #[test]
    fn test_json_reparses_to_equivalent_structure() {
        let mut m = HashMap::new();
        m.insert("a".to_string(), 1u32);

        let p = Payload::json(&m).expect("Failed to encode");
        let decoded: HashMap<String, u32> =
            serde_json::from_str(&p.to_text()).expect("Failed to decode");
        assert_eq!(decoded, m);
    }

    #[test]
    fn test_json_failure_is_explicit() {
        // serde_json rejects maps whose keys are not strings
        let mut m = HashMap::new();
        m.insert((1u32, 2u32), "v");

        let err = Payload::json(&m).unwrap_err();
        assert!(matches!(err, Error::SerializationError(_)));
    }

    #[test]
    fn test_lossy_text_for_invalid_utf8() {
        let p: Payload = vec![0xff, 0xfe].into();
        assert_eq!(p.to_text(), "\u{fffd}\u{fffd}");
    }

    #[test]
    fn test_len_and_is_empty() {
        assert!(Payload::Text(String::new()).is_empty());
        assert_eq!(Payload::from("abc").len(), 3);
    }
}
