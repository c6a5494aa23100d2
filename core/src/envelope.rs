//! The result of a successful dispatch.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::descriptor::RequestDescriptor;
use crate::http::Headers;

/// Status, headers and decoded body of one completed call, plus the request
/// that produced it (as sent, after defaults and interceptors were applied).
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub status: u16,
    pub headers: Headers,
    pub body: Value,
    pub request: RequestDescriptor,
}

impl Envelope {
    /// Deserialize the body into a typed record.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// Decode a raw response body: JSON when it parses, a plain string otherwise,
/// `null` when empty.
pub(crate) fn decode_body(raw: String) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_body_handles_json_text_and_empty() {
        assert_eq!(decode_body(r#"{"id":1}"#.to_string()), json!({"id": 1}));
        assert_eq!(decode_body("Not Found".to_string()), json!("Not Found"));
        assert_eq!(decode_body("  ".to_string()), Value::Null);
    }

    #[test]
    fn json_reads_typed_records() {
        #[derive(serde::Deserialize)]
        struct Record {
            id: u64,
        }

        let envelope = Envelope {
            status: 200,
            headers: Headers::new(),
            body: json!([{"id": 1}, {"id": 2}]),
            request: RequestDescriptor::get("http://localhost/todos"),
        };
        let records: Vec<Record> = envelope.json().unwrap();
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
