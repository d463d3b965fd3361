//! Purpose: Provide the internal runtime JSON decode entrypoints.
//! Exports: `from_str`.
//! Role: Parser boundary shared by the fetcher and the CLI input readers.
//! Notes: Error mapping is done by callsites so domain context stays explicit.

use serde::de::DeserializeOwned;

pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(input)
}

#[cfg(test)]
mod tests {
    use super::from_str;
    use serde_json::{Value, json};

    #[test]
    fn decodes_values() {
        let value: Value = from_str(r#"{"a": {"b": [1, 2]}}"#).expect("json");
        assert_eq!(value, json!({"a": {"b": [1, 2]}}));
    }

    #[test]
    fn reports_position_on_error() {
        let err = from_str::<Value>("{\"a\": }").expect_err("invalid");
        assert_eq!(err.line(), 1);
        assert!(err.column() > 0);
    }
}
