//! Translation of backend failures and payloads into the shared taxonomy.
//!
//! Every provider funnels HTTP answers, transport errors, I/O errors and
//! payload decoding through these helpers so the same backend condition maps
//! to the same [`ProviderError`] kind everywhere.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cs_core::{Properties, PropertyValue};
use errors::ProviderError;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::path::Path;

/// Structured payload syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Yaml,
    Json,
}

impl PayloadFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_file_name(name: &str) -> Self {
        if name.to_ascii_lowercase().ends_with(".json") {
            PayloadFormat::Json
        } else {
            PayloadFormat::Yaml
        }
    }
}

/// Maps a non-success HTTP status to a provider error.
///
/// 404 is `NotFound`; any other status is `UpstreamError` carrying the
/// backend's own message.
pub fn status_error(status: StatusCode, location: &str, body: &str) -> ProviderError {
    if status == StatusCode::NOT_FOUND {
        return ProviderError::not_found(location);
    }
    ProviderError::upstream(status.as_u16(), extract_message(body))
}

/// Pulls the human readable message out of an error body.
///
/// Git hosting APIs answer `{"message": ...}`, Vault answers
/// `{"errors": [...]}`; anything else is returned raw.
pub fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(errors) = value.get("errors").and_then(Value::as_array) {
            return errors
                .iter()
                .map(|e| match e {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; ");
        }
    }
    body.trim().to_string()
}

/// Passes 2xx responses through and converts everything else.
pub async fn check_response(
    response: Response,
    backend: &str,
    location: &str,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport_error(backend, e))?;

    tracing::debug!(
        backend = backend,
        status = status.as_u16(),
        location = location,
        "Backend answered with an error status"
    );

    Err(status_error(status, location, &body))
}

/// Maps a reqwest failure.
///
/// Body decoding failures are payload problems; connection refusals,
/// timeouts and other request failures mean the backend is unavailable.
pub fn transport_error(backend: &str, error: reqwest::Error) -> ProviderError {
    if error.is_decode() {
        let location = error
            .url()
            .map(ToString::to_string)
            .unwrap_or_else(|| backend.to_string());
        return ProviderError::parse(location, error.to_string());
    }
    ProviderError::unavailable(backend, error.to_string())
}

/// Maps a filesystem failure.
pub fn io_error(path: &Path, error: &std::io::Error) -> ProviderError {
    if error.kind() == std::io::ErrorKind::NotFound {
        return ProviderError::not_found(path.display().to_string());
    }
    ProviderError::unavailable("filesystem", format!("{}: {}", path.display(), error))
}

/// Decodes a structured document into properties.
///
/// An empty document is an empty map. The top level must be a mapping.
pub fn parse_properties(
    text: &str,
    format: PayloadFormat,
    location: &str,
) -> Result<Properties, ProviderError> {
    if text.trim().is_empty() {
        return Ok(Properties::new());
    }

    let value = match format {
        PayloadFormat::Json => serde_json::from_str::<Value>(text)
            .map_err(|e| ProviderError::parse(location, e.to_string()))?,
        PayloadFormat::Yaml => {
            let mut yaml = serde_yaml::from_str::<serde_yaml::Value>(text)
                .map_err(|e| ProviderError::parse(location, e.to_string()))?;
            yaml.apply_merge()
                .map_err(|e| ProviderError::parse(location, e.to_string()))?;
            serde_json::to_value(yaml).map_err(|e| ProviderError::parse(location, e.to_string()))?
        }
    };

    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(Properties::new()),
        _ => Err(ProviderError::parse(location, "top level is not a mapping")),
    }
}

/// Decodes UTF-8 bytes of a structured document into properties.
pub fn parse_properties_bytes(
    bytes: &[u8],
    format: PayloadFormat,
    location: &str,
) -> Result<Properties, ProviderError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ProviderError::parse(location, format!("invalid UTF-8: {}", e)))?;
    parse_properties(text, format, location)
}

/// Standard base64 of raw file bytes, as returned for certs and files.
pub fn encode_blob(bytes: &[u8]) -> PropertyValue {
    Value::String(STANDARD.encode(bytes))
}

/// Decodes MIME-style base64 (line breaks allowed).
pub fn decode_mime(content: &str, location: &str) -> Result<Vec<u8>, ProviderError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| ProviderError::parse(location, format!("invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_404_is_not_found() {
        let err = status_error(StatusCode::NOT_FOUND, "configs/a", "");
        assert_eq!(err, ProviderError::not_found("configs/a"));
    }

    #[test]
    fn test_git_message_is_kept() {
        let err = status_error(
            StatusCode::UNAUTHORIZED,
            "x",
            r#"{"message":"Bad credentials","documentation_url":"https://docs"}"#,
        );
        assert_eq!(err, ProviderError::upstream(401, "Bad credentials"));
    }

    #[test]
    fn test_vault_errors_are_joined() {
        let err = status_error(
            StatusCode::FORBIDDEN,
            "x",
            r#"{"errors":["permission denied","token expired"]}"#,
        );
        assert_eq!(
            err,
            ProviderError::upstream(403, "permission denied; token expired")
        );
    }

    #[test]
    fn test_raw_body_otherwise() {
        let err = status_error(StatusCode::BAD_GATEWAY, "x", "  upstream down \n");
        assert_eq!(err, ProviderError::upstream(502, "upstream down"));
    }

    #[test]
    fn test_io_not_found_vs_other() {
        let path = Path::new("/cfg/configs/p");
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(io_error(path, &missing).is_not_found());

        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(io_error(path, &denied).kind(), ErrorKind::BackendUnavailable);
    }

    #[test]
    fn test_parse_yaml_mapping() {
        let props = parse_properties(
            "server:\n  port: 8443\nname: svc\nflags: [a, b]\n",
            PayloadFormat::Yaml,
            "values.yml",
        )
        .unwrap();
        assert_eq!(props["server"], json!({"port": 8443}));
        assert_eq!(props["name"], json!("svc"));
        assert_eq!(props["flags"], json!(["a", "b"]));
    }

    #[test]
    fn test_yaml_merge_keys_are_applied() {
        let props = parse_properties(
            "base: &b {host: h, port: 1}\ndb:\n  <<: *b\n  port: 2\n",
            PayloadFormat::Yaml,
            "values.yml",
        )
        .unwrap();
        assert_eq!(props["db"], json!({"host": "h", "port": 2}));
        assert_eq!(props["base"], json!({"host": "h", "port": 1}));

        let err = parse_properties("db:\n  <<: 5\n", PayloadFormat::Yaml, "values.yml")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_parse_json_mapping() {
        let props =
            parse_properties(r#"{"a": 1, "b": {"c": true}}"#, PayloadFormat::Json, "values.json")
                .unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props["b"], json!({"c": true}));
    }

    #[test]
    fn test_empty_document_is_empty_map() {
        assert!(parse_properties("", PayloadFormat::Yaml, "x").unwrap().is_empty());
        assert!(parse_properties("  \n", PayloadFormat::Json, "x").unwrap().is_empty());
        assert!(parse_properties("~\n", PayloadFormat::Yaml, "x").unwrap().is_empty());
    }

    #[test]
    fn test_non_mapping_top_level_is_parse_error() {
        let err = parse_properties("- a\n- b\n", PayloadFormat::Yaml, "values.yml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);

        let err = parse_properties("42", PayloadFormat::Json, "values.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_invalid_syntax_is_parse_error() {
        let err = parse_properties("a: [b", PayloadFormat::Yaml, "values.yml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);

        let err = parse_properties("{", PayloadFormat::Json, "values.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = parse_properties_bytes(&[0xff, 0xfe], PayloadFormat::Yaml, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_blob_encoding() {
        assert_eq!(encode_blob(&[0x01, 0x02]), json!("AQI="));
    }

    #[test]
    fn test_decode_mime_with_line_breaks() {
        assert_eq!(decode_mime("aGVs\nbG8=\n", "x").unwrap(), b"hello");
        assert_eq!(
            decode_mime("!!!", "x").unwrap_err().kind(),
            ErrorKind::ParseError
        );
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(PayloadFormat::from_file_name("values.json"), PayloadFormat::Json);
        assert_eq!(PayloadFormat::from_file_name("values.yml"), PayloadFormat::Yaml);
        assert_eq!(PayloadFormat::from_file_name("values.yaml"), PayloadFormat::Yaml);
    }
}
