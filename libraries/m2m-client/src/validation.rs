//! Error detection for API response bodies.
//!
//! The API reports failures in several envelope shapes, often inside a
//! successful HTTP response. The checks below run in order and each one only
//! applies when its shape is present; a body matching none of them is
//! accepted as is.

use crate::error::{M2mClientError, Result};
use serde_json::Value;

const SUCCESS_MAJOR: &str = "000";
const SUCCESS_MINOR: &str = "0000";

/// Inspect a parsed response body, returning it unchanged on success.
pub fn validate_response(body: Value) -> Result<Value> {
    if is_empty(&body) {
        return Err(M2mClientError::EmptyResponse);
    }

    if let Some(error) = body.get("error") {
        return Err(M2mClientError::OAuth {
            error: as_text(error),
            description: body.get("error_description").map(as_text),
        });
    }

    if let Some(description) = body.get("description").and_then(Value::as_str) {
        if description.contains("Service Error") {
            return Err(M2mClientError::Service {
                id: body.get("id").map(as_text),
                description: description.to_string(),
            });
        }
    }

    check_return_code(&body)?;

    Ok(body)
}

fn check_return_code(body: &Value) -> Result<()> {
    // Key order is preserved, so this is the first key as sent.
    let Some((_, envelope)) = body.as_object().and_then(|map| map.iter().next()) else {
        return Ok(());
    };
    let Some(ret) = envelope.get("return") else {
        return Ok(());
    };
    let Some(code) = ret.get("returnCode") else {
        return Ok(());
    };

    let major = code.get("majorReturnCode").and_then(Value::as_str);
    let minor = code.get("minorReturnCode").and_then(Value::as_str);
    let (Some(major), Some(minor)) = (major, minor) else {
        return Ok(());
    };

    if major == SUCCESS_MAJOR && minor == SUCCESS_MINOR {
        return Ok(());
    }

    let description = code
        .get("description")
        .or_else(|| ret.get("description"))
        .map(as_text);

    Err(M2mClientError::ReturnCode {
        description,
        major: major.to_string(),
        minor: minor.to_string(),
    })
}

fn is_empty(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
