//! Read the rows currently in the sheet.
//!
//! Any failure degrades to "the sheet is empty", which makes every local row
//! an insert for this run. Nothing here returns an error to the caller.

use serde_json::Value;

use super::row::CanonicalRow;
use super::transport::SheetTransport;
use crate::error::PipelineError;

/// Fetch all sheet rows from the GET endpoint.
pub async fn fetch_remote_rows<T: SheetTransport + ?Sized>(
    transport: &T,
    endpoint: Option<&str>,
) -> Vec<CanonicalRow> {
    let Some(url) = endpoint.filter(|u| !u.trim().is_empty()) else {
        log::warn!("Sheet sync: no GET endpoint configured, treating sheet as empty");
        return Vec::new();
    };

    let resp = match transport.get(url).await {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("Sheet sync: GET {} failed: {}", url, e);
            return Vec::new();
        }
    };

    if resp.status != 200 {
        log::error!("Sheet sync: GET {} returned {}", url, resp.status);
        return Vec::new();
    }

    match parse_rows(&resp.body) {
        Ok(rows) => {
            log::info!("Sheet sync: sheet currently has {} existing rows", rows.len());
            rows
        }
        Err(e) => {
            log::error!("Sheet sync: GET {} body unusable: {}", url, e);
            Vec::new()
        }
    }
}

/// Accepts a bare row array or an envelope with a `data` array.
pub fn parse_rows(body: &str) -> Result<Vec<CanonicalRow>, PipelineError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| PipelineError::MalformedResponse(format!("not JSON: {}", e)))?;

    let rows = match value {
        Value::Array(_) => value,
        Value::Object(mut envelope) => envelope
            .remove("data")
            .ok_or_else(|| PipelineError::MalformedResponse("object without 'data'".into()))?,
        other => {
            return Err(PipelineError::MalformedResponse(format!(
                "expected array or object, got {}",
                json_kind(&other)
            )))
        }
    };

    let Value::Array(items) = rows else {
        return Err(PipelineError::MalformedResponse(
            "'data' is not an array".into(),
        ));
    };

    items
        .into_iter()
        .map(|item| {
            if !item.is_object() {
                return Err(PipelineError::MalformedResponse(format!(
                    "row is {}, expected object",
                    json_kind(&item)
                )));
            }
            serde_json::from_value(item)
                .map_err(|e| PipelineError::MalformedResponse(e.to_string()))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
