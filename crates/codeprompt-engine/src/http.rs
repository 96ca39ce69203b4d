use anyhow::{bail, Context, Result};
use reqwest::blocking::Response as HttpResponse;
use serde_json::Value;

use crate::error::truncate_text;

const MAX_BODY_CHARS: usize = 512;

pub(crate) fn response_json_or_error(service: &str, response: HttpResponse) -> Result<Value> {
    let body = response_text_or_error(service, response)?;
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{service} returned invalid JSON payload"))?;
    Ok(parsed)
}

pub(crate) fn response_text_or_error(service: &str, response: HttpResponse) -> Result<String> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{service} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{service} request failed ({code}): {}",
            truncate_text(&body, MAX_BODY_CHARS)
        );
    }
    Ok(body)
}
