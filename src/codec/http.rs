#![forbid(unsafe_code)]

use crate::error::{Context, Result};
use reqwest::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Joins `path` onto `base`, treating the base as a directory whether or not it ends in `/`.
pub fn resolve_url(base: &str, path: &str) -> Result<Url> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Url::parse(path).map_err(|err| crate::err!("invalid request url `{path}`: {err}"));
    }

    let normalised_base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    let base_url = Url::parse(&normalised_base)
        .with_context(|| format!("invalid sources api base url `{base}`"))?;

    let relative = path.trim_start_matches('/');
    if relative.is_empty() {
        Ok(base_url)
    } else {
        base_url
            .join(relative)
            .map_err(|err| crate::err!("failed to resolve path `{path}` against `{base}`: {err}"))
    }
}

pub fn build_request<B>(
    client: &reqwest::Client,
    method: Method,
    url: Url,
    headers: &[(String, String)],
    body: Option<&B>,
) -> Result<RequestBuilder>
where
    B: Serialize + ?Sized,
{
    let mut request = client
        .request(method, url)
        .header(ACCEPT, HeaderValue::from_static("application/json"));

    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| crate::err!("invalid header name `{name}`: {err}"))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| crate::err!("invalid header value for `{name}`: {err}"))?;
        request = request.header(header_name, header_value);
    }

    if let Some(body) = body {
        request = request
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(body);
    }

    Ok(request)
}

pub fn decode_body(bytes: &[u8]) -> JsonValue {
    if bytes.is_empty() {
        return JsonValue::Null;
    }

    if let Ok(json) = serde_json::from_slice::<JsonValue>(bytes) {
        return json;
    }

    JsonValue::String(String::from_utf8_lossy(bytes).into_owned())
}

/// Pulls a human readable message out of a Sources API error body.
///
/// The API answers with `{"errors":[{"status":"404","detail":"..."}]}`; anything else is
/// rendered as-is.
pub fn error_detail(body: &JsonValue) -> String {
    let details: Vec<&str> = body
        .get("errors")
        .and_then(JsonValue::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error.get("detail").and_then(JsonValue::as_str))
                .collect()
        })
        .unwrap_or_default();

    if !details.is_empty() {
        return details.join("; ");
    }

    match body {
        JsonValue::Null => "empty response body".to_string(),
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}
