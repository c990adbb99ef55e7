//! `POST /api/revalidate`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use unevent_api_types::RevalidateResponse;

use super::error::ApiError;
use super::state::FrontendState;

/// Validate the tag list and revalidate every tag.
///
/// Credentials are checked by `require_revalidate_token` before this runs.
pub async fn revalidate(State(state): State<FrontendState>, body: Bytes) -> Response {
    let tags = match parse_tags(&body) {
        Ok(tags) => tags,
        Err(hint) => {
            return ApiError::bad_request("`tags` must be an array of strings", Some(hint))
                .into_response();
        }
    };

    let report = state.revalidation.revalidate(&tags).await;
    Json(RevalidateResponse {
        ok: true,
        count: report.count,
    })
    .into_response()
}

fn parse_tags(body: &[u8]) -> Result<Vec<String>, String> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| format!("invalid JSON body: {err}"))?;
    let Some(items) = value.get("tags").and_then(Value::as_array) else {
        return Err("missing or non-array `tags` field".to_string());
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("tags[{index}] is not a string"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_array() {
        let tags = parse_tags(br#"{"tags":["home","city:cluj"]}"#).expect("tags");
        assert_eq!(tags, vec!["home", "city:cluj"]);

        let empty = parse_tags(br#"{"tags":[]}"#).expect("tags");
        assert!(empty.is_empty());
    }

    #[test]
    fn rejects_non_array_shapes() {
        assert!(parse_tags(br#"{"tags":"home"}"#).is_err());
        assert!(parse_tags(br#"{"tags":null}"#).is_err());
        assert!(parse_tags(br#"{}"#).is_err());
        assert!(parse_tags(br#"["home"]"#).is_err());
        assert!(parse_tags(b"not json").is_err());
    }

    #[test]
    fn rejects_non_string_items() {
        let err = parse_tags(br#"{"tags":["home",3]}"#).expect_err("number");
        assert_eq!(err, "tags[1] is not a string");
    }
}
