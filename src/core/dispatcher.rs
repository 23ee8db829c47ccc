//! Message routing
//!
//! Turns a raw frame into an `Update` for the right callback slot. The price
//! feed carries bare payloads; the kline feed multiplexes three kinds of
//! update behind a `{ "type": ..., "data": ... }` envelope.

use serde_json::Value;

use crate::core::errors::{StreamError, StreamResult};
use crate::core::feed::FeedKind;

/// A decoded update, tagged with the callback slot it belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Price(Value),
    Kline(Value),
    Indicators(Value),
    Signals(Value),
}

/// Decode one raw frame received on `feed`
///
/// Returns `Ok(None)` for envelopes with an unrecognised `type`, which are
/// dropped for forward compatibility.
pub fn dispatch(feed: FeedKind, raw: &str) -> StreamResult<Option<Update>> {
    let body: Value =
        serde_json::from_str(raw).map_err(|source| StreamError::Parse { feed, source })?;

    match feed {
        FeedKind::Price => Ok(Some(Update::Price(body))),
        FeedKind::Kline => route_envelope(body),
    }
}

fn route_envelope(body: Value) -> StreamResult<Option<Update>> {
    let Value::Object(mut envelope) = body else {
        return Err(StreamError::MalformedEnvelope {
            reason: "expected a JSON object".to_string(),
        });
    };

    let kind = match envelope.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => {
            return Err(StreamError::MalformedEnvelope {
                reason: format!("'type' must be a string, got {}", other),
            })
        }
        None => {
            return Err(StreamError::MalformedEnvelope {
                reason: "missing 'type'".to_string(),
            })
        }
    };

    let data = envelope.remove("data").unwrap_or(Value::Null);

    let update = match kind.as_str() {
        "kline" => Update::Kline(data),
        "indicators" => Update::Indicators(data),
        "signals" => Update::Signals(data),
        other => {
            tracing::trace!(message_type = %other, "Ignoring unknown kline message type");
            return Ok(None);
        }
    };
    Ok(Some(update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_payload_is_whole_body() {
        let raw = r#"{"event":"price_update","symbol":"btcusdt","data":{"price":"64000.1"}}"#;
        let update = dispatch(FeedKind::Price, raw).unwrap();
        assert_eq!(
            update,
            Some(Update::Price(json!({
                "event": "price_update",
                "symbol": "btcusdt",
                "data": {"price": "64000.1"}
            })))
        );
    }

    #[test]
    fn test_price_ignores_type_field() {
        // No envelope routing on the price feed, even if a `type` is present
        let update = dispatch(FeedKind::Price, r#"{"type":"signals","data":1}"#).unwrap();
        assert_eq!(update, Some(Update::Price(json!({"type": "signals", "data": 1}))));
    }

    #[test]
    fn test_kline_envelopes_route_by_type() {
        let kline = dispatch(FeedKind::Kline, r#"{"type":"kline","data":{"c":"1"}}"#).unwrap();
        let indicators =
            dispatch(FeedKind::Kline, r#"{"type":"indicators","data":{"rsi":55.2}}"#).unwrap();
        let signals = dispatch(FeedKind::Kline, r#"{"type":"signals","data":["buy"]}"#).unwrap();

        assert_eq!(kline, Some(Update::Kline(json!({"c": "1"}))));
        assert_eq!(indicators, Some(Update::Indicators(json!({"rsi": 55.2}))));
        assert_eq!(signals, Some(Update::Signals(json!(["buy"]))));
    }

    #[test]
    fn test_unknown_type_is_dropped() {
        let update = dispatch(FeedKind::Kline, r#"{"type":"initial_data","data":{}}"#).unwrap();
        assert_eq!(update, None);
    }

    #[test]
    fn test_missing_data_is_null() {
        let update = dispatch(FeedKind::Kline, r#"{"type":"signals"}"#).unwrap();
        assert_eq!(update, Some(Update::Signals(Value::Null)));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        for feed in FeedKind::ALL {
            let err = dispatch(feed, "not-json").unwrap_err();
            assert!(matches!(err, StreamError::Parse { feed: f, .. } if f == feed));
        }
    }

    #[test]
    fn test_missing_type_is_malformed() {
        let err = dispatch(FeedKind::Kline, r#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, StreamError::MalformedEnvelope { .. }));
        assert!(err.to_string().contains("missing 'type'"));
    }

    #[test]
    fn test_non_string_type_is_malformed() {
        let err = dispatch(FeedKind::Kline, r#"{"type":3,"data":{}}"#).unwrap_err();
        assert!(err.to_string().contains("'type' must be a string"));
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = dispatch(FeedKind::Kline, r#"["kline", {}]"#).unwrap_err();
        assert!(matches!(err, StreamError::MalformedEnvelope { .. }));
    }
}
