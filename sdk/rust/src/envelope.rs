use serde::de::DeserializeOwned;
use thiserror::Error;

pub const FAILURE: &str = "FAILURE";

/// Which feed a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    Multi,
    Single,
}

impl FeedShape {
    pub fn marker(self) -> &'static str {
        match self {
            FeedShape::Multi => "_SGAMEQF_",
            FeedShape::Single => "_SLGSLF_",
        }
    }

    fn other(self) -> Self {
        match self {
            FeedShape::Multi => FeedShape::Single,
            FeedShape::Single => FeedShape::Multi,
        }
    }
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway returned status {0}")]
    Status(u16),

    #[error("Expected the {expected:?} feed marker, found the {found:?} marker")]
    MarkerMismatch { expected: FeedShape, found: FeedShape },

    #[error("Response is neither FAILURE nor a marked payload")]
    Unrecognized,

    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A decoded feed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedResponse {
    Failure,
    Payload(String),
}

impl FeedResponse {
    pub fn is_failure(&self) -> bool {
        matches!(self, FeedResponse::Failure)
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            FeedResponse::Payload(body) => Some(body),
            FeedResponse::Failure => None,
        }
    }

    /// Parse a payload produced with `payload_format = "json"`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<Option<T>, SdkError> {
        match self {
            FeedResponse::Payload(body) => Ok(Some(serde_json::from_str(body)?)),
            FeedResponse::Failure => Ok(None),
        }
    }
}

/// Decode a response body from the `expected` feed.
pub fn decode(expected: FeedShape, body: &str) -> Result<FeedResponse, SdkError> {
    if body == FAILURE {
        return Ok(FeedResponse::Failure);
    }
    if let Some(payload) = unwrap_marked(expected, body) {
        return Ok(FeedResponse::Payload(payload.to_string()));
    }
    let other = expected.other();
    if unwrap_marked(other, body).is_some() {
        return Err(SdkError::MarkerMismatch { expected, found: other });
    }
    Err(SdkError::Unrecognized)
}

fn unwrap_marked(shape: FeedShape, body: &str) -> Option<&str> {
    let marker = shape.marker();
    if body.len() < 2 * marker.len() {
        return None;
    }
    body.strip_prefix(marker)?.strip_suffix(marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_failure() {
        assert_eq!(decode(FeedShape::Multi, "FAILURE").unwrap(), FeedResponse::Failure);
    }

    #[test]
    fn test_decode_payload() {
        let response = decode(FeedShape::Single, "_SLGSLF_{\"a\":1}_SLGSLF_").unwrap();
        assert_eq!(response.payload(), Some("{\"a\":1}"));
        let value: serde_json::Value = response.json().unwrap().unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_decode_marker_mismatch() {
        let err = decode(FeedShape::Multi, "_SLGSLF_x_SLGSLF_").unwrap_err();
        assert!(matches!(
            err,
            SdkError::MarkerMismatch { expected: FeedShape::Multi, found: FeedShape::Single }
        ));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode(FeedShape::Multi, "_SGAMEQF_"), Err(SdkError::Unrecognized)));
        assert!(matches!(decode(FeedShape::Multi, ""), Err(SdkError::Unrecognized)));
        assert!(matches!(decode(FeedShape::Multi, "failure"), Err(SdkError::Unrecognized)));
    }
}
