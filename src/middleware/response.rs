use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Marker placed in response extensions once a body is a `ResponseEnvelope`.
/// The exception filter uses it to tell envelopes from raw framework rejections.
#[derive(Debug, Clone, Copy)]
pub struct Enveloped;

/// Uniform wrapper for every response: `{ code, message, data? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    /// 200 OK with the conventional "Success" message
    pub fn success(data: T) -> Self {
        Self::with_status(StatusCode::OK, "Success", data)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// Error envelope; `data` is omitted from the body
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl<T: Serialize> IntoResponse for ResponseEnvelope<T> {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match serde_json::to_value(&self) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response envelope: {}", e);
                json!({
                    "code": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    "message": "Failed to serialize response data"
                })
            }
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(Enveloped);
        response
    }
}

pub type ApiResult<T> = Result<ResponseEnvelope<T>, crate::error::ApiError>;
