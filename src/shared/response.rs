use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

/// Success half of the response envelope.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T: Serialize>(message: impl Into<String>, data: T) -> WithStatus<Json> {
    with_status(StatusCode::OK, message, Some(data))
}

pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> WithStatus<Json> {
    with_status(StatusCode::CREATED, message, Some(data))
}

/// Envelope without a `data` field.
pub fn message(message: impl Into<String>) -> WithStatus<Json> {
    with_status::<()>(StatusCode::OK, message, None)
}

fn with_status<T: Serialize>(
    code: StatusCode,
    message: impl Into<String>,
    data: Option<T>,
) -> WithStatus<Json> {
    let body = ApiResponse {
        status: "success",
        message: message.into(),
        data,
    };
    warp::reply::with_status(warp::reply::json(&body), code)
}
