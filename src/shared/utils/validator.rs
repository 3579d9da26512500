use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};
use warp::{Filter, Rejection};

use crate::shared::error::AppError;

const MAX_JSON_BODY: u64 = 64 * 1024;

/// Clones a shared value (service handle, key set) into every request.
pub fn with_state<T>(state: T) -> impl Filter<Extract = (T,), Error = std::convert::Infallible> + Clone
where
    T: Clone + Send,
{
    warp::any().map(move || state.clone())
}

pub fn with_validated_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: Send + DeserializeOwned + Validate + 'static,
{
    warp::body::content_length_limit(MAX_JSON_BODY)
        .and(warp::body::json())
        .and_then(|body: T| async move {
            match body.validate() {
                Ok(_) => Ok(body),
                Err(errors) => {
                    let message = format_errors(&errors);
                    tracing::debug!("[validator] Validation error: {}", message);
                    Err(warp::reject::custom(AppError::ValidationError(message)))
                }
            }
        })
}

/// Flattens field errors into `field: message` pairs.
pub fn format_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();

    if parts.is_empty() {
        return format!("Validation failed: {errors}");
    }
    parts.sort();
    parts.join(", ")
}
