use crate::error::LeafError;
use axum::extract::FromRequest;

/// `Json` whose rejections answer with the service's `{error, code}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(LeafError))]
pub struct ApiJson<T>(pub T);
