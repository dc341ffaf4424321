//! `Json`/`Path` wrappers whose rejections go through [`AppError`], so malformed
//! bodies and path segments get the same `{"error": ..}` shape as everything else.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, FromRequest, FromRequestParts},
    Json,
};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
