//! `Json` and `Query` extractors whose rejections render through `KomikError`.

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::KomikError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(KomikError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(KomikError))]
pub struct Query<T>(pub T);
