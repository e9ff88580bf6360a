use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::convert::Infallible;

use crate::db::parse_id;

/// Caller id taken from `Authorization: Bearer <user id>`.
///
/// The server never checks it: a missing or malformed header yields
/// `Caller(None)` and the request proceeds. It is only recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Option<i64>);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(parse_id);
        Ok(Caller(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn caller_for(header: Option<&str>) -> Caller {
        let mut builder = Request::builder().uri("/boards");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Caller::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn bearer_id_is_read_but_never_required() {
        assert_eq!(caller_for(Some("Bearer 7")).await, Caller(Some(7)));
        assert_eq!(caller_for(Some("Bearer nobody")).await, Caller(None));
        assert_eq!(caller_for(Some("7")).await, Caller(None));
        assert_eq!(caller_for(None).await, Caller(None));
    }
}
