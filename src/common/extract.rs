//! Request body extractors whose rejections render as `ApiError`

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    Form, Json,
};
use serde::de::DeserializeOwned;

use super::ApiError;

/// JSON body; a malformed or mistyped body is a 400 `BAD_REQUEST`
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Form-encoded body, same rejection contract as `JsonBody`
#[derive(Debug, Clone)]
pub struct FormBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for FormBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize)]
    struct Priced {
        price: f64,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_mistyped_field_is_bad_request() {
        let result = JsonBody::<Priced>::from_request(json_request(r#"{"price":"fifty"}"#), &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let result = JsonBody::<Priced>::from_request(json_request("{\"price\":"), &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(r#"{"price":50}"#))
            .unwrap();
        let result = JsonBody::<Priced>::from_request(request, &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_valid_json_is_extracted() {
        let JsonBody(priced) = JsonBody::<Priced>::from_request(json_request(r#"{"price":50}"#), &())
            .await
            .unwrap();
        assert_eq!(priced.price, 50.0);
    }

    #[tokio::test]
    async fn test_form_without_form_content_type_is_bad_request() {
        let result =
            FormBody::<HashMap<String, String>>::from_request(json_request("tran_id=TXN_A"), &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
