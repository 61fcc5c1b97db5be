/// Request body extractors that reject with `HubError`
use crate::error::HubError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

/// JSON body whose rejections render as the service's error body
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HubError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// JSON body that may be omitted; an empty body yields `T::default()`
///
/// The content type is not checked, so bodiless `POST`s work from any client.
pub struct OptionalJsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = HubError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| HubError::Validation(format!("Invalid JSON body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Reason {
        reason: Option<String>,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_rejections_are_validation_errors() {
        let missing_type = JsonBody::<Reason>::from_request(request(None, "{}"), &()).await;
        assert!(matches!(missing_type, Err(HubError::Validation(_))));

        let malformed =
            JsonBody::<Reason>::from_request(request(Some("application/json"), "{not json"), &())
                .await;
        assert!(matches!(malformed, Err(HubError::Validation(_))));

        let JsonBody(ok) = JsonBody::<Reason>::from_request(
            request(Some("application/json"), r#"{"reason":"late"}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(ok.reason.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn test_optional_body_defaults_when_empty() {
        let OptionalJsonBody(empty) = OptionalJsonBody::<Reason>::from_request(request(None, ""), &())
            .await
            .unwrap();
        assert!(empty.reason.is_none());

        let OptionalJsonBody(blank) =
            OptionalJsonBody::<Reason>::from_request(request(None, "  \n"), &())
                .await
                .unwrap();
        assert!(blank.reason.is_none());

        let OptionalJsonBody(given) =
            OptionalJsonBody::<Reason>::from_request(request(None, r#"{"reason":"fraud"}"#), &())
                .await
                .unwrap();
        assert_eq!(given.reason.as_deref(), Some("fraud"));

        let malformed = OptionalJsonBody::<Reason>::from_request(request(None, "{oops"), &()).await;
        assert!(matches!(malformed, Err(HubError::Validation(_))));
    }
}
