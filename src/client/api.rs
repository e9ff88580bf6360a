use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::ClientError;
use super::session::Session;

/// HTTP access to the record API.
///
/// Every request carries `Authorization: Bearer <session user id>` when a
/// user is signed in. A 401 clears the session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Session) -> Self {
        ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match self.session.user_id() {
            Some(id) => builder.bearer_auth(id),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.check(self.request(Method::GET, path).send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .check(self.request(Method::POST, path).json(body).send().await?)
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .check(self.request(Method::PATCH, path).json(body).send().await?)
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.check(self.request(Method::DELETE, path).send().await?)
            .await?;
        Ok(())
    }

    async fn check(&self, resp: Response) -> Result<Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("record api rejected the session, signing out");
            self.session.sign_out();
            return Err(ClientError::Unauthenticated);
        }
        let message = error_message(resp).await;
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(message));
        }
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// `error` field of a JSON error body, else the raw body text.
async fn error_message(resp: Response) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        })
}
