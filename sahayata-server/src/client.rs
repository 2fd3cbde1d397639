//! HTTP implementation of the core session and row clients
//!
//! Talks to a running server over its JSON API. The session cookie is kept
//! in the client's cookie jar, so one `HttpClient` behaves like one browser.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use sahayata_core::{AuthEvent, Error, Row, RowClient, Session, SessionClient, SignUpRequest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;

/// Capacity of the session event channel
const EVENT_CAPACITY: usize = 16;

#[derive(Deserialize)]
struct ErrorBody {
    reason: String,
}

#[derive(Deserialize)]
struct SessionBody {
    session: Option<Session>,
}

#[derive(Deserialize)]
struct CountBody {
    count: u64,
}

pub struct HttpClient {
    http: Client,
    base_url: String,
    events: broadcast::Sender<AuthEvent>,
}

impl HttpClient {
    /// `base_url` is the server root, e.g. `http://localhost:3000`
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            events,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn notify(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport(e.to_string())
}

/// Decode a success body, or turn the server's `reason` into a remote error
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(transport);
    }

    let reason = match response.json::<ErrorBody>().await {
        Ok(body) => body.reason,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };
    tracing::debug!(status = %status, reason = %reason, "Request rejected");
    Err(Error::Remote(reason))
}

#[async_trait]
impl SessionClient for HttpClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, Error> {
        let response = self
            .http
            .post(self.url("/auth/v1/token"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport)?;
        let session: Session = decode(response).await?;
        self.notify(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<Session, Error> {
        let response = self
            .http
            .post(self.url("/auth/v1/signup"))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        let session: Session = decode(response).await?;
        self.notify(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), Error> {
        let response = self
            .http
            .post(self.url("/auth/v1/logout"))
            .send()
            .await
            .map_err(transport)?;
        decode::<serde_json::Value>(response).await?;
        self.notify(AuthEvent::SignedOut);
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, Error> {
        let response = self
            .http
            .get(self.url("/auth/v1/session"))
            .send()
            .await
            .map_err(transport)?;
        Ok(decode::<SessionBody>(response).await?.session)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl RowClient for HttpClient {
    async fn insert(&self, collection: &str, row: Row) -> Result<Row, Error> {
        let response = self
            .http
            .post(self.url(&format!("/rest/v1/{}", collection)))
            .json(&row)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn select_by_id(&self, collection: &str, id: &str) -> Result<Option<Row>, Error> {
        let response = self
            .http
            .get(self.url(&format!("/rest/v1/{}/{}", collection, id)))
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    async fn select(
        &self,
        collection: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<Row>, Error> {
        let mut request = self
            .http
            .get(self.url(&format!("/rest/v1/{}", collection)));
        if let Some((column, value)) = filter {
            request = request.query(&[(column, value)]);
        }
        let response = request.send().await.map_err(transport)?;
        decode(response).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Row) -> Result<Row, Error> {
        let response = self
            .http
            .patch(self.url(&format!("/rest/v1/{}/{}", collection, id)))
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn count(&self, collection: &str) -> Result<u64, Error> {
        let response = self
            .http
            .get(self.url(&format!("/rest/v1/{}/count", collection)))
            .send()
            .await
            .map_err(transport)?;
        Ok(decode::<CountBody>(response).await?.count)
    }
}
