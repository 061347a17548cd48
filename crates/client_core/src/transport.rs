use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::Identified,
    error::BackendErrorBody,
    protocol::{AuthRequest, AuthResponse, Credentials, Envelope},
};
use storage::SessionTokenStore;
use tracing::warn;
use url::Url;

use crate::error::ClientError;

const DEFAULT_OWNER_FIELD: &str = "ownerId";

/// Remote CRUD service for one entity kind.
#[async_trait]
pub trait EntityService<T: Send + Sync>: Send + Sync {
    async fn get(&self) -> Result<Envelope<Vec<T>>, ClientError>;
    async fn get_by_owner(&self, owner_id: &str) -> Result<Envelope<Vec<T>>, ClientError>;
    async fn create(&self, record: &T) -> Result<Envelope<T>, ClientError>;
    async fn update(&self, record: &T) -> Result<Envelope<T>, ClientError>;
    /// A confirmed removal answers with `content: null`.
    async fn remove(&self, id: &str) -> Result<Envelope<Option<T>>, ClientError>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;
}

pub struct UnavailableEntityService {
    name: &'static str,
}

impl UnavailableEntityService {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn unavailable(&self) -> ClientError {
        ClientError::Network(format!("{} service is unavailable", self.name))
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> EntityService<T> for UnavailableEntityService {
    async fn get(&self) -> Result<Envelope<Vec<T>>, ClientError> {
        Err(self.unavailable())
    }

    async fn get_by_owner(&self, _owner_id: &str) -> Result<Envelope<Vec<T>>, ClientError> {
        Err(self.unavailable())
    }

    async fn create(&self, _record: &T) -> Result<Envelope<T>, ClientError> {
        Err(self.unavailable())
    }

    async fn update(&self, _record: &T) -> Result<Envelope<T>, ClientError> {
        Err(self.unavailable())
    }

    async fn remove(&self, _id: &str) -> Result<Envelope<Option<T>>, ClientError> {
        Err(self.unavailable())
    }
}

pub struct UnavailableAuthService;

#[async_trait]
impl AuthService for UnavailableAuthService {
    async fn register(&self, _credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        Err(ClientError::Network("auth service is unavailable".into()))
    }

    async fn login(&self, _credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        Err(ClientError::Network("auth service is unavailable".into()))
    }
}

/// JSON-over-HTTP entity service: `GET endpoint/`, `PUT|PATCH|DELETE endpoint/<id>`.
pub struct HttpEntityService<T> {
    http: Client,
    base_url: Url,
    endpoint: String,
    owner_field: &'static str,
    tokens: Option<Arc<dyn SessionTokenStore>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> HttpEntityService<T> {
    pub fn new(http: Client, base_url: Url, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
            endpoint: endpoint.into().trim_matches('/').to_string(),
            owner_field: DEFAULT_OWNER_FIELD,
            tokens: None,
            _record: PhantomData,
        }
    }

    /// Field that `get_by_owner` filters on.
    pub fn with_owner_field(mut self, owner_field: &'static str) -> Self {
        self.owner_field = owner_field;
        self
    }

    /// Sends the persisted access token as the `auth` query parameter.
    pub fn with_token_store(mut self, tokens: Arc<dyn SessionTokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    fn collection_url(&self) -> Result<Url, ClientError> {
        self.base_url
            .join(&format!("{}/", self.endpoint))
            .map_err(|err| ClientError::Validation(format!("invalid collection url: {err}")))
    }

    fn record_url(&self, id: &str) -> Result<Url, ClientError> {
        if id.is_empty() || id.contains('/') {
            return Err(ClientError::Validation(format!("invalid record id '{id}'")));
        }
        self.base_url
            .join(&format!("{}/{id}", self.endpoint))
            .map_err(|err| ClientError::Validation(format!("invalid record url: {err}")))
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(tokens) = &self.tokens else {
            return request;
        };
        match tokens.access_token().await {
            Ok(Some(token)) => request.query(&[("auth", token)]),
            Ok(None) => request,
            Err(err) => {
                warn!("sending request without access token: {err:#}");
                request
            }
        }
    }
}

#[async_trait]
impl<T> EntityService<T> for HttpEntityService<T>
where
    T: Identified + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self) -> Result<Envelope<Vec<T>>, ClientError> {
        let request = self.http.get(self.collection_url()?);
        let response = self.authorize(request).await.send().await?;
        read_envelope(response).await
    }

    async fn get_by_owner(&self, owner_id: &str) -> Result<Envelope<Vec<T>>, ClientError> {
        let request = self.http.get(self.collection_url()?).query(&[
            ("orderBy", json_string(self.owner_field)?),
            ("equalTo", json_string(owner_id)?),
        ]);
        let response = self.authorize(request).await.send().await?;
        read_envelope(response).await
    }

    async fn create(&self, record: &T) -> Result<Envelope<T>, ClientError> {
        let request = self.http.put(self.record_url(record.id())?).json(record);
        let response = self.authorize(request).await.send().await?;
        read_envelope(response).await
    }

    async fn update(&self, record: &T) -> Result<Envelope<T>, ClientError> {
        let request = self.http.patch(self.record_url(record.id())?).json(record);
        let response = self.authorize(request).await.send().await?;
        read_envelope(response).await
    }

    async fn remove(&self, id: &str) -> Result<Envelope<Option<T>>, ClientError> {
        let request = self.http.delete(self.record_url(id)?);
        let response = self.authorize(request).await.send().await?;
        read_envelope(response).await
    }
}

/// Email/password authentication against the identity backend.
pub struct HttpAuthService {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl HttpAuthService {
    pub fn new(http: Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
            api_key: api_key.into(),
        }
    }

    async fn authenticate(
        &self,
        action: &str,
        credentials: &Credentials,
    ) -> Result<AuthResponse, ClientError> {
        // "./" keeps `accounts:` from being parsed as a url scheme.
        let url = self
            .base_url
            .join(&format!("./accounts:{action}"))
            .map_err(|err| ClientError::Validation(format!("invalid auth url: {err}")))?;
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&AuthRequest::from(credentials))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = read_body(response).await;
        match serde_json::from_str::<BackendErrorBody>(&body) {
            Ok(parsed) => Err(parsed.error.into()),
            Err(_) => Err(ClientError::Auth {
                code: status.as_u16(),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            }),
        }
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        self.authenticate("signUp", credentials).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        self.authenticate("signInWithPassword", credentials).await
    }
}

async fn read_envelope<R: DeserializeOwned>(response: Response) -> Result<R, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = read_body(response).await;
        return Err(ClientError::Network(format!(
            "remote service returned {status}: {body}"
        )));
    }
    Ok(response.json().await?)
}

/// Error response text, empty when the body itself cannot be read.
async fn read_body(response: Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(err) => {
            warn!("failed to read error response body: {err}");
            String::new()
        }
    }
}

/// Filter values are JSON literals, so quotes inside ids must be escaped.
fn json_string(value: &str) -> Result<String, ClientError> {
    serde_json::to_string(value)
        .map_err(|err| ClientError::Validation(format!("invalid filter value: {err}")))
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
