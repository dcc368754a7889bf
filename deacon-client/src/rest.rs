//! HTTP client for the CRM REST API.

use crate::remote::{ConnectionSink, ContactSource, NoteSource};
use async_trait::async_trait;
use deacon_core::{
    ClientConfig, ConfigError, Contact, ContactId, ContactListId, DeaconResult, NewConnection,
    Note, RemoteError,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Authenticated REST client.
///
/// Token acquisition and refresh happen elsewhere; the client is built with
/// whatever token is current.
#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ListMembersResponse {
    #[serde(default, rename = "provisionalMembers")]
    provisional_members: Vec<Contact>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> DeaconResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RemoteError::Transport {
                path: config.api_base_url.clone(),
                reason: e.to_string(),
            })?;

        let auth_header = build_auth_headers(config.token.as_deref())?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_header.contains_key(AUTHORIZATION)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn require_auth(&self) -> DeaconResult<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(RemoteError::NotAuthenticated.into())
        }
    }

    async fn get_json<T, Q>(&self, path: &str, query: &Q) -> DeaconResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.require_auth()?;
        let response = self
            .client
            .get(self.url(path))
            .headers(self.auth_header.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;
        parse_response(path, response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> DeaconResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.require_auth()?;
        let response = self
            .client
            .post(self.url(path))
            .headers(self.auth_header.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;
        parse_response(path, response).await
    }
}

#[async_trait]
impl ContactSource for RestClient {
    async fn list_members(&self, list_id: &ContactListId) -> DeaconResult<Vec<Contact>> {
        let path = format!("/content/get/{list_id}");
        let response: ListMembersResponse = self
            .get_json(&path, &[("type", "team"), ("appendContactDetail", "all")])
            .await?;
        tracing::debug!(
            list_id = %list_id,
            members = response.provisional_members.len(),
            "Fetched list members"
        );
        Ok(response.provisional_members)
    }
}

#[async_trait]
impl NoteSource for RestClient {
    async fn fetch_notes(&self, contact_id: &ContactId) -> DeaconResult<Vec<Note>> {
        let values: Vec<serde_json::Value> = self
            .get_json("/info/posts", &[("contact", contact_id.as_str())])
            .await?;
        Ok(parse_notes(values))
    }
}

#[async_trait]
impl ConnectionSink for RestClient {
    async fn create_connection(
        &self,
        contact_id: &ContactId,
        connection: &NewConnection,
    ) -> DeaconResult<()> {
        let path = format!("/post/{contact_id}/connection");
        let _created: serde_json::Value = self.post_json(&path, connection).await?;
        Ok(())
    }
}

fn build_auth_headers(token: Option<&str>) -> DeaconResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
        let value = format!("Bearer {}", token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| ConfigError::InvalidValue {
                field: "client.token".to_string(),
                reason: e.to_string(),
            })?,
        );
    }
    Ok(headers)
}

fn transport_error(path: &str, error: reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        path: path.to_string(),
        reason: error.to_string(),
    }
}

async fn parse_response<T: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> DeaconResult<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(path, e))?;

    if status.is_success() {
        serde_json::from_str(&text).map_err(|e| {
            RemoteError::InvalidResponse {
                path: path.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    } else {
        Err(RemoteError::RequestFailed {
            path: path.to_string(),
            status: status.as_u16(),
            message: error_message(&text),
        }
        .into())
    }
}

/// The server's `message` or `error` field, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message.or(parsed.error))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Decode posts one at a time, dropping definitions other than notes and
/// connections.
///
/// Posts that omit `definition` are classified by
/// `fullDefinition.definitionName`.
pub(crate) fn parse_notes(values: Vec<serde_json::Value>) -> Vec<Note> {
    values
        .into_iter()
        .filter_map(|mut value| {
            if value.get("definition").is_none() {
                let name = value
                    .pointer("/fullDefinition/definitionName")
                    .cloned();
                if let (Some(name), Some(object)) = (name, value.as_object_mut()) {
                    object.insert("definition".to_string(), name);
                }
            }
            match serde_json::from_value::<Note>(value.clone()) {
                Ok(note) => Some(note),
                Err(e) => {
                    tracing::debug!(
                        definition = ?value.get("definition"),
                        error = %e,
                        "Skipping unsupported post"
                    );
                    None
                }
            }
        })
        .collect()
}
