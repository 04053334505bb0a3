use std::error::Error as StdError;
use std::fmt;

use anyhow::Result;
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{
    config::Config,
    contact::{Contact, Field, NewContact},
};

#[derive(Clone)]
pub struct Client {
    http_client: HttpClient,
    url: Url,
}

impl Client {
    pub fn start(api_url: &Url, config: &Config) -> Result<Self> {
        let http_client = HttpClient::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()?;

        let url = contacts_url(api_url)?;

        Ok(Self { http_client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Contact>, RequestError> {
        let response = make_request(self.http_client.get(self.url.clone())).await?;

        let list = response.json::<ContactList>().await?;
        tracing::debug!("Received {} contacts", list.contacts.len());

        Ok(list.contacts)
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, contact: &NewContact) -> Result<(), RequestError> {
        make_request(self.http_client.post(self.url.clone()).json(contact)).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn update(&self, contact: &Contact) -> Result<(), RequestError> {
        make_request(self.http_client.put(self.url.clone()).json(contact)).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, contact: &Contact) -> Result<(), RequestError> {
        let body = DeleteBody {
            contact: contact.clone(),
        };

        make_request(self.http_client.delete(self.url.clone()).json(&body)).await?;

        Ok(())
    }
}

async fn make_request(request: RequestBuilder) -> Result<Response, RequestError> {
    let response = request.send().await?;

    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    // Error bodies are not guaranteed to be JSON or to carry a message.
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => match body.message {
            Some(Value::String(message)) => Some(message),
            Some(Value::Null) | None => None,
            Some(message) => Some(message.to_string()),
        },
        Err(_err) => None,
    };

    Err(RequestError::Backend { status, message })
}

/// Appends the contacts collection to the configured base URL.
///
/// The base URL may or may not end with a slash and may carry a path prefix.
fn contacts_url(api_url: &Url) -> Result<Url, url::ParseError> {
    let base = api_url.as_str().trim_end_matches('/');

    format!("{}/phonebook/contacts", base).parse()
}

#[derive(Debug)]
pub enum RequestError {
    /// The request was not sent because a required field is blank.
    Missing(Field),
    /// The backend answered with an error status.
    Backend {
        status: StatusCode,
        message: Option<String>,
    },
    /// The request could not be sent or the response could not be read.
    Transport(reqwest::Error),
}

impl RequestError {
    /// The text shown to the user, preferring the message supplied by the backend.
    pub fn message(&self) -> String {
        match self {
            Self::Missing(field) => format!("{} is required", field.label()),
            Self::Backend {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Backend {
                status,
                message: None,
            } => format!("Request failed with status {}", status),
            Self::Transport(err) => err.to_string(),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.message())
    }
}

impl StdError for RequestError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Missing(_) | Self::Backend { .. } => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ContactList {
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct DeleteBody {
    pub contact: Contact,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ErrorBody {
    pub message: Option<Value>,
}
