//! An in-memory implementation of the phonebook backend.
//!
//! It serves the same contract as the real backend and is used for local development and by the tests.

use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router, Server,
};
use parking_lot::Mutex;
use tower_http::trace::TraceLayer;

use crate::{
    client::{ContactList, DeleteBody, ErrorBody},
    contact::{Contact, NewContact},
};

#[derive(Default)]
pub struct Backend(Mutex<Inner>);

#[derive(Default)]
struct Inner {
    contacts: Vec<Contact>,
    next_id: u64,
    requests: usize,
    failure: Option<BackendError>,
}

impl Inner {
    fn assign_id(&mut self) -> String {
        self.next_id += 1;

        format!("{:024x}", self.next_id)
    }

    fn begin_request(&mut self) -> Result<(), BackendError> {
        self.requests += 1;

        match self.failure.take() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn position(&self, id: Option<&str>) -> Result<usize, BackendError> {
        let id = id.ok_or_else(|| {
            BackendError::bad_request("Contact identifier is required".to_owned())
        })?;

        self.contacts
            .iter()
            .position(|contact| contact.id.as_deref() == Some(id))
            .ok_or_else(|| BackendError {
                status: StatusCode::NOT_FOUND,
                message: Some(format!("Contact {} not found", id)),
            })
    }
}

impl Backend {
    /// Creates a backend serving the given contacts, assigning identifiers where missing.
    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        let mut inner = Inner::default();

        for mut contact in contacts {
            if contact.id.is_none() {
                contact.id = Some(inner.assign_id());
            }

            inner.contacts.push(contact);
        }

        Self(Mutex::new(inner))
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.0.lock().contacts.clone()
    }

    /// The number of requests received so far, including failed ones.
    pub fn requests(&self) -> usize {
        self.0.lock().requests
    }

    /// Makes the next request fail with the given status.
    ///
    /// Without a message, the response body is plain text instead of JSON.
    pub fn fail_next(&self, status: StatusCode, message: Option<&str>) {
        self.0.lock().failure = Some(BackendError {
            status,
            message: message.map(ToOwned::to_owned),
        });
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route(
                "/phonebook/contacts",
                get(list).post(create).put(update).delete(delete),
            )
            .layer(Extension(self))
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        tracing::info!("Listening on {}", listener.local_addr()?);

        Server::from_tcp(listener)?
            .serve(self.router().into_make_service())
            .await?;

        Ok(())
    }
}

async fn list(
    Extension(backend): Extension<Arc<Backend>>,
) -> Result<Json<ContactList>, BackendError> {
    let mut inner = backend.0.lock();
    inner.begin_request()?;

    let contacts = inner.contacts.clone();

    Ok(Json(ContactList { contacts }))
}

async fn create(
    Extension(backend): Extension<Arc<Backend>>,
    Json(new_contact): Json<NewContact>,
) -> Result<(StatusCode, Json<Contact>), BackendError> {
    let mut inner = backend.0.lock();
    inner.begin_request()?;

    if let Some(field) = new_contact.missing() {
        return Err(BackendError::bad_request(format!(
            "{} is required",
            field.label()
        )));
    }

    let mut contact = Contact::from(new_contact);
    contact.id = Some(inner.assign_id());

    tracing::debug!("Creating contact {:?}", contact.id);
    inner.contacts.push(contact.clone());

    Ok((StatusCode::CREATED, Json(contact)))
}

async fn update(
    Extension(backend): Extension<Arc<Backend>>,
    Json(contact): Json<Contact>,
) -> Result<Json<Contact>, BackendError> {
    let mut inner = backend.0.lock();
    inner.begin_request()?;

    let pos = inner.position(contact.id.as_deref())?;

    let blank = [&contact.name_first, &contact.name_last, &contact.tel]
        .iter()
        .any(|value| value.trim().is_empty());

    if blank {
        return Err(BackendError::bad_request(
            "Contact fields must not be empty".to_owned(),
        ));
    }

    tracing::debug!("Updating contact {:?}", contact.id);
    inner.contacts[pos] = contact.clone();

    Ok(Json(contact))
}

async fn delete(
    Extension(backend): Extension<Arc<Backend>>,
    Json(body): Json<DeleteBody>,
) -> Result<StatusCode, BackendError> {
    let mut inner = backend.0.lock();
    inner.begin_request()?;

    let pos = inner.position(body.contact.id.as_deref())?;

    tracing::debug!("Deleting contact {:?}", body.contact.id);
    inner.contacts.remove(pos);

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone)]
struct BackendError {
    status: StatusCode,
    message: Option<String>,
}

impl BackendError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: Some(message),
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        match self.message {
            Some(message) => (
                self.status,
                Json(ErrorBody {
                    message: Some(message.into()),
                }),
            )
                .into_response(),
            None => (self.status, "Something went wrong").into_response(),
        }
    }
}

/// Serves `backend` on an ephemeral local port and returns its base URL.
#[cfg(test)]
pub(crate) async fn spawn(backend: &Arc<Backend>) -> url::Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(backend.clone().serve(listener));

    format!("http://{}", addr).parse().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn al_lee() -> NewContact {
        NewContact {
            name_first: "Al".to_owned(),
            name_last: "Lee".to_owned(),
            tel: "555-0101".to_owned(),
        }
    }

    #[test]
    fn with_contacts_assigns_missing_identifiers() {
        let backend = Backend::with_contacts(vec![Contact::from(al_lee())]);

        let contacts = backend.contacts();
        assert_eq!(
            contacts[0].id.as_deref(),
            Some("000000000000000000000001")
        );
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let backend = Arc::new(Backend::default());

        let err = create(
            Extension(backend.clone()),
            Json(NewContact {
                tel: String::new(),
                ..al_lee()
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message.as_deref(), Some("Phone number is required"));
        assert!(backend.contacts().is_empty());
    }

    #[tokio::test]
    async fn failures_apply_to_a_single_request() {
        let backend = Arc::new(Backend::default());

        backend.fail_next(StatusCode::SERVICE_UNAVAILABLE, None);

        let err = list(Extension(backend.clone())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let Json(response) = list(Extension(backend.clone())).await.unwrap();
        assert!(response.contacts.is_empty());

        assert_eq!(backend.requests(), 2);
    }

    #[tokio::test]
    async fn update_requires_a_known_identifier() {
        let backend = Arc::new(Backend::default());

        let err = update(Extension(backend.clone()), Json(Contact::from(al_lee())))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut contact = Contact::from(al_lee());
        contact.id = Some("missing".to_owned());

        let err = update(Extension(backend), Json(contact))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message.as_deref(), Some("Contact missing not found"));
    }
}
