use std::mem::replace;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::{
    client::{Client, RequestError},
    config::{Config, ResyncPolicy, SearchMode},
    contact::{Contact, Field, NewContact},
    notification::{Notifications, Notifier},
};

pub type Contacts = Arc<Vec<Contact>>;

/// The authoritative list of contacts as last fetched from the backend.
///
/// The list is only ever replaced as a whole. Views observe replacements via [`Directory::subscribe`]
/// and are informed about the outcome of mutations via the [`Notifications`] returned by [`Directory::new`].
pub struct Directory {
    client: Client,
    search_mode: SearchMode,
    resync: ResyncPolicy,
    contacts: watch::Sender<Contacts>,
    search: Mutex<Search>,
    form: Mutex<CreationForm>,
    notifier: Notifier,
}

#[derive(Default)]
struct Search {
    input: String,
    applied: String,
}

/// The state of the surface used to stage a new contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationForm {
    pub open: bool,
    pub draft: NewContact,
}

impl Directory {
    pub fn new(client: Client, config: &Config) -> (Self, Notifications) {
        let (notifier, notifications) = Notifier::new();
        let (contacts, _) = watch::channel(Contacts::default());

        let directory = Self {
            client,
            search_mode: config.search,
            resync: config.resync,
            contacts,
            search: Default::default(),
            form: Default::default(),
            notifier,
        };

        (directory, notifications)
    }

    pub fn contacts(&self) -> Contacts {
        self.contacts.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Contacts> {
        self.contacts.subscribe()
    }

    /// Replaces the directory with a fresh copy from the backend.
    ///
    /// Failures are logged but otherwise ignored, leaving the previous directory in place.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) {
        match self.client.list().await {
            Ok(contacts) => {
                tracing::debug!("Loaded {} contacts", contacts.len());

                self.contacts.send_replace(Arc::new(contacts));
            }
            Err(err) => tracing::warn!("Failed to load contacts: {:#}", err),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, fields: &NewContact) -> Result<(), RequestError> {
        let res = match fields.missing() {
            Some(field) => Err(RequestError::Missing(field)),
            None => self.client.create(fields).await,
        };

        if let Err(err) = res {
            tracing::warn!("Failed to create contact: {:#}", err);
            self.notifier.error("Error adding contact", err.message());

            return Err(err);
        }

        self.form.lock().draft = NewContact::default();
        self.load().await;
        self.form.lock().open = false;

        self.notifier.success("Contact added");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn update(&self, contact: &Contact) -> Result<(), RequestError> {
        if let Err(err) = self.client.update(contact).await {
            tracing::warn!("Failed to update contact: {:#}", err);
            self.notifier.error("Error updating contact", err.message());

            return Err(err);
        }

        match self.resync {
            ResyncPolicy::Pessimistic => self.load().await,
            ResyncPolicy::Optimistic => {
                let mut patched = false;

                self.contacts.send_modify(|contacts| {
                    if let Some(pos) = contacts.iter().position(|other| other.id == contact.id) {
                        Arc::make_mut(contacts)[pos] = contact.clone();
                        patched = true;
                    }
                });

                if !patched {
                    self.load().await;
                }
            }
        }

        self.notifier.success("Contact updated");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, contact: &Contact) -> Result<(), RequestError> {
        if let Err(err) = self.client.delete(contact).await {
            tracing::warn!("Failed to delete contact: {:#}", err);
            self.notifier.error("Error deleting contact", err.message());

            return Err(err);
        }

        match self.resync {
            ResyncPolicy::Pessimistic => self.load().await,
            ResyncPolicy::Optimistic => self.contacts.send_modify(|contacts| {
                Arc::make_mut(contacts).retain(|other| other.id != contact.id);
            }),
        }

        self.notifier.success("Contact deleted");

        Ok(())
    }

    /// Records `text` as the search input and returns the contacts matching the filter.
    ///
    /// Depending on the [`SearchMode`], the filter uses either `text` itself or the input recorded by the previous call.
    pub fn search(&self, text: &str) -> Vec<Contact> {
        let query = {
            let mut search = self.search.lock();

            let previous = replace(&mut search.input, text.to_owned());

            search.applied = match self.search_mode {
                SearchMode::Current => text.to_owned(),
                SearchMode::Lagging => previous,
            };

            search.applied.clone()
        };

        filter(&self.contacts(), &query)
    }

    pub fn query(&self) -> String {
        self.search.lock().input.clone()
    }

    /// The contacts to display: everything for inputs of at most one character, the filtered view otherwise.
    pub fn visible(&self) -> Vec<Contact> {
        let contacts = self.contacts();
        let search = self.search.lock();

        if search.input.chars().count() <= 1 {
            contacts.to_vec()
        } else {
            filter(&contacts, &search.applied)
        }
    }

    pub fn form(&self) -> CreationForm {
        self.form.lock().clone()
    }

    pub fn staged(&self) -> NewContact {
        self.form.lock().draft.clone()
    }

    pub fn open_create(&self) {
        self.form.lock().open = true;
    }

    /// Hides the creation surface, keeping whatever has been staged so far.
    pub fn close_create(&self) {
        self.form.lock().open = false;
    }

    pub fn set_new_field(&self, field: Field, value: String) {
        self.form.lock().draft.set(field, value);
    }

    pub async fn submit_new(&self) -> Result<(), RequestError> {
        let fields = self.staged();

        self.create(&fields).await
    }
}

/// Returns the contacts whose joined attributes contain `query`, ignoring case and preserving order.
pub fn filter(contacts: &[Contact], query: &str) -> Vec<Contact> {
    let query = query.to_lowercase();

    contacts
        .iter()
        .filter(|contact| contact.matches(&query))
        .cloned()
        .collect()
}
