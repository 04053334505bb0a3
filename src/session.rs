use std::error::Error as StdError;
use std::fmt;

use crate::{
    client::RequestError,
    contact::{Contact, Field},
    directory::Directory,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Closed,
    Editing,
    /// An update is in flight and both cancelling and committing are disabled.
    Committing,
}

/// The in-progress edit of a single contact.
///
/// `working` is what the inputs show, `committed` is the last state known to the backend
/// and is what cancelling reverts to.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    working: Contact,
    committed: Contact,
    state: State,
}

impl EditSession {
    pub fn working(&self) -> &Contact {
        &self.working
    }

    pub fn committed(&self) -> &Contact {
        &self.committed
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != State::Closed
    }

    pub fn is_busy(&self) -> bool {
        self.state == State::Committing
    }

    /// Starts editing `contact`, discarding anything left over from earlier edits.
    pub fn open(&mut self, contact: Contact) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }

        self.working = contact.clone();
        self.committed = contact;
        self.state = State::Editing;

        Ok(())
    }

    pub fn set_field(&mut self, field: Field, value: String) -> Result<(), SessionError> {
        match self.state {
            State::Closed => Err(SessionError::NotOpen),
            State::Committing => Err(SessionError::Busy),
            State::Editing => {
                self.working.set(field, value);

                Ok(())
            }
        }
    }

    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }

        self.working = self.committed.clone();
        self.state = State::Closed;

        Ok(())
    }

    /// Marks the session as busy and returns the contact to send to the backend.
    pub fn begin_commit(&mut self) -> Result<Contact, SessionError> {
        match self.state {
            State::Closed => Err(SessionError::NotOpen),
            State::Committing => Err(SessionError::Busy),
            State::Editing => {
                self.state = State::Committing;

                Ok(self.working.clone())
            }
        }
    }

    /// Leaves the busy state once the backend has answered.
    pub fn finish_commit(&mut self, success: bool) {
        if !self.is_busy() {
            tracing::warn!("Commit finished without being started");
            return;
        }

        if success {
            self.committed = self.working.clone();
            self.state = State::Closed;
        } else {
            self.state = State::Editing;
        }
    }

    pub async fn commit(&mut self, directory: &Directory) -> Result<(), SessionError> {
        let contact = self.begin_commit()?;

        let res = directory.update(&contact).await;

        self.finish_commit(res.is_ok());

        res.map_err(SessionError::Rejected)
    }
}

#[derive(Debug)]
pub enum SessionError {
    NotOpen,
    Busy,
    Rejected(RequestError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotOpen => fmt.write_str("No contact is being edited"),
            Self::Busy => fmt.write_str("The contact is still being saved"),
            Self::Rejected(err) => write!(fmt, "Failed to save contact: {}", err),
        }
    }
}

impl StdError for SessionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::NotOpen | Self::Busy => None,
        }
    }
}
