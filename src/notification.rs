use std::fmt;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: &'static str,
    pub description: Option<String>,
    pub status: Status,
}

impl fmt::Display for Notification {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let marker = match self.status {
            Status::Success => "ok",
            Status::Error => "error",
        };

        write!(fmt, "[{}] {}", marker, self.title)?;

        if let Some(description) = &self.description {
            write!(fmt, ": {}", description)?;
        }

        Ok(())
    }
}

pub type Notifications = UnboundedReceiver<Notification>;

#[derive(Debug, Clone)]
pub struct Notifier(UnboundedSender<Notification>);

impl Notifier {
    pub fn new() -> (Self, Notifications) {
        let (sender, receiver) = unbounded_channel();

        (Self(sender), receiver)
    }

    pub fn success(&self, title: &'static str) {
        self.send(Notification {
            title,
            description: None,
            status: Status::Success,
        });
    }

    pub fn error(&self, title: &'static str, description: String) {
        self.send(Notification {
            title,
            description: Some(description),
            status: Status::Error,
        });
    }

    fn send(&self, notification: Notification) {
        tracing::debug!("Notifying: {}", notification);

        // Nobody is looking if the receiver is gone.
        let _ = self.0.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_are_delivered_in_order() {
        let (notifier, mut notifications) = Notifier::new();

        notifier.success("Contact added");
        notifier.error("Error updating contact", "Invalid phone".to_owned());

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.status, Status::Success);
        assert_eq!(notification.to_string(), "[ok] Contact added");

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.status, Status::Error);
        assert_eq!(notification.description.as_deref(), Some("Invalid phone"));
        assert_eq!(
            notification.to_string(),
            "[error] Error updating contact: Invalid phone"
        );

        notifications.try_recv().unwrap_err();
    }

    #[test]
    fn sending_without_receiver_is_harmless() {
        let (notifier, notifications) = Notifier::new();
        drop(notifications);

        notifier.success("Contact deleted");
    }
}
