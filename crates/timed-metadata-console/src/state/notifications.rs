//! Notification stack and its expiry timers.
//!
//! `NotificationsState` is the pure slice: newest entry first, capped, oldest
//! trimmed first. `NotificationCenter` wraps it and owns one expiry task per
//! live entry. Whenever an entry leaves the slice (dismissed, trimmed,
//! cleared, expired) its task is aborted, so no timer outlives its entry.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

use crate::dashboard::DashboardEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationsState {
    entries: VecDeque<Notification>,
    cap: usize,
}

#[derive(Debug, Clone)]
pub enum NotificationsAction {
    Add(Notification),
    Remove(Uuid),
    RemoveAll,
}

impl NotificationsState {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    pub fn reduce(mut self, action: NotificationsAction) -> Self {
        match action {
            NotificationsAction::Add(notification) => {
                self.entries.push_front(notification);
                self.entries.truncate(self.cap);
            }
            NotificationsAction::Remove(id) => {
                self.entries.retain(|n| n.id != id);
            }
            NotificationsAction::RemoveAll => {
                self.entries.clear();
            }
        }
        self
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.entries.iter().any(|n| &n.id == id)
    }
}

pub struct NotificationCenter {
    state: NotificationsState,
    timers: HashMap<Uuid, AbortHandle>,
    timeout: Duration,
    events: mpsc::Sender<DashboardEvent>,
}

impl NotificationCenter {
    pub fn new(cap: usize, timeout: Duration, events: mpsc::Sender<DashboardEvent>) -> Self {
        Self {
            state: NotificationsState::new(cap),
            timers: HashMap::new(),
            timeout,
            events,
        }
    }

    pub fn state(&self) -> &NotificationsState {
        &self.state
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notification::new(message, Severity::Success));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notification::new(message, Severity::Error));
    }

    pub fn dismiss(&mut self, id: Uuid) {
        self.apply(NotificationsAction::Remove(id));
    }

    pub fn clear(&mut self) {
        self.apply(NotificationsAction::RemoveAll);
    }

    /// Called when an expiry timer fires.
    pub fn expire(&mut self, id: Uuid) {
        self.timers.remove(&id);
        self.apply(NotificationsAction::Remove(id));
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn push(&mut self, notification: Notification) {
        let id = notification.id;
        debug!("notification {}: {}", id, notification.message);
        self.apply(NotificationsAction::Add(notification));
        if !self.state.contains(&id) {
            return;
        }

        let events = self.events.clone();
        let timeout = self.timeout;
        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(DashboardEvent::NotificationExpired(id)).await;
        });
        self.timers.insert(id, task.abort_handle());
    }

    fn apply(&mut self, action: NotificationsAction) {
        let state = std::mem::replace(&mut self.state, NotificationsState::new(1));
        self.state = state.reduce(action);

        let state = &self.state;
        self.timers.retain(|id, timer| {
            let live = state.contains(id);
            if !live {
                timer.abort();
            }
            live
        });
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        for timer in self.timers.values() {
            timer.abort();
        }
    }
}
