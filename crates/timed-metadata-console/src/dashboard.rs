//! Dashboard controller.
//!
//! Owns every state slice and is driven from a single task. Gateway calls run
//! in spawned tasks and report back through an mpsc channel as
//! `DashboardEvent`s. List and item fetches carry a sequence number; a
//! response whose number is no longer the latest issued is dropped, so a slow
//! response can never overwrite a newer one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use timed_metadata_proto::config::ConsoleConfig;
use timed_metadata_proto::payload::{lint_json, normalize};
use timed_metadata_proto::protocol::{
    sort_newest_first, Channel, ChannelList, CreateRequest, PublicRecord, SendRequest,
    StoredRecord, UpdateRequest,
};

use crate::api::{ApiError, MetadataApi};
use crate::state::channels::{ChannelsAction, ChannelsState};
use crate::state::form::{fits_payload_cap, FormAction, FormState, PAYLOAD_REJECTED};
use crate::state::modal::{ButtonStyle, ConfirmAction, ModalAction, ModalIntent, ModalState};
use crate::state::notifications::{NotificationCenter, NotificationsState};
use crate::state::records::{Latest, RecordsAction, RecordsState};

const UNSAVED_CHANGES: &str = "You have unsaved TimedMetadata changes. Do you want to continue?";
const CONFIRM_DELETE: &str = "Are you sure you would like to delete this TimedMetadata?";
const UNTITLED: &str = "Untitled";

const EVENT_BUFFER: usize = 256;

#[derive(Debug)]
pub enum DashboardEvent {
    ListLoaded {
        seq: u64,
        select: Option<isize>,
        result: Result<Vec<PublicRecord>, ApiError>,
    },
    ItemFetched {
        seq: u64,
        id: String,
        force: bool,
        result: Result<Option<PublicRecord>, ApiError>,
    },
    ChannelsLoaded(Result<ChannelList, ApiError>),
    Created(Result<StoredRecord, ApiError>),
    Updated(Result<PublicRecord, ApiError>),
    Deleted {
        was_last: bool,
        select: isize,
        result: Result<(), ApiError>,
    },
    Sent {
        id: String,
        result: Result<(), ApiError>,
    },
    NotificationExpired(Uuid),
}

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub notification_timeout: Duration,
    pub max_notifications: usize,
    pub max_payload_bytes: usize,
}

impl From<&ConsoleConfig> for DashboardSettings {
    fn from(config: &ConsoleConfig) -> Self {
        Self {
            notification_timeout: Duration::from_secs(config.notification_timeout_secs),
            max_notifications: config.max_notifications,
            max_payload_bytes: config.max_payload_bytes,
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from(&ConsoleConfig::default())
    }
}

pub struct Dashboard {
    api: Arc<dyn MetadataApi>,
    events: mpsc::Sender<DashboardEvent>,
    records: RecordsState,
    channels: ChannelsState,
    modal: ModalState,
    form: FormState,
    notifications: NotificationCenter,
    list_seq: u64,
    item_seq: u64,
    in_flight: usize,
    max_payload_bytes: usize,
}

impl Dashboard {
    pub fn new(
        api: Arc<dyn MetadataApi>,
        settings: DashboardSettings,
    ) -> (Self, mpsc::Receiver<DashboardEvent>) {
        let (events, rx) = mpsc::channel(EVENT_BUFFER);
        let notifications = NotificationCenter::new(
            settings.max_notifications,
            settings.notification_timeout,
            events.clone(),
        );
        let dashboard = Self {
            api,
            events,
            records: RecordsState::default(),
            channels: ChannelsState::default(),
            modal: ModalState::default(),
            form: FormState::default(),
            notifications,
            list_seq: 0,
            item_seq: 0,
            in_flight: 0,
            max_payload_bytes: settings.max_payload_bytes,
        };
        (dashboard, rx)
    }

    // ── Read access ──────────────────────────────────────────────────────────

    pub fn records(&self) -> &RecordsState {
        &self.records
    }

    pub fn channels(&self) -> &ChannelsState {
        &self.channels
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn notifications(&self) -> &NotificationsState {
        self.notifications.state()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_dirty(&self) -> bool {
        self.form.is_dirty(self.records.selected())
    }

    pub fn save_disabled(&self) -> bool {
        self.form
            .save_disabled(self.records.selected(), self.records.is_stale)
    }

    pub fn send_disabled(&self) -> bool {
        self.form.send_disabled(self.records.selected())
    }

    // ── Fetching ─────────────────────────────────────────────────────────────

    pub fn load(&mut self) {
        self.refresh_channels();
        self.refresh_list(None);
    }

    pub fn refresh_channels(&mut self) {
        let api = self.api.clone();
        self.spawn(async move { DashboardEvent::ChannelsLoaded(api.list_channels().await) });
    }

    /// Refetches the whole list; `select` is the index to select once it
    /// arrives (clamped), `None` keeps the current one.
    pub fn refresh_list(&mut self, select: Option<isize>) {
        self.list_seq += 1;
        let seq = self.list_seq;
        let api = self.api.clone();
        self.spawn(async move {
            DashboardEvent::ListLoaded {
                seq,
                select,
                result: api.list_records().await,
            }
        });
    }

    fn refetch_item(&mut self, id: &str, force: bool) {
        self.item_seq += 1;
        let seq = self.item_seq;
        let id = id.to_string();
        let api = self.api.clone();
        self.spawn(async move {
            let result = api.get_record(&id).await;
            DashboardEvent::ItemFetched {
                seq,
                id,
                force,
                result,
            }
        });
    }

    /// Explicit refresh: refetch the selection and flag it if it changed.
    pub fn check_selected(&mut self) {
        if let Some(id) = self.records.selected().map(|r| r.id.clone()) {
            self.refetch_item(&id, false);
        }
    }

    /// Replace the cached selection with the pending latest value.
    pub fn accept_latest(&mut self) {
        self.apply_records(RecordsAction::PromoteLatest);
    }

    fn set_selected(&mut self, id: &str) {
        self.apply_records(RecordsAction::SelectById(id.to_string()));
        self.notifications.clear();
        self.refetch_item(id, false);
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    pub fn create_metadata(&mut self) {
        let Some(channel) = self.channels.selected.as_ref() else {
            warn!("create: no channel selected");
            self.notifications.error("Unable to create TimedMetadata");
            return;
        };
        let req = CreateRequest {
            channel: Some(channel.name.clone()),
            title: Some(UNTITLED.to_string()),
            metadata: Some(String::new()),
        };
        let api = self.api.clone();
        self.spawn(async move { DashboardEvent::Created(api.create_record(req).await) });
    }

    pub fn update_metadata(&mut self) {
        let (Some(record), Some(channel)) =
            (self.records.selected(), self.channels.selected.as_ref())
        else {
            return;
        };
        let req = UpdateRequest {
            id: Some(record.id.clone()),
            channel: Some(channel.name.clone()),
            title: Some(self.form.title.clone()),
            metadata: Some(self.form.metadata.clone()),
        };
        let api = self.api.clone();
        self.spawn(async move { DashboardEvent::Updated(api.update_record(req).await) });
    }

    pub fn delete_metadata(&mut self) {
        let Some(id) = self.records.selected().map(|r| r.id.clone()) else {
            return;
        };
        let was_last = self.records.records.len() <= 1;
        let select = self.records.selected_idx as isize - 1;
        let api = self.api.clone();
        self.spawn(async move {
            DashboardEvent::Deleted {
                was_last,
                select,
                result: api.delete_record(&id).await,
            }
        });
    }

    /// Dispatches the editor's payload, normalized, to the selected channel.
    pub fn send_metadata(&mut self) {
        let (Some(record), Some(channel)) =
            (self.records.selected(), self.channels.selected.as_ref())
        else {
            return;
        };
        let id = record.id.clone();
        let req = SendRequest {
            id: Some(id.clone()),
            channel_arn: Some(channel.arn.clone()),
            metadata: Some(normalize(&self.form.metadata)),
        };
        let api = self.api.clone();
        self.spawn(async move {
            DashboardEvent::Sent {
                id,
                result: api.send_metadata(req).await,
            }
        });
    }

    // ── User intents ─────────────────────────────────────────────────────────

    pub fn save(&mut self) {
        if self.save_disabled() || !self.lint_payload() {
            return;
        }
        self.update_metadata();
    }

    pub fn send(&mut self) {
        if self.send_disabled() || !self.lint_payload() {
            return;
        }
        let dirty = self.is_dirty();
        self.send_metadata();
        if dirty {
            self.update_metadata();
        }
    }

    pub fn request_add(&mut self) {
        if self.is_dirty() {
            self.show_modal(UNSAVED_CHANGES, ConfirmAction::new(ModalIntent::CreateRecord));
        } else {
            self.create_metadata();
        }
    }

    pub fn request_select(&mut self, id: &str) {
        if self.is_dirty() {
            self.show_modal(
                UNSAVED_CHANGES,
                ConfirmAction::new(ModalIntent::SelectRecord(id.to_string())),
            );
        } else {
            self.set_selected(id);
        }
    }

    pub fn request_delete(&mut self) {
        if self.records.selected().is_none() {
            return;
        }
        self.show_modal(
            CONFIRM_DELETE,
            ConfirmAction::new(ModalIntent::DeleteRecord).with_button("Delete", ButtonStyle::Destruct),
        );
    }

    pub fn confirm_modal(&mut self) {
        let confirm = self.modal.confirm.clone();
        self.apply_modal(ModalAction::Hide);
        match confirm.map(|c| c.intent) {
            Some(ModalIntent::CreateRecord) => self.create_metadata(),
            Some(ModalIntent::SelectRecord(id)) => self.set_selected(&id),
            Some(ModalIntent::DeleteRecord) => self.delete_metadata(),
            None => {}
        }
    }

    pub fn hide_modal(&mut self) {
        self.apply_modal(ModalAction::Hide);
    }

    /// Global escape: closes the modal and clears every notification.
    pub fn escape(&mut self) {
        self.apply_modal(ModalAction::Hide);
        self.notifications.clear();
    }

    pub fn dismiss_notification(&mut self, id: Uuid) {
        self.notifications.dismiss(id);
    }

    pub fn select_channel(&mut self, channel: Channel) {
        self.channels = std::mem::take(&mut self.channels).reduce(ChannelsAction::Select(channel));
    }

    pub fn cycle_channel(&mut self) {
        if let Some(next) = self.channels.next_channel().cloned() {
            self.select_channel(next);
        }
    }

    pub fn edit_title(&mut self, title: String) {
        if self.records.selected().is_none() {
            return;
        }
        self.apply_form(FormAction::SetTitle(title));
    }

    /// Returns false when the edit was rejected for exceeding the editor's
    /// byte cap.
    pub fn edit_metadata(&mut self, metadata: String) -> bool {
        if self.records.selected().is_none() {
            return false;
        }
        if !fits_payload_cap(&metadata, self.max_payload_bytes) {
            self.notifications.error(PAYLOAD_REJECTED);
            return false;
        }
        self.apply_form(FormAction::SetMetadata(metadata));
        true
    }

    // ── Event handling ───────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: DashboardEvent) {
        if !matches!(event, DashboardEvent::NotificationExpired(_)) {
            self.in_flight = self.in_flight.saturating_sub(1);
        }

        match event {
            DashboardEvent::ListLoaded {
                seq,
                select,
                result,
            } => {
                if seq != self.list_seq {
                    debug!("list: dropping superseded response #{}", seq);
                    return;
                }
                match result {
                    Ok(mut records) => {
                        sort_newest_first(&mut records);
                        debug!("list: {} record(s)", records.len());
                        self.apply_records(RecordsAction::ReplaceList { records, select });
                    }
                    Err(e) => {
                        warn!("list: {}", e);
                        self.notifications.error("Unable to retrieve TimedMetadata");
                    }
                }
            }
            DashboardEvent::ItemFetched {
                seq,
                id,
                force,
                result,
            } => {
                if seq != self.item_seq {
                    debug!("item: dropping superseded response #{} for {}", seq, id);
                    return;
                }
                match result {
                    Ok(latest) => self.reconcile(&id, latest, force),
                    Err(e) => {
                        warn!("item {}: {}", id, e);
                        self.notifications
                            .error("Unable to retrieve latest TimedMetadata");
                    }
                }
            }
            DashboardEvent::ChannelsLoaded(result) => match result {
                Ok(list) => {
                    debug!("channels: {} listed", list.channels.len());
                    self.channels = std::mem::take(&mut self.channels)
                        .reduce(ChannelsAction::ReplaceList(list.channels));
                }
                Err(e) => {
                    warn!("channels: {}", e);
                    self.notifications.error("Unable to retrieve channels");
                }
            },
            DashboardEvent::Created(result) => match result {
                Ok(item) => {
                    info!("created {}", item.id);
                    self.refresh_list(Some(0));
                    self.notifications.success("TimedMetadata created successfully");
                }
                Err(e) => {
                    warn!("create: {}", e);
                    self.notifications.error("Unable to create TimedMetadata");
                }
            },
            DashboardEvent::Updated(result) => match result {
                Ok(record) => {
                    info!("saved {}", record.id);
                    self.refresh_list(None);
                    self.notifications.success("TimedMetadata saved successfully");
                }
                Err(e) => {
                    warn!("update: {}", e);
                    self.notifications.error("Unable to update TimedMetadata");
                }
            },
            DashboardEvent::Deleted {
                was_last,
                select,
                result,
            } => match result {
                Ok(()) => {
                    if was_last {
                        self.create_metadata();
                    } else {
                        self.refresh_list(Some(select));
                    }
                    self.notifications.success("TimedMetadata deleted successfully");
                }
                Err(e) => {
                    warn!("delete: {}", e);
                    self.notifications.error("Unable to delete TimedMetadata");
                }
            },
            DashboardEvent::Sent { id, result } => match result {
                Ok(()) => {
                    info!("sent {}", id);
                    self.notifications.success("TimedMetadata sent successfully");
                    self.refetch_item(&id, true);
                }
                Err(e) if e.was_dispatched() => {
                    warn!("send {}: dispatched but not flagged: {}", id, e);
                    self.notifications
                        .error("TimedMetadata was sent but could not be marked as sent");
                    self.refetch_item(&id, true);
                }
                Err(e) => {
                    warn!("send {}: {}", id, e);
                    self.notifications.error("Unable to send timedMetadata");
                }
            },
            DashboardEvent::NotificationExpired(id) => self.notifications.expire(id),
        }
    }

    /// Compares a refetched record with the cached copy. Forced refetches
    /// write through; otherwise a difference on the selection is held as
    /// pending and the cache is marked stale.
    fn reconcile(&mut self, id: &str, latest: Option<PublicRecord>, force: bool) {
        let Some(cached) = self.records.find(id) else {
            debug!("item {}: no longer listed", id);
            return;
        };
        if latest.as_ref().is_some_and(|l| l.same_as(cached)) {
            return;
        }
        let is_selected = self.records.selected().is_some_and(|r| r.id == id);

        match (latest, force) {
            (Some(record), true) => self.apply_records(RecordsAction::ReplaceOne(record)),
            (None, true) => self.refresh_list(None),
            (Some(record), false) if is_selected => {
                info!("item {}: cached copy is stale", id);
                self.apply_records(RecordsAction::SetPending(Latest::Record(record)));
            }
            (None, false) if is_selected => {
                info!("item {}: removed upstream", id);
                self.apply_records(RecordsAction::SetPending(Latest::Missing));
            }
            _ => {}
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = DashboardEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = request.await;
            let _ = events.send(event).await;
        });
    }

    /// Applies a records action and reloads the editor when the selected
    /// record changed.
    fn apply_records(&mut self, action: RecordsAction) {
        let before = self.records.selected().cloned();
        self.records = std::mem::take(&mut self.records).reduce(action);
        let after = self.records.selected();
        if before.as_ref() != after {
            let load = FormAction::Load(after.cloned());
            self.apply_form(load);
        }
    }

    fn apply_form(&mut self, action: FormAction) {
        self.form = std::mem::take(&mut self.form).reduce(action);
    }

    fn apply_modal(&mut self, action: ModalAction) {
        self.modal = std::mem::take(&mut self.modal).reduce(action);
    }

    fn show_modal(&mut self, message: &str, confirm: ConfirmAction) {
        self.apply_modal(ModalAction::Show {
            message: message.to_string(),
            confirm,
        });
    }

    fn lint_payload(&mut self) -> bool {
        match lint_json(&self.form.metadata) {
            Ok(()) => true,
            Err(message) => {
                self.notifications.error(message);
                false
            }
        }
    }

    /// Handles events until every spawned request has reported back.
    #[cfg(test)]
    pub async fn settle(&mut self, rx: &mut mpsc::Receiver<DashboardEvent>) {
        while self.in_flight > 0 {
            match rx.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use timed_metadata_proto::protocol::SentFlag;
    use tokio::sync::Mutex;

    const ARN: &str = "arn:aws:ivs:us-west-2:1:channel/demo";

    /// In-memory gateway with the same semantics as the real one.
    #[derive(Default)]
    struct FakeApi {
        items: Mutex<Vec<StoredRecord>>,
        clock: Mutex<i64>,
        sent: Mutex<Vec<SendRequest>>,
        list_delays: Mutex<VecDeque<Duration>>,
        fail_lists: Mutex<bool>,
    }

    impl FakeApi {
        async fn seed(&self, title: &str) -> String {
            self.create_record(CreateRequest {
                channel: Some("demo".to_string()),
                title: Some(title.to_string()),
                metadata: Some(String::new()),
            })
            .await
            .unwrap()
            .id
        }

        async fn retitle(&self, id: &str, title: &str) {
            let mut items = self.items.lock().await;
            if let Some(item) = items.iter_mut().find(|i| i.id == id) {
                item.title = title.to_string();
            }
        }

        async fn remove(&self, id: &str) {
            self.items.lock().await.retain(|i| i.id != id);
        }
    }

    #[async_trait]
    impl MetadataApi for FakeApi {
        async fn list_records(&self) -> Result<Vec<PublicRecord>, ApiError> {
            if *self.fail_lists.lock().await {
                return Err(ApiError::Rejected {
                    status: 500,
                    message: "scan failed".to_string(),
                    kind: Some("store".to_string()),
                    dispatched: None,
                });
            }
            let snapshot: Vec<PublicRecord> = self
                .items
                .lock()
                .await
                .iter()
                .map(PublicRecord::from_stored)
                .collect();
            let delay = self.list_delays.lock().await.pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(snapshot)
        }

        async fn get_record(&self, id: &str) -> Result<Option<PublicRecord>, ApiError> {
            let items = self.items.lock().await;
            Ok(items
                .iter()
                .find(|i| i.id == id)
                .map(PublicRecord::from_stored))
        }

        async fn create_record(&self, req: CreateRequest) -> Result<StoredRecord, ApiError> {
            let mut clock = self.clock.lock().await;
            *clock += 1;
            let item = StoredRecord {
                id: Uuid::new_v4().to_string(),
                channel: req.channel.unwrap_or_default(),
                title: req.title.unwrap_or_default(),
                metadata: req.metadata.unwrap_or_default(),
                created_date: Some(clock.to_string()),
                sent: None,
            };
            self.items.lock().await.push(item.clone());
            Ok(item)
        }

        async fn update_record(&self, req: UpdateRequest) -> Result<PublicRecord, ApiError> {
            let mut items = self.items.lock().await;
            let id = req.id.unwrap_or_default();
            let item = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| ApiError::Rejected {
                    status: 500,
                    message: "unknown id".to_string(),
                    kind: None,
                    dispatched: None,
                })?;
            item.channel = req.channel.unwrap_or_default();
            item.title = req.title.unwrap_or_default();
            item.metadata = req.metadata.unwrap_or_default();
            Ok(PublicRecord::without_created_date(item))
        }

        async fn delete_record(&self, id: &str) -> Result<(), ApiError> {
            self.remove(id).await;
            Ok(())
        }

        async fn list_channels(&self) -> Result<ChannelList, ApiError> {
            Ok(ChannelList {
                channels: vec![Channel {
                    arn: ARN.to_string(),
                    name: "demo".to_string(),
                    attributes: Default::default(),
                }],
                next_token: None,
            })
        }

        async fn send_metadata(&self, req: SendRequest) -> Result<(), ApiError> {
            let id = req.id.clone().unwrap_or_default();
            if let Some(item) = self.items.lock().await.iter_mut().find(|i| i.id == id) {
                item.sent = Some("Yes".to_string());
            }
            self.sent.lock().await.push(req);
            Ok(())
        }
    }

    async fn loaded(api: Arc<FakeApi>) -> (Dashboard, mpsc::Receiver<DashboardEvent>) {
        let (mut dashboard, mut rx) = Dashboard::new(api, DashboardSettings::default());
        dashboard.load();
        dashboard.settle(&mut rx).await;
        (dashboard, rx)
    }

    fn titles(dashboard: &Dashboard) -> Vec<String> {
        dashboard
            .records()
            .records
            .iter()
            .map(|r| r.title.clone())
            .collect()
    }

    fn messages(dashboard: &Dashboard) -> Vec<String> {
        dashboard
            .notifications()
            .entries()
            .map(|n| n.message.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_load_sorts_newest_first_and_selects_channel() {
        let api = Arc::new(FakeApi::default());
        api.seed("first").await;
        api.seed("second").await;
        let (dashboard, _rx) = loaded(api).await;

        assert_eq!(titles(&dashboard), vec!["second", "first"]);
        assert_eq!(dashboard.records().selected_idx, 0);
        assert_eq!(dashboard.channels().selected.as_ref().unwrap().arn, ARN);
        assert_eq!(dashboard.form().title, "second");
        assert!(!dashboard.is_busy());
    }

    #[tokio::test]
    async fn test_refetch_marks_stale_then_promote() {
        let api = Arc::new(FakeApi::default());
        let id = api.seed("Quiz").await;
        let (mut dashboard, mut rx) = loaded(api.clone()).await;

        api.retitle(&id, "Quiz v2").await;
        dashboard.check_selected();
        dashboard.settle(&mut rx).await;

        assert!(dashboard.records().is_stale);
        assert_eq!(titles(&dashboard), vec!["Quiz"]);
        assert!(!dashboard.save_disabled());

        dashboard.accept_latest();
        assert!(!dashboard.records().is_stale);
        assert_eq!(titles(&dashboard), vec!["Quiz v2"]);
        assert_eq!(dashboard.form().title, "Quiz v2");
    }

    #[tokio::test]
    async fn test_refetch_of_unchanged_record_is_noop() {
        let api = Arc::new(FakeApi::default());
        let id = api.seed("Quiz").await;
        let (mut dashboard, mut rx) = loaded(api).await;
        let before = dashboard.records().clone();

        dashboard.request_select(&id);
        dashboard.settle(&mut rx).await;
        assert_eq!(dashboard.records(), &before);
    }

    #[tokio::test]
    async fn test_record_removed_upstream() {
        let api = Arc::new(FakeApi::default());
        api.seed("keep").await;
        let gone = api.seed("gone").await;
        let (mut dashboard, mut rx) = loaded(api.clone()).await;

        api.remove(&gone).await;
        dashboard.check_selected();
        dashboard.settle(&mut rx).await;
        assert!(dashboard.records().is_stale);
        assert_eq!(dashboard.records().latest, Some(Latest::Missing));

        dashboard.accept_latest();
        assert_eq!(titles(&dashboard), vec!["keep"]);
        assert_eq!(dashboard.form().title, "keep");
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_list_response_is_dropped() {
        let api = Arc::new(FakeApi::default());
        let (mut dashboard, mut rx) = loaded(api.clone()).await;

        api.list_delays
            .lock()
            .await
            .push_back(Duration::from_secs(5));
        dashboard.refresh_list(None);
        tokio::task::yield_now().await;

        api.seed("fresh").await;
        dashboard.refresh_list(None);
        dashboard.settle(&mut rx).await;

        assert_eq!(titles(&dashboard), vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_create_selects_new_record() {
        let api = Arc::new(FakeApi::default());
        api.seed("older").await;
        let (mut dashboard, mut rx) = loaded(api).await;

        dashboard.request_add();
        dashboard.settle(&mut rx).await;

        assert_eq!(titles(&dashboard), vec!["Untitled", "older"]);
        assert_eq!(dashboard.records().selected_idx, 0);
        let selected = dashboard.records().selected().unwrap();
        assert_eq!(selected.channel, "demo");
        assert_eq!(selected.sent, SentFlag::No);
        assert_eq!(messages(&dashboard), vec!["TimedMetadata created successfully"]);
    }

    #[tokio::test]
    async fn test_dirty_form_requires_confirmation() {
        let api = Arc::new(FakeApi::default());
        let other = api.seed("other").await;
        api.seed("current").await;
        let (mut dashboard, mut rx) = loaded(api).await;

        dashboard.edit_title("edited".to_string());
        assert!(dashboard.is_dirty());

        dashboard.request_select(&other);
        assert!(dashboard.modal().is_visible);
        assert_eq!(dashboard.modal().message, UNSAVED_CHANGES);
        assert_eq!(dashboard.records().selected().unwrap().title, "current");

        dashboard.escape();
        assert!(!dashboard.modal().is_visible);
        assert_eq!(dashboard.form().title, "edited");

        dashboard.request_select(&other);
        dashboard.confirm_modal();
        dashboard.settle(&mut rx).await;
        assert!(!dashboard.modal().is_visible);
        assert_eq!(dashboard.records().selected().unwrap().title, "other");
        assert_eq!(dashboard.form().title, "other");
        assert!(!dashboard.is_dirty());
    }

    #[tokio::test]
    async fn test_delete_selects_previous_record() {
        let api = Arc::new(FakeApi::default());
        api.seed("a").await;
        api.seed("b").await;
        let c = api.seed("c").await;
        let (mut dashboard, mut rx) = loaded(api).await;
        let b_id = dashboard.records().records[1].id.clone();

        dashboard.request_select(&b_id);
        dashboard.settle(&mut rx).await;
        dashboard.request_delete();
        let confirm = dashboard.modal().confirm.clone().unwrap();
        assert_eq!(confirm.button_text, "Delete");
        assert_eq!(confirm.button_style, ButtonStyle::Destruct);

        dashboard.confirm_modal();
        dashboard.settle(&mut rx).await;
        assert_eq!(titles(&dashboard), vec!["c", "a"]);
        assert_eq!(dashboard.records().selected().unwrap().id, c);
    }

    #[tokio::test]
    async fn test_deleting_last_record_creates_untitled() {
        let api = Arc::new(FakeApi::default());
        let only = api.seed("only").await;
        let (mut dashboard, mut rx) = loaded(api).await;

        dashboard.request_delete();
        dashboard.confirm_modal();
        dashboard.settle(&mut rx).await;

        assert_eq!(titles(&dashboard), vec!["Untitled"]);
        assert_ne!(dashboard.records().selected().unwrap().id, only);
    }

    #[tokio::test]
    async fn test_send_normalizes_saves_and_refetches() {
        let api = Arc::new(FakeApi::default());
        let id = api.seed("Quiz").await;
        let (mut dashboard, mut rx) = loaded(api.clone()).await;

        assert!(dashboard.edit_metadata("{\n  \"q\":   1\n}".to_string()));
        dashboard.send();
        dashboard.settle(&mut rx).await;

        let sent = api.sent.lock().await.clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id.as_deref(), Some(id.as_str()));
        assert_eq!(sent[0].channel_arn.as_deref(), Some(ARN));
        assert_eq!(sent[0].metadata.as_deref(), Some("{\"q\": 1}"));

        let selected = dashboard.records().selected().unwrap();
        assert_eq!(selected.sent, SentFlag::Yes);
        assert_eq!(selected.metadata, "{\n  \"q\":   1\n}");
        assert!(!dashboard.is_dirty());
        assert!(!dashboard.records().is_stale);
    }

    #[tokio::test]
    async fn test_invalid_json_is_not_sent() {
        let api = Arc::new(FakeApi::default());
        api.seed("Quiz").await;
        let (mut dashboard, mut rx) = loaded(api.clone()).await;

        dashboard.edit_metadata("{\"q\":".to_string());
        dashboard.send();
        dashboard.save();
        dashboard.settle(&mut rx).await;

        assert!(api.sent.lock().await.is_empty());
        assert_eq!(dashboard.notifications().len(), 2);
        assert_eq!(dashboard.records().selected().unwrap().metadata, "");
    }

    #[tokio::test]
    async fn test_oversized_edit_is_rejected() {
        let api = Arc::new(FakeApi::default());
        api.seed("Quiz").await;
        let (mut dashboard, _rx) = loaded(api).await;

        assert!(dashboard.edit_metadata("a".repeat(1000)));

        // Indented JSON over the cap raw but well under it once normalized.
        let pretty: String = (0..55).map(|i| format!("    \"k{:02}\": \"v\",\n", i)).collect();
        assert!(pretty.len() > 1000);
        assert!(dashboard.edit_metadata(pretty.clone()));
        assert!(messages(&dashboard).is_empty());

        assert!(!dashboard.edit_metadata("a".repeat(1001)));
        assert_eq!(dashboard.form().metadata, pretty);
        assert_eq!(messages(&dashboard), vec![PAYLOAD_REJECTED]);
    }

    #[tokio::test]
    async fn test_list_failure_becomes_notification() {
        let api = Arc::new(FakeApi::default());
        *api.fail_lists.lock().await = true;
        let (dashboard, _rx) = loaded(api).await;

        assert!(dashboard.records().records.is_empty());
        assert_eq!(messages(&dashboard), vec!["Unable to retrieve TimedMetadata"]);
    }

    #[tokio::test]
    async fn test_selecting_clears_notifications() {
        let api = Arc::new(FakeApi::default());
        let id = api.seed("Quiz").await;
        let (mut dashboard, mut rx) = loaded(api).await;

        dashboard.request_add();
        dashboard.settle(&mut rx).await;
        assert_eq!(dashboard.notifications().len(), 1);

        dashboard.request_select(&id);
        assert!(dashboard.notifications().is_empty());
        dashboard.settle(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifications_expire() {
        let api = Arc::new(FakeApi::default());
        let (mut dashboard, mut rx) = loaded(api).await;

        dashboard.request_add();
        dashboard.settle(&mut rx).await;
        assert_eq!(dashboard.notifications().len(), 1);

        match rx.recv().await {
            Some(event @ DashboardEvent::NotificationExpired(_)) => dashboard.handle_event(event),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(dashboard.notifications().is_empty());
    }
}
