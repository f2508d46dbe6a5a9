//! Editor buffer for the selected record.

use timed_metadata_proto::payload::normalized_byte_len;
use timed_metadata_proto::protocol::PublicRecord;

pub const PAYLOAD_REJECTED: &str =
    "The text was not pasted since it will exceed the maximum TimedMetadata size";

/// Longest title the editor accepts, in characters.
pub const MAX_TITLE_CHARS: usize = 160;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub title: String,
    pub metadata: String,
}

#[derive(Debug, Clone)]
pub enum FormAction {
    /// Reset the buffer to a record's saved values (empty when `None`).
    Load(Option<PublicRecord>),
    SetTitle(String),
    SetMetadata(String),
}

impl FormState {
    pub fn reduce(self, action: FormAction) -> Self {
        match action {
            FormAction::Load(Some(record)) => Self {
                title: record.title,
                metadata: record.metadata,
            },
            FormAction::Load(None) => Self::default(),
            FormAction::SetTitle(title) => Self {
                title: title.chars().take(MAX_TITLE_CHARS).collect(),
                ..self
            },
            FormAction::SetMetadata(metadata) => Self { metadata, ..self },
        }
    }

    /// Without a selection there is nothing to be dirty against.
    pub fn is_dirty(&self, selected: Option<&PublicRecord>) -> bool {
        match selected {
            Some(record) => self.title != record.title || self.metadata != record.metadata,
            None => false,
        }
    }

    pub fn save_disabled(&self, selected: Option<&PublicRecord>, is_stale: bool) -> bool {
        if is_stale {
            return false;
        }
        selected.is_none() || !self.is_dirty(selected) || self.title.is_empty()
    }

    pub fn send_disabled(&self, selected: Option<&PublicRecord>) -> bool {
        selected.is_none() || self.title.is_empty() || self.metadata.is_empty()
    }
}

/// Whether a metadata edit fits under the editor's byte cap. Measured on the
/// normalized payload, so indentation and line breaks are free.
pub fn fits_payload_cap(metadata: &str, max_bytes: usize) -> bool {
    normalized_byte_len(metadata) <= max_bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use timed_metadata_proto::protocol::SentFlag;

    fn record() -> PublicRecord {
        PublicRecord {
            id: "a".to_string(),
            channel: "demo".to_string(),
            title: "Quiz".to_string(),
            metadata: "{\"q\":1}".to_string(),
            created_date: Some("1".to_string()),
            sent: SentFlag::No,
        }
    }

    #[test]
    fn test_load_and_dirty() {
        let form = FormState::default().reduce(FormAction::Load(Some(record())));
        assert!(!form.is_dirty(Some(&record())));
        let form = form.reduce(FormAction::SetTitle("Poll".to_string()));
        assert!(form.is_dirty(Some(&record())));
        assert!(!form.is_dirty(None));
    }

    #[test]
    fn test_save_rules() {
        let rec = record();
        let clean = FormState::default().reduce(FormAction::Load(Some(rec.clone())));
        assert!(clean.save_disabled(Some(&rec), false));
        assert!(!clean.save_disabled(Some(&rec), true));

        let dirty = clean.clone().reduce(FormAction::SetMetadata("{}".to_string()));
        assert!(!dirty.save_disabled(Some(&rec), false));

        let untitled = dirty.reduce(FormAction::SetTitle(String::new()));
        assert!(untitled.save_disabled(Some(&rec), false));
        assert!(clean.save_disabled(None, false));
    }

    #[test]
    fn test_send_rules() {
        let rec = record();
        let form = FormState::default().reduce(FormAction::Load(Some(rec.clone())));
        assert!(!form.send_disabled(Some(&rec)));
        assert!(form.send_disabled(None));
        let empty = form.reduce(FormAction::SetMetadata(String::new()));
        assert!(empty.send_disabled(Some(&rec)));
    }

    #[test]
    fn test_title_is_capped() {
        let form = FormState::default().reduce(FormAction::SetTitle("x".repeat(500)));
        assert_eq!(form.title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_payload_cap_counts_normalized_bytes() {
        assert!(fits_payload_cap(&"a".repeat(1000), 1000));
        assert!(!fits_payload_cap(&"é".repeat(501), 1000));

        let pretty: String = (0..55).map(|i| format!("    \"k{:02}\": \"v\",\n", i)).collect();
        assert!(pretty.len() > 1000);
        assert!(fits_payload_cap(&pretty, 1000));
    }
}
