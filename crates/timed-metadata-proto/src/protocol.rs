use serde::{Deserialize, Serialize};

/// A record exactly as it sits in the key-value table.
///
/// `Sent` is a marker attribute: absent until the payload has been dispatched
/// at least once. `CreatedDate` is epoch millis rendered as a decimal string;
/// items created by an upserting update never get one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StoredRecord {
    pub id: String,
    pub channel: String,
    pub title: String,
    #[serde(default)]
    pub metadata: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent: Option<String>,
}

/// Presentation of the sent marker at the API boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SentFlag {
    Yes,
    #[default]
    No,
}

/// The filtered shape every read and update returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PublicRecord {
    pub id: String,
    pub channel: String,
    pub title: String,
    #[serde(default)]
    pub metadata: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default)]
    pub sent: SentFlag,
}

impl PublicRecord {
    /// Read shape: a missing `CreatedDate` is reported as an empty string.
    pub fn from_stored(item: &StoredRecord) -> Self {
        Self {
            created_date: Some(item.created_date.clone().unwrap_or_default()),
            ..Self::without_created_date(item)
        }
    }

    /// Update shape: no `CreatedDate` at all.
    pub fn without_created_date(item: &StoredRecord) -> Self {
        Self {
            id: item.id.clone(),
            channel: item.channel.clone(),
            title: item.title.clone(),
            metadata: item.metadata.clone(),
            created_date: None,
            sent: if item.sent.is_some() {
                SentFlag::Yes
            } else {
                SentFlag::No
            },
        }
    }

    /// Structural comparison used for staleness detection. An absent
    /// `CreatedDate` and an empty one compare equal.
    pub fn same_as(&self, other: &PublicRecord) -> bool {
        self.id == other.id
            && self.channel == other.channel
            && self.title == other.title
            && self.metadata == other.metadata
            && self.sent == other.sent
            && self.created_date.as_deref().unwrap_or("")
                == other.created_date.as_deref().unwrap_or("")
    }

    /// Creation time in epoch millis; unparsable or missing dates sort last.
    pub fn created_millis(&self) -> i64 {
        self.created_date
            .as_deref()
            .and_then(|d| d.trim().parse::<i64>().ok())
            .unwrap_or(0)
    }
}

/// Sorts newest first, the order the console lists records in.
pub fn sort_newest_first(records: &mut [PublicRecord]) {
    records.sort_by(|a, b| b.created_millis().cmp(&a.created_millis()));
}

// ── Request bodies ────────────────────────────────────────────────────────────
//
// Every field is optional on the wire so the gateway can answer "missing
// field" with a 400 instead of a parse failure.

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CreateRequest {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UpdateRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SendRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "channelArn")]
    pub channel_arn: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

/// `?id=` query used by get and delete.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// Returns the value when it is present and non-empty.
pub fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

// ── Responses ─────────────────────────────────────────────────────────────────

/// Acknowledgment returned by delete. Mirrors the table's empty result.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DeleteAck {}

/// Error body for every non-2xx gateway response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub message: String,
    pub kind: String,
    /// Set on send failures where the payload already reached the channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatched: Option<bool>,
}

// ── Channels ──────────────────────────────────────────────────────────────────

/// A channel entry from the control API listing. Only `arn` and `name` are
/// interpreted; every other attribute is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    pub arn: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Channel {
    /// Short identifier: the arn from its `channel` resource segment onward.
    pub fn id(&self) -> &str {
        channel_id_from_arn(&self.arn)
    }
}

pub fn channel_id_from_arn(arn: &str) -> &str {
    match arn.find("channel") {
        Some(idx) => &arn[idx..],
        None => arn,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChannelList {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default, rename = "nextToken", skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}
