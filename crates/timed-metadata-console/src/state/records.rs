//! Records slice: the cached list, the selection, and the staleness marker.

use timed_metadata_proto::protocol::PublicRecord;

/// What a refetch of the selected record turned up.
#[derive(Debug, Clone, PartialEq)]
pub enum Latest {
    Record(PublicRecord),
    /// The record is gone from the table.
    Missing,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordsState {
    pub records: Vec<PublicRecord>,
    pub selected_idx: usize,
    /// Set when `latest` differs from the cached selection.
    pub is_stale: bool,
    pub latest: Option<Latest>,
}

#[derive(Debug, Clone)]
pub enum RecordsAction {
    /// `select` may be negative or past the end; it is clamped. `None` keeps
    /// the current index.
    ReplaceList {
        records: Vec<PublicRecord>,
        select: Option<isize>,
    },
    ReplaceOne(PublicRecord),
    PromoteLatest,
    SetPending(Latest),
    SelectById(String),
}

impl RecordsState {
    pub fn reduce(mut self, action: RecordsAction) -> Self {
        match action {
            RecordsAction::ReplaceList { records, select } => {
                let wanted = select.unwrap_or(self.selected_idx as isize);
                self.selected_idx = clamp_index(wanted, records.len());
                self.records = records;
                self.is_stale = false;
                self.latest = None;
            }
            RecordsAction::ReplaceOne(record) => {
                if let Some(slot) = self.records.iter_mut().find(|r| r.id == record.id) {
                    *slot = record;
                }
                self.is_stale = false;
                self.latest = None;
            }
            RecordsAction::PromoteLatest => {
                match self.latest.take() {
                    Some(Latest::Record(record)) => {
                        if let Some(slot) = self.records.get_mut(self.selected_idx) {
                            *slot = record;
                        }
                    }
                    Some(Latest::Missing) => {
                        if self.selected_idx < self.records.len() {
                            self.records.remove(self.selected_idx);
                        }
                        self.selected_idx =
                            clamp_index(self.selected_idx as isize, self.records.len());
                    }
                    None => {}
                }
                self.is_stale = false;
            }
            RecordsAction::SetPending(latest) => {
                self.latest = Some(latest);
                self.is_stale = true;
            }
            RecordsAction::SelectById(id) => {
                if let Some(idx) = self.index_of(&id) {
                    self.selected_idx = idx;
                }
                self.is_stale = false;
                self.latest = None;
            }
        }
        self
    }

    pub fn selected(&self) -> Option<&PublicRecord> {
        self.records.get(self.selected_idx)
    }

    pub fn find(&self, id: &str) -> Option<&PublicRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

fn clamp_index(idx: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    idx.clamp(0, len as isize - 1) as usize
}
