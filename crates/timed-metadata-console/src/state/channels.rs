use timed_metadata_proto::protocol::Channel;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelsState {
    pub channels: Vec<Channel>,
    pub selected: Option<Channel>,
}

#[derive(Debug, Clone)]
pub enum ChannelsAction {
    ReplaceList(Vec<Channel>),
    Select(Channel),
}

impl ChannelsState {
    pub fn reduce(mut self, action: ChannelsAction) -> Self {
        match action {
            ChannelsAction::ReplaceList(channels) => {
                // An existing selection survives a refresh even if the
                // channel dropped out of the listing.
                if self.selected.is_none() {
                    self.selected = channels.first().cloned();
                }
                self.channels = channels;
            }
            ChannelsAction::Select(channel) => {
                self.selected = Some(channel);
            }
        }
        self
    }

    /// The channel after the selected one, wrapping around.
    pub fn next_channel(&self) -> Option<&Channel> {
        if self.channels.is_empty() {
            return None;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|s| self.channels.iter().position(|c| c.arn == s.arn));
        let next = match current {
            Some(idx) => (idx + 1) % self.channels.len(),
            None => 0,
        };
        self.channels.get(next)
    }
}
