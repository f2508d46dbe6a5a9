//! Confirmation modal slice.

/// What confirming the modal will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalIntent {
    CreateRecord,
    SelectRecord(String),
    DeleteRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonStyle {
    Secondary,
    Destruct,
    #[default]
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmAction {
    pub intent: ModalIntent,
    pub button_text: String,
    pub button_style: ButtonStyle,
}

impl ConfirmAction {
    /// A "Continue" button in the confirm style.
    pub fn new(intent: ModalIntent) -> Self {
        Self {
            intent,
            button_text: "Continue".to_string(),
            button_style: ButtonStyle::default(),
        }
    }

    pub fn with_button(mut self, text: impl Into<String>, style: ButtonStyle) -> Self {
        self.button_text = text.into();
        self.button_style = style;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalState {
    pub is_visible: bool,
    pub message: String,
    pub confirm: Option<ConfirmAction>,
}

#[derive(Debug, Clone)]
pub enum ModalAction {
    Show {
        message: String,
        confirm: ConfirmAction,
    },
    Hide,
}

impl ModalState {
    pub fn reduce(self, action: ModalAction) -> Self {
        match action {
            ModalAction::Show { message, confirm } => Self {
                is_visible: true,
                message,
                confirm: Some(confirm),
            },
            ModalAction::Hide => Self::default(),
        }
    }
}
