use super::{
    compose_buffer::ComposeBuffer, composition::CompositionState, list_projection::DisplayRow,
};

/// Which part of the chat screen receives key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivePane {
    #[default]
    ComposeInput,
    MessageList,
}

/// Transient notice shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusNotice {
    Info(String),
    Error(String),
}

/// Everything the chat screen renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    running: bool,
    identity_label: String,
    active_pane: ActivePane,
    rows: Vec<DisplayRow>,
    compose: ComposeBuffer,
    composition: CompositionState,
    notice: Option<StatusNotice>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            running: true,
            identity_label: String::new(),
            active_pane: ActivePane::default(),
            rows: Vec::new(),
            compose: ComposeBuffer::default(),
            composition: CompositionState::default(),
            notice: None,
        }
    }
}

impl ShellState {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn identity_label(&self) -> &str {
        &self.identity_label
    }

    pub fn set_identity_label(&mut self, label: impl Into<String>) {
        self.identity_label = label.into();
    }

    pub fn active_pane(&self) -> ActivePane {
        self.active_pane
    }

    pub fn toggle_pane(&mut self) {
        self.active_pane = match self.active_pane {
            ActivePane::ComposeInput => ActivePane::MessageList,
            ActivePane::MessageList => ActivePane::ComposeInput,
        };
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn set_rows(&mut self, rows: Vec<DisplayRow>) {
        self.rows = rows;
    }

    pub fn compose(&self) -> &ComposeBuffer {
        &self.compose
    }

    pub fn compose_mut(&mut self) -> &mut ComposeBuffer {
        &mut self.compose
    }

    pub fn composition(&self) -> CompositionState {
        self.composition
    }

    pub fn set_composition(&mut self, composition: CompositionState) {
        self.composition = composition;
    }

    /// Input is disabled while a send is in flight.
    pub fn input_enabled(&self) -> bool {
        !self.composition.is_submitting()
    }

    pub fn notice(&self) -> Option<&StatusNotice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: StatusNotice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}
