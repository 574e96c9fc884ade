use anyhow::Result;

use crate::domain::{
    events::{AppEvent, KeyInput, StoreError, SubscriptionHandle},
    list_projection::project,
    message::FeedRecord,
    shell_state::{ActivePane, ShellState, StatusNotice},
};

use super::{
    contracts::{AuthService, MessageStore, RecordHandler, ShellOrchestrator},
    feed_subscriber::{Delivery, FeedSubscriber},
    send_coordinator::{AckSink, SendCoordinator},
    session_gate::SessionGate,
};

/// Drives the chat screen: every store notification arrives here as an
/// [`AppEvent`] and is applied one at a time.
pub struct ChatShellOrchestrator<S, A>
where
    S: MessageStore + Clone,
    A: AuthService,
{
    state: ShellState,
    gate: SessionGate<A>,
    subscriber: FeedSubscriber<S>,
    coordinator: SendCoordinator<S>,
}

impl<S, A> ChatShellOrchestrator<S, A>
where
    S: MessageStore + Clone,
    A: AuthService,
{
    pub fn new(gate: SessionGate<A>, store: S, collection: &str, ack: AckSink) -> Self {
        let mut state = ShellState::default();
        if let Some(identity) = gate.current_identity() {
            state.set_identity_label(identity.as_str());
        }

        Self {
            state,
            gate,
            subscriber: FeedSubscriber::new(store.clone(), collection),
            coordinator: SendCoordinator::new(store, collection, ack),
        }
    }

    /// Opens the feed subscription; records reach the shell through `on_append`.
    pub fn start(&mut self, on_append: RecordHandler) -> Result<SubscriptionHandle, StoreError> {
        self.subscriber.subscribe(on_append)
    }

    fn handle_key(&mut self, key: KeyInput) {
        if key.ctrl {
            if key.key == "l" {
                self.sign_out();
            }
            return;
        }

        if key.key == "esc" {
            self.state.toggle_pane();
            return;
        }

        match self.state.active_pane() {
            ActivePane::MessageList => match key.key.as_str() {
                "q" => self.quit(),
                "i" | "enter" => self.state.toggle_pane(),
                _ => {}
            },
            ActivePane::ComposeInput => self.handle_compose_key(&key.key),
        }
    }

    fn handle_compose_key(&mut self, key: &str) {
        if !self.state.input_enabled() {
            return;
        }

        if key == "enter" {
            self.send();
            return;
        }

        let compose = self.state.compose_mut();
        match key {
            "backspace" => compose.backspace(),
            "delete" => compose.delete(),
            "left" => compose.left(),
            "right" => compose.right(),
            "home" => compose.home(),
            "end" => compose.end(),
            other => {
                let mut chars = other.chars();
                if let (Some(ch), None) = (chars.next(), chars.next()) {
                    compose.insert(ch);
                }
            }
        }
    }

    fn send(&mut self) {
        let body = self.state.compose().text();
        let identity = self.gate.current_identity();

        // Dispatch only refuses with `Blocked`; store failures come back
        // through `on_send_acknowledged`.
        match self.coordinator.send(&body, identity.as_ref()) {
            Ok(()) => self.state.clear_notice(),
            Err(error) => tracing::debug!(error = %error, "send request blocked"),
        }
        self.state.set_composition(self.coordinator.state());
    }

    fn on_send_acknowledged(&mut self, outcome: Result<(), StoreError>) {
        let result = self.coordinator.acknowledge(outcome, self.state.compose_mut());
        self.state.set_composition(self.coordinator.state());

        if let Err(error) = result {
            self.state.set_notice(StatusNotice::Error(error.to_string()));
        }
    }

    fn on_feed_record(&mut self, subscription: SubscriptionHandle, record: &FeedRecord) {
        if let Ok(Delivery::Appended) = self.subscriber.deliver(subscription, record) {
            self.reproject();
        }
    }

    fn reproject(&mut self) {
        let identity = self.gate.current_identity();
        let rows = project(self.subscriber.feed().messages(), identity.as_ref());
        self.state.set_rows(rows);
    }

    fn sign_out(&mut self) {
        match self.gate.sign_out(&mut self.subscriber) {
            Ok(()) => {
                self.state
                    .set_notice(StatusNotice::Info("Signed out.".to_owned()));
                self.state.stop();
            }
            Err(error) => self.state.set_notice(StatusNotice::Error(format!(
                "{}: {error}. Press Ctrl-L to try again.",
                error.code()
            ))),
        }
    }

    fn quit(&mut self) {
        self.subscriber.cancel();
        self.state.stop();
    }
}

impl<S, A> ShellOrchestrator for ChatShellOrchestrator<S, A>
where
    S: MessageStore + Clone,
    A: AuthService,
{
    fn state(&self) -> &ShellState {
        &self.state
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Tick => {}
            AppEvent::QuitRequested => self.quit(),
            AppEvent::InputKey(key) => self.handle_key(key),
            AppEvent::FeedRecord {
                subscription,
                record,
            } => self.on_feed_record(subscription, &record),
            AppEvent::SendAcknowledged(outcome) => self.on_send_acknowledged(outcome),
        }

        Ok(())
    }
}
