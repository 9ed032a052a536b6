use crate::client::AssistantClient;
use crate::panel::{ChatPanel, PanelEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct ShellSettings {
    pub reply_delay: Duration,
    /// Keep the conversation mounted while the panel is hidden. Off by default:
    /// hiding unmounts the panel and reopening starts a new conversation.
    pub keep_on_close: bool,
}

/// Owns the chat panel's visibility and, through it, the panel's lifetime.
pub struct Shell {
    visible: bool,
    panel: Option<ChatPanel>,
    next_mount: u64,
    settings: ShellSettings,
    client: Arc<AssistantClient>,
    events: mpsc::Sender<PanelEvent>,
}

impl Shell {
    pub fn new(
        settings: ShellSettings,
        client: Arc<AssistantClient>,
        events: mpsc::Sender<PanelEvent>,
    ) -> Self {
        Self {
            visible: false,
            panel: None,
            next_mount: 1,
            settings,
            client,
            events,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        if self.visible {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn open(&mut self) {
        if self.visible {
            return;
        }
        if self.panel.is_none() {
            let mount = self.next_mount;
            self.next_mount += 1;
            self.panel = Some(ChatPanel::mount(
                mount,
                Arc::clone(&self.client),
                self.events.clone(),
                self.settings.reply_delay,
            ));
        }
        self.visible = true;
    }

    pub fn close(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;
        if !self.settings.keep_on_close {
            if let Some(panel) = self.panel.take() {
                tracing::debug!(mount = panel.mount_id(), "discarding conversation on close");
            }
        }
    }

    /// The panel while it is on screen.
    pub fn panel(&self) -> Option<&ChatPanel> {
        self.panel.as_ref().filter(|_| self.visible)
    }

    pub fn panel_mut(&mut self) -> Option<&mut ChatPanel> {
        if self.visible {
            self.panel.as_mut()
        } else {
            None
        }
    }

    /// Routes a task completion to the mounted panel, hidden or not.
    pub fn handle(&mut self, event: PanelEvent) -> bool {
        match self.panel.as_mut() {
            Some(panel) => panel.handle(event),
            None => false,
        }
    }
}
