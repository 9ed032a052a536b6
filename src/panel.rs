use crate::client::AssistantClient;
use crate::protocol::ChatOutcome;
use crate::widget::{Received, Widget};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Completions reported back to the UI loop by a panel's background tasks.
#[derive(Debug)]
pub enum PanelEvent {
    Reply { mount: u64, outcome: ChatOutcome },
    DisplayDue { mount: u64 },
}

impl PanelEvent {
    pub fn mount(&self) -> u64 {
        match self {
            PanelEvent::Reply { mount, .. } | PanelEvent::DisplayDue { mount } => *mount,
        }
    }
}

/// A mounted conversation widget plus the tasks it has in flight.
///
/// Dropping the panel aborts those tasks, so nothing from an unmounted
/// instance reaches the UI loop after the fact.
pub struct ChatPanel {
    mount: u64,
    widget: Widget,
    client: Arc<AssistantClient>,
    events: mpsc::Sender<PanelEvent>,
    reply_delay: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl ChatPanel {
    pub fn mount(
        mount: u64,
        client: Arc<AssistantClient>,
        events: mpsc::Sender<PanelEvent>,
        reply_delay: Duration,
    ) -> Self {
        tracing::debug!(mount, "chat panel mounted");
        Self {
            mount,
            widget: Widget::new(),
            client,
            events,
            reply_delay,
            tasks: Vec::new(),
        }
    }

    pub fn mount_id(&self) -> u64 {
        self.mount
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut Widget {
        &mut self.widget
    }

    /// Sends the input buffer. Returns false when the widget refused it.
    pub fn submit(&mut self) -> bool {
        let Some(request) = self.widget.submit_input() else {
            return false;
        };

        let client = Arc::clone(&self.client);
        let sender = self.events.clone();
        let mount = self.mount;
        self.spawn(async move {
            let outcome = client.send(&request).await;
            let _ = sender.send(PanelEvent::Reply { mount, outcome }).await;
        });
        true
    }

    /// Applies an event from one of this panel's tasks. Events from another
    /// mount are dropped. Returns true if the widget changed.
    pub fn handle(&mut self, event: PanelEvent) -> bool {
        if event.mount() != self.mount {
            tracing::debug!(
                mount = self.mount,
                stale = event.mount(),
                "dropping event from unmounted panel"
            );
            return false;
        }

        match event {
            PanelEvent::Reply { outcome, .. } => match self.widget.receive(outcome) {
                Received::Deferred => {
                    self.schedule_reveal();
                    true
                }
                Received::Shown => true,
                Received::Ignored => false,
            },
            PanelEvent::DisplayDue { .. } => self.widget.reveal(),
        }
    }

    fn schedule_reveal(&mut self) {
        let sender = self.events.clone();
        let mount = self.mount;
        let delay = self.reply_delay;
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(PanelEvent::DisplayDue { mount }).await;
        });
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|handle| !handle.is_finished());
        self.tasks.push(tokio::spawn(task));
    }
}

impl Drop for ChatPanel {
    fn drop(&mut self) {
        let live = self.tasks.iter().filter(|t| !t.is_finished()).count();
        if live > 0 {
            tracing::debug!(mount = self.mount, live, "aborting tasks of unmounted panel");
        }
        for task in &self.tasks {
            task.abort();
        }
    }
}
