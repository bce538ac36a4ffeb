//! Drives one invocation view: fetch, commit, maybe poll, repeat.
//!
//! The controller runs as a single tokio task that owns the [`ViewState`].
//! Only that task mutates it, and at most one fetch is in flight. Committed
//! states are published whole through a `watch` channel; title changes go out
//! as [`ShellCommand`]s.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::fetch::{InvocationId, InvocationSource};
use crate::lifecycle::ViewState;
use crate::poll::{DEFAULT_POLL_INTERVAL, PollScheduler};
use crate::title::{DEFAULT_PRODUCT_NAME, title_for};

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    pub product_name: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
        }
    }
}

/// One-way side effects for the surrounding shell to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    SetTitle(String),
}

/// The shell's end of a running controller.
///
/// Dropping the handle tears the controller down as well.
pub struct ControllerHandle {
    states: watch::Receiver<ViewState>,
    commands: mpsc::UnboundedReceiver<ShellCommand>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    /// A receiver that observes every committed state.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.states.clone()
    }

    /// The most recently committed state.
    pub fn current(&self) -> ViewState {
        self.states.borrow().clone()
    }

    pub async fn next_command(&mut self) -> Option<ShellCommand> {
        self.commands.recv().await
    }

    pub fn try_next_command(&mut self) -> Option<ShellCommand> {
        self.commands.try_recv().ok()
    }

    /// Stop the controller and wait for it to exit. A response still in
    /// flight is discarded and a pending refresh is cancelled.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Start a controller for `invocation_id` on the current tokio runtime.
pub fn spawn<S>(
    invocation_id: InvocationId,
    source: S,
    options: ControllerOptions,
) -> ControllerHandle
where
    S: InvocationSource + 'static,
{
    let state = ViewState::new(invocation_id);
    let (state_tx, states) = watch::channel(state.clone());
    let (command_tx, commands) = mpsc::unbounded_channel();
    let (shutdown, shutdown_rx) = watch::channel(false);

    let controller = InvocationController {
        source,
        state,
        options,
        state_tx,
        command_tx,
        last_title: None,
    };
    let task = tokio::spawn(controller.run(shutdown_rx));

    ControllerHandle {
        states,
        commands,
        shutdown,
        task,
    }
}

struct InvocationController<S> {
    source: S,
    state: ViewState,
    options: ControllerOptions,
    state_tx: watch::Sender<ViewState>,
    command_tx: mpsc::UnboundedSender<ShellCommand>,
    last_title: Option<String>,
}

impl<S: InvocationSource> InvocationController<S> {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let id = self.state.invocation_id().clone();
        let (mut poller, mut fired) = PollScheduler::new(self.options.poll_interval);
        self.publish_title();

        loop {
            let outcome = tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    debug!("Invocation {id}: torn down with a fetch in flight");
                    break;
                }
                outcome = self.source.fetch_invocation(&id) => outcome,
            };

            let transition = self.state.apply(outcome);
            // Title goes out first so a shell reacting to the state already has it.
            self.publish_title();
            self.state_tx.send_replace(self.state.clone());

            if !transition.schedule_poll {
                info!("Invocation {id}: settled as {}", transition.to);
                // Stay alive so the handle keeps a live state channel.
                let _ = shutdown.changed().await;
                break;
            }

            poller.schedule_refresh();
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => return,
                    ticket = fired.recv() => match ticket {
                        Some(ticket) if poller.take_fired(ticket) => break,
                        Some(_) => continue,
                        None => return,
                    },
                }
            }
        }
    }

    fn publish_title(&mut self) {
        let title = title_for(&self.state, &self.options.product_name);
        if self.last_title.as_deref() == Some(title.as_str()) {
            return;
        }
        self.last_title = Some(title.clone());
        let _ = self.command_tx.send(ShellCommand::SetTitle(title));
    }
}
