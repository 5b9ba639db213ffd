//! Connection hub: the single owner of connection membership and chat history.
//!
//! All mutations arrive as [`HubCommand`]s on one queue and are applied by one
//! task, so register, deregister and submit are totally ordered without locks.
//! The hub task never waits on socket I/O: snapshot writes, broadcast delivery
//! and close handshakes all run in spawned tasks.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Semaphore, mpsc, oneshot};

use crate::{
    domain::{
        ChatHistory, ChatMessage, Connection, ConnectionId, DeliveryError, DeliveryState,
        FramePlan, HubError, RetryPolicy,
    },
    infrastructure::dto::websocket::OutboundEvent,
};

/// Requests processed by the hub task, in arrival order
pub enum HubCommand {
    Register(Connection),
    Deregister(ConnectionId),
    Submit(ChatMessage),
    History(oneshot::Sender<ChatHistory>),
    Status(oneshot::Sender<HubStatus>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSummary {
    pub id: ConnectionId,
    pub remote: String,
}

/// Point-in-time view of the hub state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubStatus {
    pub connections: Vec<ConnectionSummary>,
    pub history: ChatHistory,
}

impl HubStatus {
    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.connections.iter().any(|c| c.id == id)
    }
}

/// Cloneable handle for enqueueing commands to the hub
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands.send(command).map_err(|_| HubError::Stopped)
    }

    pub fn register(&self, connection: Connection) -> Result<(), HubError> {
        self.send(HubCommand::Register(connection))
    }

    pub fn deregister(&self, id: ConnectionId) -> Result<(), HubError> {
        self.send(HubCommand::Deregister(id))
    }

    pub fn submit(&self, message: ChatMessage) -> Result<(), HubError> {
        self.send(HubCommand::Submit(message))
    }

    /// Current history, as of the time the hub processes this request
    pub async fn history(&self) -> Result<ChatHistory, HubError> {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::History(tx))?;
        rx.await.map_err(|_| HubError::Stopped)
    }

    pub async fn status(&self) -> Result<HubStatus, HubError> {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::Status(tx))?;
        rx.await.map_err(|_| HubError::Stopped)
    }
}

/// Outcome of broadcasting one event to one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    GaveUp,
    /// The register snapshot failed, so the connection was already dropped
    Skipped,
}

/// Opens once a connection's register snapshot is written.
///
/// Broadcasts to the connection wait on it, so the snapshot is always the
/// first frame even though it is written outside the hub task.
#[derive(Clone)]
pub struct SnapshotGate(Arc<Semaphore>);

impl SnapshotGate {
    pub fn new() -> Self {
        Self(Arc::new(Semaphore::new(0)))
    }

    pub fn open(&self) {
        self.0.add_permits(1);
    }

    fn fail(&self) {
        self.0.close();
    }

    /// `false` if the snapshot could not be written
    async fn wait(&self) -> bool {
        self.0.acquire().await.is_ok()
    }
}

impl Default for SnapshotGate {
    fn default() -> Self {
        Self::new()
    }
}

struct Member {
    connection: Connection,
    gate: SnapshotGate,
}

pub struct ConnectionHub {
    members: HashMap<ConnectionId, Member>,
    history: ChatHistory,
    commands: mpsc::UnboundedReceiver<HubCommand>,
    // weak so that the hub stops once every external handle is dropped
    handle: mpsc::WeakUnboundedSender<HubCommand>,
    policy: RetryPolicy,
}

impl ConnectionHub {
    pub fn new(policy: RetryPolicy) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            members: HashMap::new(),
            history: ChatHistory::new(),
            commands: rx,
            handle: tx.downgrade(),
            policy,
        };
        (hub, HubHandle { commands: tx })
    }

    /// Start the hub on the current runtime and return its handle
    pub fn spawn(policy: RetryPolicy) -> HubHandle {
        let (hub, handle) = Self::new(policy);
        tokio::spawn(hub.run());
        handle
    }

    pub async fn run(mut self) {
        tracing::info!(
            "Connection hub started (max attempts: {}, backoff unit: {:?})",
            self.policy.max_attempts,
            self.policy.backoff_unit
        );
        while let Some(command) = self.commands.recv().await {
            self.handle_command(command);
        }
        tracing::info!("Connection hub stopped");
    }

    fn handle_command(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(connection) => self.register(connection),
            HubCommand::Deregister(id) => self.deregister(id),
            HubCommand::Submit(message) => self.submit(message),
            HubCommand::History(reply) => {
                let _ = reply.send(self.history.clone());
            }
            HubCommand::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn hub_handle(&self) -> Option<HubHandle> {
        self.handle
            .upgrade()
            .map(|commands| HubHandle { commands })
    }

    fn register(&mut self, connection: Connection) {
        tracing::info!(
            "Adding connection {} from {}",
            connection.id,
            connection.remote
        );
        let gate = SnapshotGate::new();
        self.members.insert(
            connection.id,
            Member {
                connection: connection.clone(),
                gate: gate.clone(),
            },
        );

        tokio::spawn(write_snapshot(
            connection,
            self.history.clone(),
            gate,
            self.hub_handle(),
        ));
    }

    fn deregister(&mut self, id: ConnectionId) {
        match self.members.remove(&id) {
            Some(Member { connection, .. }) => {
                tracing::info!(
                    "Removing connection {} from {} ({} remaining)",
                    id,
                    connection.remote,
                    self.members.len()
                );
                tokio::spawn(async move { connection.sink.close().await });
            }
            None => tracing::warn!("Error removing connection {}: not registered", id),
        }
    }

    fn submit(&mut self, message: ChatMessage) {
        tracing::debug!(
            "Broadcasting chat {} from '{}' to {} connection(s)",
            message.chat_id,
            message.username,
            self.members.len()
        );
        let event = OutboundEvent::broadcast(&message);
        self.history.upsert(message);

        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode chat broadcast: {}", e);
                return;
            }
        };
        let Some(hub) = self.hub_handle() else {
            tracing::debug!("Hub is shutting down; skipping broadcast");
            return;
        };

        // every connection is a target, the sender included
        for member in self.members.values() {
            tokio::spawn(deliver(
                member.connection.clone(),
                member.gate.clone(),
                frame.clone(),
                hub.clone(),
                self.policy,
            ));
        }
    }

    fn status(&self) -> HubStatus {
        HubStatus {
            connections: self
                .members
                .values()
                .map(|m| ConnectionSummary {
                    id: m.connection.id,
                    remote: m.connection.remote.clone(),
                })
                .collect(),
            history: self.history.clone(),
        }
    }
}

async fn send_snapshot(
    connection: &Connection,
    history: &ChatHistory,
) -> Result<(), DeliveryError> {
    let frame = OutboundEvent::snapshot(history)
        .to_frame()
        .map_err(|e| DeliveryError::Encode(e.to_string()))?;
    connection.sink.send_frame(frame).await
}

/// Write the register snapshot, then open the gate for broadcasts.
///
/// On failure the connection is closed and its deregistration enqueued.
async fn write_snapshot(
    connection: Connection,
    history: ChatHistory,
    gate: SnapshotGate,
    hub: Option<HubHandle>,
) {
    match send_snapshot(&connection, &history).await {
        Ok(()) => gate.open(),
        Err(e) => {
            tracing::error!(
                "Error sending chat list to {}: {}; closing connection",
                connection.remote,
                e
            );
            gate.fail();
            connection.sink.close().await;
            if let Some(hub) = hub {
                let _ = hub.deregister(connection.id);
            }
        }
    }
}

/// Deliver one broadcast frame to one connection, retrying with full resync.
///
/// Waits for the connection's register snapshot first. Gives up after
/// `policy.max_attempts` failures, closes the connection and enqueues its
/// deregistration.
pub async fn deliver(
    connection: Connection,
    gate: SnapshotGate,
    frame: String,
    hub: HubHandle,
    policy: RetryPolicy,
) -> DeliveryOutcome {
    if !gate.wait().await {
        tracing::debug!(
            "Skipping broadcast to {}: chat list was never delivered",
            connection.remote
        );
        return DeliveryOutcome::Skipped;
    }

    let mut state = DeliveryState::start();

    while let (Some(attempt), Some(plan)) = (state.attempt(), state.frame()) {
        let result = match plan {
            FramePlan::Incremental => connection.sink.send_frame(frame.clone()).await,
            FramePlan::Snapshot => match hub.history().await {
                Ok(history) => send_snapshot(&connection, &history).await,
                Err(e) => Err(e.into()),
            },
        };

        match result {
            Ok(()) => {
                if attempt > 1 {
                    tracing::info!(
                        "Resynced {} with full chat list on attempt {}",
                        connection.remote,
                        attempt
                    );
                }
                return DeliveryOutcome::Delivered { attempts: attempt };
            }
            Err(e) => {
                tracing::warn!(
                    "Attempt {} of {} - error writing message to {}: {}",
                    attempt,
                    policy.max_attempts,
                    connection.remote,
                    e
                );
                state = state.on_failure(&policy);
                if state != DeliveryState::Failed {
                    tokio::time::sleep(policy.backoff(attempt)).await;
                }
            }
        }
    }

    tracing::error!(
        "Giving up on {} after {} attempts; closing connection",
        connection.remote,
        policy.max_attempts
    );
    connection.sink.close().await;
    if hub.deregister(connection.id).is_err() {
        tracing::debug!("Hub stopped before {} could be deregistered", connection.id);
    }
    DeliveryOutcome::GaveUp
}
