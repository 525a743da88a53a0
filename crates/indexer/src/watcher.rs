use crate::error::{IndexerError, Result};
use crate::scanner::VaultScanner;
use crate::store::GraphStore;
use log::{debug, info, warn};
use notify::event::{EventKind, ModifyKind};
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use voicetree_graph::{Delta, Graph, NodeId};
use voicetree_protocol::{FsEvent, FsEventKind, GRAPH_UPDATE_SCHEMA_VERSION};

/// One applied filesystem event, as broadcast to subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUpdate {
    pub schema_version: u32,
    /// Position of this update in the coordinator's stream, starting at 1
    pub sequence: u64,
    pub kind: FsEventKind,
    pub node_id: NodeId,
    pub delta: Delta,
    pub node_count: usize,
    pub completed_at: SystemTime,
}

#[derive(Debug, Clone, Copy)]
pub struct VaultWatcherConfig {
    pub notify_poll_interval: Duration,
}

impl Default for VaultWatcherConfig {
    fn default() -> Self {
        Self {
            notify_poll_interval: Duration::from_secs(2),
        }
    }
}

enum WatcherCommand {
    Submit(FsEvent),
    Shutdown,
}

/// Keeps a [`GraphStore`] in sync with the vault on disk.
///
/// A single coordinator task owns the store and drains filesystem events in
/// arrival order; there is no debouncing or reordering. After each event it
/// publishes the new graph and broadcasts a [`GraphUpdate`].
pub struct VaultWatcher {
    command_tx: mpsc::Sender<WatcherCommand>,
    update_tx: broadcast::Sender<GraphUpdate>,
    graph_rx: watch::Receiver<Arc<Graph>>,
    task: Mutex<Option<JoinHandle<()>>>,
    _watcher: RecommendedWatcher,
}

impl VaultWatcher {
    /// Start watching `store.root()`. Must be called inside a tokio runtime.
    pub fn start(store: GraphStore, scanner: VaultScanner, config: VaultWatcherConfig) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (command_tx, command_rx) = mpsc::channel(64);
        let (update_tx, _) = broadcast::channel(256);
        let (graph_tx, graph_rx) = watch::channel(Arc::new(store.graph().clone()));

        let watcher = create_fs_watcher(store.root(), event_tx, config.notify_poll_interval)?;
        info!("Watching {}", store.root().display());

        let task = spawn_coordinator(store, scanner, event_rx, command_rx, update_tx.clone(), graph_tx);

        Ok(Self {
            command_tx,
            update_tx,
            graph_rx,
            task: Mutex::new(Some(task)),
            _watcher: watcher,
        })
    }

    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<GraphUpdate> {
        self.update_tx.subscribe()
    }

    /// Graph as of the last applied event
    #[must_use]
    pub fn graph(&self) -> Arc<Graph> {
        self.graph_rx.borrow().clone()
    }

    #[must_use]
    pub fn graph_stream(&self) -> watch::Receiver<Arc<Graph>> {
        self.graph_rx.clone()
    }

    /// Queue an event behind those already observed, e.g. an edit made
    /// through a UI rather than on disk.
    pub async fn submit(&self, event: FsEvent) -> Result<()> {
        self.command_tx
            .send(WatcherCommand::Submit(event))
            .await
            .map_err(|e| IndexerError::Other(format!("failed to submit event: {e}")))
    }

    /// Stop the coordinator after the events already queued ahead of the
    /// request, and wait for it to finish.
    pub async fn shutdown(&self) -> Result<()> {
        let _ = self.command_tx.send(WatcherCommand::Shutdown).await;
        let task = self
            .task
            .lock()
            .map_err(|_| IndexerError::Other("watcher task lock poisoned".to_string()))?
            .take();
        if let Some(task) = task {
            task.await
                .map_err(|e| IndexerError::Other(format!("watcher task failed: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for VaultWatcher {
    fn drop(&mut self) {
        let _ = self.command_tx.try_send(WatcherCommand::Shutdown);
    }
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
    poll_interval: Duration,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default().with_poll_interval(poll_interval),
    )?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

fn spawn_coordinator(
    mut store: GraphStore,
    scanner: VaultScanner,
    mut event_rx: mpsc::Receiver<notify::Result<Event>>,
    mut command_rx: mpsc::Receiver<WatcherCommand>,
    update_tx: broadcast::Sender<GraphUpdate>,
    graph_tx: watch::Sender<Arc<Graph>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sequence = 0u64;

        loop {
            let events = tokio::select! {
                Some(event) = event_rx.recv() => match event {
                    Ok(event) => observe(&scanner, &event).await,
                    Err(err) => {
                        warn!("Watcher error: {err}");
                        continue;
                    }
                },
                Some(cmd) = command_rx.recv() => match cmd {
                    WatcherCommand::Submit(event) => vec![event],
                    WatcherCommand::Shutdown => break,
                },
                else => break,
            };

            for event in events {
                let delta = store.apply_event(&event);
                sequence += 1;
                let node_id = delta
                    .first()
                    .map(|node_delta| node_delta.node_id().to_string())
                    .unwrap_or_default();

                let graph = Arc::new(store.graph().clone());
                let node_count = graph.len();
                let _ = graph_tx.send(graph);
                let _ = update_tx.send(GraphUpdate {
                    schema_version: GRAPH_UPDATE_SCHEMA_VERSION,
                    sequence,
                    kind: event.kind(),
                    node_id,
                    delta,
                    node_count,
                    completed_at: SystemTime::now(),
                });
            }
        }

        debug!("Watcher coordinator for {} stopped", store.root().display());
    })
}

/// Turn one notify event into filesystem observations for tracked notes.
///
/// A path is classified by what is on disk now: readable file means added or
/// changed, missing file means deleted.
async fn observe(scanner: &VaultScanner, event: &Event) -> Vec<FsEvent> {
    if matches!(event.kind, EventKind::Access(_) | EventKind::Other) {
        return Vec::new();
    }
    let created = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
    );

    let mut out = Vec::new();
    for path in &event.paths {
        if !scanner.is_tracked(path) {
            continue;
        }
        if let Some(observed) = read_observation(path, created).await {
            out.push(observed);
        }
    }
    out
}

async fn read_observation(path: &Path, created: bool) -> Option<FsEvent> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if created => Some(FsEvent::added(path, content)),
        Ok(content) => Some(FsEvent::changed(path, content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Some(FsEvent::deleted(path)),
        Err(err) => {
            warn!("Failed to read {}: {err}", path.display());
            None
        }
    }
}
