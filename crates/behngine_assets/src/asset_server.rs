use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::{
    runtime::Handle as TokioHandle,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError, unbounded_channel},
};

use crate::{
    assets::{Assets, Handle, MeshData},
    obj::{ObjError, ObjLoadOptions, load_obj},
};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load `{path}`: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: ObjError,
    },

    #[error("loader task for `{path}` did not complete: {reason}")]
    Task { path: PathBuf, reason: String },
}

// Internal Message (Heavy - Used only inside the server)
enum AssetWorkerMessage {
    MeshLoaded {
        handle: Handle<MeshData>,
        path: PathBuf,
        data: MeshData,
    },
    MeshFailed {
        handle: Handle<MeshData>,
        path: PathBuf,
        error: AssetError,
    },
}

/// What happened to a pending load, reported by [`AssetServer::flush`].
#[derive(Debug)]
pub enum AssetEvent {
    Loaded {
        handle: Handle<MeshData>,
        path: PathBuf,
    },
    Failed {
        handle: Handle<MeshData>,
        path: PathBuf,
        error: AssetError,
    },
}

/// Loads meshes off the main thread.
///
/// `load_mesh` hands out a handle right away; the parsed mesh is inserted into
/// `Assets<MeshData>` by a later `flush` on the main thread.
pub struct AssetServer {
    io_handle: TokioHandle,
    event_sender: UnboundedSender<AssetWorkerMessage>,
    event_receiver: UnboundedReceiver<AssetWorkerMessage>,
    pending: usize,
}

impl AssetServer {
    pub fn new(io_handle: TokioHandle) -> Self {
        let (event_sender, event_receiver) = unbounded_channel();
        Self {
            io_handle,
            event_sender,
            event_receiver,
            pending: 0,
        }
    }

    pub fn load_mesh(&mut self, path: impl AsRef<Path>, options: ObjLoadOptions) -> Handle<MeshData> {
        let handle = Handle::<MeshData>::new();
        let path = path.as_ref().to_path_buf();
        let sender = self.event_sender.clone();
        self.pending += 1;

        log::info!("[AssetServer] Loading: {}", path.display());

        self.io_handle.spawn(async move {
            let task_path = path.clone();
            let load_result = tokio::task::spawn_blocking(move || {
                load_obj(&task_path, &options).and_then(|mesh| mesh.to_mesh_data())
            })
            .await;

            let message = match load_result {
                Ok(Ok(data)) => AssetWorkerMessage::MeshLoaded { handle, path, data },
                Ok(Err(source)) => AssetWorkerMessage::MeshFailed {
                    handle,
                    error: AssetError::Obj {
                        path: path.clone(),
                        source,
                    },
                    path,
                },
                Err(join_error) => AssetWorkerMessage::MeshFailed {
                    handle,
                    error: AssetError::Task {
                        path: path.clone(),
                        reason: join_error.to_string(),
                    },
                    path,
                },
            };

            // The receiver is gone only when the server was dropped.
            let _ = sender.send(message);
        });

        handle
    }

    /// Number of loads that have not been flushed yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Moves every finished load into `meshes`. Never blocks.
    pub fn flush(&mut self, meshes: &mut Assets<MeshData>) -> Vec<AssetEvent> {
        let mut events = Vec::new();

        loop {
            match self.event_receiver.try_recv() {
                Ok(AssetWorkerMessage::MeshLoaded { handle, path, data }) => {
                    log::info!(
                        "[AssetServer] Loaded {} ({} vertices, {} triangles)",
                        path.display(),
                        data.vertices.len(),
                        data.triangle_count()
                    );
                    meshes.insert(handle, data);
                    events.push(AssetEvent::Loaded { handle, path });
                }
                Ok(AssetWorkerMessage::MeshFailed { handle, path, error }) => {
                    log::error!("[AssetServer] {error}");
                    events.push(AssetEvent::Failed { handle, path, error });
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
            self.pending = self.pending.saturating_sub(1);
        }

        events
    }
}
