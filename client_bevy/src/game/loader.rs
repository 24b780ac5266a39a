//! Background level loading.
//!
//! Level files and maze scenes are read asynchronously on a dedicated thread
//! running a current-thread tokio runtime. Finished levels come back over a
//! channel and are picked up by [`LevelLoader::poll_events`].

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use bevy::prelude::Resource;
use maze_shared::LevelCatalog;
use maze_sim::config::SimConfig;
use maze_sim::input::GyroHandle;
use maze_sim::level::{read_catalog, Level};
use tokio::sync::mpsc::UnboundedSender;

enum LoaderCmd {
    /// Load a level by id; `None` picks the first level of the catalog.
    Load(Option<String>),
    RequestGyroPermission,
}

pub(crate) enum LoaderEvent {
    Loaded(Box<Level>),
    Failed { id: String, error: String },
}

#[derive(Resource)]
pub(crate) struct LevelLoader {
    event_rx: Mutex<Receiver<LoaderEvent>>,
    cmd_tx: UnboundedSender<LoaderCmd>,
    pending: bool,
}

impl LevelLoader {
    pub(crate) fn new(levels_dir: PathBuf, sim_config: Option<PathBuf>, gyro: GyroHandle) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<LoaderEvent>();
        let cmd_tx = spawn_loader_thread(levels_dir, sim_config, gyro, event_tx);
        Self {
            event_rx: Mutex::new(event_rx),
            cmd_tx,
            pending: false,
        }
    }

    pub(crate) fn load(&mut self, id: Option<String>) {
        if self.cmd_tx.send(LoaderCmd::Load(id)).is_ok() {
            self.pending = true;
        }
    }

    pub(crate) fn request_gyro_permission(&self) {
        let _ = self.cmd_tx.send(LoaderCmd::RequestGyroPermission);
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending
    }

    pub(crate) fn poll_events(&mut self) -> Vec<LoaderEvent> {
        let mut out = Vec::new();
        if let Ok(rx) = self.event_rx.lock() {
            while let Ok(evt) = rx.try_recv() {
                out.push(evt);
            }
        }
        if !out.is_empty() {
            self.pending = false;
        }
        out
    }
}

fn spawn_loader_thread(
    levels_dir: PathBuf,
    sim_config: Option<PathBuf>,
    gyro: GyroHandle,
    event_tx: Sender<LoaderEvent>,
) -> UnboundedSender<LoaderCmd> {
    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::unbounded_channel::<LoaderCmd>();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = event_tx.send(LoaderEvent::Failed {
                    id: String::new(),
                    error: format!("could not start the loader runtime: {e}"),
                });
                return;
            }
        };

        rt.block_on(async move {
            let sim = load_sim_config(sim_config.as_deref()).await;
            let catalog = match read_catalog(levels_dir.join("catalog.json")).await {
                Ok(catalog) => catalog,
                Err(e) => {
                    bevy::log::warn!("No level catalog: {}", e);
                    LevelCatalog::default()
                }
            };

            while let Some(cmd) = cmd_rx.recv().await {
                match cmd {
                    LoaderCmd::Load(id) => {
                        let event = load_level(&levels_dir, id, &catalog, &sim).await;
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    LoaderCmd::RequestGyroPermission => {
                        // Desktop builds have no permission prompt to wait on.
                        if let Some(task) = gyro.request_permission(async { false }) {
                            let _ = task.await;
                        }
                    }
                }
            }
        });
    });

    cmd_tx
}

async fn load_sim_config(path: Option<&Path>) -> SimConfig {
    let Some(path) = path else {
        return SimConfig::default();
    };
    match SimConfig::load(path).await {
        Ok(sim) => sim,
        Err(e) => {
            bevy::log::warn!("Using default simulation tuning: {}", e);
            SimConfig::default()
        }
    }
}

async fn load_level(
    levels_dir: &Path,
    id: Option<String>,
    catalog: &LevelCatalog,
    sim: &SimConfig,
) -> LoaderEvent {
    let Some(id) = id.or_else(|| catalog.levels.first().cloned()) else {
        return LoaderEvent::Failed {
            id: String::new(),
            error: format!("no levels listed in {}", levels_dir.display()),
        };
    };

    let path = levels_dir.join(format!("{id}.json"));
    match Level::load(&path, sim.clone(), catalog).await {
        Ok(level) => LoaderEvent::Loaded(Box::new(level)),
        Err(e) => LoaderEvent::Failed {
            id,
            error: e.to_string(),
        },
    }
}
