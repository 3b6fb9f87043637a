//! Write selected shots to disk as an export package.
//!
//! ```text
//! out/
//! └── PRJ_SC01_Export_Package/
//!     ├── manifest.json
//!     ├── PRJ_SC01_hero_K3ZQ/
//!     │   ├── Shot001_hero_SC01__PRJ_001_K3ZQ.png
//!     │   └── Shot004_hero_SC01__PRJ_004_K3ZQ.png
//!     └── PRJ_SC01_street_9B0A/
//!         └── ...
//! ```
//!
//! One folder per task that has at least one selected shot. Tasks with no
//! selection get no folder, and when nothing at all is selected nothing is
//! written.

use crate::imaging::{AspectRatio, GridSpec};
use crate::naming::{package_folder_name, package_root_name};
use crate::task::TaskQueue;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Contents of `manifest.json`.
#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub project_id: String,
    pub scene_id: String,
    pub tasks: Vec<ExportedTask>,
}

#[derive(Debug, Serialize)]
pub struct ExportedTask {
    pub name: String,
    pub short_id: String,
    pub source: PathBuf,
    pub grid: GridSpec,
    pub ratio: AspectRatio,
    /// Folder name relative to the package root.
    pub folder: String,
    pub files: Vec<ExportedShot>,
}

#[derive(Debug, Serialize)]
pub struct ExportedShot {
    pub shot: usize,
    pub file: String,
    pub width: u32,
    pub height: u32,
}

/// Result of a successful export.
#[derive(Debug)]
pub struct ExportReport {
    /// Package root directory.
    pub root: PathBuf,
    pub manifest: ExportManifest,
}

impl ExportReport {
    pub fn file_count(&self) -> usize {
        self.manifest.tasks.iter().map(|t| t.files.len()).sum()
    }
}

/// Export all selected shots of `queue` under `out_dir`.
///
/// Returns `Ok(None)` without touching the filesystem when no shot is selected.
pub fn export_selected(queue: &TaskQueue, out_dir: &Path) -> Result<Option<ExportReport>, ExportError> {
    if queue.selected_count() == 0 {
        return Ok(None);
    }

    let config = queue.config();
    let root = out_dir.join(package_root_name(&config.project_id, &config.scene_id));
    std::fs::create_dir_all(&root)?;

    let mut tasks = Vec::new();
    for task in queue.tasks() {
        let mut shots = task.selected_shots().peekable();
        if shots.peek().is_none() {
            continue;
        }

        let folder = package_folder_name(
            &config.project_id,
            &config.scene_id,
            &task.name,
            &task.short_id,
        );
        let folder_path = root.join(&folder);
        std::fs::create_dir_all(&folder_path)?;

        let mut files = Vec::new();
        for shot in shots {
            let result = &shot.result;
            let file_path = folder_path.join(&result.name);
            // Names may carry separators from user-set project or task names.
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&file_path, &result.data)?;
            files.push(ExportedShot {
                shot: result.shot_number(),
                file: result.name.clone(),
                width: result.width,
                height: result.height,
            });
        }
        debug!(folder = %folder, files = files.len(), "exported task");

        tasks.push(ExportedTask {
            name: task.name.clone(),
            short_id: task.short_id.clone(),
            source: task.source.clone(),
            grid: task.grid,
            ratio: task.ratio,
            folder,
            files,
        });
    }

    let manifest = ExportManifest {
        project_id: config.project_id.clone(),
        scene_id: config.scene_id.clone(),
        tasks,
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(root.join(MANIFEST_FILE), json)?;

    Ok(Some(ExportReport { root, manifest }))
}
