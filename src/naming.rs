//! Centralized naming for shots, tasks and export folders.
//!
//! Every exported file carries its 1-based shot number twice, zero-padded
//! to three digits, around the naming context:
//!
//! ```text
//! Shot{NNN}_{imageName}_{sceneId}__{projectId}_{NNN}_{taskId}.png
//! Shot004_hero_SC01__PRJ_004_K3ZQ.png
//! ```
//!
//! Shots of one task are grouped in a folder named
//! `{projectId}_{sceneId}_{taskName}_{shortId}`.

use crate::imaging::ShotNaming;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Length of a task short ID.
pub const SHORT_ID_LEN: usize = 4;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Format a 1-based shot number as 3-digit zero-padded.
pub fn format_shot_number(number: usize) -> String {
    format!("{:0>3}", number)
}

/// Output filename of shot `number` (1-based).
pub fn shot_filename(number: usize, naming: &ShotNaming) -> String {
    let nnn = format_shot_number(number);
    format!(
        "Shot{nnn}_{}_{}__{}_{nnn}_{}.png",
        naming.image_name, naming.scene_id, naming.project_id, naming.task_id
    )
}

/// Initial task name: the file name without its last extension.
///
/// - `"hero.sheet.png"` → `"hero.sheet"`
/// - `"sheet"` → `"sheet"`
pub fn task_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Four-character uppercase base-36 ID derived from the source bytes.
///
/// Content-based, so re-running on the same file produces the same names.
pub fn short_id(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut value = u64::from_be_bytes(digest[..8].try_into().unwrap_or_default());
    let mut id = String::with_capacity(SHORT_ID_LEN);
    for _ in 0..SHORT_ID_LEN {
        id.push(BASE36[(value % 36) as usize] as char);
        value /= 36;
    }
    id
}

/// Export folder for one task's shots.
pub fn package_folder_name(project_id: &str, scene_id: &str, task_name: &str, short_id: &str) -> String {
    format!("{project_id}_{scene_id}_{task_name}_{short_id}")
}

/// Top-level export directory for a project/scene.
pub fn package_root_name(project_id: &str, scene_id: &str) -> String {
    format!("{project_id}_{scene_id}_Export_Package")
}
