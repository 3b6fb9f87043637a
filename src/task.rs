//! Batch orchestration: a queue of sheets waiting to be sliced.
//!
//! Each input file becomes a [`Task`]. Adding files decodes and analyzes
//! them up front (in parallel), so every task starts out with its own
//! detected grid and ratio. [`TaskQueue::run`] then slices the tasks one
//! after another and records the shots.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──run──▶ Processing ──▶ Completed
//!                       │
//!                       └──────▶ Error (message kept, other tasks continue)
//! ```
//!
//! Completed tasks are skipped by later runs. A task whose file could not be
//! read or decoded is queued directly in the `Error` state.
//!
//! ## Progress
//!
//! Task progress is 10 when a task enters `Processing`, then follows the
//! slice engine as `10 + p × 0.9`, and is 100 once completed. Every change is
//! reported as a [`TaskEvent`] on the optional channel passed to `run`.

use crate::config::{GridConfig, ProjectConfig, RatioConfig};
use crate::imaging::{
    self, AspectRatio, GridSpec, ImagingError, PngShotEncoder, RasterImage, ShotEncoder,
    ShotNaming, SliceResult,
};
use crate::naming::{short_id, task_name_from_path};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};

/// Largest allowed difference between a task's ratio value and the global
/// one before the task counts as mismatched.
pub const RATIO_MISMATCH_THRESHOLD: f64 = 0.05;

/// Progress of a task the moment it starts processing.
const START_PROGRESS: f64 = 10.0;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("No task at position {0}")]
    NoSuchTask(usize),
    #[error("Task {task} has no shot {shot}")]
    NoSuchShot { task: usize, shot: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Which grid/ratio a run slices with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    /// Each task's own (detected or overridden) parameters.
    #[default]
    Individual,
    /// The project-wide grid and ratio from [`ProjectConfig`].
    Global,
}

/// A produced shot plus its export selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    pub result: SliceResult,
    pub selected: bool,
}

/// One source sheet in the queue.
#[derive(Debug, Clone)]
pub struct Task {
    /// Queue-unique, stable across reordering.
    pub id: usize,
    /// Four-character ID embedded in shot filenames.
    pub short_id: String,
    pub source: PathBuf,
    /// Display/export name, initially the file stem.
    pub name: String,
    pub status: TaskStatus,
    /// 0-100.
    pub progress: f64,
    /// Parameters for an `Individual` run; once completed, the ones actually used.
    pub grid: GridSpec,
    pub ratio: AspectRatio,
    pub results: Vec<Shot>,
    pub error: Option<String>,
    pub(crate) bytes: Option<Vec<u8>>,
}

impl Task {
    pub fn selected_shots(&self) -> impl Iterator<Item = &Shot> {
        self.results.iter().filter(|s| s.selected)
    }
}

/// Progress reports emitted by [`TaskQueue::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    TaskStarted {
        index: usize,
        name: String,
        grid: GridSpec,
        ratio: AspectRatio,
    },
    Progress {
        index: usize,
        progress: f64,
    },
    TaskFinished {
        index: usize,
        name: String,
        outcome: TaskOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Completed { shots: usize },
    Failed { error: String },
}

/// Counts for one [`TaskQueue::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    /// Already completed before the run.
    pub skipped: usize,
}

/// Ordered list of tasks sharing one project configuration.
#[derive(Debug, Default)]
pub struct TaskQueue {
    config: ProjectConfig,
    tasks: Vec<Task>,
    next_id: usize,
    seed_global: bool,
}

impl TaskQueue {
    pub fn new(config: ProjectConfig) -> Self {
        Self {
            config,
            tasks: Vec::new(),
            next_id: 0,
            seed_global: false,
        }
    }

    /// Take the global grid and ratio from the first analyzed sheet added to
    /// an empty queue, replacing the configured ones.
    pub fn with_global_seeding(mut self) -> Self {
        self.seed_global = true;
        self
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Read and analyze `paths`, appending one task per path in input order.
    ///
    /// Analysis runs on the rayon pool. Returns the positions of the new tasks.
    pub fn add_files<P: AsRef<Path> + Sync>(&mut self, paths: &[P]) -> std::ops::Range<usize> {
        let loaded: Vec<Task> = paths
            .par_iter()
            .map(|p| load_task(p.as_ref()))
            .collect();

        let start = self.tasks.len();
        if start == 0
            && self.seed_global
            && let Some(first) = loaded.iter().find(|t| t.status != TaskStatus::Error)
        {
            debug!(task = %first.name, grid = %first.grid, ratio = %first.ratio, "seeded global params");
            self.config.grid = GridConfig {
                rows: first.grid.rows(),
                cols: first.grid.cols(),
            };
            self.config.aspect_ratio = RatioConfig {
                width: first.ratio.width(),
                height: first.ratio.height(),
            };
        }
        for mut task in loaded {
            task.id = self.next_id;
            self.next_id += 1;
            self.tasks.push(task);
        }
        start..self.tasks.len()
    }

    pub fn move_up(&mut self, index: usize) {
        if index > 0 && index < self.tasks.len() {
            self.tasks.swap(index, index - 1);
        }
    }

    pub fn move_down(&mut self, index: usize) {
        if index + 1 < self.tasks.len() {
            self.tasks.swap(index, index + 1);
        }
    }

    /// Override the grid and ratio a task is sliced with.
    pub fn set_task_params(
        &mut self,
        index: usize,
        grid: GridSpec,
        ratio: AspectRatio,
    ) -> Result<(), TaskError> {
        let task = self.task_mut(index)?;
        task.grid = grid;
        task.ratio = ratio;
        Ok(())
    }

    pub fn rename_task(&mut self, index: usize, name: impl Into<String>) -> Result<(), TaskError> {
        self.task_mut(index)?.name = name.into();
        Ok(())
    }

    /// Positions of unfinished tasks whose parameters disagree with the
    /// project-wide grid or ratio.
    pub fn mismatched(&self) -> Vec<usize> {
        let global_grid = self.config.grid_spec();
        let global_ratio = self.config.ratio().value();
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status != TaskStatus::Completed)
            .filter(|(_, t)| {
                t.grid != global_grid
                    || (t.ratio.value() - global_ratio).abs() > RATIO_MISMATCH_THRESHOLD
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Slice every unfinished task as PNG shots.
    pub fn run(&mut self, policy: RunPolicy, events: Option<Sender<TaskEvent>>) -> RunSummary {
        self.run_with_encoder(&PngShotEncoder, policy, events)
    }

    /// Slice every unfinished task using a specific encoder (allows testing with mock).
    pub fn run_with_encoder(
        &mut self,
        encoder: &impl ShotEncoder,
        policy: RunPolicy,
        events: Option<Sender<TaskEvent>>,
    ) -> RunSummary {
        let emit = |event: TaskEvent| {
            if let Some(tx) = &events {
                // Receiver gone means nobody is listening; slicing goes on.
                tx.send(event).ok();
            }
        };

        let mut summary = RunSummary::default();
        let config = &self.config;

        for (index, task) in self.tasks.iter_mut().enumerate() {
            if task.status == TaskStatus::Completed {
                summary.skipped += 1;
                continue;
            }

            let (grid, ratio) = match policy {
                RunPolicy::Individual => (task.grid, task.ratio),
                RunPolicy::Global => (config.grid_spec(), config.ratio()),
            };
            let naming = ShotNaming {
                image_name: task.name.clone(),
                task_id: task.short_id.clone(),
                project_id: config.project_id.clone(),
                scene_id: config.scene_id.clone(),
            };

            task.status = TaskStatus::Processing;
            task.progress = START_PROGRESS;
            task.error = None;
            emit(TaskEvent::TaskStarted {
                index,
                name: task.name.clone(),
                grid,
                ratio,
            });
            emit(TaskEvent::Progress {
                index,
                progress: START_PROGRESS,
            });

            let image = match &task.bytes {
                Some(bytes) => RasterImage::decode(bytes),
                None => RasterImage::open(&task.source),
            };
            let progress = &mut task.progress;
            let sliced = image.and_then(|image| {
                imaging::slice_image(&image, grid, ratio, &naming, encoder, |p| {
                    *progress = START_PROGRESS + p * 0.9;
                    emit(TaskEvent::Progress {
                        index,
                        progress: *progress,
                    });
                })
            });

            let outcome = match sliced {
                Ok(results) => {
                    debug!(task = %task.name, shots = results.len(), "task completed");
                    task.status = TaskStatus::Completed;
                    task.progress = 100.0;
                    task.grid = grid;
                    task.ratio = ratio;
                    task.bytes = None;
                    task.results = results
                        .into_iter()
                        .map(|result| Shot {
                            result,
                            selected: true,
                        })
                        .collect();
                    summary.completed += 1;
                    TaskOutcome::Completed {
                        shots: task.results.len(),
                    }
                }
                Err(e) => {
                    warn!(task = %task.name, error = %e, "task failed");
                    task.status = TaskStatus::Error;
                    task.error = Some(e.to_string());
                    summary.failed += 1;
                    TaskOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            emit(TaskEvent::TaskFinished {
                index,
                name: task.name.clone(),
                outcome,
            });
        }

        summary
    }

    /// If every shot is selected, deselect everything; otherwise select everything.
    pub fn select_all(&mut self) {
        let all_selected = self
            .tasks
            .iter()
            .flat_map(|t| &t.results)
            .all(|s| s.selected);
        for shot in self.tasks.iter_mut().flat_map(|t| &mut t.results) {
            shot.selected = !all_selected;
        }
    }

    /// If any shot of the task is selected, deselect them all; otherwise select them all.
    pub fn toggle_task(&mut self, index: usize) -> Result<(), TaskError> {
        let task = self.task_mut(index)?;
        let any_selected = task.results.iter().any(|s| s.selected);
        for shot in &mut task.results {
            shot.selected = !any_selected;
        }
        Ok(())
    }

    /// Flip the selection of shot `shot` (0-based) of task `index`.
    pub fn toggle_shot(&mut self, index: usize, shot: usize) -> Result<(), TaskError> {
        let task = self.task_mut(index)?;
        let target = task
            .results
            .get_mut(shot)
            .ok_or(TaskError::NoSuchShot { task: index, shot })?;
        target.selected = !target.selected;
        Ok(())
    }

    /// Select exactly the shots whose 1-based shot number is in `numbers`.
    pub fn select_shot_numbers(&mut self, numbers: &[usize]) {
        for shot in self.tasks.iter_mut().flat_map(|t| &mut t.results) {
            shot.selected = numbers.contains(&shot.result.shot_number());
        }
    }

    pub fn selected_count(&self) -> usize {
        self.tasks.iter().map(|t| t.selected_shots().count()).sum()
    }

    fn task_mut(&mut self, index: usize) -> Result<&mut Task, TaskError> {
        self.tasks.get_mut(index).ok_or(TaskError::NoSuchTask(index))
    }
}

/// Read and analyze one file. Failures yield a task in the `Error` state.
fn load_task(path: &Path) -> Task {
    let mut task = Task {
        id: 0,
        short_id: short_id(path.as_os_str().as_encoded_bytes()),
        source: path.to_path_buf(),
        name: task_name_from_path(path),
        status: TaskStatus::Pending,
        progress: 0.0,
        grid: GridSpec::default(),
        ratio: AspectRatio::default(),
        results: Vec::new(),
        error: None,
        bytes: None,
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read source");
            task.status = TaskStatus::Error;
            task.error = Some(ImagingError::Io(e).to_string());
            return task;
        }
    };
    task.short_id = short_id(&bytes);

    match RasterImage::decode(&bytes) {
        Ok(image) => {
            let analysis = imaging::analyze(&image);
            debug!(
                path = %path.display(),
                grid = %analysis.grid,
                ratio = %analysis.ratio,
                "analyzed"
            );
            task.grid = analysis.grid;
            task.ratio = analysis.ratio;
            task.bytes = Some(bytes);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot decode source");
            task.status = TaskStatus::Error;
            task.error = Some(e.to_string());
        }
    }
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockEncoder;
    use crate::test_helpers::{colored_cells, flat_image, grid_sheet, write_png};
    use std::sync::mpsc;
    use tempfile::TempDir;

    /// Queue with the given sheets written as PNG files, in order.
    fn queue_with(tmp: &TempDir, sheets: &[(&str, image::RgbaImage)]) -> TaskQueue {
        let paths: Vec<PathBuf> = sheets
            .iter()
            .map(|(name, img)| {
                let path = tmp.path().join(name);
                write_png(&path, img);
                path
            })
            .collect();
        let mut queue = TaskQueue::new(ProjectConfig::default());
        queue.add_files(&paths);
        queue
    }

    fn names(queue: &TaskQueue) -> Vec<&str> {
        queue.tasks().iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn add_files_analyzes_in_input_order() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_with(
            &tmp,
            &[
                ("a.png", grid_sheet(1920, 1080, 3, 3)),
                ("b.png", grid_sheet(800, 600, 2, 2)),
                ("c.png", flat_image(900, 900, [9, 9, 9])),
            ],
        );

        assert_eq!(names(&queue), vec!["a", "b", "c"]);
        let ids: Vec<usize> = queue.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);

        let a = &queue.tasks()[0];
        assert_eq!(a.status, TaskStatus::Pending);
        assert_eq!(a.grid, GridSpec::new(3, 3));
        assert_eq!(a.ratio, AspectRatio::new(16, 9));
        assert_eq!(a.short_id.len(), 4);

        let b = &queue.tasks()[1];
        assert_eq!(b.grid, GridSpec::new(2, 2));
        // 400x300 cells
        assert_eq!(b.ratio, AspectRatio::new(4, 3));

        assert_eq!(queue.tasks()[2].grid, GridSpec::new(3, 3));
    }

    #[test]
    fn unreadable_and_undecodable_files_become_error_tasks() {
        let tmp = TempDir::new().unwrap();
        let garbage = tmp.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        let missing = tmp.path().join("missing.png");

        let mut queue = TaskQueue::new(ProjectConfig::default());
        let added = queue.add_files(&[garbage, missing]);

        assert_eq!(added, 0..2);
        for task in queue.tasks() {
            assert_eq!(task.status, TaskStatus::Error);
            assert!(task.error.is_some());
        }
        assert!(queue.tasks()[0].error.as_deref().unwrap().contains("decode"));
    }

    #[test]
    fn reordering_swaps_neighbours_and_ignores_ends() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(
            &tmp,
            &[
                ("a.png", flat_image(30, 30, [1, 1, 1])),
                ("b.png", flat_image(30, 30, [2, 2, 2])),
                ("c.png", flat_image(30, 30, [3, 3, 3])),
            ],
        );

        queue.move_up(0);
        queue.move_down(2);
        assert_eq!(names(&queue), vec!["a", "b", "c"]);

        queue.move_up(2);
        assert_eq!(names(&queue), vec!["a", "c", "b"]);
        queue.move_down(0);
        assert_eq!(names(&queue), vec!["c", "a", "b"]);
        // ids follow the tasks
        assert_eq!(queue.tasks()[0].id, 2);
    }

    #[test]
    fn mismatched_compares_grid_and_ratio_against_global() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(
            &tmp,
            &[
                ("a.png", flat_image(30, 30, [1, 1, 1])),
                ("b.png", flat_image(30, 30, [2, 2, 2])),
                ("c.png", flat_image(30, 30, [3, 3, 3])),
                ("d.png", flat_image(30, 30, [4, 4, 4])),
            ],
        );
        // Global: 3x3, 16:9 (1.777)
        queue.set_task_params(0, GridSpec::new(3, 3), AspectRatio::new(16, 9)).unwrap();
        queue.set_task_params(1, GridSpec::new(2, 3), AspectRatio::new(16, 9)).unwrap();
        queue.set_task_params(2, GridSpec::new(3, 3), AspectRatio::new(4, 3)).unwrap();
        // 1.75 is within 0.05 of 1.777
        queue.set_task_params(3, GridSpec::new(3, 3), AspectRatio::new(7, 4)).unwrap();

        assert_eq!(queue.mismatched(), vec![1, 2]);
    }

    #[test]
    fn completed_tasks_are_not_mismatched() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("a.png", colored_cells(200, 100, 1, 2))]);
        queue.set_task_params(0, GridSpec::new(1, 2), AspectRatio::new(1, 1)).unwrap();
        assert_eq!(queue.mismatched(), vec![0]);

        queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Individual, None);
        assert!(queue.mismatched().is_empty());
    }

    #[test]
    fn set_params_out_of_range_is_error() {
        let mut queue = TaskQueue::new(ProjectConfig::default());
        assert!(matches!(
            queue.set_task_params(0, GridSpec::default(), AspectRatio::default()),
            Err(TaskError::NoSuchTask(0))
        ));
    }

    #[test]
    fn run_individual_uses_task_params() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("sheet.png", colored_cells(400, 200, 1, 2))]);
        queue.set_task_params(0, GridSpec::new(1, 2), AspectRatio::new(1, 1)).unwrap();

        let summary = queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Individual, None);

        assert_eq!(summary, RunSummary { completed: 1, failed: 0, skipped: 0 });
        let task = &queue.tasks()[0];
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100.0);
        assert_eq!(task.results.len(), 2);
        assert!(task.results.iter().all(|s| s.selected));
        assert_eq!((task.results[0].result.width, task.results[0].result.height), (200, 200));
        assert_eq!(
            task.results[1].result.name,
            format!("Shot002_sheet_SC01__PRJ_002_{}.png", task.short_id)
        );
    }

    #[test]
    fn run_global_uses_project_config() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("sheet.png", colored_cells(400, 200, 1, 2))]);
        queue.set_task_params(0, GridSpec::new(1, 2), AspectRatio::new(1, 1)).unwrap();

        queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Global, None);

        // Default global grid is 3x3
        let task = &queue.tasks()[0];
        assert_eq!(task.results.len(), 9);
        assert_eq!(task.grid, GridSpec::new(3, 3));
        assert_eq!(task.ratio, AspectRatio::new(16, 9));
    }

    #[test]
    fn run_emits_events_with_scaled_progress() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("sheet.png", colored_cells(400, 200, 1, 2))]);
        queue.set_task_params(0, GridSpec::new(1, 2), AspectRatio::new(1, 1)).unwrap();

        let (tx, rx) = mpsc::channel();
        queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Individual, Some(tx));
        let events: Vec<TaskEvent> = rx.iter().collect();

        assert!(matches!(&events[0], TaskEvent::TaskStarted { index: 0, name, .. } if name == "sheet"));
        let progress: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                TaskEvent::Progress { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![10.0, 55.0, 100.0]);
        assert_eq!(
            events.last(),
            Some(&TaskEvent::TaskFinished {
                index: 0,
                name: "sheet".into(),
                outcome: TaskOutcome::Completed { shots: 2 },
            })
        );
    }

    #[test]
    fn failed_task_does_not_stop_the_queue() {
        let tmp = TempDir::new().unwrap();
        let garbage = tmp.path().join("bad.png");
        std::fs::write(&garbage, b"nope").unwrap();
        let good = tmp.path().join("good.png");
        write_png(&good, &colored_cells(300, 300, 3, 3));

        let mut queue = TaskQueue::new(ProjectConfig::default());
        queue.add_files(&[garbage, good]);
        let summary = queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Individual, None);

        assert_eq!(summary, RunSummary { completed: 1, failed: 1, skipped: 0 });
        assert_eq!(queue.tasks()[0].status, TaskStatus::Error);
        assert!(queue.tasks()[0].results.is_empty());
        assert_eq!(queue.tasks()[1].status, TaskStatus::Completed);
    }

    #[test]
    fn encode_failures_still_complete_the_task() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("sheet.png", colored_cells(300, 300, 3, 3))]);
        queue.set_task_params(0, GridSpec::new(3, 3), AspectRatio::new(1, 1)).unwrap();

        queue.run_with_encoder(&MockEncoder::failing_on(&[0, 8]), RunPolicy::Individual, None);

        let task = &queue.tasks()[0];
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.results.len(), 7);
    }

    #[test]
    fn completed_tasks_release_source_bytes() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("a.png", colored_cells(300, 300, 3, 3))]);
        let garbage = tmp.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        queue.add_files(&[garbage]);
        assert!(queue.tasks()[0].bytes.is_some());

        queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Individual, None);

        assert_eq!(queue.tasks()[0].status, TaskStatus::Completed);
        assert!(queue.tasks()[0].bytes.is_none());
        assert_eq!(queue.tasks()[1].status, TaskStatus::Error);
    }

    #[test]
    fn global_seeding_takes_first_analyzed_sheet() {
        let tmp = TempDir::new().unwrap();
        let garbage = tmp.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        let sheet = tmp.path().join("sheet.png");
        write_png(&sheet, &grid_sheet(800, 600, 2, 2));

        let mut queue = TaskQueue::new(ProjectConfig::default()).with_global_seeding();
        queue.add_files(&[garbage, sheet]);

        assert_eq!(queue.config().grid_spec(), GridSpec::new(2, 2));
        assert_eq!(queue.config().ratio(), AspectRatio::new(4, 3));
        assert!(queue.mismatched().iter().all(|&i| i == 0));

        let summary = queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Global, None);
        assert_eq!(summary.completed, 1);
        assert_eq!(queue.tasks()[1].results.len(), 4);
    }

    #[test]
    fn global_seeding_only_applies_to_an_empty_queue() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first.png");
        write_png(&first, &flat_image(30, 30, [1, 1, 1]));
        let second = tmp.path().join("second.png");
        write_png(&second, &grid_sheet(800, 600, 2, 2));

        let mut queue = TaskQueue::new(ProjectConfig::default()).with_global_seeding();
        queue.add_files(&[first]);
        queue.add_files(&[second]);

        // Flat square sheet falls back to 3x3 at 1:1
        assert_eq!(queue.config().grid_spec(), GridSpec::new(3, 3));
        assert_eq!(queue.config().ratio(), AspectRatio::new(1, 1));
    }

    #[test]
    fn without_seeding_global_params_stay_configured() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_with(&tmp, &[("sheet.png", grid_sheet(800, 600, 2, 2))]);

        assert_eq!(queue.config(), &ProjectConfig::default());
        assert_eq!(queue.mismatched(), vec![0]);
    }

    #[test]
    fn second_run_skips_completed_tasks() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("a.png", colored_cells(300, 300, 3, 3))]);
        let encoder = MockEncoder::new();

        queue.run_with_encoder(&encoder, RunPolicy::Individual, None);
        let summary = queue.run_with_encoder(&encoder, RunPolicy::Individual, None);

        assert_eq!(summary, RunSummary { completed: 0, failed: 0, skipped: 1 });
        assert_eq!(encoder.get_calls().len(), 9);
    }

    #[test]
    fn selection_toggles() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(
            &tmp,
            &[
                ("a.png", colored_cells(300, 300, 3, 3)),
                ("b.png", colored_cells(300, 300, 3, 3)),
            ],
        );
        queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Individual, None);
        assert_eq!(queue.selected_count(), 18);

        // Everything selected: select_all clears
        queue.select_all();
        assert_eq!(queue.selected_count(), 0);
        // Nothing selected: select_all selects everything
        queue.select_all();
        assert_eq!(queue.selected_count(), 18);

        queue.toggle_shot(1, 4).unwrap();
        assert_eq!(queue.selected_count(), 17);
        // Partially selected: select_all selects everything again
        queue.select_all();
        assert_eq!(queue.selected_count(), 18);

        queue.toggle_task(0).unwrap();
        assert_eq!(queue.selected_count(), 9);
        queue.toggle_task(0).unwrap();
        assert_eq!(queue.selected_count(), 18);

        assert!(matches!(
            queue.toggle_shot(0, 99),
            Err(TaskError::NoSuchShot { task: 0, shot: 99 })
        ));
    }

    #[test]
    fn toggle_task_deselects_partly_selected_task() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("a.png", colored_cells(300, 300, 3, 3))]);
        queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Individual, None);

        queue.toggle_shot(0, 0).unwrap();
        assert_eq!(queue.selected_count(), 8);
        queue.toggle_task(0).unwrap();
        assert_eq!(queue.selected_count(), 0);
        queue.toggle_task(0).unwrap();
        assert_eq!(queue.selected_count(), 9);
    }

    #[test]
    fn select_shot_numbers_is_one_based() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("a.png", colored_cells(300, 300, 3, 3))]);
        queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Individual, None);

        queue.select_shot_numbers(&[1, 5, 9]);

        let selected: Vec<usize> = queue.tasks()[0]
            .selected_shots()
            .map(|s| s.result.index)
            .collect();
        assert_eq!(selected, vec![0, 4, 8]);
    }

    #[test]
    fn rename_changes_shot_names_on_next_run() {
        let tmp = TempDir::new().unwrap();
        let mut queue = queue_with(&tmp, &[("a.png", colored_cells(300, 300, 3, 3))]);
        queue.rename_task(0, "hero").unwrap();
        queue.run_with_encoder(&MockEncoder::new(), RunPolicy::Individual, None);

        assert!(queue.tasks()[0].results[0].result.name.starts_with("Shot001_hero_"));
    }
}
