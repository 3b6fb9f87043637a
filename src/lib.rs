//! # gridcut
//!
//! Cuts contact sheets and storyboard grids into individual, uniformly sized
//! shots. A sheet is analyzed to find its grid and the aspect ratio of its
//! cells, then every cell is cropped to that ratio and exported as a PNG with
//! a production-style filename.
//!
//! # Architecture: Analyze → Queue → Export
//!
//! ```text
//! 1. Analyze   sheet bytes  →  grid + ratio        (edge energy on a 300px scan copy)
//! 2. Slice     task queue   →  shots in memory     (centered fit-crop per cell, PNG)
//! 3. Export    selection    →  out/…_Export_Package/
//! ```
//!
//! Analysis is cheap and runs for every added file in parallel. Slicing is
//! sequential: tasks run one after another and cells within a task are
//! rendered in row-major order, so progress is monotonic and shot numbers
//! are stable.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Engine: decoding, grid detection, ratio resolution, slicing |
//! | [`task`] | Task queue: per-file parameters, run policy, progress events, selection |
//! | [`export`] | Writes selected shots plus `manifest.json` into a package directory |
//! | [`naming`] | Shot filenames, task short IDs, export folder names |
//! | [`config`] | `gridcut.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Headless Pure-Rust Imaging
//!
//! All pixel work happens on owned RGBA buffers through the `image` crate.
//! There is no canvas, window system or GPU involved, so the engine runs the
//! same in a CLI, a test, or a server.
//!
//! ## Content-Derived Short IDs
//!
//! Every shot filename carries a four-character task ID. It is derived from
//! the SHA-256 of the source file, so slicing the same sheet twice produces
//! identical filenames.
//!
//! ## Soft Encode Failures
//!
//! A cell that fails to encode is dropped with a warning; the rest of the
//! sheet is still exported. Failing to decode the sheet fails only that task.

pub mod config;
pub mod export;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod task;

#[cfg(test)]
pub(crate) mod test_helpers;
