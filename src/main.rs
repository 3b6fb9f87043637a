use clap::{Parser, Subcommand};
use gridcut::imaging::{AspectRatio, GridSpec, is_supported_image};
use gridcut::task::{RunPolicy, TaskQueue};
use gridcut::{config, export, output};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "gridcut")]
#[command(about = "Slice contact sheets and storyboard grids into individual shots")]
#[command(long_about = "\
Slice contact sheets and storyboard grids into individual shots

Every input sheet is analyzed on its own: the grid (up to 3x3) is detected
from the low-contrast gutters between panels, and the panel aspect ratio is
snapped to a standard ratio (16:9, 9:16, 1:1, 4:3, 3:4, 3:2, 2:3, 21:9).
Each panel is then center-cropped to that ratio and written as a PNG.

Output layout:

  <output>/
  └── PRJ_SC01_Export_Package/
      ├── manifest.json
      └── PRJ_SC01_hero_K3ZQ/
          ├── Shot001_hero_SC01__PRJ_001_K3ZQ.png
          └── ...

Directories given as input are searched recursively for images.
Run 'gridcut gen-config' to generate a documented gridcut.toml.")]
#[command(version)]
struct Cli {
    /// Project config file (optional)
    #[arg(long, default_value = "gridcut.toml", global = true)]
    config: PathBuf,

    /// Project code used in shot filenames (overrides config)
    #[arg(long, global = true)]
    project: Option<String>,

    /// Scene code used in shot filenames (overrides config)
    #[arg(long, global = true)]
    scene: Option<String>,

    /// Log debug details (detection scores, crop geometry) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the detected grid and ratio of each sheet
    Detect {
        /// Image files or directories
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Slice sheets into shots and export them
    Slice(SliceArgs),
    /// Print a stock gridcut.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct SliceArgs {
    /// Image files or directories
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Rows for every sheet (overrides detection)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=9))]
    rows: Option<u32>,

    /// Columns for every sheet (overrides detection)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=9))]
    cols: Option<u32>,

    /// Export ratio for every sheet, e.g. 16:9 (overrides detection)
    #[arg(long)]
    ratio: Option<AspectRatio>,

    /// Slice every sheet with the global grid and ratio (from the config,
    /// or the first sheet when neither the config nor --rows/--cols/--ratio set them)
    #[arg(long)]
    apply_global: bool,

    /// Export only these 1-based shot numbers, e.g. 1,5,9
    #[arg(long, value_delimiter = ',')]
    shots: Vec<usize>,

    /// Output directory
    #[arg(long, short)]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Detect { ref files } => {
            let project = load_project_config(&cli)?;
            init_thread_pool(&project.processing);
            let mut queue = TaskQueue::new(project);
            queue.add_files(&expand_inputs(files));
            output::print_analysis(queue.tasks());
        }
        Command::Slice(ref args) => {
            let project = load_project_config(&cli)?;
            init_thread_pool(&project.processing);
            let overridden = args.rows.is_some() || args.cols.is_some() || args.ratio.is_some();
            let mut queue = TaskQueue::new(project);
            if !overridden && !config::sets_global_params(&cli.config)? {
                queue = queue.with_global_seeding();
            }
            let added = queue.add_files(&expand_inputs(&args.files));

            if overridden {
                for i in added {
                    let task = &queue.tasks()[i];
                    let grid = GridSpec::new(
                        args.rows.unwrap_or(task.grid.rows()),
                        args.cols.unwrap_or(task.grid.cols()),
                    );
                    let ratio = args.ratio.unwrap_or(task.ratio);
                    queue.set_task_params(i, grid, ratio)?;
                }
            }
            output::print_analysis(queue.tasks());

            let policy = if args.apply_global {
                RunPolicy::Global
            } else {
                let global = (queue.config().grid_spec(), queue.config().ratio());
                output::print_mismatch(queue.tasks(), &queue.mismatched(), global);
                RunPolicy::Individual
            };

            println!("==> Slicing {} sheets", queue.len());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_task_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let summary = queue.run(policy, Some(tx));
            printer.join().map_err(|_| "output thread panicked")?;
            output::print_run_summary(&summary);

            if !args.shots.is_empty() {
                queue.select_shot_numbers(&args.shots);
            }
            println!("==> Exporting to {}", args.output.display());
            let report = export::export_selected(&queue, &args.output)?;
            output::print_export(report.as_ref());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `--config` and apply the `--project` / `--scene` overrides.
fn load_project_config(cli: &Cli) -> Result<config::ProjectConfig, config::ConfigError> {
    let mut project = config::load_config(&cli.config)?;
    if let Some(id) = &cli.project {
        project.project_id = id.clone();
    }
    if let Some(id) = &cli.scene {
        project.scene_id = id.clone();
    }
    project.validate()?;
    Ok(project)
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` wins; otherwise `warn`, or `debug` for the crate with `--verbose`.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default = if verbose { "warn,gridcut=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. User can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Expand directories into the supported images they contain (sorted by
/// path). Files named explicitly are kept as given.
fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(images_in(input));
        } else {
            files.push(input.clone());
        }
    }
    files
}

fn images_in(dir: &Path) -> impl Iterator<Item = PathBuf> + use<> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_supported_image(entry.path()))
        .map(|entry| entry.into_path())
}
