use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use thumbwatch::{Config, DisposalPolicy, Pipeline, WatchService};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "thumbwatch", version)]
#[command(about = "Convert dropped images into rounded PNG thumbnails")]
struct Cli {
    /// JSON config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Drop folder to watch.
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Folder receiving `<stem>.png` thumbnails.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Thumbnail width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Thumbnail height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Corner radius in pixels.
    #[arg(long)]
    radius: Option<f64>,

    /// Draw a border along the rounded edge.
    #[arg(long)]
    border: bool,

    /// Border width in pixels.
    #[arg(long)]
    border_width: Option<f64>,

    /// Border colour as #RRGGBB or #RRGGBBAA.
    #[arg(long, value_parser = parse_color)]
    border_color: Option<[u8; 4]>,

    /// Move originals into the backup folder instead of deleting them.
    #[arg(long)]
    move_to_backup: bool,

    /// Backup folder for originals.
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Comma-separated extension allow-list (e.g. `jpg,png`).
    #[arg(long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Quiet period before a changed file is converted, in milliseconds.
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Maximum number of conversions running at once.
    #[arg(long)]
    jobs: Option<usize>,

    /// Convert what is already in the input folder and exit.
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;

    let config = build_config(&cli)?;
    config.ensure_directories()?;
    log_banner(&config);
    let config = Arc::new(config);

    if cli.once {
        let outcomes = Pipeline::new(config).convert_existing()?;
        let skipped = outcomes.iter().filter(|o| !o.is_converted()).count();
        if skipped > 0 {
            anyhow::bail!("{skipped} file(s) skipped");
        }
        return Ok(());
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start tokio runtime")?;
    rt.block_on(WatchService::new(config).run(shutdown_signal()))?;
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    if let Some(v) = &cli.input_dir {
        cfg.input_dir = v.clone();
    }
    if let Some(v) = &cli.output_dir {
        cfg.output_dir = v.clone();
    }
    if let Some(v) = cli.width {
        cfg.target.width = v;
    }
    if let Some(v) = cli.height {
        cfg.target.height = v;
    }
    if let Some(v) = cli.radius {
        cfg.corner_radius = v;
    }
    cfg.add_border |= cli.border;
    if let Some(v) = cli.border_width {
        cfg.border_width = v;
    }
    if let Some(v) = cli.border_color {
        cfg.border_color = v;
    }
    cfg.move_to_backup |= cli.move_to_backup;
    if let Some(v) = &cli.backup_dir {
        cfg.backup_dir = v.clone();
    }
    if let Some(v) = &cli.extensions {
        cfg.valid_extensions = v.clone();
    }
    if let Some(v) = cli.debounce_ms {
        cfg.debounce_ms = v;
    }
    if let Some(v) = cli.jobs {
        cfg.max_concurrent_jobs = v;
    }

    Ok(cfg.validate()?)
}

fn init_logging(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn log_banner(cfg: &Config) {
    tracing::info!(
        input = %cfg.input_dir.display(),
        output = %cfg.output_dir.display(),
        width = cfg.target.width,
        height = cfg.target.height,
        "thumbwatch starting"
    );
    match cfg.disposal_policy() {
        DisposalPolicy::Delete => tracing::info!("originals will be deleted after conversion"),
        DisposalPolicy::Archive { backup_dir } => {
            tracing::info!(backup = %backup_dir.display(), "originals will be moved to backup");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for ctrl-c; stop the process another way");
        std::future::pending::<()>().await;
    }
}

fn parse_color(s: &str) -> Result<[u8; 4], String> {
    thumbwatch::parse_rgba_hex(s).map_err(|e| e.to_string())
}
