use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use epochset::{io::write_windows, DatasetConfig, LocalSource, RecordingSource, SyntheticSource};

#[derive(Parser)]
#[command(name = "dataset_demo", about = "Build a windowed EEG dataset and print its first item")]
struct Args {
    /// TOML dataset configuration (default: built-in motor-imagery pipeline)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding subject_NN/*.safetensors (default: synthetic data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// JSON file receiving the data path when update_path is enabled
    #[arg(long)]
    path_config: Option<PathBuf>,

    /// Override the subject from the configuration
    #[arg(long)]
    subject: Option<u32>,

    /// Precompute window transforms instead of applying them on access
    #[arg(long)]
    offline: bool,

    /// Write every (transformed) window to this safetensors file
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(p) => DatasetConfig::from_file(p)?,
        None => DatasetConfig::default(),
    };
    if let Some(s) = args.subject {
        cfg.subject = s;
    }
    if args.offline {
        cfg.transform_online = false;
    }

    let source: Box<dyn RecordingSource> = match &args.data_dir {
        Some(dir) => {
            let mut local = LocalSource::new(dir);
            if let Some(p) = &args.path_config {
                local = local.with_config_file(p);
            }
            Box::new(local)
        }
        None => Box::new(SyntheticSource::default()),
    };
    info!("source {}, subject {}", source.code(), cfg.subject);

    let dataset = cfg.builder()?.build(source.as_ref())?;
    println!("{} windows for subject {}", dataset.len(), dataset.subject());

    if !dataset.is_empty() {
        let (x, y) = dataset.get(0)?;
        println!("dataset[0]: {} ch × {} samples, label {y:?}", x.nrows(), x.ncols());
    }

    if let Some(out) = &args.output {
        write_windows(&dataset, out)?;
        println!("Written → {}", out.display());
    }
    Ok(())
}
