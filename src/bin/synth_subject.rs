use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use epochset::{LocalSource, RecordingSource, SyntheticSource};

#[derive(Parser)]
#[command(name = "synth_subject", about = "Write synthetic motor-imagery recordings for one subject")]
struct Args {
    /// Root directory; recordings land in <root>/subject_NN/
    #[arg(long)]
    root: PathBuf,

    #[arg(long, default_value_t = 2)]
    subject: u32,

    /// Number of runs (one file each)
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Trials per class and run
    #[arg(long, default_value_t = 12)]
    repetitions: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let synth = SyntheticSource {
        n_runs: args.runs,
        n_repetitions: args.repetitions,
        seed: args.seed,
        ..SyntheticSource::default()
    };
    let recordings = synth.load_subject(args.subject, false)?;
    let paths = LocalSource::new(&args.root).write_subject(args.subject, &recordings)?;
    for (p, raw) in paths.iter().zip(&recordings) {
        println!("{} ch × {} samples, {} events → {}",
            raw.n_channels(), raw.n_times(), raw.events.len(), p.display());
    }
    Ok(())
}
