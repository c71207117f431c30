use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sr1_excess::data::synthetic;

#[derive(Debug, Parser)]
#[command(author, version, about = "Write a synthetic fig_4.dat / b0.txt pair")]
struct Cli {
    /// Directory for the two tables
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    let (spectrum, background) = synthetic::generate(cli.seed);
    let data_path = cli.out_dir.join("fig_4.dat");
    let background_path = cli.out_dir.join("b0.txt");
    synthetic::write_spectrum(&data_path, &spectrum)?;
    synthetic::write_background(&background_path, &background)?;

    println!(
        "Wrote {} spectrum rows to {} and {} background points to {}",
        spectrum.len(),
        data_path.display(),
        background.len(),
        background_path.display()
    );
    Ok(())
}
