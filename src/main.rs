use clap::Parser;
use sr1_excess::cli::RunArgs;
use sr1_excess::pipeline::{self, Variant};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "SR1 low-energy excess significance and spectrum/residual figure"
)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let cfg = cli.run.to_config();
    let summary = pipeline::run(&cfg, Variant::WithSignificance)?;

    if let Some(sig) = &summary.significance {
        println!(
            "Window ({}, {}) keV, exposure {} t·y",
            cfg.window.lo, cfg.window.hi, cfg.exposure
        );
        println!("Observed: {:.3}", sig.observed);
        println!("Expected: {:.3}", sig.expected);
        println!("z: {:.3}", sig.z);
    }
    println!("Figure: {}", summary.figure_path.display());

    if let Some(path) = &cli.run.summary {
        pipeline::write_summary(path, &summary)?;
        println!("Summary: {}", path.display());
    }

    Ok(())
}
