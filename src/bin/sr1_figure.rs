use clap::Parser;
use sr1_excess::cli::RunArgs;
use sr1_excess::pipeline::{self, Variant};

#[derive(Debug, Parser)]
#[command(author, version, about = "SR1 spectrum/residual figure without the significance")]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let summary = pipeline::run(&cli.run.to_config(), Variant::FigureOnly)?;
    println!("Figure: {}", summary.figure_path.display());

    if let Some(path) = &cli.run.summary {
        pipeline::write_summary(path, &summary)?;
        println!("Summary: {}", path.display());
    }

    Ok(())
}
