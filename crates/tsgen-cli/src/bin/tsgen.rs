//! tsgen: TypeScript declaration planner for CLR assembly metadata.

use clap::Parser;

use tsgen_cli::{CliArgs, loader, render, run_pipeline, writer};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tsgen=info,warn".to_string()),
        )
        .init();

    let args = CliArgs::parse();
    let graph = loader::load_graph(&args.input)?;
    let options = args.to_options();

    let outcome = run_pipeline(graph, &options).map_err(anyhow::Error::new)?;

    if !args.quiet {
        for diagnostic in outcome.sink.iter() {
            println!("{}", render::render_diagnostic(diagnostic));
        }
    }
    println!("{}", render::render_summary(&outcome.sink));

    if let Some(out_dir) = &args.out {
        let written = writer::write_outputs(out_dir, &outcome)?;
        for path in &written {
            println!("wrote {}", path.display());
        }
    }

    if !outcome.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
