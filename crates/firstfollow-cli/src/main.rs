use anyhow::Context as _;
use clap::Parser;
use firstfollow::{report::Report, syntax, Config, SetEngine};
use std::{fs, path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of the report file.
    #[arg(short, long, default_value = "first_follow_output.txt")]
    output: PathBuf,

    /// Do not write the report file.
    #[arg(long)]
    no_output: bool,

    /// The start symbol. Defaults to the left-hand side of the first rule.
    #[arg(long)]
    start: Option<String>,

    /// Give up the FOLLOW computation after the specified number of passes.
    #[arg(long)]
    max_passes: Option<usize>,

    /// The path of grammar definition file.
    #[arg(default_value = "grammar.txt")]
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let s = Instant::now();
    let parsed = syntax::parse_file(&args.input, args.start.as_deref())
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;
    tracing::info!("parse_file: {:?} elapsed", s.elapsed());

    for err in &parsed.errors {
        println!("[warning] {}", err);
    }

    let mut config = Config::new();
    if let Some(passes) = args.max_passes {
        config = config.max_follow_passes(passes);
    }

    let s = Instant::now();
    let grammar = &parsed.grammar;
    let analysis = SetEngine::with_config(grammar, config).analyze();
    tracing::info!("analyze: {:?} elapsed", s.elapsed());

    for diagnostic in &analysis.diagnostics {
        println!("[warning] {}", diagnostic);
    }

    let report = Report::new(grammar, &analysis).source(&args.input);
    println!("\n{}", report);

    if !args.no_output {
        fs::write(&args.output, report.sets().to_string()).with_context(|| {
            anyhow::anyhow!("failed to write the report to {}", args.output.display())
        })?;
        println!("results are written to {}", args.output.display());
    }

    Ok(())
}
