mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Brokers => cli::brokers::list(),
        Commands::Taxonomy => cli::taxonomy::list(),
        Commands::Classify { code } => cli::taxonomy::classify(code),
        Commands::Inspect { file, broker, json } => cli::inspect::run(&file, broker.as_deref(), json),
        Commands::Export {
            file,
            broker,
            output,
            format,
        } => cli::export::run(&file, broker.as_deref(), output, format),
        Commands::Config {
            total_label,
            output_dir,
        } => cli::config::run(total_label, output_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
