//! Bindery CLI.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "bindery",
    version,
    about = "Task-independent blueprints bound into shared, memoized component graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: bindery::cli::Commands,
}

fn main() {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(bindery::cli::log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = bindery::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
