use clap::Parser;
use gtdb_itol_decorate::{cli, commands};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    let result = match args.command {
        cli::Commands::Decorate {
            tree,
            taxonomy,
            out_dir,
            common,
        } => commands::decorate::run(&tree, &taxonomy, &out_dir, &common),
        cli::Commands::Summarize {
            tree,
            taxonomy,
            output_file,
            common,
        } => commands::summarize::run(&tree, &taxonomy, output_file.as_deref(), &common),
        cli::Commands::InitConfig { force } => commands::init_config::run(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
