mod aggregate;
mod cli;
mod dataset;
mod error;
mod filter;
mod fmt;
mod logging;
mod models;
mod pages;
mod session;
mod settings;
mod stats;
mod tui;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(&settings::load_settings().log_level);

    let result = match cli.command {
        None => cli::dashboard::run(cli.file),
        Some(Commands::View {
            page,
            file,
            locations,
            categories,
            years,
            rows_per_page,
            page_number,
            measure,
            format,
        }) => cli::view::run(cli::view::ViewArgs {
            page,
            file,
            locations,
            categories,
            years,
            rows_per_page,
            page_number,
            measure,
            format,
        }),
        Some(Commands::Pages) => {
            cli::pages::run();
            Ok(())
        }
        Some(Commands::Config {
            rows_per_page,
            remember_filters,
            log_level,
        }) => cli::config::run(rows_per_page, remember_filters, log_level),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "salescope", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
