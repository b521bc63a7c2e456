use ancestry::commands::{run_config, run_walk, Cli, Commands};
use ancestry::error::{AncestryError, EXIT_FAILURE};
use ancestry::utils::logger::init_logger;
use ancestry::InspectorConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let command = cli.command();
    if command == Commands::Version {
        println!("ancestry {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    // Config is loaded before logging so that `log_level` from the file or
    // environment can seed the filter.
    let config = match InspectorConfig::load(cli.global.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return report_failure(&err),
    };

    let log_level = cli
        .global
        .log_level
        .clone()
        .or_else(|| config.log_level.clone());
    if let Err(err) = init_logger(log_level.as_deref(), cli.global.log_file.clone()) {
        eprintln!("Failed to initialize logging: {err}");
        return ExitCode::from(EXIT_FAILURE);
    }

    match main_impl(command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(category = err.category().display_name(), "{}", err);
            report_failure(&err)
        }
    }
}

fn report_failure(err: &AncestryError) -> ExitCode {
    eprintln!("{}", err.user_message());
    ExitCode::from(err.exit_code())
}

fn main_impl(command: Commands, config: &InspectorConfig) -> Result<(), AncestryError> {
    let mut stdout = std::io::stdout().lock();

    match command {
        Commands::Walk(args) => run_walk(&args, config, &mut stdout),
        Commands::Config => run_config(config, &mut stdout),
        Commands::Version => Ok(()),
    }
}
