use anyhow::Context;
use clap::Parser;
use sheet_inspect::services::excel::utils::expand_home;
use sheet_inspect::services::excel::ExcelWorkbook;
use sheet_inspect::{logging, render, AppError, Config, Inspector};

mod cli;

use crate::cli::{Cli, OutputFormatArg};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = logging::init_logging(cli.verbosity.tracing_level_filter()) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let exit_code = match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let mut config = Config::from_env();
    if let Some(raw) = cli.memory.as_deref() {
        if config.apply_memory_limit(raw) {
            tracing::info!("Memory limit set to {} MB", config.memory_limit_mb);
        }
    }

    let path = expand_home(&cli.file);
    if !path.is_file() {
        return Err(AppError::FileNotFound(path.display().to_string()).into());
    }
    tracing::info!("Inspecting {}", path.display());

    let mut workbook = ExcelWorkbook::open(&path, &config)
        .with_context(|| format!("Failed to inspect {}", path.display()))?;
    let options = cli.inspect_options(cli.extract_images.as_deref().map(expand_home));
    let file = workbook.path().display().to_string();
    let report = Inspector::new(&config).run(&mut workbook, &file, &options)?;

    match cli.format {
        OutputFormatArg::Markdown => Ok(render::markdown(&report, config.display_truncate)),
        OutputFormatArg::Json => Ok(render::json(&report)?),
    }
}
