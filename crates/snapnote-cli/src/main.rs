//! Snapnote CLI - capture notes and export them from the command line

mod cli;
mod commands;
mod config;
mod error;


use std::env;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::add::{run_add, AddOptions};
use crate::commands::category::run_category;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::export::run_export;
use crate::commands::import::run_import;
use crate::commands::list::run_list;
use crate::commands::search::run_search;
use crate::commands::show::run_show;
use crate::config::{resolve_db_path, CliConfig, DB_PATH_ENV};
use crate::error::CliError;

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "snapnote=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Completions and config never touch the database
    let command = match cli.command {
        Some(Commands::Completions { shell, output }) => {
            return run_completions(shell, output.as_deref());
        }
        Some(Commands::Config { command }) => return run_config(command),
        command => command,
    };

    let config = CliConfig::load()?;
    let db_path = resolve_db_path(
        cli.db_path,
        env::var_os(DB_PATH_ENV).map(PathBuf::from),
        &config,
    )?;

    match command {
        Some(Commands::Add {
            body,
            title,
            category,
            images,
        }) => run_add(
            &AddOptions {
                body: &body,
                title: title.as_deref(),
                category: category.as_deref(),
                images: &images,
            },
            &config,
            &db_path,
        )?,
        Some(Commands::List {
            limit,
            category,
            json,
        }) => run_list(limit, category.as_deref(), json, &db_path)?,
        Some(Commands::Search { query, limit, json }) => {
            run_search(&query, limit, json, &db_path)?;
        }
        Some(Commands::Show { id }) => run_show(&id, &db_path)?,
        Some(Commands::Delete { id }) => run_delete(&id, &db_path)?,
        Some(Commands::Category { command }) => run_category(command, &db_path)?,
        Some(Commands::Export {
            format,
            ids,
            output,
        }) => {
            run_export(format.into(), &ids, output.as_deref(), &config, &db_path)?;
        }
        Some(Commands::Import { path, replace }) => {
            run_import(&path, replace, &db_path)?;
        }
        Some(Commands::Completions { .. } | Commands::Config { .. }) => {}
        None => {
            // Quick capture mode: snapnote "my thought"
            if cli.note.is_empty() {
                Cli::command().print_help()?;
                println!();
            } else {
                run_add(
                    &AddOptions {
                        body: &cli.note,
                        title: None,
                        category: None,
                        images: &[],
                    },
                    &config,
                    &db_path,
                )?;
            }
        }
    }

    Ok(())
}
