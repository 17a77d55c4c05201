use std::path::Path;

use snapnote_core::db::{CategoryRemoval, CategoryRepository, SqliteCategoryRepository};

use crate::cli::CategoryCommands;
use crate::commands::common::open_database;
use crate::error::CliError;

pub fn run_category(command: CategoryCommands, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let repo = SqliteCategoryRepository::new(db.connection());

    match command {
        CategoryCommands::List { json } => {
            let categories = repo.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                for category in categories {
                    println!("{:<24}  {}", category.id, category.label);
                }
            }
        }
        CategoryCommands::Add { label } => {
            let category = repo.create(&label)?;
            println!("{}", category.id);
        }
        CategoryCommands::Rename { id, label } => {
            let category = repo.rename(id.trim(), &label)?;
            println!("Renamed {} to {}", category.id, category.label);
        }
        CategoryCommands::Delete { id, force } => {
            let id = id.trim();
            match repo.delete(id, force)? {
                CategoryRemoval::Blocked { usage } => {
                    return Err(CliError::CategoryInUse {
                        id: id.to_string(),
                        usage,
                    });
                }
                CategoryRemoval::Removed { moved: 0 } => println!("Deleted {id}"),
                CategoryRemoval::Removed { moved } => {
                    println!("Deleted {id}; moved {moved} notes");
                }
            }
        }
    }

    Ok(())
}
