//! Command-line host for the person store.
//!
//! # Responsibility
//! - Resolve configuration, connect once, run one person operation.
//! - Print results as JSON on stdout and errors on stderr.
//!
//! # Invariants
//! - A failed connection aborts with a non-zero exit code.

use clap::{Parser, Subcommand};
use log::{error, info};
use persondb_core::db::{close_db, connect};
use persondb_core::service::person_service::sample_people;
use persondb_core::{
    flush_logging, init_logging, AppConfig, LogSettings, NewPerson, PersonService,
    SqlitePersonRepository, StoreUri,
};
use rusqlite::Connection;
use serde_json::Value;
use std::error::Error;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "persondb", version, about = "Person document store operations")]
struct Cli {
    /// Store URI; overrides PERSONDB_URI.
    #[arg(long, global = true)]
    uri: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Save the default person.
    CreateDefault,
    /// Save one person.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: Option<i64>,
        #[arg(long = "food")]
        foods: Vec<String>,
    },
    /// Save the sample people in one batch.
    Seed,
    FindByName { name: String },
    FindByFood { food: String },
    FindById { id: String },
    /// Append the fixed food to a person's favorites.
    EditThenSave { id: String },
    /// Set the fixed age on the first person with this name.
    UpdateAge { name: String },
    RemoveById { id: String },
    /// Remove everyone with the fixed name.
    RemoveMany,
    /// Filter by food, sort by name, keep two, hide age.
    QueryChain {
        #[arg(long)]
        food: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, Box<dyn Error>> {
    let config = AppConfig::from_env_with_uri(cli.uri.as_deref())?;
    if let Some(dir) = &config.log_dir {
        init_logging(&LogSettings::new(&config.log_level, dir)?)?;
    }

    let result = run_command(&config.store_uri, cli.command);
    match &result {
        Ok(_) => info!("event=cli_run module=cli status=ok"),
        Err(err) => error!("event=cli_run module=cli status=error error={err}"),
    }
    flush_logging();
    result
}

fn run_command(uri: &StoreUri, command: Command) -> Result<String, Box<dyn Error>> {
    let conn = connect(uri).inspect_err(|err| {
        error!("event=cli_connect module=cli status=error error={err}");
    })?;
    let output = execute(&conn, command)?;
    close_db(conn)?;
    Ok(serde_json::to_string_pretty(&output)?)
}

fn execute(conn: &Connection, command: Command) -> Result<Value, Box<dyn Error>> {
    let service = PersonService::new(SqlitePersonRepository::new(conn));
    let output = match command {
        Command::CreateDefault => serde_json::to_value(service.create_and_save_person()?)?,
        Command::Create { name, age, foods } => {
            let mut person = NewPerson::new(name).with_foods(foods);
            person.age = age;
            serde_json::to_value(service.create_person(&person)?)?
        }
        Command::Seed => serde_json::to_value(service.create_many_people(&sample_people())?)?,
        Command::FindByName { name } => serde_json::to_value(service.find_people_by_name(&name)?)?,
        Command::FindByFood { food } => serde_json::to_value(service.find_one_by_food(&food)?)?,
        Command::FindById { id } => serde_json::to_value(service.find_person_by_id(&id)?)?,
        Command::EditThenSave { id } => serde_json::to_value(service.find_edit_then_save(&id)?)?,
        Command::UpdateAge { name } => serde_json::to_value(service.find_and_update(&name)?)?,
        Command::RemoveById { id } => serde_json::to_value(service.remove_by_id(&id)?)?,
        Command::RemoveMany => serde_json::to_value(service.remove_many_people()?)?,
        Command::QueryChain { food } => {
            let docs = match food {
                Some(food) => service.query_chain_for(&food)?,
                None => service.query_chain()?,
            };
            serde_json::to_value(docs)?
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::{run, Cli};
    use clap::Parser;
    use serde_json::Value;

    #[test]
    fn uri_flag_runs_without_environment_uri() {
        let cli = Cli::try_parse_from(["persondb", "--uri", "sqlite::memory:", "seed"]).unwrap();
        let output: Value = serde_json::from_str(&run(cli).unwrap()).unwrap();
        assert_eq!(output.as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn unsupported_uri_flag_fails() {
        let cli =
            Cli::try_parse_from(["persondb", "--uri", "mongodb://localhost", "seed"]).unwrap();
        assert!(run(cli).is_err());
    }
}
