use clap::Parser;
use log::LevelFilter;
use sql_dataset::{Config, DEFAULT_CONFIG_FILE, HttpDatasetClient, run};
use sql_dataset_core::{DatasetClient, Result};
use std::{env, path::PathBuf, process::ExitCode};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "sql-dataset")]
#[command(version)]
#[command(about = "Keeps remote datasets in sync with the results of SQL queries", long_about = None)]
struct Args {
    /// Config file to load
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Name of a dataset to delete, asks for confirmation first
    #[arg(long)]
    delete_dataset: Option<String>,
}

fn init_logs() {
    let mut logger = env_logger::builder();
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Info);
    }
    logger.init();
}

async fn confirm_delete(client: &HttpDatasetClient, name: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("Delete dataset \"{name}\" (y/N): ").as_bytes())
        .await?;
    stdout.flush().await?;
    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    if answer.trim_end_matches(['\n', '\r']).eq_ignore_ascii_case("y") {
        client.delete_dataset(name).await?;
        println!("Dataset deleted successfully");
    } else {
        println!("Cancelled action");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logs();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let errors = config.validate();
    if !errors.is_empty() {
        println!("\nThere are errors in your config:");
        for error in &errors {
            println!(" - {error}");
        }
        println!();
        return ExitCode::FAILURE;
    }

    let client = match HttpDatasetClient::with_api_url(&config.api_key, config.api_url()) {
        Ok(client) => client,
        Err(e) => {
            log::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(name) = &args.delete_dataset {
        return match confirm_delete(&client, name).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run(&config, &client).await {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
