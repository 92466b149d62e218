use clap::{Parser, Subcommand};
use hivres_core::{accumulate, run_report, SemaphoreConfig};
use hivres_records::RecordStore;
use hivres_sierra::{SierraClient, DEFAULT_ENDPOINT};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hivres")]
#[command(about = "HIV resistance report CLI")]
struct Cli {
    /// Directory holding patient_<id>.json files
    #[arg(long, default_value = "/patient_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full resistance report pipeline for a patient
    Report {
        /// Patient identifier (e.g. 76 for patient_76.json)
        pat_id: String,
        /// Sierra GraphQL endpoint override
        #[arg(long)]
        sierra_url: Option<String>,
    },
    /// Print the accumulated mutation set for a patient
    Accumulate {
        /// Patient identifier
        pat_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let store = RecordStore::new(cli.data_dir);

    match cli.command {
        Commands::Report { pat_id, sierra_url } => {
            let record = store.load_patient(&pat_id)?;
            let client =
                SierraClient::new(sierra_url.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()));

            let report = run_report(
                Some(&record.resistance_history),
                Some(&record.treatment_history),
                &client,
                &SemaphoreConfig::default(),
            )
            .await;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Accumulate { pat_id } => {
            let record = store.load_patient(&pat_id)?;
            let accumulated = accumulate(Some(&record.resistance_history));

            println!(
                "{}",
                serde_json::to_string_pretty(&accumulated.accumulated)?
            );
        }
    }

    Ok(())
}
