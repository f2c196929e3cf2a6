use clap::Parser;
use eceg_loader::config::{self, DEFAULT_BATCH_SIZE};
use eceg_loader::import::run_import;
use eceg_loader::store::elastic::ElasticClient;
use eceg_loader::store::submit::RetryPolicy;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "eceg-loader",
    about = "Bulk-load the ECEG 2020 census CSV exports into Elasticsearch"
)]
struct Args {
    /// Base URL of the Elasticsearch cluster.
    #[arg(long, env = "ECEG_STORE_URL", default_value = "http://localhost:9200")]
    store_url: String,

    /// API key for secured clusters.
    #[arg(long, env = "ECEG_STORE_API_KEY")]
    api_key: Option<String>,

    /// Directory holding the census CSV exports.
    #[arg(long, default_value = "./eceg_2020_csv")]
    data_dir: PathBuf,

    /// Documents per bulk request.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("starting census import against {}", args.store_url);

    let client = match ElasticClient::new(&args.store_url, args.api_key.clone()) {
        Ok(client) => client,
        Err(err) => {
            log::error!("failed to build store client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let tables = config::table_configs(&args.data_dir, args.batch_size);
    let policy = RetryPolicy::default();

    match run_import(&client, &tables, &policy).await {
        Ok(report) => {
            report.log_summary();
            if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            log::error!("cannot continue without a store connection: {err}");
            ExitCode::FAILURE
        }
    }
}
