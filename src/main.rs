use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use friend_chat::config::{self, AppConfig, BackendConfig};
use friend_chat::service::remote::DEFAULT_POLL_INTERVAL;
use friend_chat::service::{DataService, LocalDataService, RemoteDataService};
use friend_chat::storage::{self, ChatDatabase};
use friend_chat::ui::{ChatApp, Home};

#[derive(Parser)]
#[command(
    name = "friend_chat",
    version,
    about = "Friends and chats home screen"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Override the signed-in user id
    #[arg(long)]
    user: Option<String>,
    /// Override the signed-in user's display name
    #[arg(long)]
    name: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Fill the local database with demo users, friendships and chats
    Seed,
    /// Write the effective configuration to the config path
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    if let Some(user) = cli.user.clone() {
        app_config.user.id = user;
    }
    if let Some(name) = cli.name.clone() {
        app_config.user.display_name = Some(name);
    }

    match cli.mode {
        Some(Mode::Seed) => seed(&app_config),
        Some(Mode::InitConfig) => {
            config::save_config(&cli.config, &app_config)?;
            log::info!("Wrote config to {}", cli.config);
            Ok(())
        }
        None => run_client(app_config),
    }
}

fn seed(app_config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let BackendConfig::Local { database_path } = &app_config.backend else {
        return Err("seeding is only available for the local backend".into());
    };
    storage::ensure_parent_dir(database_path)?;
    let mut db = ChatDatabase::with_path(database_path)?;
    storage::seed_demo_data(&mut db)?;
    log::info!("Seeded demo data into {}", database_path.display());
    Ok(())
}

fn build_service(backend: &BackendConfig) -> Result<Arc<dyn DataService>, Box<dyn Error>> {
    match backend {
        BackendConfig::Local { database_path } => {
            storage::ensure_parent_dir(database_path)?;
            log::info!("Using local database {}", database_path.display());
            Ok(Arc::new(LocalDataService::open(database_path)?))
        }
        BackendConfig::Remote { base_url, .. } => {
            let poll_interval = backend.poll_interval().unwrap_or(DEFAULT_POLL_INTERVAL);
            log::info!("Using remote backend {base_url} (poll every {poll_interval:?})");
            Ok(Arc::new(RemoteDataService::new(base_url.clone(), poll_interval)))
        }
    }
}

fn run_client(app_config: AppConfig) -> Result<(), Box<dyn Error>> {
    let service = build_service(&app_config.backend)?;
    let runtime = tokio::runtime::Handle::current();
    let user = app_config.user.to_user();
    log::info!("Signed in as {} ({})", user.label(), user.id);

    let options = eframe::NativeOptions::default();
    let home = Home::new(service, runtime, user);

    eframe::run_native(
        "Friend Chat",
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, home)))),
    )?;
    Ok(())
}
