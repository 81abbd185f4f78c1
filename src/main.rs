use anyhow::{bail, Context, Result};
use gofinances::import::load_import_file;
use gofinances::{
    append_transactions, logging, AppConfig, AuthProvider, DashboardLoader, SessionAuth,
    SqliteStorage, Storage, User,
};
use std::env;
use std::path::Path;
use std::sync::Arc;

const USAGE: &str = "\
Usage:
  gofinances                            open the dashboard
  gofinances login <id> <name> [photo]  sign in as a user
  gofinances logout                     sign out
  gofinances import <user_id> <file>    append transactions from .json or .csv
  gofinances summary [user_id]          print the dashboard as JSON";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = AppConfig::load().context("Failed to load configuration")?;

    match args.first().map(String::as_str) {
        None | Some("ui") => run_ui_mode(&config),
        Some("login") => {
            logging::init_stderr();
            run_login(&config, &args[1..])
        }
        Some("logout") => {
            logging::init_stderr();
            run_logout(&config)
        }
        Some("import") => {
            logging::init_stderr();
            run_import(&config, &args[1..])
        }
        Some("summary") => {
            logging::init_stderr();
            run_summary(&config, &args[1..])
        }
        Some("help") | Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn open_storage(config: &AppConfig) -> Result<Arc<dyn Storage>> {
    let storage = SqliteStorage::open(&config.database_path)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    Ok(Arc::new(storage))
}

fn run_login(config: &AppConfig, args: &[String]) -> Result<()> {
    let (id, name) = match args {
        [id, name, ..] => (id, name),
        _ => bail!("login needs <id> and <name>\n\n{}", USAGE),
    };

    let mut user = User::new(id.as_str(), name.as_str());
    if let Some(photo) = args.get(2) {
        user = user.with_photo(photo.as_str());
    }

    let auth = SessionAuth::new(open_storage(config)?);
    auth.sign_in(&user)?;

    println!("✓ Signed in as {} ({})", user.name, user.id);
    Ok(())
}

fn run_logout(config: &AppConfig) -> Result<()> {
    let auth = SessionAuth::new(open_storage(config)?);
    auth.sign_out()?;
    println!("✓ Signed out");
    Ok(())
}

fn run_import(config: &AppConfig, args: &[String]) -> Result<()> {
    let (user_id, file) = match args {
        [user_id, file, ..] => (user_id, file),
        _ => bail!("import needs <user_id> and <file>\n\n{}", USAGE),
    };

    let path = Path::new(file);
    let transactions = load_import_file(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    println!("📂 Loaded {} transactions from {}", transactions.len(), path.display());

    let storage = open_storage(config)?;
    let added = append_transactions(storage.as_ref(), user_id, &transactions)?;

    println!("✓ Added {} transactions for user {}", added, user_id);
    if added < transactions.len() {
        println!("✓ Already stored: {}", transactions.len() - added);
    }

    Ok(())
}

fn run_summary(config: &AppConfig, args: &[String]) -> Result<()> {
    let storage = open_storage(config)?;

    let user_id = match args.first() {
        Some(id) => id.clone(),
        None => SessionAuth::new(storage.clone()).require_user()?.id,
    };

    let loader = DashboardLoader::new(storage, config.display_options());
    let dashboard = loader
        .load(&user_id)
        .with_context(|| format!("Failed to load dashboard for user {}", user_id))?;

    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    use gofinances::ui::{self, UiExit};
    use gofinances::DashboardScreen;
    use std::time::Duration;

    logging::init_file(&config.log_file)
        .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;

    let storage = open_storage(config)?;
    let auth = Arc::new(SessionAuth::new(storage.clone()));

    let Some(user) = auth.current_user()? else {
        eprintln!("❌ No user signed in!");
        eprintln!("   Run: gofinances login <id> <name> [photo]");
        std::process::exit(1);
    };

    let loader = Arc::new(DashboardLoader::new(storage, config.display_options()));
    let screen = DashboardScreen::new(loader, user);
    let mut app = ui::App::new(screen, auth);

    match ui::run_ui(&mut app, Duration::from_millis(config.tick_rate_ms))? {
        UiExit::Quit => {}
        UiExit::SignedOut => println!("✓ Signed out"),
    }

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin gofinances-server --features server");
    std::process::exit(1);
}
