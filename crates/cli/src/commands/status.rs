//! `choreboard status` — Show configuration and store status.

use choreboard_config::{AppConfig, StoreBackend};
use serde_json::json;
use std::path::Path;

use super::{CommandResult, Output, config_path, load_config};

pub async fn run(explicit: Option<&Path>, out: &Output) -> CommandResult {
    let config = load_config(explicit)?;
    let path = config_path(explicit);
    let database = match config.store.backend {
        StoreBackend::Sqlite => Some(config.store.path.display().to_string()),
        StoreBackend::Memory => None,
    };

    let status = json!({
        "config_file": path.display().to_string(),
        "config_file_exists": path.exists(),
        "backend": config.store.backend,
        "database": database,
        "database_exists": config.store.path.exists(),
        "time_zone": config.engine.time_zone,
        "max_reward": config.engine.max_reward(),
        "max_adjustment": config.engine.max_adjustment(),
        "activity_tracing": config.activity.tracing,
    });

    out.emit(&status, |_| print_human(&config, &path))
}

fn print_human(config: &AppConfig, path: &Path) {
    println!("Choreboard Status");
    println!("=================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Backend:      {:?}", config.store.backend);
    if config.store.backend == StoreBackend::Sqlite {
        println!("  Database:     {}", config.store.path.display());
    }
    println!("  Time zone:    {}", config.engine.time_zone);
    println!("  Max reward:   {}", config.engine.max_reward());
    println!("  Max adjust:   {}", config.engine.max_adjustment());
    println!("  Title limit:  {} chars", config.engine.max_title_len);
    println!("  Reason limit: {} chars", config.engine.max_reason_len);
    println!(
        "  Activity:     {}",
        if config.activity.tracing { "logged" } else { "in-memory only" }
    );

    if path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `choreboard init` first");
    }
}
