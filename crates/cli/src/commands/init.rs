//! `choreboard init` — Write the default configuration file.

use choreboard_config::AppConfig;
use std::path::Path;

use super::{CommandResult, config_path};

pub async fn run(explicit: Option<&Path>, force: bool) -> CommandResult {
    let path = config_path(explicit);
    write_default(&path, force)?;

    println!("Choreboard — Setup");
    println!("==================\n");
    println!("✅ Wrote {}", path.display());
    println!("\nNext steps:");
    println!("  1. Set engine.time_zone to your household's time zone (e.g. \"Europe/London\")");
    println!("  2. Create a chore: choreboard chore create --title ... --parent <id> --reward 1.00 --child <id>");
    Ok(())
}

fn write_default(path: &Path, force: bool) -> CommandResult {
    if path.exists() && !force {
        return Err(format!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        )
        .into());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        write_default(&path, false).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.engine.max_reason_len, 200);
    }

    #[test]
    fn refuses_to_clobber_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[activity]\nretain = 7\n").unwrap();

        let err = write_default(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(AppConfig::load_from(&path).unwrap().activity.retain, 7);

        write_default(&path, true).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().activity.retain, 5_000);
    }
}
