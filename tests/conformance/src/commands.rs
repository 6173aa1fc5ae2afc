use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, bail};
use steamsync_protocol::BatchReport;
use steamsync_reconcile::{
    GridArtwork, MemoryCatalog, SyncConfig, WriteConfirmation, WriteCoordinator, WriteOutcome,
    export_games, import_shortcuts,
};
use steamsync_steam::shortcuts::{from_document, to_document};
use steamsync_steam::{
    ArtworkType, Controller, Paths, ShortcutManager, ShortcutRecord, User, expected_rungame_url,
    generate_app_id, get_users, get_users_with_paths, load_shortcuts_vdf, parse_shortcuts,
    save_shortcuts_vdf, select_user, serialize_shortcuts, stable_id, to_shortcut_game_id, vdf,
};
use tracing::{info, warn};

use crate::cli::{ArtworkArgs, Cli, Command, IdsArgs, SyncArgs};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => SyncConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SyncConfig::load().context("loading default config")?,
    };
    if cli.steam_dir.is_some() {
        config.steam_dir = cli.steam_dir;
    }
    if cli.user.is_some() {
        config.user_id = cli.user;
    }

    match cli.command {
        Command::Read(args) => read(&args.path),
        Command::Roundtrip(args) => {
            let summary = roundtrip(&args.path)?;
            println!("{summary}");
            Ok(())
        }
        Command::WriteSample(args) => {
            save_shortcuts_vdf(&args.path, &sample_records())?;
            info!(path = %args.path.display(), "sample written");
            Ok(())
        }
        Command::Ids(args) => {
            println!("{}", serde_json::to_string_pretty(&identities(&args))?);
            Ok(())
        }
        Command::Users => {
            let users = match &config.steam_dir {
                Some(dir) => get_users_with_paths(&Paths::with_base(dir.clone()))?,
                None => get_users().context("Steam installation not found")?,
            };
            for user in users {
                let marker = if user.has_shortcuts { "shortcuts" } else { "-" };
                println!("{}\t{marker}", user.id);
            }
            Ok(())
        }
        Command::Artwork(args) => {
            let paths = steam_paths(&config)?;
            let user = resolve_user(&config, &paths)?;
            for line in artwork_listing(&paths, &user.id, &args) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Export(args) => {
            let coordinator = coordinator_for(&config);
            let report = export(&config, &args, &coordinator).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Import(args) => {
            let report = import(&config, &args)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn read(path: &Path) -> anyhow::Result<()> {
    let records = load_shortcuts_vdf(path)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Checks that the file re-encodes byte for byte and that its records
/// survive a trip through the document mapper.
fn roundtrip(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let doc = vdf::decode(&bytes)?;
    let encoded = vdf::encode(&doc)?;
    if encoded != bytes {
        let at = encoded
            .iter()
            .zip(&bytes)
            .position(|(a, b)| a != b)
            .unwrap_or(encoded.len().min(bytes.len()));
        bail!(
            "re-encoded document differs at byte {at} ({} vs {} bytes)",
            encoded.len(),
            bytes.len()
        );
    }

    let records = from_document(&doc)?;
    let reparsed = parse_shortcuts(&serialize_shortcuts(&records)?)?;
    if reparsed != records {
        bail!("records changed after a mapper round-trip");
    }
    if to_document(&reparsed) != to_document(&records) {
        bail!("documents differ after a mapper round-trip");
    }

    Ok(format!("ok: {} bytes, {} shortcuts", bytes.len(), records.len()))
}

fn sample_records() -> Vec<ShortcutRecord> {
    let mut hades = ShortcutRecord::new("Hades", "\"/games/hades/Hades.x86_64\"");
    hades.start_dir = "\"/games/hades\"".into();
    hades.tags = vec!["Roguelike".into(), "Favorite".into()];

    let mut celeste = ShortcutRecord::new("Celeste", "\"/games/celeste/Celeste\"");
    celeste.start_dir = "\"/games/celeste\"".into();
    celeste.launch_options = "--fullscreen".into();

    let mut records = vec![hades, celeste];
    for rec in &mut records {
        rec.ensure_app_id();
    }
    records
}

fn identities(args: &IdsArgs) -> serde_json::Value {
    let app_id = generate_app_id(&args.exe, &args.name);
    serde_json::json!({
        "appId": app_id,
        "gameId": to_shortcut_game_id(app_id).to_string(),
        "launchUrl": expected_rungame_url(app_id),
        "stableId": stable_id(&args.name, &args.exe),
    })
}

fn steam_paths(config: &SyncConfig) -> anyhow::Result<Paths> {
    match &config.steam_dir {
        Some(dir) => Ok(Paths::with_base(dir.clone())),
        None => Ok(Paths::new().context("Steam installation not found")?),
    }
}

fn resolve_user(config: &SyncConfig, paths: &Paths) -> anyhow::Result<User> {
    let users = get_users_with_paths(paths)?;
    Ok(select_user(&users, config.user_id.as_deref())?)
}

/// One line per artwork type present for `args.app_id`, then the file a
/// shortcut icon would use.
fn artwork_listing(paths: &Paths, user_id: &str, args: &ArtworkArgs) -> Vec<String> {
    let show = |found: Option<PathBuf>| {
        found.map_or_else(|| "-".to_string(), |p| p.display().to_string())
    };
    let mut lines: Vec<String> = ArtworkType::all()
        .iter()
        .map(|&kind| {
            let found = paths.find_artwork(user_id, args.app_id, kind);
            format!("{kind}\t{}", show(found))
        })
        .collect();
    lines.push(format!("best\t{}", show(paths.best_artwork(user_id, args.app_id))));
    lines
}

fn load_catalog(path: &Path) -> anyhow::Result<MemoryCatalog> {
    MemoryCatalog::from_json_file(path).with_context(|| format!("loading {}", path.display()))
}

fn save_catalog(path: &Path, catalog: &MemoryCatalog) -> anyhow::Result<()> {
    catalog
        .save_json_file(path)
        .with_context(|| format!("writing {}", path.display()))
}

/// Asks on the terminal before writing while Steam is running.
struct TerminalConfirmation;

impl WriteConfirmation for TerminalConfirmation {
    fn confirm_write<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        let prompt = format!(
            "Steam is running and may overwrite {}. Write anyway? [y/N] ",
            path.display()
        );
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                eprint!("{prompt}");
                let mut line = String::new();
                std::io::stdin().read_line(&mut line).is_ok()
                    && matches!(line.trim(), "y" | "Y" | "yes")
            })
            .await
            .unwrap_or(false)
        })
    }
}

fn coordinator_for(config: &SyncConfig) -> WriteCoordinator {
    let confirm: Option<Arc<dyn WriteConfirmation>> = if config.confirm_when_running {
        Some(Arc::new(TerminalConfirmation))
    } else {
        None
    };
    WriteCoordinator::new(config.debounce(), Arc::new(Controller::new()), confirm)
}

async fn export(
    config: &SyncConfig,
    args: &SyncArgs,
    coordinator: &WriteCoordinator,
) -> anyhow::Result<BatchReport> {
    let paths = steam_paths(config)?;
    let user = resolve_user(config, &paths)?;
    let manager = ShortcutManager::with_paths(paths.clone());
    let existing = manager.load(&user.id)?;

    let mut catalog = load_catalog(&args.catalog)?;
    let artwork = GridArtwork::new(paths.clone(), user.id.clone());
    let outcome = export_games(&mut catalog, &existing, &artwork, &config.reconciler())?;

    let report = &outcome.report;
    if args.dry_run || (report.processed.is_empty() && report.updated.is_empty()) {
        return Ok(outcome.report);
    }

    let target: PathBuf = paths.shortcuts_path(&user.id);
    let ticket = coordinator.schedule(&target, outcome.shortcuts);
    match ticket.outcome().await? {
        WriteOutcome::Written => {
            save_catalog(&args.catalog, &catalog)?;
            info!(user = %user.id, path = %target.display(), "shortcuts updated");
            Ok(outcome.report)
        }
        other => {
            warn!(?other, "shortcuts not written, catalog left unchanged");
            bail!("shortcuts not written: {other:?}")
        }
    }
}

fn import(config: &SyncConfig, args: &SyncArgs) -> anyhow::Result<BatchReport> {
    let paths = steam_paths(config)?;
    let user = resolve_user(config, &paths)?;
    let shortcuts = ShortcutManager::with_paths(paths).load(&user.id)?;

    let mut catalog = load_catalog(&args.catalog)?;
    let report = import_shortcuts(&mut catalog, &shortcuts, &config.reconciler())?;
    if !args.dry_run && !report.processed.is_empty() {
        save_catalog(&args.catalog, &catalog)?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use steamsync_protocol::CatalogGame;
    use steamsync_reconcile::ProcessProbe;

    struct Idle;

    impl ProcessProbe for Idle {
        fn is_running(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
            Box::pin(async { false })
        }
    }

    fn fake_steam(tmp: &Path) -> SyncConfig {
        std::fs::create_dir_all(tmp.join("userdata").join("777").join("config")).unwrap();
        SyncConfig {
            steam_dir: Some(tmp.to_path_buf()),
            ..SyncConfig::default()
        }
    }

    fn idle_coordinator() -> WriteCoordinator {
        WriteCoordinator::new(Duration::from_millis(10), Arc::new(Idle), None)
    }

    #[test]
    fn sample_file_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shortcuts.vdf");
        save_shortcuts_vdf(&path, &sample_records()).unwrap();

        let summary = roundtrip(&path).unwrap();
        assert!(summary.contains("2 shortcuts"), "{summary}");
    }

    #[test]
    fn roundtrip_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shortcuts.vdf");
        std::fs::write(&path, [0x00, b's', 0x00, 0x01]).unwrap();
        assert!(roundtrip(&path).is_err());
    }

    #[test]
    fn identities_are_consistent() {
        let ids = identities(&IdsArgs {
            name: "Hades".into(),
            exe: "\"/games/hades/Hades\"".into(),
        });
        let app_id = ids["appId"].as_u64().unwrap() as u32;
        assert!(app_id & 0x8000_0000 != 0);
        assert_eq!(ids["launchUrl"], expected_rungame_url(app_id));
        assert_eq!(ids["stableId"].as_str().unwrap().len(), 32);
    }

    #[tokio::test]
    async fn export_then_import_is_stable() {
        let tmp = tempfile::tempdir().unwrap();
        let config = fake_steam(tmp.path());
        let catalog_path = tmp.path().join("catalog.json");
        let games = vec![CatalogGame {
            id: "g1".into(),
            name: "Celeste".into(),
            install_dir: "/games/celeste".into(),
            executable: "/games/celeste/Celeste".into(),
            ..CatalogGame::default()
        }];
        std::fs::write(&catalog_path, serde_json::to_string(&games).unwrap()).unwrap();

        let args = SyncArgs {
            catalog: catalog_path.clone(),
            dry_run: false,
        };
        let report = export(&config, &args, &idle_coordinator()).await.unwrap();
        assert_eq!(report.processed, vec!["Celeste"]);

        let shortcuts = Paths::with_base(tmp.path()).shortcuts_path("777");
        let records = load_shortcuts_vdf(&shortcuts).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].exe, "\"/games/celeste/Celeste\"");

        let saved = load_catalog(&catalog_path).unwrap().into_games();
        assert_eq!(saved[0].steam_app_id, records[0].app_id);

        let report = import(&config, &args).unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(report.duplicates, vec!["Celeste"]);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let config = fake_steam(tmp.path());
        let catalog_path = tmp.path().join("catalog.json");
        let games = vec![CatalogGame {
            id: "g1".into(),
            name: "A".into(),
            executable: "/games/a".into(),
            ..CatalogGame::default()
        }];
        std::fs::write(&catalog_path, serde_json::to_string(&games).unwrap()).unwrap();

        let args = SyncArgs {
            catalog: catalog_path,
            dry_run: true,
        };
        let report = export(&config, &args, &idle_coordinator()).await.unwrap();
        assert_eq!(report.processed, vec!["A"]);
        assert!(!Paths::with_base(tmp.path()).has_shortcuts("777"));
    }

    #[test]
    fn import_into_missing_catalog_creates_it() {
        let tmp = tempfile::tempdir().unwrap();
        let config = fake_steam(tmp.path());
        let paths = Paths::with_base(tmp.path());
        save_shortcuts_vdf(&paths.shortcuts_path("777"), &sample_records()).unwrap();

        let catalog_path = tmp.path().join("catalog.json");
        let report = import(
            &config,
            &SyncArgs {
                catalog: catalog_path.clone(),
                dry_run: false,
            },
        )
        .unwrap();
        assert_eq!(report.processed, vec!["Hades", "Celeste"]);
        assert_eq!(load_catalog(&catalog_path).unwrap().into_games().len(), 2);
    }

    #[test]
    fn artwork_listing_covers_every_type() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(tmp.path());
        paths.ensure_grid_dir("777").unwrap();
        let poster = paths.grid_dir("777").join("42p.jpg");
        std::fs::write(&poster, b"p").unwrap();

        let lines = artwork_listing(&paths, "777", &ArtworkArgs { app_id: 42 });
        assert_eq!(lines.len(), ArtworkType::all().len() + 1);
        assert_eq!(lines[0], "hero\t-");
        assert_eq!(lines[1], format!("poster\t{}", poster.display()));
        assert_eq!(lines.last().unwrap(), &format!("best\t{}", poster.display()));
    }

    #[tokio::test]
    async fn export_writes_renamed_game() {
        let tmp = tempfile::tempdir().unwrap();
        let config = fake_steam(tmp.path());
        let catalog_path = tmp.path().join("catalog.json");
        let games = vec![CatalogGame {
            id: "g1".into(),
            name: "Celeste".into(),
            executable: "/games/celeste/Celeste".into(),
            ..CatalogGame::default()
        }];
        MemoryCatalog::new(games).save_json_file(&catalog_path).unwrap();
        let args = SyncArgs {
            catalog: catalog_path.clone(),
            dry_run: false,
        };
        export(&config, &args, &idle_coordinator()).await.unwrap();

        let mut games = load_catalog(&catalog_path).unwrap().into_games();
        games[0].name = "Celeste Deluxe".into();
        MemoryCatalog::new(games).save_json_file(&catalog_path).unwrap();

        let report = export(&config, &args, &idle_coordinator()).await.unwrap();
        assert_eq!(report.updated, vec!["Celeste Deluxe"]);

        let shortcuts = Paths::with_base(tmp.path()).shortcuts_path("777");
        let records = load_shortcuts_vdf(&shortcuts).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].app_name, "Celeste Deluxe");
        let saved = load_catalog(&catalog_path).unwrap().into_games();
        assert_eq!(saved[0].steam_app_id, records[0].app_id);
    }
}
