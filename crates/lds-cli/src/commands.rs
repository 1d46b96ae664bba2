use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use lds_directory::{
    Directory, DirectoryConfig, EnvSecrets, LayerAuth, Query, ReloadStatus, Snapshot,
};
use lds_store::Store;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Check => cmd_check(&config, format).await,
        Command::Keys(args) => cmd_keys(&config, format, &args.uid).await,
        Command::LayerUsers(args) => cmd_layer_users(&config, format, &args.layer).await,
        Command::Groups => cmd_groups(&config, format).await,
        Command::Auth(args) => cmd_auth(&config, format, &args),
        Command::Watch => cmd_watch(config).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<DirectoryConfig> {
    let mut config = match &cli.config {
        Some(path) => DirectoryConfig::from_file(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => DirectoryConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    Ok(config)
}

async fn load_store(config: &DirectoryConfig) -> anyhow::Result<Store> {
    Store::load_within(&config.root, config.load_timeout())
        .await
        .with_context(|| format!("loading {}", config.root.display()))
}

/// A query handle over a single, unwatched load of the tree.
async fn load_query(config: &DirectoryConfig) -> anyhow::Result<Query> {
    let snapshot = Arc::new(Snapshot::new());
    snapshot.replace(load_store(config).await?);
    Ok(Query::new(snapshot, LayerAuth::new(Arc::new(EnvSecrets), config)))
}

async fn cmd_check(config: &DirectoryConfig, format: OutputFormat) -> anyhow::Result<()> {
    let store = load_store(config).await?;
    if format == OutputFormat::Json {
        let report = json!({
            "root": store.dir(),
            "users": store.user_count(),
            "groups": store.group_count(),
            "layers": store.layer_count(),
            "diagnostics": store.diagnostics(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} Loaded {}", "✓".green().bold(), store.dir().display().to_string().bold());
    println!("  Users: {}", store.user_count());
    println!("  Groups: {}", store.group_count());
    println!("  Layers: {}", store.layer_count());
    if store.diagnostics().is_empty() {
        println!("  Diagnostics: {}", "none".green());
    } else {
        println!("  Diagnostics: {}", store.diagnostics().len().to_string().yellow());
        for diagnostic in store.diagnostics() {
            println!("    {} {}", "!".yellow(), diagnostic);
        }
    }
    Ok(())
}

async fn cmd_keys(config: &DirectoryConfig, format: OutputFormat, uid: &str) -> anyhow::Result<()> {
    let keys = load_query(config).await?.public_keys(uid)?;
    match (format, keys) {
        (OutputFormat::Json, keys) => println!("{}", serde_json::to_string_pretty(&keys)?),
        (OutputFormat::Text, None) => println!("User {} not found.", uid.yellow()),
        (OutputFormat::Text, Some(keys)) if keys.is_empty() => {
            println!("User {} has no public keys.", uid.yellow())
        }
        (OutputFormat::Text, Some(keys)) => {
            for key in keys {
                println!("{key}");
            }
        }
    }
    Ok(())
}

async fn cmd_layer_users(
    config: &DirectoryConfig,
    format: OutputFormat,
    layer: &str,
) -> anyhow::Result<()> {
    let users: Vec<_> = load_query(config).await?.layer_users(layer)?.collect();
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }
    if users.is_empty() {
        println!("Layer {} has no users.", layer.yellow());
    }
    for user in users {
        println!("{} {}", user.uid.bold(), format!("({} keys)", user.public_keys.len()).dimmed());
    }
    Ok(())
}

async fn cmd_groups(config: &DirectoryConfig, format: OutputFormat) -> anyhow::Result<()> {
    let groups: Vec<_> = load_query(config).await?.groups()?.collect();
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }
    if groups.is_empty() {
        println!("No groups.");
    }
    for group in groups {
        let members = group.members().map(|m| m.join(", ")).unwrap_or_default();
        println!("{} {} {}", group.cn.bold(), group.gid_number.to_string().cyan(), members);
    }
    Ok(())
}

fn cmd_auth(config: &DirectoryConfig, format: OutputFormat, args: &AuthArgs) -> anyhow::Result<()> {
    let auth = LayerAuth::new(Arc::new(EnvSecrets), config);
    let result = auth.authenticate(&args.layer, &args.credential);
    if format == OutputFormat::Json {
        println!("{}", json!({ "layer": args.layer, "authenticated": result.is_ok() }));
    } else if result.is_ok() {
        println!("{} Credential accepted for layer {}", "✓".green().bold(), args.layer.yellow());
    }
    result.map(|_| ()).map_err(Into::into)
}

async fn cmd_watch(config: DirectoryConfig) -> anyhow::Result<()> {
    let root = config.root.clone();
    let directory = Directory::new(config);
    directory
        .initialize(&root)
        .await
        .with_context(|| format!("initializing {}", root.display()))?;
    println!("{} Watching {}", "✓".green().bold(), root.display().to_string().bold());

    let mut status = directory.subscribe();
    let mut previous = status.borrow_and_update().clone();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                match failed_reload(&previous, &current) {
                    Some(err) => println!(
                        "  {} generation {} (failures: {}, last: {})",
                        "!".yellow(), current.generation, current.failures, err
                    ),
                    None => println!("  {} generation {}", "↻".cyan(), current.generation),
                }
                previous = current;
            }
        }
    }

    directory.shutdown();
    println!("Stopped.");
    Ok(())
}

/// The error of the reload that produced `current`, if that reload failed.
fn failed_reload<'a>(previous: &ReloadStatus, current: &'a ReloadStatus) -> Option<&'a str> {
    if current.failures > previous.failures {
        current.last_error.as_deref()
    } else {
        None
    }
}
