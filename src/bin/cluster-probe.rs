use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use log::info;
use std::path::Path;

use cluster_probe::cli::{build_cli, event_settle, min_event_delta};
use cluster_probe::config::{create_sample_config, load_config, startup_log_level, ProbeConfig};
use cluster_probe::files::grep_dir;
use cluster_probe::wait::{wait_for_event_propagation, wait_for_metric_at_least, wait_for_metric_value};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    // Before load_config, which logs.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(startup_log_level(&matches)),
    )
    .init();

    let config_path = matches.get_one::<String>("config");
    let config = load_config(config_path.map(|s| s.as_str()), &matches)?;

    // A file-level setting can only quieten the logger that is already running.
    if let Some(level) = config.log_level.as_deref().and_then(|l| l.parse::<log::LevelFilter>().ok()) {
        if level < log::max_level() {
            log::set_max_level(level);
        }
    }

    match matches.subcommand() {
        Some(("metric", sub)) => print_metric(&config, sub).await,
        Some(("wait-metric", sub)) => wait_metric(&config, sub).await,
        Some(("events", _)) => print_events(&config).await,
        Some(("wait-events", sub)) => wait_events(&config, sub).await,
        Some(("grep", sub)) => grep(sub),
        Some(("sample-config", sub)) => {
            let path = required(sub, "path")?;
            create_sample_config(path)?;
            println!("Sample configuration written to: {path}");
            Ok(())
        }
        _ => bail!("no command given"),
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(|s| s.as_str())
        .with_context(|| format!("missing argument: {id}"))
}

async fn print_metric(config: &ProbeConfig, sub: &ArgMatches) -> Result<()> {
    let name = required(sub, "name")?;
    let value = config.metric_scraper()?.get_metric(name).await?;
    println!("{name}: {value}");
    Ok(())
}

async fn wait_metric(config: &ProbeConfig, sub: &ArgMatches) -> Result<()> {
    let name = required(sub, "name")?;
    let expected = *sub
        .get_one::<i64>("expected")
        .context("missing argument: expected")?;
    let scraper = config.metric_scraper()?;
    let settings = config.poll_settings()?;

    let result = if sub.get_flag("at-least") {
        wait_for_metric_at_least(&scraper, name, expected, settings).await?
    } else {
        wait_for_metric_value(&scraper, name, expected, settings).await?
    };

    info!(
        "{name} = {} after {:?} ({} attempts)",
        result.value, result.elapsed, result.attempts
    );
    let value = result.into_result(&format!("{name} to reach {expected}"))?;
    println!("{name}: {value}");
    Ok(())
}

async fn print_events(config: &ProbeConfig) -> Result<()> {
    let metrics = config.event_scraper()?.metrics().await?;
    for (name, value) in metrics.sorted() {
        println!("{name}: {value}");
    }
    Ok(())
}

async fn wait_events(config: &ProbeConfig, sub: &ArgMatches) -> Result<()> {
    let previous = *sub
        .get_one::<i64>("previous-id")
        .context("missing argument: previous-id")?;
    let min_delta = min_event_delta(sub);
    let settle = event_settle(sub, config.event_settle());

    let events = config.event_scraper()?;
    let result = wait_for_event_propagation(
        &events,
        previous,
        min_delta,
        config.event_poll_settings()?,
        settle,
    )
    .await?;
    let synced = result.into_result(&format!("event processing past {previous}"))?;
    println!("last-synced-event-id: {synced}");
    Ok(())
}

fn grep(sub: &ArgMatches) -> Result<()> {
    let dir = required(sub, "dir")?;
    let search = required(sub, "search")?;

    let results = grep_dir(Path::new(dir), search)?;
    if results.is_empty() {
        bail!("no file under {dir} contains '{search}'");
    }
    for (path, lines) in results {
        for line in lines {
            println!("{}: {line}", path.display());
        }
    }
    Ok(())
}
