use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use shared::{
    domain::TogglePair,
    protocol::{WidgetEvent, CHANGE_EVENT},
};
use tracing::{info, warn};
use widget_core::{
    item_group::VALUE_ATTRIBUTE, AsyncGroupWidget, HttpPairSource, ItemGroupWidget, PairSource,
    StaticPairSource, Widget,
};

mod config;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "demo.toml")]
    config: PathBuf,
    #[arg(long)]
    source_url: Option<String>,
    /// JSON value attribute for the item group, e.g. '[{"a":false}]'.
    #[arg(long)]
    group_value: Option<String>,
    /// Row of the item group to click; repeatable.
    #[arg(long = "row")]
    rows: Vec<usize>,
    /// Name of a fetched toggle to click; repeatable.
    #[arg(long = "toggle")]
    toggles: Vec<String>,
    /// Use the built-in pair list instead of fetching.
    #[arg(long)]
    offline: bool,
}

fn builtin_pairs() -> Vec<TogglePair> {
    vec![
        TogglePair::new("Common", "888888"),
        TogglePair::new("Rare", "3cf4c8"),
    ]
}

fn print_event(event: impl Into<WidgetEvent>) {
    match serde_json::to_string(&event.into()) {
        Ok(line) => println!("{CHANGE_EVENT} {line}"),
        Err(err) => warn!(error = %err, "failed to encode change event"),
    }
}

fn run_item_group(group_value: &str, rows: &[usize]) -> Result<()> {
    let group = ItemGroupWidget::new();
    group
        .set_attribute(VALUE_ATTRIBUTE, group_value)
        .context("item group value rejected")?;
    let _changes = group.on_change(|change| print_event(change.clone()));

    for &row in rows {
        group.click(row)?;
    }

    println!(
        "item group render: {}",
        serde_json::to_string_pretty(&group.render())?
    );
    println!("item group value: {}", group.value_attribute());
    Ok(())
}

async fn run_async_group(settings: &Settings, offline: bool, toggles: &[String]) -> Result<()> {
    let source: Arc<dyn PairSource> = if offline {
        Arc::new(StaticPairSource::new(builtin_pairs()))
    } else {
        Arc::new(HttpPairSource::with_timeout(
            &settings.source_url,
            Duration::from_millis(settings.fetch_timeout_ms),
        )?)
    };

    let group = AsyncGroupWidget::spawn(source);
    let children = group
        .populated()
        .await
        .with_context(|| format!("failed to populate toggles from {}", settings.source_url))?;
    info!(children, "toggle group ready");

    let _changes = group.on_change(|change| print_event(change.clone()));
    for name in toggles {
        group
            .child(name)
            .ok_or_else(|| anyhow!("no toggle named `{name}`"))?
            .click();
    }

    println!(
        "toggle group render: {}",
        serde_json::to_string_pretty(&group.render())?
    );
    println!(
        "toggle group value: {}",
        serde_json::to_string(&group.value())?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(v) = args.source_url {
        settings.source_url = v;
    }
    if let Some(v) = args.group_value {
        settings.group_value = v;
    }

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    run_item_group(&settings.group_value, &args.rows)?;
    run_async_group(&settings, args.offline, &args.toggles).await?;

    Ok(())
}
