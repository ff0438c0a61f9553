//! litelog - Browse LiteLLM gateway request logs from the terminal

use clap::Parser;
use litelog::{
    Result, Session, Settings, SettingsStore,
    browser::Browser,
    cli::{Cli, Command, ConfigAction, WindowArgs},
    progress::with_spinner,
    settings::mask_secret,
};
use litelog_client::GatewayClient;
use litelog_core::{error::LitelogError, timezone::TimezoneConfig};
use litelog_terminal::{BrowserView, OutputFormatter, PayloadView, get_formatter};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn connect(settings: &Settings) -> Result<Arc<GatewayClient>> {
    GatewayClient::new(&settings.base_url, &settings.admin_api_key).map(Arc::new)
}

/// Select the key named by `--key`, else the remembered or first key,
/// then load `--older` additional windows.
async fn prepare_window(
    session: &mut Session<GatewayClient>,
    args: &WindowArgs,
    show_progress: bool,
) -> Result<()> {
    with_spinner(show_progress, "Loading keys", session.load_keys()).await?;

    let token = match &args.key {
        Some(needle) => session
            .find_key(needle)
            .map(|k| k.token.clone())
            .ok_or_else(|| LitelogError::InvalidArgument(format!("Unknown key: {needle}")))?,
        None => {
            let remembered = session
                .settings()
                .last_selected_key
                .clone()
                .filter(|token| session.keys().iter().any(|k| &k.token == token));
            remembered
                .or_else(|| session.keys().first().map(|k| k.token.clone()))
                .ok_or_else(|| LitelogError::InvalidArgument("No virtual keys found".to_string()))?
        }
    };

    with_spinner(show_progress, "Loading logs", session.select_key(&token)).await?;
    for _ in 0..args.older {
        with_spinner(show_progress, "Loading older logs", session.load_older()).await?;
    }
    Ok(())
}

fn format_settings(settings: &Settings, store: &SettingsStore, json: bool) -> String {
    if json {
        let output = json!({
            "path": store.path(),
            "base_url": settings.base_url,
            "admin_api_key": mask_secret(&settings.admin_api_key),
            "lookback_hours": settings.lookback_hours,
            "page_size": settings.page_size,
            "last_selected_key": settings.last_selected_key,
        });
        return serde_json::to_string_pretty(&output).unwrap_or_default();
    }
    let or_unset = |value: &str| {
        if value.is_empty() {
            "(not set)".to_string()
        } else {
            value.to_string()
        }
    };
    format!(
        "Settings file:   {}\nBase URL:        {}\nAdmin API Key:   {}\nLookback hours:  {}\nPage size:       {}",
        store.path().display(),
        or_unset(&settings.base_url),
        or_unset(&mask_secret(&settings.admin_api_key)),
        settings.lookback_hours,
        settings.page_size
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. RUST_LOG wins; --verbose raises the default.
    let default_filter = if cli.verbose {
        "litelog=info,litelog_core=debug,litelog_client=debug"
    } else {
        "litelog=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = SettingsStore::resolve(cli.config.clone())?;
    let settings = cli.overrides().apply(store.load()?);
    let tz_config = TimezoneConfig::from_cli(cli.timezone.as_deref(), cli.utc)?;
    info!("Using timezone: {}", tz_config.display_name());

    let interactive = is_terminal::is_terminal(std::io::stdout());
    let show_progress = !cli.json && interactive;

    match cli.command.unwrap_or(Command::Browse) {
        Command::Config { action } => match action {
            ConfigAction::Show => println!("{}", format_settings(&settings, &store, cli.json)),
            ConfigAction::Set => {
                let saved = store.save(&settings)?;
                if cli.json {
                    println!("{}", format_settings(&saved, &store, true));
                } else {
                    println!("Settings saved successfully!");
                }
            }
        },
        Command::Keys => {
            let formatter = get_formatter(cli.json, tz_config);
            let remembered = settings.last_selected_key.clone();
            let mut session = Session::new(settings, connect);
            let keys = with_spinner(show_progress, "Loading keys", session.load_keys()).await?;
            println!("{}", formatter.format_keys(keys, remembered.as_ref()));
        }
        Command::Logs(args) => {
            let formatter = get_formatter(cli.json, tz_config);
            let mut session = Session::new(settings, connect).with_store(store);
            prepare_window(&mut session, &args, show_progress).await?;
            println!(
                "{}",
                formatter.format_logs(
                    session.current_entries(),
                    session.current_window().as_ref()
                )
            );
        }
        Command::Show {
            request_id,
            formatted,
            window,
        } => {
            let formatter = get_formatter(cli.json, tz_config);
            let mut session = Session::new(settings, connect).with_store(store);
            prepare_window(&mut session, &window, show_progress).await?;
            session.select_entry(&request_id)?;
            if let Some(entry) = session.selected_entry() {
                let view = if formatted {
                    PayloadView::Formatted
                } else {
                    PayloadView::Raw
                };
                println!("{}", formatter.format_log_detail(entry, view));
            }
        }
        Command::Browse => {
            let formatter: Box<dyn OutputFormatter> = get_formatter(false, tz_config.clone());
            let session = Session::new(settings, connect).with_store(store);
            let mut browser = Browser::new(session, BrowserView::new(tz_config), formatter);
            if interactive {
                browser = browser.with_terminal(console::Term::stdout());
            }
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            browser.run(stdin, &mut stdout).await?;
        }
    }

    Ok(())
}
