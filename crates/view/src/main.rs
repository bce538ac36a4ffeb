use anyhow::{Context, Result};
use buildview_api_client::ApiClient;
use buildview_view::config::{self, ViewerConfig};
use buildview_view::{
    ControllerHandle, InvocationId, NavigationSelector, ShellCommand, ViewState, select_views,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "buildview", about = "Follow a build invocation until it settles")]
struct Cli {
    /// Invocation to show
    invocation_id: String,

    /// Server base URL (overrides the config file)
    #[arg(long)]
    server: Option<String>,

    /// Section to focus, e.g. `#targets`, `#log`, `#raw`
    #[arg(long, default_value = "")]
    anchor: String,

    /// Use the dense layout
    #[arg(long)]
    dense: bool,

    /// Print each render plan as JSON
    #[arg(long)]
    json: bool,

    /// Exit once the build has settled instead of waiting for Ctrl+C
    #[arg(long)]
    once: bool,

    /// Alternate config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("buildview=info".parse().unwrap())
                .add_directive("buildview_view=info".parse().unwrap())
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("buildview: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    apply_overrides(&mut cfg, &cli);

    let api = ApiClient::new(&cfg.server.url, cfg.request_timeout())
        .with_context(|| format!("Failed to create client for {}", cfg.server.url))?;
    let nav = NavigationSelector::new(&cli.anchor, cfg.view.dense);
    info!("Watching invocation {} on {}", cli.invocation_id, api.base_url());

    let mut handle = buildview_view::spawn(
        InvocationId::new(cli.invocation_id.clone()),
        api,
        cfg.controller_options(),
    );
    let mut states = handle.subscribe();
    render(&states.borrow_and_update(), &nav, cli.json)?;

    loop {
        tokio::select! {
            Some(command) = handle.next_command() => apply_command(command),
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                render(&state, &nav, cli.json)?;
                if cli.once && state.is_settled() {
                    drain_commands(&mut handle);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn apply_overrides(cfg: &mut ViewerConfig, cli: &Cli) {
    if let Some(server) = &cli.server {
        cfg.server.url = server.clone();
    }
    if cli.dense {
        cfg.view.dense = true;
    }
}

fn apply_command(command: ShellCommand) {
    match command {
        ShellCommand::SetTitle(title) => println!("title: {title}"),
    }
}

fn drain_commands(handle: &mut ControllerHandle) {
    while let Some(command) = handle.try_next_command() {
        apply_command(command);
    }
}

fn render(state: &ViewState, nav: &NavigationSelector, json: bool) -> Result<()> {
    let plan = select_views(state, nav);
    if json {
        println!("{}", serde_json::to_string(&plan)?);
        return Ok(());
    }
    println!("[{}] {} (revision {})", plan.lifecycle, plan.invocation_id, state.revision());
    for view in &plan.views {
        println!("  {view}");
    }
    Ok(())
}
