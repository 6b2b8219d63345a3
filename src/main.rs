use clap::{Args, Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, process::ExitCode, sync::Arc, time::Duration};
use tokio::fs;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};
use vote_widget::{
    AppState, Connect, Container, FileFlagStore, HttpCounterClient, HttpFetcher, Page, ScriptLoader,
    ServerConfig, StoreConfig, VoteOutcome, WidgetConfig, WidgetController, format_count,
    load_store, router,
    view::{LogNotifier, VOTE_TEXT_ATTR, VOTED_TEXT_ATTR},
};

#[derive(Parser)]
#[command(name = "vote_widget")]
#[command(about = "One vote per profile, counted live in a shared store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the shared counter store and the demo page
    Serve,
    /// Cast this profile's vote and show the widget
    Vote(WidgetArgs),
    /// Show the widget without voting
    Status(WidgetArgs),
}

#[derive(Args)]
struct WidgetArgs {
    /// Base URL of the counter store
    #[arg(long, env = "VOTE_WIDGET_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,

    /// File keeping this profile's flags
    #[arg(long, default_value = ".vote_widget/flags.json")]
    flags: PathBuf,

    /// Count votes only
    #[arg(long)]
    no_visitors: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    match Cli::parse().command {
        Command::Serve => serve(ServerConfig::from_env()).await,
        Command::Vote(args) => run_widget(args, true).await,
        Command::Status(args) => run_widget(args, false).await,
    }
}

async fn serve(config: ServerConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if let Some(parent) = config.data_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let counters = load_store(&config.data_path).await;
    let state = AppState::new(config.data_path, counters, config.watch_timeout);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(ExitCode::SUCCESS)
}

async fn run_widget(args: WidgetArgs, vote: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store_config = StoreConfig::new(args.server);
    let widget_config = if args.no_visitors {
        WidgetConfig::votes_only()
    } else {
        WidgetConfig::default()
    };

    let page = Page::new(
        Container::widget(widget_config.track_visitors)
            .with_attribute(VOTE_TEXT_ATTR, "Vote for this project")
            .with_attribute(VOTED_TEXT_ATTR, "Thanks for voting!"),
    );
    let loader = ScriptLoader::new(store_config.resources(), HttpFetcher::default());
    let connect_config = store_config.clone();
    let connect: Connect<HttpCounterClient> =
        Box::new(move || HttpCounterClient::connect(connect_config.clone()));
    let widget = WidgetController::new(
        widget_config,
        Arc::new(FileFlagStore::open(args.flags)),
        loader,
        connect,
        page.clone(),
        Arc::new(LogNotifier),
    );

    if let Err(err) = widget.init().await {
        error!("widget unavailable: {err}");
        print_page(&page);
        return Ok(ExitCode::FAILURE);
    }

    let mut code = ExitCode::SUCCESS;
    if vote {
        match widget.cast_vote().await {
            Ok(VoteOutcome::Counted(total)) => println!("vote counted, {} votes", format_count(total)),
            Ok(VoteOutcome::Ignored) => println!("already voted from this profile"),
            Err(err) => {
                eprintln!("vote failed: {err}");
                code = ExitCode::FAILURE;
            }
        }
    }

    // first live values arrive on their own tasks
    tokio::time::sleep(Duration::from_millis(300)).await;
    print_page(&page);
    widget.dispose();
    Ok(code)
}

fn print_page(page: &Page) {
    if let Some(container) = page.snapshot() {
        println!("{}", container.to_html());
    }
}
