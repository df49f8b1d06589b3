use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use workload_core::*;
use workload_schema::ProjectAction;
use workload_store::LoadOutcome;

#[derive(Parser)]
#[command(name = "workload", version, about = "workload task allocation")]
struct Cli {
    #[arg(
        long,
        default_value = "~/.workload",
        help = "Config root directory (contains config/, data/ and logs/)"
    )]
    config_root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Render a route through the project guard")]
    Show {
        #[arg(long, default_value = ENTRY_ROUTE, help = "Route to open")]
        route: String,
    },
    #[command(subcommand, about = "Project selection")]
    Project(ProjectCommands),
    #[command(subcommand, about = "Category management")]
    Category(CategoryCommands),
    #[command(about = "Validate config files")]
    Validate,
}

#[derive(Subcommand)]
enum ProjectCommands {
    #[command(about = "Select the active project")]
    Select {
        #[arg(allow_negative_numbers = true, help = "Project ID")]
        id: i64,
    },
    #[command(about = "Close the active project")]
    Close,
}

#[derive(Subcommand)]
enum CategoryCommands {
    #[command(about = "Create a category in the active project")]
    Add {
        #[arg(help = "Category name")]
        name: String,
    },
    #[command(about = "List categories of the active project")]
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    cli.config_root = expand_home(&cli.config_root, std::env::var_os("HOME").map(PathBuf::from));

    let log_dir = cli.config_root.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "workload.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(&cli.config_root.join("config"))?;
    tracing::debug!(
        root = %cli.config_root.display(),
        backend = ?config.storage.backend,
        "config loaded"
    );

    match command {
        Commands::Validate => {
            println!(
                "Config valid. backend={:?}, store_key={}, storage={}",
                config.storage.backend,
                config.store_key,
                config
                    .storage_path(&cli.config_root)
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
        Commands::Show { route } => {
            let mut app = open_app(&config, &cli.config_root, &route).await?;
            print_page(&mut app);
        }
        Commands::Project(cmd) => {
            let mut app = open_app(&config, &cli.config_root, ENTRY_ROUTE).await?;
            let action = match cmd {
                ProjectCommands::Select { id } => ProjectAction::SelectProject { id },
                ProjectCommands::Close => ProjectAction::CloseProject,
            };
            app.context().project_data().dispatch(action).await;
            print_page(&mut app);
        }
        Commands::Category(CategoryCommands::Add { name }) => {
            let mut app = open_app(&config, &cli.config_root, ENTRY_ROUTE).await?;
            match app.add_category(&name).await {
                AddCategoryOutcome::Added => println!("Category '{name}' added."),
                AddCategoryOutcome::Blocked { route } => {
                    println!("Category form unavailable; sent to {route}. Select a project first.")
                }
            }
            print_page(&mut app);
        }
        Commands::Category(CategoryCommands::List) => {
            let mut app = open_app(&config, &cli.config_root, CATEGORIES_ROUTE).await?;
            print_page(&mut app);
        }
    }

    Ok(())
}

/// Replace a leading `~` component with `home`, when there is one.
fn expand_home(path: &Path, home: Option<PathBuf>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

async fn open_app(config: &WorkloadConfig, root: &Path, route: &str) -> Result<App<HistoryRouter>> {
    let (app, outcome) = App::open(config, root, HistoryRouter::new(route)).await?;
    if outcome == LoadOutcome::Malformed {
        eprintln!("Stored project data was unreadable and has been reset.");
    }
    Ok(app)
}

fn print_page(app: &mut App<HistoryRouter>) {
    match app.render_settled() {
        Some(page) => println!("{page}"),
        None => println!("(nothing to show)"),
    }
}
