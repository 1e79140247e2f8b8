//! viewstack - runtime view-stack manager for game UI layers
//!
//! Command line front end: validates view tables and runs headless demo
//! sessions against the recording host.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use viewstack::config::validator::{self, ValidationSeverity};
use viewstack::headless::HeadlessHost;
use viewstack::{
    AnimationGroup, MessageChannel, RequestId, View, ViewConfigRegistry, ViewId, ViewManager,
    ViewTable, ViewTypes,
};

#[derive(Parser)]
#[command(name = "viewstack")]
#[command(about = "Runtime view-stack manager for game UI layers", long_about = None)]
struct Cli {
    /// Log to stderr instead of viewstack.log
    #[arg(long, global = true)]
    log_stderr: bool,

    /// Custom data directory (default: ~/.viewstack)
    /// Can also be set via VIEWSTACK_DIR environment variable
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a view table
    Validate {
        /// Table to validate (default: the table in the data directory)
        #[arg(value_name = "FILE")]
        table: Option<PathBuf>,
    },
    /// Show and close views against a headless host, printing a timeline
    Demo {
        /// Table to load (default: the table in the data directory)
        #[arg(long, value_name = "FILE")]
        table: Option<PathBuf>,

        /// View to show, by name; repeatable (default: every view in the table)
        #[arg(long = "show", value_name = "NAME")]
        show: Vec<String>,

        /// Show/close animation length reported by the headless host
        #[arg(long, value_name = "MS", default_value_t = 250)]
        anim_ms: u64,
    },
    /// Write the default view table to the data directory
    InitConfig,
}

// Demo behaviors for the bindings in the default table

struct DemoStart;
struct DemoLoading;
struct DemoSettings;
struct DemoShop;

impl View for DemoStart {
    type Args = ();
    fn create(_: ()) -> Self {
        DemoStart
    }
}

impl View for DemoLoading {
    type Args = ();
    fn create(_: ()) -> Self {
        DemoLoading
    }
}

impl View for DemoSettings {
    type Args = ();
    fn create(_: ()) -> Self {
        DemoSettings
    }
}

impl View for DemoShop {
    type Args = ();
    fn create(_: ()) -> Self {
        DemoShop
    }

    fn on_shown(&mut self) {
        tracing::debug!("Shop is open for business");
    }
}

fn demo_types() -> ViewTypes {
    ViewTypes::new()
        .with::<DemoStart>("Game.ViewStart")
        .with::<DemoLoading>("Game.ViewLoading")
        .with::<DemoSettings>("Game.ViewSettings")
        .with::<DemoShop>("Game.ViewShop")
}

fn show_by_binding<F>(manager: &mut ViewManager, class_binding: &str, done: F) -> Result<RequestId>
where
    F: FnOnce(ViewId) + Send + 'static,
{
    let request = match class_binding {
        "Game.ViewStart" => manager.show_async::<DemoStart, _>((), move |h| done(h.id())),
        "Game.ViewLoading" => manager.show_async::<DemoLoading, _>((), move |h| done(h.id())),
        "Game.ViewSettings" => manager.show_async::<DemoSettings, _>((), move |h| done(h.id())),
        "Game.ViewShop" => manager.show_async::<DemoShop, _>((), move |h| done(h.id())),
        other => bail!("No demo view type is bound to '{}'", other),
    }?;
    Ok(request)
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

fn load_table(path: Option<&PathBuf>) -> Result<ViewTable> {
    match path {
        Some(path) => ViewTable::load_from_file(path),
        None => ViewTable::load(),
    }
}

fn run_validate(table: Option<PathBuf>) -> Result<()> {
    match &table {
        Some(path) => println!("Validating view table: {:?}", path),
        None => println!("Validating default view table"),
    }

    let table = match load_table(table.as_ref()) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("✗ Failed to load view table: {:#}", e);
            std::process::exit(1);
        }
    };
    println!("✓ View table loaded successfully");
    println!("  {} views defined", table.views.len());

    let result = validator::validate_table(&table);
    for issue in &result.issues {
        match issue.severity() {
            ValidationSeverity::Error => eprintln!("✗ Error: {}", issue.message()),
            ValidationSeverity::Warning => eprintln!("⚠ Warning: {}", issue.message()),
        }
    }

    if result.issues.is_empty() {
        println!("✓ View table is valid with no issues");
    } else {
        let errors = result.errors().len();
        let warnings = result.warnings().len();
        if errors > 0 {
            eprintln!("\n✗ Found {} error(s)", errors);
        }
        if warnings > 0 {
            println!("⚠ Found {} warning(s)", warnings);
        }
    }

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_demo(table: ViewTable, show: Vec<String>, anim: Duration) -> Result<()> {
    let types = demo_types();
    let check = validator::validate_against_bindings(&table, types.class_bindings());
    for issue in check.warnings() {
        println!("⚠ {}", issue.message());
    }

    let registry = ViewConfigRegistry::load(&table.views, &types);

    let host = HeadlessHost::new();
    host.set_default_latency(Duration::from_millis(50));
    for entry in &table.views {
        host.set_animation(&entry.asset_path, AnimationGroup::SHOW, anim);
        host.set_animation(&entry.asset_path, AnimationGroup::CLOSE, anim);
    }
    host.set_message_animation(MessageChannel::Positive, anim * 2);

    let mut manager = ViewManager::init(
        table.manager.clone(),
        registry,
        host.clone(),
        host.clone(),
        host.clone(),
    )
    .await
    .context("Failed to start view manager")?;
    println!("[{}] root {} ready", timestamp(), manager.root());

    manager.observe(|notice| {
        println!(
            "[{}] {} '{}' {}",
            timestamp(),
            notice.id,
            notice.view_name,
            notice.event.as_str()
        );
    });

    let names: Vec<String> = if show.is_empty() {
        table.views.iter().map(|v| v.view_name.clone()).collect()
    } else {
        show
    };

    let opened = Arc::new(Mutex::new(Vec::new()));
    for name in &names {
        let entry = table
            .find(name)
            .with_context(|| format!("No view named '{}' in the table", name))?;
        let sink = Arc::clone(&opened);
        let request = show_by_binding(&mut manager, &entry.class_binding, move |id| {
            if let Ok(mut ids) = sink.lock() {
                ids.push(id);
            }
        })?;
        println!("[{}] requested '{}' ({})", timestamp(), name, request);
    }

    manager.run_until_idle().await;

    for summary in manager.summaries() {
        println!(
            "[{}]   {} '{}' {:?} ({})",
            timestamp(),
            summary.id,
            summary.view_name,
            summary.state,
            summary.type_name
        );
    }

    let text = format!("{} views open", manager.live_view_count());
    manager.positive_message(&text);
    println!("[{}] message: {}", timestamp(), text);
    manager.run_until_idle().await;
    println!("[{}] message hidden", timestamp());

    let ids: Vec<ViewId> = match opened.lock() {
        Ok(ids) => ids.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    for id in ids.into_iter().rev() {
        manager.close_view(id)?;
    }
    manager.run_until_idle().await;

    println!(
        "[{}] done: {} live views, {} input blocker toggles",
        timestamp(),
        manager.live_view_count(),
        host.blocker_toggles().len()
    );
    manager.shutdown();
    Ok(())
}

fn init_logging(to_stderr: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("viewstack.log")
            .context("Failed to open viewstack.log")?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(log_file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_stderr)?;

    if let Some(data_dir) = &cli.data_dir {
        std::env::set_var("VIEWSTACK_DIR", data_dir);
        tracing::info!("Using custom data directory: {:?}", data_dir);
    } else if let Ok(env_dir) = std::env::var("VIEWSTACK_DIR") {
        tracing::info!("Using data directory from VIEWSTACK_DIR: {}", env_dir);
    }

    match cli.command {
        Commands::Validate { table } => run_validate(table),
        Commands::Demo {
            table,
            show,
            anim_ms,
        } => {
            let table = load_table(table.as_ref())?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_demo(table, show, Duration::from_millis(anim_ms)))
        }
        Commands::InitConfig => {
            let path = ViewTable::extract_defaults()?;
            println!("View table: {}", path.display());
            Ok(())
        }
    }
}
