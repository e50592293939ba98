//! Command-line host for the reminder core.
//!
//! # Responsibility
//! - Drive save/list/clear/sync through `ReminderService` against a local DB.
//! - Simulate platform transitions with the in-memory geofencing provider.
//!
//! Geofences registered here live only as long as the process, so `trigger`
//! resyncs before it delivers anything.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use georemind_core::{
    init_logging_from_config, parse_location_capability, transition_channel, CoreConfig,
    GeofencePolicy, GeofenceReconciler, InMemoryGeofencingProvider, LocalReminderRepository,
    LocationCapability, ReconcileOutcome, RecordingNotificationEmitter, RegistrationOutcome,
    Reminder, ReminderService, SaveDecision, SqliteReminderStore, StaticLocationAccess,
    TransitionKind, TransitionProcessor,
};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// GeoRemind: location-triggered reminders
#[derive(Parser, Debug)]
#[command(name = "georemind")]
#[command(about = "Location-triggered reminders", long_about = None)]
struct Cli {
    /// TOML config file (missing files fall back to defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides `storage.db_path`
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Location capabilities treated as granted
    #[arg(
        long = "grant",
        global = true,
        value_delimiter = ',',
        value_parser = parse_location_capability,
        default_values = ["foreground", "background"]
    )]
    grants: Vec<LocationCapability>,

    /// Treat device location services as switched off
    #[arg(long, global = true)]
    location_off: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save a reminder and register its geofence
    Add(AddArgs),
    /// List saved reminders
    List,
    /// Delete every reminder and its geofence
    Clear,
    /// Register geofences for every eligible reminder
    Sync,
    /// Simulate the platform reporting a transition
    Trigger(TriggerArgs),
    /// Print core linkage info
    Version,
}

#[derive(Parser, Debug)]
struct AddArgs {
    #[arg(long)]
    title: String,

    #[arg(long)]
    description: Option<String>,

    /// Free-text location label; `lat,lon` labels are geofenced directly
    #[arg(long)]
    location: Option<String>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Explicit reminder id (generated when omitted)
    #[arg(long)]
    id: Option<String>,
}

#[derive(Parser, Debug)]
struct TriggerArgs {
    /// Reminder ids whose regions were crossed
    #[arg(required = true, num_args = 1..)]
    region_ids: Vec<String>,

    /// Transition kind: enter, exit or dwell
    #[arg(long, default_value = "enter")]
    kind: TransitionKind,
}

struct App {
    repository: Arc<LocalReminderRepository>,
    access: Arc<StaticLocationAccess>,
    policy: GeofencePolicy,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let mut config = CoreConfig::load(cli.config.as_deref())?;
        if let Some(db) = &cli.db {
            config.storage.db_path = db.clone();
        }

        if init_logging_from_config(&config.logging).map_err(|err| anyhow!(err))? {
            info!("event=cli_start module=cli status=ok");
        }

        let policy = GeofencePolicy::from_config(&config.geofence)?;
        let store = SqliteReminderStore::open(&config.storage.db_path).with_context(|| {
            format!(
                "Failed to open reminder database `{}`",
                config.storage.db_path.display()
            )
        })?;

        let mut access = StaticLocationAccess::new(cli.grants.iter().copied());
        if cli.location_off {
            access = access.location_disabled();
        }

        Ok(Self {
            repository: Arc::new(LocalReminderRepository::new(Arc::new(store))),
            access: Arc::new(access),
            policy,
        })
    }

    fn reconciler(&self, provider: Arc<InMemoryGeofencingProvider>) -> Arc<GeofenceReconciler> {
        Arc::new(GeofenceReconciler::new(
            self.repository.clone(),
            provider,
            self.access.clone(),
            self.policy.clone(),
        ))
    }

    fn service(&self, provider: Arc<InMemoryGeofencingProvider>) -> ReminderService {
        ReminderService::new(self.repository.clone(), self.reconciler(provider))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("georemind_core ping={}", georemind_core::ping());
        println!("georemind_core version={}", georemind_core::core_version());
        return Ok(());
    }

    let app = App::new(&cli)?;
    match &cli.command {
        Commands::Add(args) => add(&app, args).await,
        Commands::List => list(&app).await,
        Commands::Clear => clear(&app).await,
        Commands::Sync => sync(&app).await,
        Commands::Trigger(args) => trigger(&app, args).await,
        Commands::Version => Ok(()),
    }
}

async fn add(app: &App, args: &AddArgs) -> Result<()> {
    let mut reminder = match &args.id {
        Some(id) => Reminder::with_id(id.clone(), args.title.clone()),
        None => Reminder::new(args.title.clone()),
    };
    reminder.description = args.description.clone();
    reminder.location_label = args.location.clone();
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        reminder = reminder.at(lat, lon);
    }

    let service = app.service(Arc::new(InMemoryGeofencingProvider::new()));
    match service.validate_and_save(reminder).await? {
        SaveDecision::Saved {
            reminder_id,
            geofence,
        } => {
            println!("saved {reminder_id}");
            match geofence {
                RegistrationOutcome::Registered { region_id } => {
                    println!("geofence registered for {region_id}")
                }
                RegistrationOutcome::Declined(reason) => {
                    println!("geofence skipped: {}", reason.reason_code())
                }
                RegistrationOutcome::ProviderFailed(err) => println!("geofence failed: {err}"),
                RegistrationOutcome::Skipped { missing } => {
                    println!("geofence skipped: missing {}", capability_list(&missing))
                }
            }
            Ok(())
        }
        SaveDecision::Declined(reason) => Err(anyhow!("{} ({})", reason, reason.reason_code())),
    }
}

async fn list(app: &App) -> Result<()> {
    let service = app.service(Arc::new(InMemoryGeofencingProvider::new()));
    let listing = service.list_reminders().await.into_result().map_err(|err| anyhow!(err))?;

    if listing.show_no_data {
        println!("No reminders yet");
        return Ok(());
    }
    for reminder in &listing.items {
        let location = match reminder.coordinates() {
            Ok(point) => point.to_string(),
            Err(reason) => reason.reason_code().to_string(),
        };
        println!(
            "{}\t{}\t{}",
            reminder.id,
            reminder.display_title().unwrap_or("-"),
            location
        );
    }
    Ok(())
}

async fn clear(app: &App) -> Result<()> {
    let service = app.service(Arc::new(InMemoryGeofencingProvider::new()));
    let outcome = service.delete_all_reminders().await?;
    println!("deleted all reminders");
    print_reconcile(&outcome);
    Ok(())
}

async fn sync(app: &App) -> Result<()> {
    let service = app.service(Arc::new(InMemoryGeofencingProvider::new()));
    let outcome = service.sync_geofences().await;
    print_reconcile(&outcome);
    Ok(())
}

async fn trigger(app: &App, args: &TriggerArgs) -> Result<()> {
    let emitter = Arc::new(RecordingNotificationEmitter::new());
    let (sender, inbox) = transition_channel();
    let worker = inbox.spawn(TransitionProcessor::new(
        app.repository.clone(),
        emitter.clone(),
    ));

    {
        let provider = Arc::new(InMemoryGeofencingProvider::with_callback(sender));
        let reconciler = app.reconciler(provider.clone());
        print_reconcile(&reconciler.setup_all_geofences().await);

        let ids: Vec<&str> = args.region_ids.iter().map(String::as_str).collect();
        let sent = provider.deliver(args.kind, &ids).await?;
        println!(
            "delivered {} of {} region(s) as {}",
            sent,
            ids.len(),
            args.kind.as_str()
        );
    }

    let stats = worker.await.context("Transition worker stopped unexpectedly")?;
    for notification in emitter.visible().await {
        println!(
            "notification {} [{}] {}: {} -> {}",
            notification.notification_id,
            notification.channel_id,
            notification.title,
            notification.body,
            notification.deep_link
        );
    }
    println!(
        "events={} delivered={} dropped={} ignored={}",
        stats.events, stats.delivered, stats.dropped, stats.ignored
    );
    Ok(())
}

fn print_reconcile(outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Skipped { missing } => {
            println!("sync skipped: missing {}", capability_list(missing))
        }
        ReconcileOutcome::ReadFailed { message } => println!("sync failed: {message}"),
        ReconcileOutcome::Completed(summary) => {
            println!(
                "sync registered={} skipped={} removed={}",
                summary.registered.len(),
                summary.skipped.len(),
                summary.removed.len()
            );
            for skipped in &summary.skipped {
                println!("  skipped {}: {}", skipped.reminder_id, skipped.reason.reason_code());
            }
            if let Some(err) = &summary.register_error {
                println!("  register failed: {err}");
            }
            if let Some(err) = &summary.remove_error {
                println!("  remove failed: {err}");
            }
        }
    }
}

fn capability_list(missing: &[LocationCapability]) -> String {
    missing
        .iter()
        .map(|capability| capability.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
