use crate::core::export::ExportFormat;
use crate::models::expense::ExpenseCategory;
use crate::models::table::Table;
use crate::models::trip::TripStatus;
use clap::{Parser, Subcommand};

/// Command-line interface definition for fleetlog
/// Offline-first logbook for small trucking fleets, backed by SQLite
#[derive(Parser)]
#[command(
    name = "fleetlog",
    version = env!("CARGO_PKG_VERSION"),
    about = "Offline-first fleet logbook: trips, expenses, vehicles, maintenance and driving hours, synced when online",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init {
        #[arg(long = "owner", help = "Account / driver id that owns new records")]
        owner: Option<String>,
    },

    /// Manage the configuration file (view, check or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Add missing keys to the configuration file")]
        check: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Specify the editor to use (vim, nano, or custom path)")]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Trips
    Trip {
        #[command(subcommand)]
        action: TripAction,
    },

    /// Expenses
    Expense {
        #[command(subcommand)]
        action: ExpenseAction,
    },

    /// Vehicles
    Vehicle {
        #[command(subcommand)]
        action: VehicleAction,
    },

    /// Parts and services bought for a vehicle
    Maintenance {
        #[command(subcommand)]
        action: MaintenanceAction,
    },

    /// Driving / rest timer
    Duty {
        #[command(subcommand)]
        action: DutyAction,
    },

    /// Push pending changes to the remote store
    Sync {
        #[command(subcommand)]
        action: SyncCommand,
    },

    /// Write the whole local store to a single JSON document
    Backup {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long)]
        compress: bool,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Export one table to CSV or JSON
    Export {
        #[arg(long, value_enum)]
        table: Table,

        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum TripAction {
    /// Log a new trip
    Add {
        #[arg(long = "from")]
        origin: String,

        #[arg(long = "to")]
        destination: String,

        #[arg(long = "distance", help = "Distance in km")]
        distance: f64,

        #[arg(long = "price", help = "Agreed freight price")]
        price: f64,

        #[arg(long = "commission", default_value_t = 0.0, help = "Driver commission (%)")]
        commission: f64,

        #[arg(long = "cargo", default_value = "general")]
        cargo: String,

        #[arg(long = "date", help = "Trip date (YYYY-MM-DD, default today)")]
        date: Option<String>,

        #[arg(long = "status", value_enum)]
        status: Option<TripStatus>,

        #[arg(long = "notes")]
        notes: Option<String>,

        #[arg(long = "id", hide = true)]
        id: Option<String>,
    },

    /// List trips (newest first)
    List {
        #[arg(long = "status", value_enum)]
        status: Option<TripStatus>,
    },

    /// Change the status of a trip
    Status {
        id: String,

        #[arg(value_enum)]
        status: TripStatus,
    },

    /// Delete a trip
    Del {
        id: String,

        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ExpenseAction {
    /// Record an expense
    Add {
        #[arg(long = "desc")]
        description: String,

        #[arg(long = "amount")]
        amount: f64,

        #[arg(long = "category", value_enum, default_value = "other")]
        category: ExpenseCategory,

        #[arg(long = "date", help = "Expense date (YYYY-MM-DD, default today)")]
        date: Option<String>,

        #[arg(long = "trip", help = "Trip id this expense belongs to")]
        trip: Option<String>,
    },

    /// List expenses (newest first)
    List {
        #[arg(long = "category", value_enum)]
        category: Option<ExpenseCategory>,

        #[arg(long = "trip")]
        trip: Option<String>,
    },

    /// Delete an expense
    Del {
        id: String,

        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum VehicleAction {
    /// Register a vehicle
    Add {
        #[arg(long = "plate")]
        plate: String,

        #[arg(long = "model")]
        model: String,

        #[arg(long = "year")]
        year: i32,

        #[arg(long = "odometer", default_value_t = 0)]
        odometer: u32,

        #[arg(long = "axles", default_value_t = 2)]
        axles: u8,

        #[arg(long = "cargo", default_value = "general")]
        cargo: String,
    },

    /// List vehicles
    List,

    /// Record a new odometer reading
    Odometer {
        /// Vehicle id or plate
        vehicle: String,

        km: u32,
    },

    /// Delete a vehicle
    Del {
        /// Vehicle id or plate
        vehicle: String,

        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum MaintenanceAction {
    /// Record a part or service
    Add {
        /// Vehicle id or plate
        #[arg(long = "vehicle")]
        vehicle: String,

        #[arg(long = "name")]
        name: String,

        #[arg(long = "odometer", help = "Odometer at purchase (default: vehicle odometer)")]
        odometer: Option<u32>,

        #[arg(long = "warranty", default_value_t = 0, help = "Warranty in months")]
        warranty: u32,

        #[arg(long = "date", help = "Purchase date (YYYY-MM-DD, default today)")]
        date: Option<String>,

        #[arg(long = "cost", default_value_t = 0.0)]
        cost: f64,
    },

    /// List maintenance items
    List {
        /// Vehicle id or plate
        #[arg(long = "vehicle")]
        vehicle: Option<String>,
    },

    /// Delete a maintenance item
    Del {
        id: String,

        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum DutyAction {
    /// Start (or switch to) driving
    Drive,

    /// Start (or switch to) resting
    Rest,

    /// Stop the timer (back to idle)
    Stop,

    /// Show the current mode, elapsed time and today's totals
    Status,

    /// Keep refreshing the timer and fire alerts when thresholds are crossed
    Watch {
        #[arg(long = "interval", default_value_t = 1, help = "Refresh interval in seconds")]
        interval: u64,

        #[arg(long = "ticks", help = "Stop after N refreshes")]
        ticks: Option<u64>,
    },

    /// List duty logs
    List {
        #[arg(long = "date", help = "YYYY-MM-DD or 'today' (default: all)")]
        date: Option<String>,
    },

    /// Delete duty logs (all, or one date). Other data is not touched.
    Clear {
        #[arg(long = "date", help = "YYYY-MM-DD or 'today' (default: all)")]
        date: Option<String>,

        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SyncCommand {
    /// Run one reconciliation pass
    Run {
        #[arg(long = "force", help = "Retry entries still waiting for their backoff")]
        force: bool,

        #[arg(long = "dry-run", help = "Drain into an in-memory remote, leave the DB untouched")]
        dry_run: bool,
    },

    /// Show pending queue entries
    Status,

    /// Run reconciliation passes periodically
    Watch {
        #[arg(long = "interval", help = "Seconds between passes (default from config)")]
        interval: Option<u64>,

        #[arg(long = "passes", help = "Stop after N passes")]
        passes: Option<u64>,
    },
}
