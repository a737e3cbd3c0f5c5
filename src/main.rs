use alerter::{LogNotifier, Notifier, TelegramNotifier};
use analytics::{BoundedModelCache, Forecaster};
use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use configuration::{init_logging, load_config_from, Config, LogFormat};
use core_types::{NewReminder, TaxConfig, TaxRecord, UserId};
use dashboard::{DashboardService, DashboardSummary};
use database::{MemoryStore, SnapshotFileStore};
use reminders::ReminderScheduler;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tax::TaxCalculator;
use uuid::Uuid;

/// The main entry point for the BizPilot analytics tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = load_config_from(cli.config.as_deref()).context("loading configuration")?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _log_guard = init_logging(&config.logging)?;

    let app = App::build(&cli, &config).await?;

    // Execute the appropriate command
    let mutated = match cli.command {
        Commands::Summary(args) => app.summary(args).await?,
        Commands::Breakdown(args) => app.breakdown(args).await?,
        Commands::Tax { command } => app.tax(command).await?,
        Commands::TaxConfig { command } => app.tax_config(command).await?,
        Commands::Remind { command } => app.remind(command).await?,
    };

    if mutated {
        if cli.save {
            app.store
                .save(&cli.ledger)
                .await
                .with_context(|| format!("saving {}", cli.ledger.display()))?;
            tracing::info!(path = %cli.ledger.display(), "Snapshot saved.");
        } else {
            tracing::warn!("Changes were not written back; pass --save to keep them.");
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Ledger analytics, tax records and reminders for small businesses.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to an optional `config.toml` in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON snapshot holding the ledger, tax records and reminders.
    #[arg(long, global = true, default_value = "bizpilot.json")]
    ledger: PathBuf,

    /// Write changes made by the command back to the snapshot.
    #[arg(long, global = true)]
    save: bool,

    /// Overrides `logging.format` from the configuration.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Totals, the trailing monthly series, the forecast and the health score.
    Summary(SummaryArgs),
    /// Net amount per category and its share of income.
    Breakdown(UserArgs),
    /// Generate and query tax records.
    Tax {
        #[command(subcommand)]
        command: TaxCommand,
    },
    /// Manage per-year tax rate overrides.
    TaxConfig {
        #[command(subcommand)]
        command: TaxConfigCommand,
    },
    /// Schedule, list and deliver reminders.
    Remind {
        #[command(subcommand)]
        command: RemindCommand,
    },
}

#[derive(Args)]
struct UserArgs {
    #[arg(long)]
    user: UserId,
}

#[derive(Args)]
struct SummaryArgs {
    #[arg(long)]
    user: UserId,

    /// Last month of the window (format: YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Print the summary as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PeriodArgs {
    #[arg(long)]
    user: UserId,
    #[arg(long)]
    year: i32,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: u32,
}

#[derive(Subcommand)]
enum TaxCommand {
    /// Compute the liability for a month from the ledger. Every call adds a record.
    Generate(PeriodArgs),
    /// Show the record for a month.
    Show(PeriodArgs),
    /// Unpaid records due within the given number of days, overdue ones included.
    Due {
        #[arg(long)]
        user: UserId,
        #[arg(long, default_value_t = 30)]
        days: u64,
    },
    /// Mark a record as paid.
    MarkPaid {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        record: Uuid,
    },
}

#[derive(Subcommand)]
enum TaxConfigCommand {
    /// Set the VAT and tax rates for a user and year.
    Set {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        vat_rate: Decimal,
        #[arg(long, default_value_t = Decimal::ZERO)]
        tax_rate: Decimal,
    },
}

#[derive(Subcommand)]
enum RemindCommand {
    /// Schedule a reminder about a related record.
    Schedule {
        #[arg(long)]
        user: UserId,
        /// Kind of record the reminder points at, e.g. "tax".
        #[arg(long, default_value = "tax")]
        related_type: String,
        #[arg(long)]
        related_id: Uuid,
        /// When to fire (RFC 3339, e.g. 2024-06-10T09:00:00Z).
        #[arg(long)]
        at: DateTime<Utc>,
    },
    /// List a user's reminders.
    List(UserArgs),
    /// Deliver due reminders on the configured interval until Ctrl-C.
    ///
    /// Reads the ledger file on every tick and records sent reminders in it
    /// straight away, so `--save` is not needed.
    Run {
        /// Run a single tick and exit.
        #[arg(long)]
        once: bool,
    },
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// The services every command draws from, all backed by one snapshot store.
struct App {
    store: Arc<MemoryStore>,
    dashboard: DashboardService,
    scheduler: Arc<ReminderScheduler>,
    /// Same notifier and interval, over the ledger file instead of the snapshot.
    runner: Arc<ReminderScheduler>,
}

impl App {
    async fn build(cli: &Cli, config: &Config) -> anyhow::Result<Self> {
        let store = Arc::new(
            MemoryStore::open(&cli.ledger)
                .await
                .with_context(|| format!("opening {}", cli.ledger.display()))?,
        );

        let calculator = TaxCalculator::new(store.clone(), config.tax.rates());
        let cache = Arc::new(BoundedModelCache::new(
            config.forecast.cache_capacity,
            config.forecast.cache_max_age,
        ));
        let forecaster = Forecaster::new(config.forecast.min_points).with_cache(cache);
        let dashboard = DashboardService::new(store.clone(), calculator, forecaster)
            .with_window(config.ledger.window_months);

        let notifier: Arc<dyn Notifier> = match TelegramNotifier::new(&config.telegram) {
            Some(telegram) => Arc::new(telegram),
            None => Arc::new(LogNotifier),
        };
        let scheduler = Arc::new(ReminderScheduler::new(
            store.clone(),
            notifier.clone(),
            config.reminders.interval,
        ));
        let runner = Arc::new(ReminderScheduler::new(
            Arc::new(SnapshotFileStore::new(&cli.ledger)),
            notifier,
            config.reminders.interval,
        ));

        Ok(Self {
            store,
            dashboard,
            scheduler,
            runner,
        })
    }

    async fn summary(&self, args: SummaryArgs) -> anyhow::Result<bool> {
        let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
        let summary = self.dashboard.summary(args.user, as_of).await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }
        Ok(false)
    }

    async fn breakdown(&self, args: UserArgs) -> anyhow::Result<bool> {
        let shares = self.dashboard.category_breakdown(args.user).await?;
        let mut table = Table::new();
        table.set_header(vec!["Category", "Amount", "% of income"]);
        for share in shares {
            table.add_row(vec![
                share.category,
                share.amount.to_string(),
                share.percentage.to_string(),
            ]);
        }
        println!("{table}");
        Ok(false)
    }

    async fn tax(&self, command: TaxCommand) -> anyhow::Result<bool> {
        let calculator = self.dashboard.tax();
        match command {
            TaxCommand::Generate(p) => {
                let record = self.dashboard.generate_tax(p.user, p.year, p.month).await?;
                print_records(&[record]);
                Ok(true)
            }
            TaxCommand::Show(p) => {
                let record = calculator.record_for(p.user, p.year, p.month).await?;
                print_records(&[record]);
                Ok(false)
            }
            TaxCommand::Due { user, days } => {
                let today = Utc::now().date_naive();
                let due = calculator.due_within(user, days, today).await?;
                if due.is_empty() {
                    println!("Nothing due within {days} days.");
                } else {
                    print_records(&due);
                }
                Ok(false)
            }
            TaxCommand::MarkPaid { user, record } => {
                let record = calculator.mark_paid(user, record).await?;
                print_records(&[record]);
                Ok(true)
            }
        }
    }

    async fn tax_config(&self, command: TaxConfigCommand) -> anyhow::Result<bool> {
        match command {
            TaxConfigCommand::Set {
                user,
                year,
                vat_rate,
                tax_rate,
            } => {
                let config = self
                    .dashboard
                    .tax()
                    .set_config(TaxConfig {
                        user_id: user,
                        year,
                        vat_rate,
                        tax_rate,
                        thresholds: HashMap::new(),
                    })
                    .await?;
                println!(
                    "User {} in {}: VAT {} / tax {}",
                    config.user_id, config.year, config.vat_rate, config.tax_rate
                );
                Ok(true)
            }
        }
    }

    async fn remind(&self, command: RemindCommand) -> anyhow::Result<bool> {
        match command {
            RemindCommand::Schedule {
                user,
                related_type,
                related_id,
                at,
            } => {
                let reminder = self
                    .scheduler
                    .schedule(NewReminder {
                        user_id: user,
                        related_type,
                        related_id,
                        remind_at: at,
                    })
                    .await?;
                println!("Scheduled reminder {} for {}", reminder.id, reminder.remind_at);
                Ok(true)
            }
            RemindCommand::List(args) => {
                let mut table = Table::new();
                table.set_header(vec!["Id", "Related", "Remind at", "Sent"]);
                for r in self.scheduler.reminders_for(args.user).await? {
                    table.add_row(vec![
                        r.id.to_string(),
                        format!("{} {}", r.related_type, r.related_id),
                        r.remind_at.to_rfc3339(),
                        r.sent.to_string(),
                    ]);
                }
                println!("{table}");
                Ok(false)
            }
            RemindCommand::Run { once } => {
                // The runner has already written every sent flag to the ledger
                // file; saving the startup snapshot over it would undo them.
                if once {
                    let fired = self.runner.run_tick(Utc::now()).await?;
                    println!("Delivered {fired} reminder(s).");
                    return Ok(false);
                }

                let handle = self.runner.clone().spawn();
                tokio::signal::ctrl_c()
                    .await
                    .context("waiting for Ctrl-C")?;
                tracing::info!("Shutdown requested; finishing the current tick.");
                handle.stop().await;
                Ok(false)
            }
        }
    }
}

fn print_summary(summary: &DashboardSummary) {
    let mut totals = Table::new();
    totals.set_header(vec!["Income", "Expense", "Profit", "Tax due", "Health"]);
    totals.add_row(vec![
        summary.totals.income_total.to_string(),
        summary.totals.expense_total.to_string(),
        summary.totals.profit_total.to_string(),
        summary.tax_due.to_string(),
        format!("{}/100", summary.health_score),
    ]);
    println!("{totals}");

    let mut series = Table::new();
    series.set_header(vec!["Month", "Net"]);
    for point in summary.time_series.points() {
        series.add_row(vec![
            format!("{}-{:02}", point.year, point.month),
            point.value.to_string(),
        ]);
    }
    println!("{series}");

    match &summary.forecast {
        Some(forecast) => {
            let last = summary.time_series.points().last();
            let mut table = Table::new();
            table.set_header(vec!["Forecast month", "Net"]);
            for p in &forecast.predictions {
                let label = last
                    .and_then(|l| l.month_start())
                    .and_then(|start| start.checked_add_months(chrono::Months::new(p.month_offset.into())))
                    .map(|d| format!("{}-{:02}", d.year(), d.month()))
                    .unwrap_or_else(|| format!("+{}", p.month_offset));
                table.add_row(vec![label, p.value.round_dp(2).to_string()]);
            }
            println!("{table}");
            println!("Forecast confidence: {}", forecast.confidence.round_dp(2));
        }
        None => println!("Not enough history for a forecast yet."),
    }
}

fn print_records(records: &[TaxRecord]) {
    let mut table = Table::new();
    table.set_header(vec![
        "Id", "Period", "Taxable", "VAT", "Tax", "Payable", "Due", "Paid",
    ]);
    for r in records {
        table.add_row(vec![
            r.id.to_string(),
            format!("{}-{:02}", r.year, r.month),
            r.taxable_amount.to_string(),
            r.vat_amount.to_string(),
            r.tax_amount.to_string(),
            r.payable.to_string(),
            r.due_date.to_string(),
            r.paid.to_string(),
        ]);
    }
    println!("{table}");
}
