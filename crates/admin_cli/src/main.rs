use std::error::Error;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use ledger::{
    Currency, Ledger, OpenShiftCmd, RATE_SCALE, ReportFilter, ReportRange, Role,
    SetExchangeRateCmd,
};
use migration::MigratorTrait;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "kassa_admin")]
#[command(about = "Admin utilities for Kassa (bootstrap users/drawers, rates, reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL` or
    /// `settings.toml`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Drawer(Drawer),
    Shift(Shift),
    Rate(Rate),
    Report(Report),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    display_name: String,
    /// `cashier` or `manager`.
    #[arg(long, default_value = "cashier")]
    role: String,
}

#[derive(Args, Debug)]
struct Drawer {
    #[command(subcommand)]
    command: DrawerCommand,
}

#[derive(Subcommand, Debug)]
enum DrawerCommand {
    Create(DrawerCreateArgs),
    Activate(DrawerIdArgs),
    Deactivate(DrawerIdArgs),
    List,
    Balance(DrawerIdArgs),
}

#[derive(Args, Debug)]
struct DrawerCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    location: String,
}

#[derive(Args, Debug)]
struct DrawerIdArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Shift {
    #[command(subcommand)]
    command: ShiftCommand,
}

#[derive(Subcommand, Debug)]
enum ShiftCommand {
    /// Open a shift with carry-forward opening balances.
    Open(ShiftOpenArgs),
    /// Show a shift's live balances.
    Balances(ShiftIdArgs),
}

#[derive(Args, Debug)]
struct ShiftOpenArgs {
    #[arg(long)]
    drawer_id: Uuid,
    #[arg(long)]
    cashier: String,
    /// Accept carry-forward amounts whose source shift was flagged.
    #[arg(long)]
    accept_flagged: bool,
}

#[derive(Args, Debug)]
struct ShiftIdArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Rate {
    #[command(subcommand)]
    command: RateCommand,
}

#[derive(Subcommand, Debug)]
enum RateCommand {
    Set(RateSetArgs),
}

#[derive(Args, Debug)]
struct RateSetArgs {
    #[arg(long)]
    base: String,
    #[arg(long)]
    quote: String,
    /// Quote units per base unit, decimal (e.g. `12650.25`).
    #[arg(long)]
    rate: String,
    /// RFC 3339 timestamp; defaults to now.
    #[arg(long)]
    effective_from: Option<String>,
    /// RFC 3339 timestamp.
    #[arg(long)]
    expires_at: Option<String>,
}

#[derive(Args, Debug)]
struct Report {
    /// Calling manager's username.
    #[arg(long)]
    caller: String,
    /// RFC 3339 start of the window (inclusive).
    #[arg(long)]
    from: String,
    /// RFC 3339 end of the window (exclusive).
    #[arg(long)]
    to: String,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    currency: Option<String>,
    #[arg(long)]
    report_currency: Option<String>,

    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    Financial,
    Discrepancy,
    Executive,
    Exchange,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, Box<dyn Error + Send + Sync>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

fn parse_currency(raw: &str) -> Result<Currency, Box<dyn Error + Send + Sync>> {
    Currency::try_from(raw).map_err(|err| err.to_string().into())
}

/// Parse a decimal rate (quote per base) into micro-units without going
/// through floating point.
fn parse_rate_micros(raw: &str) -> Result<i64, Box<dyn Error + Send + Sync>> {
    let trimmed = raw.trim();
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (trimmed, ""),
    };
    if int_part.is_empty()
        || frac_part.len() > 6
        || !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(format!("invalid rate: {raw}").into());
    }

    let int_value: i64 = int_part.parse()?;
    let mut frac = frac_part.to_string();
    while frac.len() < 6 {
        frac.push('0');
    }
    let frac_value: i64 = frac.parse()?;

    int_value
        .checked_mul(RATE_SCALE)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| format!("rate too large: {raw}").into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("database ready: {database_url}");
    Ok(db)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::load()?;

    let level = settings.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(format!("kassa_admin={level},ledger={level}"))
        .init();

    let database_url = cli
        .database_url
        .or(settings.database_url)
        .unwrap_or_else(|| "sqlite:./kassa.db?mode=rwc".to_string());
    let db = connect_db(&database_url).await?;

    let mut builder = Ledger::builder().database(db);
    if let Some(tolerance) = settings.discrepancy_tolerance_minor {
        builder = builder.discrepancy_tolerance_minor(tolerance);
    }
    let ledger = builder.build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let role = match args.role.as_str() {
                "cashier" => Role::Cashier,
                "manager" => Role::Manager,
                other => {
                    eprintln!("unsupported role: {other}");
                    std::process::exit(2);
                }
            };
            ledger
                .create_user(&args.username, &args.display_name, role, Utc::now())
                .await?;
            println!("created user: {}", args.username);
        }
        Command::Drawer(Drawer { command }) => match command {
            DrawerCommand::Create(args) => {
                let id = ledger
                    .create_drawer(&args.name, &args.location, Utc::now())
                    .await?;
                println!("created drawer: {} ({id})", args.name);
            }
            DrawerCommand::Activate(args) => {
                ledger.set_drawer_active(args.id, true).await?;
                println!("activated drawer: {}", args.id);
            }
            DrawerCommand::Deactivate(args) => {
                ledger.set_drawer_active(args.id, false).await?;
                println!("deactivated drawer: {}", args.id);
            }
            DrawerCommand::List => {
                let drawers = ledger.list_active_drawers().await?;
                print_json(&drawers)?;
            }
            DrawerCommand::Balance(args) => {
                let balances = ledger.drawer_balance(args.id).await?;
                print_json(&balances)?;
            }
        },
        Command::Shift(Shift { command }) => match command {
            ShiftCommand::Open(args) => {
                let mut cmd = OpenShiftCmd::new(args.drawer_id, args.cashier, Utc::now());
                if args.accept_flagged {
                    cmd = cmd.accept_flagged_carry_forward();
                }
                let shift_id = ledger.open_shift(cmd).await?;
                println!("opened shift: {shift_id}");
            }
            ShiftCommand::Balances(args) => {
                let balances = ledger.live_balances(args.id).await?;
                print_json(&balances)?;
            }
        },
        Command::Rate(Rate {
            command: RateCommand::Set(args),
        }) => {
            let effective_from = match args.effective_from.as_deref() {
                Some(raw) => parse_timestamp(raw)?,
                None => Utc::now(),
            };
            let mut cmd = SetExchangeRateCmd::new(
                parse_currency(&args.base)?,
                parse_currency(&args.quote)?,
                parse_rate_micros(&args.rate)?,
                effective_from,
            );
            if let Some(raw) = args.expires_at.as_deref() {
                cmd = cmd.expires_at(parse_timestamp(raw)?);
            }
            let id = ledger.set_exchange_rate(cmd).await?;
            println!("recorded rate: {id}");
        }
        Command::Report(report) => {
            let range = ReportRange::new(
                parse_timestamp(&report.from)?,
                parse_timestamp(&report.to)?,
            )?;
            let mut filter = ReportFilter::default();
            if let Some(location) = report.location.clone() {
                filter = filter.location(location);
            }
            if let Some(raw) = report.currency.as_deref() {
                filter = filter.currency(parse_currency(raw)?);
            }
            if let Some(raw) = report.report_currency.as_deref() {
                filter = filter.report_currency(parse_currency(raw)?);
            }

            match report.command {
                ReportCommand::Financial => {
                    let summary = ledger
                        .financial_summary(&report.caller, range, &filter)
                        .await?;
                    print_json(&summary)?;
                }
                ReportCommand::Discrepancy => {
                    let summary = ledger
                        .discrepancy_report(&report.caller, range, &filter)
                        .await?;
                    print_json(&summary)?;
                }
                ReportCommand::Executive => {
                    let summary = ledger
                        .executive_summary(&report.caller, range, &filter)
                        .await?;
                    print_json(&summary)?;
                }
                ReportCommand::Exchange => {
                    let summary = ledger
                        .exchange_summary(&report.caller, range, &filter)
                        .await?;
                    print_json(&summary)?;
                }
            }
        }
    }

    Ok(())
}
