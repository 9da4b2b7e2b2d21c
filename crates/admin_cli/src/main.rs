use std::{error::Error, io::Write};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{
    Actor, Currency, Difficulty, Engine, EngineError, ExpeditionNew, ExpeditionStatus, MoneyCents,
    Role, SignupCmd, TrailNew,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "trekko_admin")]
#[command(about = "Admin utilities for Trekko (bootstrap users, trails and expeditions)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./trekko.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Trail(Trail),
    Expedition(Expedition),
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
    name: String,
    #[arg(long)]
    email: String,
    /// ADMIN, GUIDE or TREKKER. Admins can only be created here.
    #[arg(long, default_value = "ADMIN", value_parser = parse_role)]
    role: Role,
    #[arg(long)]
    cadastur: Option<String>,
}

#[derive(Args, Debug)]
struct Trail {
    #[command(subcommand)]
    command: TrailCommand,
}

#[derive(Subcommand, Debug)]
enum TrailCommand {
    Create(TrailCreateArgs),
}

#[derive(Args, Debug)]
struct TrailCreateArgs {
    #[arg(long)]
    name: String,
    /// Two-letter state code, e.g. MG.
    #[arg(long)]
    state: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    region: String,
    #[arg(long)]
    distance_meters: i64,
    #[arg(long, default_value_t = 0)]
    elevation_gain_m: i32,
    #[arg(long, default_value = "MODERATE", value_parser = parse_difficulty)]
    difficulty: Difficulty,
    #[arg(long)]
    requires_guide: bool,
    /// Entry fee, e.g. `36,00`.
    #[arg(long)]
    entry_fee: Option<MoneyCents>,
}

#[derive(Args, Debug)]
struct Expedition {
    #[command(subcommand)]
    command: ExpeditionCommand,
}

#[derive(Subcommand, Debug)]
enum ExpeditionCommand {
    Create(ExpeditionCreateArgs),
}

#[derive(Args, Debug)]
struct ExpeditionCreateArgs {
    #[arg(long)]
    trail_id: Uuid,
    #[arg(long)]
    guide_id: Uuid,
    #[arg(long)]
    title: String,
    /// RFC 3339, e.g. `2026-11-01T08:00:00Z`.
    #[arg(long)]
    start: DateTime<Utc>,
    #[arg(long)]
    end: DateTime<Utc>,
    /// Price per person, e.g. `450,00`.
    #[arg(long)]
    price: MoneyCents,
    #[arg(long)]
    max_people: i32,
    #[arg(long, default_value = "BRL", value_parser = parse_currency)]
    currency: Currency,
    #[arg(long)]
    publish: bool,
}

fn parse_role(raw: &str) -> Result<Role, EngineError> {
    Role::try_from(raw)
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, EngineError> {
    Difficulty::try_from(raw)
}

fn parse_currency(raw: &str) -> Result<Currency, EngineError> {
    Currency::try_from(raw)
}

/// The CLI operator acts with admin rights.
fn operator() -> Actor {
    Actor::new(Uuid::nil(), Role::Admin)
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.chars().count() < 8 {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must be at least 8 characters.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            let user = match engine
                .create_user(SignupCmd {
                    name: args.name,
                    email: args.email,
                    password,
                    role: args.role,
                    cadastur: args.cadastur,
                })
                .await
            {
                Ok(user) => user,
                Err(EngineError::ExistingKey(email)) => {
                    eprintln!("user already exists: {email}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };

            println!(
                "created user: {} ({}, {})",
                user.email,
                user.role.as_str(),
                user.id
            );
        }
        Command::Trail(Trail {
            command: TrailCommand::Create(args),
        }) => {
            let trail = engine
                .new_trail(
                    TrailNew {
                        name: args.name,
                        state: args.state,
                        city: args.city,
                        region_or_park: args.region,
                        distance_meters: args.distance_meters,
                        elevation_gain_m: args.elevation_gain_m,
                        difficulty: args.difficulty,
                        requires_guide: args.requires_guide,
                        entry_fee_cents: args.entry_fee.map(MoneyCents::cents),
                        description: None,
                    },
                    &operator(),
                )
                .await?;
            println!("created trail: {} ({})", trail.name, trail.id);
        }
        Command::Expedition(Expedition {
            command: ExpeditionCommand::Create(args),
        }) => {
            let status = if args.publish {
                ExpeditionStatus::Published
            } else {
                ExpeditionStatus::Draft
            };
            let expedition = engine
                .new_expedition(
                    ExpeditionNew {
                        trail_id: args.trail_id,
                        guide_id: Some(args.guide_id),
                        title: args.title,
                        start_date: args.start,
                        end_date: args.end,
                        price_per_person_cents: args.price.cents(),
                        max_people: args.max_people,
                        currency: args.currency,
                        status,
                        description: None,
                    },
                    &operator(),
                )
                .await?;
            println!(
                "created expedition: {} ({}, {} {} per person)",
                expedition.title,
                expedition.id,
                expedition.price_per_person,
                expedition.currency.code()
            );
        }
    }

    Ok(())
}
