use std::{error::Error, io::Write, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, PatchKind, scan_patch_dir};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "patchpair_admin")]
#[command(about = "Admin utilities for patchpair (members, patch pool, statistics)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./patchpair.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Patches(Patches),
    Classifications(Classifications),
    /// Print error and timing statistics as JSON.
    Stats(StatsArgs),
    /// Delete every member, patch and classification.
    Reset(ResetArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    Delete(UsernameArgs),
    List,
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    /// Store an already hashed password (PHC string) instead of prompting.
    #[arg(long)]
    password_hash: Option<String>,
}

#[derive(Args, Debug)]
struct UsernameArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Patches {
    #[command(subcommand)]
    command: PatchesCommand,
}

#[derive(Subcommand, Debug)]
enum PatchesCommand {
    /// Load `<dir>/real` and `<dir>/fake` into the pool.
    Load(PatchesLoadArgs),
    Count,
}

#[derive(Args, Debug)]
struct PatchesLoadArgs {
    #[arg(long)]
    dir: PathBuf,
    /// Drop the current pool and every classification first.
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct Classifications {
    #[command(subcommand)]
    command: ClassificationsCommand,
}

#[derive(Subcommand, Debug)]
enum ClassificationsCommand {
    List(ClassificationsListArgs),
    Clear(UsernameArgs),
}

#[derive(Args, Debug)]
struct ClassificationsListArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    csv: bool,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Report a single member instead of the whole cohort.
    #[arg(long)]
    username: Option<String>,
    /// Members left out of the pooled figures, e.g. test accounts.
    #[arg(
        long,
        env = "PATCHPAIR_EXCLUDED_USERS",
        value_delimiter = ','
    )]
    exclude: Vec<String>,
}

#[derive(Args, Debug)]
struct ResetArgs {
    #[arg(long)]
    yes: bool,
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
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
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

/// Print `err` and exit for the failures an operator can act on.
fn exit_on_user_error(err: EngineError) -> Box<dyn Error + Send + Sync> {
    match err {
        EngineError::ExistingKey(name) => {
            eprintln!("user already exists: {name}");
            std::process::exit(1);
        }
        EngineError::KeyNotFound(name) => {
            eprintln!("user not found: {name}");
            std::process::exit(1);
        }
        EngineError::MissingData => {
            eprintln!("username and password must not be empty");
            std::process::exit(2);
        }
        other => other.into(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User { command }) => match command {
            UserCommand::Create(args) => {
                let member = match args.password_hash {
                    Some(hash) => engine.add_member_with_hash(&args.username, &hash).await,
                    None => {
                        let password = prompt_password_twice()?;
                        engine.add_member(&args.username, &password).await
                    }
                }
                .map_err(exit_on_user_error)?;
                println!("created user: {} ({})", member.username, member.id);
            }
            UserCommand::Delete(args) => {
                engine
                    .delete_member(&args.username)
                    .await
                    .map_err(exit_on_user_error)?;
                println!("deleted user: {}", args.username);
            }
            UserCommand::List => {
                for member in engine.members().await? {
                    println!("{}\t{}", member.id, member.username);
                }
            }
        },
        Command::Patches(Patches { command }) => match command {
            PatchesCommand::Load(args) => {
                let real = scan_patch_dir(&args.dir.join(PatchKind::Real.dir()))?;
                let fake = scan_patch_dir(&args.dir.join(PatchKind::Fake.dir()))?;
                for name in real.rejected.iter().chain(&fake.rejected) {
                    eprintln!("skipping unrecognised file: {name}");
                }

                let summary = engine
                    .load_patches(&real.files, &fake.files, args.force)
                    .await?;
                println!(
                    "inserted {} patches, {} already present",
                    summary.inserted, summary.skipped
                );
            }
            PatchesCommand::Count => {
                for kind in [PatchKind::Real, PatchKind::Fake] {
                    println!("{kind}: {}", engine.patch_count(kind).await?);
                }
            }
        },
        Command::Classifications(Classifications { command }) => match command {
            ClassificationsCommand::List(args) => {
                let records = engine
                    .classifications_for(&args.username)
                    .await
                    .map_err(exit_on_user_error)?;
                if args.csv {
                    let mut writer = csv::Writer::from_writer(std::io::stdout());
                    for record in &records {
                        writer.serialize(record)?;
                    }
                    writer.flush()?;
                } else {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                }
            }
            ClassificationsCommand::Clear(args) => {
                let removed = engine
                    .clear_classifications(&args.username)
                    .await
                    .map_err(exit_on_user_error)?;
                println!("removed {removed} classifications of {}", args.username);
            }
        },
        Command::Stats(args) => {
            let output = match args.username {
                Some(username) => {
                    let report = engine
                        .member_statistics(&username)
                        .await
                        .map_err(exit_on_user_error)?;
                    serde_json::to_string_pretty(&report)?
                }
                None => serde_json::to_string_pretty(&engine.statistics(&args.exclude).await?)?,
            };
            println!("{output}");
        }
        Command::Reset(args) => {
            if !args.yes {
                eprintln!("refusing to reset without --yes");
                std::process::exit(2);
            }
            engine.reset().await?;
            println!("database reset");
        }
    }

    Ok(())
}
