//! Headless shell for the live-monitoring client.
//!
//! Drives the same controllers a mobile shell would, reading credentials from
//! the command line and printing notices to the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use livewatch_client::auth::AuthOutcome;
use livewatch_client::auth::token;
use livewatch_client::notice::Notice;
use livewatch_client::push::{PushTokenProvisioner, StaticPushPlatform};
use livewatch_client::streams::{DEFAULT_LIMIT, DEFAULT_PAGE, FetchOutcome, filter_by_status};
use livewatch_client::streams::StreamStatus;
use livewatch_client::{ClientContext, Config};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "livewatch", version, about = "Live-monitoring client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the stored session and where the app would open
    Status,
    /// Sign in, prompting for a one-time code when the account requires it
    Login {
        #[arg(long, env = "LIVEWATCH_USERNAME")]
        username: String,
        #[arg(long, env = "LIVEWATCH_PASSWORD", hide_env_values = true)]
        password: String,
        /// Device push token registered with the login
        #[arg(long, env = "LIVEWATCH_PUSH_TOKEN")]
        push_token: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// List monitoring streams
    Streams {
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
        #[arg(long)]
        active_only: bool,
    },
    /// Record that onboarding has been shown
    Onboarded,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let mut context = ClientContext::new(&config)
        .await
        .context("Failed to initialize client")?;

    let result = run(cli.command, &mut context).await;
    context.database.close().await;
    result
}

async fn run(command: Command, context: &mut ClientContext) -> Result<()> {
    match command {
        Command::Status => {
            let route = context.session.launch_route().await?;
            println!("launch route: {}", route.path());

            match context.session.load().await? {
                Some(session) => {
                    let who = session
                        .profile
                        .as_ref()
                        .map(|p| p.username.as_str())
                        .unwrap_or("unknown user");
                    println!("signed in as {} (role: {})", who, session.role);
                    println!(
                        "token valid for {:.2} more day(s)",
                        token::expiry_in_days(&session.token)
                    );
                }
                None => println!("not signed in"),
            }
        }
        Command::Login {
            username,
            password,
            push_token,
        } => {
            let mut provisioner = PushTokenProvisioner::new(StaticPushPlatform::new(push_token));
            let push_state = provisioner.provision().await.clone();

            let mut outcome = context.auth.login(&username, &password, &push_state).await;
            print_notice(outcome.notice());

            if let AuthOutcome::SecondFactorRequired { .. } = outcome {
                let code = prompt("One-time code: ")?;
                outcome = context.auth.verify_2fa(&code).await;
                print_notice(outcome.notice());
            }

            if let AuthOutcome::SignedIn { route, .. } = &outcome {
                info!(route = route.path(), "Signed in");
            } else {
                anyhow::bail!("Sign-in did not complete");
            }
        }
        Command::Logout => {
            let route = context.auth.logout().await;
            println!("signed out, next screen: {}", route.path());
        }
        Command::Streams {
            page,
            limit,
            active_only,
        } => {
            if let FetchOutcome::Failed { notice } = context.streams.fetch(page, limit).await {
                print_notice(&notice);
                anyhow::bail!("Could not list streams");
            }

            let state = context.streams.snapshot().await;
            let streams = if active_only {
                filter_by_status(&state.streams, StreamStatus::Active)
            } else {
                state.streams
            };

            for stream in &streams {
                let source = stream
                    .video_source
                    .as_ref()
                    .map(|v| v.name.as_str())
                    .unwrap_or("-");
                println!("{:>6}  {:<8}  {}", stream.id, stream.status, source);
            }

            let p = state.pagination;
            println!(
                "page {}/{} ({} total)",
                p.page,
                p.total_pages.max(1),
                p.total
            );
        }
        Command::Onboarded => {
            context.session.mark_onboarding_seen().await?;
            println!("onboarding marked as seen");
        }
    }

    Ok(())
}

fn print_notice(notice: &Notice) {
    if notice.is_error() {
        eprintln!("{}", notice);
    } else {
        println!("{}", notice);
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}
