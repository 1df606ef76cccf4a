//! foundry-agents CLI entry point

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use futures_util::StreamExt;
use tracing_subscriber::EnvFilter;

use foundry_agents::agent::{AgentContext, AgentProfile, Chunk, FoundryAgent};
use foundry_agents::config::{self, Config};
use foundry_agents::profiles::{EmailProfile, SmsProfile};
use foundry_agents::ui;

#[derive(Parser)]
#[command(name = "foundry-agents")]
#[command(about = "Email and SMS agents on a hosted agent platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Show which settings are configured
    Status,

    /// Chat with an agent
    Chat {
        /// Agent to talk to
        #[arg(short, long, value_enum, default_value_t = AgentKind::Email)]
        agent: AgentKind,

        /// Message to send; starts an interactive session when omitted
        #[arg(short, long)]
        message: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AgentKind {
    Email,
    Sms,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Second Ctrl+C within 3 seconds exits
    let exit_flag = Arc::new(AtomicBool::new(false));
    let r = exit_flag.clone();

    ctrlc::set_handler(move || {
        if r.load(Ordering::SeqCst) {
            println!("\n👋 Bye!");
            std::process::exit(0);
        } else {
            println!("\n⚠️  Press Ctrl+C again to exit");
            r.store(true, Ordering::SeqCst);

            let r2 = r.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_secs(3));
                r2.store(false, Ordering::SeqCst);
            });
        }
    })
    .ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let path = config::init()?;
            ui::print_success(&format!("Configuration at {}", path.display()));
            println!("\nNext steps:");
            println!("  1. Set the project endpoint and token in the file or via");
            println!("     AZURE_AI_FOUNDRY_PROJECT_ENDPOINT / AZURE_AI_FOUNDRY_ACCESS_TOKEN");
            println!("  2. Chat: foundry-agents chat --agent email");
        }

        Commands::Status => print_status(&config::read()?),

        Commands::Chat { agent, message } => {
            let config = config::load()?;
            let ctx = AgentContext::new(config);

            match agent {
                AgentKind::Email => {
                    let profile = EmailProfile::new(ctx.config().email.clone());
                    chat(FoundryAgent::new(ctx, profile), message).await?;
                }
                AgentKind::Sms => {
                    let profile = SmsProfile::new(ctx.config().twilio.clone());
                    chat(FoundryAgent::new(ctx, profile), message).await?;
                }
            }
        }
    }

    Ok(())
}

fn print_status(config: &Config) {
    println!("{}\n", "Foundry Agents Status".bold());
    ui::print_setting("Config file", &config::config_path().display().to_string());
    ui::print_setting("Project endpoint", &config.foundry.endpoint);
    ui::print_setting("Access token", &ui::mask(&config.foundry.access_token));
    ui::print_setting("Model", &config.foundry.model);
    ui::print_setting("Documents", &config.documents_dir.display().to_string());

    println!();
    let missing = config.twilio.missing();
    if missing.is_empty() {
        ui::print_success("SMS agent ready");
    } else {
        ui::print_warning(&format!("SMS agent needs {}", missing.join(", ")));
    }
    ui::print_setting("Default SMS recipient", &config.twilio.default_to_number);

    if config.email.access_token.is_empty() || config.email.sender_address.is_empty() {
        ui::print_warning("Email sending needs GRAPH_ACCESS_TOKEN and EMAIL_SENDER_ADDRESS");
    } else {
        ui::print_success(&format!("Email sender {}", config.email.sender_address));
    }
}

async fn chat<P: AgentProfile>(agent: FoundryAgent<P>, message: Option<String>) -> Result<()> {
    let remote = agent.create_agent().await?;
    ui::print_header(agent.profile().name(), &agent.context().config().foundry.model);
    ui::print_step(&format!("Agent {}", remote.id));

    let thread = agent.create_thread().await?;

    if let Some(msg) = message {
        ask(&agent, &thread, &msg).await;
    } else {
        ui::print_step("Interactive mode (type 'exit' to quit)\n");
        loop {
            print!("{}: ", "You".blue().bold());
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                println!("👋 Bye!");
                break;
            }
            if input.is_empty() {
                continue;
            }

            ask(&agent, &thread, input).await;
        }
    }

    if let Some(usage) = agent.last_usage() {
        ui::print_step(&format!(
            "Tokens: {} prompt, {} completion, {} total",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        ));
    }
    agent.cleanup();
    Ok(())
}

async fn ask<P: AgentProfile>(agent: &FoundryAgent<P>, thread: &str, message: &str) {
    let spinner = ui::thinking("Thinking");
    let chunks: Vec<Chunk> = agent.run_conversation(thread, message).collect().await;
    spinner.finish_and_clear();

    for chunk in chunks {
        match chunk {
            Chunk::Text(text) => println!("\n{}: {}\n", "Agent".green().bold(), text),
            Chunk::Error(e) => println!("\n{}: {}\n", "Error".red().bold(), e),
        }
    }
}
