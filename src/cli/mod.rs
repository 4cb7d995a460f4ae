pub mod menu;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::application::{IN_MEMORY, LedgerService};
use crate::domain::{Account, AccountId, Cents, parse_cents};

use menu::{Session, balance_message, parse_amount, top_up_message, withdraw_message};

/// Pocketbank - a tiny console bank
#[derive(Parser)]
#[command(name = "pocketbank")]
#[command(about = "Check a balance, top up and withdraw from a single seeded account")]
#[command(version)]
pub struct Cli {
    /// Database file path (":memory:" keeps everything in memory)
    #[arg(short, long, default_value = IN_MEMORY)]
    pub database: String,

    /// ID of the account this session works on
    #[arg(long, default_value_t = 1)]
    pub account_id: AccountId,

    /// Account holder name used when the account has to be created
    #[arg(long, default_value = "John Doe")]
    pub name: String,

    /// Opening balance used when the account has to be created (e.g., "100.00")
    #[arg(long, default_value = "100.00")]
    pub opening_balance: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to the interactive menu
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive menu
    Menu,

    /// Show the account balance
    Balance {
        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Add money to the account
    TopUp {
        /// Amount (e.g., "50.00" or "50")
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Take money out of the account
    Withdraw {
        /// Amount (e.g., "50.00" or "50")
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_logging(self.verbose);

        let opening_balance = parse_cents(&self.opening_balance)
            .context("Invalid opening balance. Use '100.00' or '100'")?;

        let service = LedgerService::init(&self.database).await?;
        debug!(database = %self.database, "storage ready");

        let outcome = self.dispatch(&service, opening_balance).await;
        service.close().await;
        outcome
    }

    async fn dispatch(self, service: &LedgerService, opening_balance: Cents) -> Result<()> {
        let account = service
            .ensure_account(self.account_id, &self.name, opening_balance)
            .await?;

        match self.command.unwrap_or(Commands::Menu) {
            Commands::Menu => run_menu(service, &account).await?,
            Commands::Balance { format } => run_balance_command(&account, &format)?,
            Commands::TopUp { amount } => {
                let amount = parse_amount(&amount)?;
                let change = service.top_up(account.id, amount).await?;
                println!("{}", top_up_message(&change));
            }
            Commands::Withdraw { amount } => {
                let amount = parse_amount(&amount)?;
                let change = service.withdraw(account.id, amount).await?;
                println!("{}", withdraw_message(&change));
            }
        }

        Ok(())
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_menu(service: &LedgerService, account: &Account) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let mut session = Session::new(service, account.id, input, tokio::io::stdout());
    session.run().await
}

fn run_balance_command(account: &Account, format: &str) -> Result<()> {
    match format {
        "text" => println!("{}", balance_message(&account.name, account.balance)),
        "json" => println!("{}", serde_json::to_string_pretty(account)?),
        other => bail!("Unknown format '{}'. Use 'text' or 'json'", other),
    }
    Ok(())
}
