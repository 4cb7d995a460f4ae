//! Interactive menu loop.
//!
//! A [`Session`] is bound to one account for its whole lifetime and walks a
//! small state machine: main menu, amount prompts, the continue prompt, and
//! finally [`MenuState::Terminated`]. Input and output are plain async
//! streams so the loop can be driven by stdin/stdout or by a test script.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::application::{AppError, BalanceChange, LedgerService};
use crate::domain::{AccountId, Cents, format_cents, parse_cents};

pub const WELCOME: &str = "Welcome to the banking app!";
pub const GOODBYE: &str = "Goodbye!";
const MENU_PROMPT: &str = "1. Check Balance\n2. Top Up\n3. Withdraw\nChoose an option: ";
const TOP_UP_PROMPT: &str = "Enter top up amount: ";
const WITHDRAW_PROMPT: &str = "Enter withdrawal amount: ";
const CONTINUE_PROMPT: &str = "Do you want to choose another menu? (yes/no): ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    MainMenu,
    AwaitingTopUpAmount,
    AwaitingWithdrawAmount,
    AwaitingContinueChoice,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    CheckBalance,
    TopUp,
    Withdraw,
}

impl MenuOption {
    /// Reads the leading integer of the line, so "01" and "2 please" both select.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim_start();
        let input = input.strip_prefix('+').unwrap_or(input);
        let end = input
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(input.len());

        match input[..end].parse::<u32>().ok()? {
            1 => Some(MenuOption::CheckBalance),
            2 => Some(MenuOption::TopUp),
            3 => Some(MenuOption::Withdraw),
            _ => None,
        }
    }
}

/// Parse an amount typed at a prompt.
pub fn parse_amount(input: &str) -> Result<Cents, AppError> {
    parse_cents(input)
        .map_err(|e| AppError::InvalidInput(format!("'{}' is not a valid amount: {}", input.trim(), e)))
}

pub fn balance_message(name: &str, balance: Cents) -> String {
    format!("User {} balance: {}", name, format_cents(balance))
}

pub fn top_up_message(change: &BalanceChange) -> String {
    format!(
        "Successfully topped up {} for user {}. New balance: {}",
        format_cents(change.amount),
        change.account.name,
        format_cents(change.account.balance)
    )
}

pub fn withdraw_message(change: &BalanceChange) -> String {
    format!(
        "Successfully withdrew {} from user {}. New balance: {}",
        format_cents(change.amount),
        change.account.name,
        format_cents(change.account.balance)
    )
}

pub fn error_message(err: &AppError) -> String {
    if let AppError::Storage(cause) = err {
        warn!("storage failure: {:#}", cause);
    } else {
        debug!("operation rejected: {}", err);
    }
    format!("Error: {}", err)
}

pub struct Session<'a, R, W> {
    service: &'a LedgerService,
    account_id: AccountId,
    input: R,
    output: W,
    state: MenuState,
}

impl<'a, R, W> Session<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(service: &'a LedgerService, account_id: AccountId, input: R, output: W) -> Self {
        Self {
            service,
            account_id,
            input,
            output,
            state: MenuState::MainMenu,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Hand back the output stream, e.g. to inspect a transcript.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Greet, loop until the user stops, say goodbye.
    pub async fn run(&mut self) -> Result<()> {
        self.println(WELCOME).await?;
        while self.state != MenuState::Terminated {
            self.step().await?;
        }
        self.println(GOODBYE).await?;
        Ok(())
    }

    /// Handle one prompt and move to the next state.
    /// Only console I/O failures are returned; operation errors are printed.
    pub async fn step(&mut self) -> Result<()> {
        let next = match self.state {
            MenuState::MainMenu => self.main_menu().await?,
            MenuState::AwaitingTopUpAmount => self.amount_prompt(MenuOption::TopUp).await?,
            MenuState::AwaitingWithdrawAmount => self.amount_prompt(MenuOption::Withdraw).await?,
            MenuState::AwaitingContinueChoice => self.continue_prompt().await?,
            MenuState::Terminated => MenuState::Terminated,
        };
        debug!(from = ?self.state, to = ?next, "menu transition");
        self.state = next;
        Ok(())
    }

    async fn main_menu(&mut self) -> Result<MenuState> {
        let Some(line) = self.prompt(MENU_PROMPT).await? else {
            return Ok(MenuState::Terminated);
        };

        let next = match MenuOption::parse(&line) {
            Some(MenuOption::CheckBalance) => {
                let message = match self.service.get_account(self.account_id).await {
                    Ok(account) => balance_message(&account.name, account.balance),
                    Err(e) => error_message(&e),
                };
                self.println(&message).await?;
                MenuState::AwaitingContinueChoice
            }
            Some(MenuOption::TopUp) => MenuState::AwaitingTopUpAmount,
            Some(MenuOption::Withdraw) => MenuState::AwaitingWithdrawAmount,
            None => {
                debug!(input = line.trim(), "invalid menu option");
                self.println("Invalid option").await?;
                MenuState::AwaitingContinueChoice
            }
        };
        Ok(next)
    }

    async fn amount_prompt(&mut self, option: MenuOption) -> Result<MenuState> {
        let prompt = match option {
            MenuOption::Withdraw => WITHDRAW_PROMPT,
            _ => TOP_UP_PROMPT,
        };
        let Some(line) = self.prompt(prompt).await? else {
            return Ok(MenuState::Terminated);
        };

        let result = match parse_amount(&line) {
            Ok(amount) => match option {
                MenuOption::Withdraw => self
                    .service
                    .withdraw(self.account_id, amount)
                    .await
                    .map(|change| withdraw_message(&change)),
                _ => self
                    .service
                    .top_up(self.account_id, amount)
                    .await
                    .map(|change| top_up_message(&change)),
            },
            Err(e) => Err(e),
        };

        let message = result.unwrap_or_else(|e| error_message(&e));
        self.println(&message).await?;
        Ok(MenuState::AwaitingContinueChoice)
    }

    async fn continue_prompt(&mut self) -> Result<MenuState> {
        let answer = self.prompt(CONTINUE_PROMPT).await?;
        match answer {
            Some(answer) if answer.trim().eq_ignore_ascii_case("yes") => Ok(MenuState::MainMenu),
            _ => Ok(MenuState::Terminated),
        }
    }

    /// Print a prompt and read one line. `None` means end of input.
    async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            // Keep the transcript tidy when input ends mid-prompt.
            self.output.write_all(b"\n").await?;
            return Ok(None);
        }
        Ok(Some(line))
    }

    async fn println(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}
