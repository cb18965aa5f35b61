//! CLI front-end for the wallet:
//!   huduma-wallet login --email you@example.co.tz --password ...
//!   huduma-wallet deposit 10000 --method M-Pesa
//!   huduma-wallet history --output statement.csv
//!   huduma-wallet fold statement.csv

use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use huduma_wallet::{
    Config, LedgerSummary, RequestKind, WalletContext, WalletError, calculate_balance,
    parse_amount,
    statement::{read_transactions, write_statement},
    try_calculate_balance,
};
use rust_decimal::Decimal;
use std::{
    fs::File,
    io::{self, Write},
    process::ExitCode,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn cli() -> Command {
    let amount_args = |cmd: Command| {
        cmd.arg(
            Arg::new("amount")
                .required(true)
                .value_name("AMOUNT")
                .help("Positive amount"),
        )
        .arg(
            Arg::new("method")
                .long("method")
                .required(true)
                .value_name("METHOD")
                .help("Payment channel, e.g. M-Pesa"),
        )
        .arg(
            Arg::new("description")
                .long("description")
                .value_name("TEXT"),
        )
    };

    Command::new("huduma-wallet")
        .about("Huduma wallet: balance, history, deposits and withdrawals")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .help("Configuration file (TOML)"),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and remember the session")
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("password").long("password").required(true)),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("balance").about("Fetch the ledger and print the balance"))
        .subcommand(
            Command::new("history")
                .about("Fetch the ledger and write it as CSV")
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_name("FILE")
                        .help("Output CSV (defaults to stdout)"),
                ),
        )
        .subcommand(amount_args(Command::new("deposit").about("Add funds")))
        .subcommand(amount_args(Command::new("withdraw").about("Withdraw funds")))
        .subcommand(
            Command::new("fold")
                .about("Compute a balance from an exported CSV statement, offline")
                .arg(Arg::new("input").required(true).value_name("FILE"))
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Fail on unrecognised transaction kinds"),
                ),
        )
}

fn init_logging(level: &str) {
    // logs → stderr, keeping stdout clean for CSV
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<WalletError>() {
                Some(wallet_err) => {
                    error!(%wallet_err, "wallet operation failed");
                    eprintln!("{}", wallet_err.user_message());
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let Some((name, sub)) = matches.subcommand() else {
        bail!("no command given");
    };

    if name == "fold" {
        init_logging("info");
        return fold(sub);
    }

    let config = Config::load(sub.get_one::<String>("config").map(String::as_str))?;
    init_logging(&config.log_level);
    let mut ctx = WalletContext::init(config)?;

    match name {
        "login" => {
            let email = arg(sub, "email")?;
            ctx.sign_in(email, arg(sub, "password")?).await?;
            println!("Signed in as {email}");
            if ctx.wallet().is_fetched() {
                print_balance(&ctx);
            } else {
                println!("Balance could not be loaded; run `huduma-wallet balance` to retry.");
            }
        }
        "logout" => {
            ctx.teardown()?;
            println!("Signed out");
        }
        "balance" => {
            ctx.wallet_mut().refresh().await?;
            print_summary(&ctx.wallet().summary(), &ctx.config().currency);
        }
        "history" => {
            ctx.wallet_mut().refresh().await?;
            let sink: Box<dyn Write> = match sub.get_one::<String>("output") {
                Some(p) => Box::new(File::create(p)?),
                None => Box::new(io::stdout()),
            };
            write_statement(sink, ctx.wallet().transactions())?;
            info!("wrote {} transactions", ctx.wallet().transactions().len());
        }
        "deposit" | "withdraw" => {
            let kind = if name == "deposit" {
                RequestKind::Deposit
            } else {
                RequestKind::Withdrawal
            };
            let amount = parse_amount(arg(sub, "amount")?)?;
            let method = arg(sub, "method")?;
            let description = sub.get_one::<String>("description").cloned();

            let tx = ctx
                .wallet_mut()
                .request_transaction(kind, amount, method, description)
                .await?;

            println!(
                "{kind} of {} {} recorded (reference {})",
                fmt_amount(tx.amount),
                ctx.config().currency,
                tx.reference.as_deref().unwrap_or("-"),
            );
            if ctx.wallet().is_stale() {
                println!("Balance could not be refreshed; run `huduma-wallet balance` to retry.");
            } else {
                print_balance(&ctx);
            }
        }
        other => bail!("unknown command `{other}`"),
    }
    Ok(())
}

fn fold(sub: &ArgMatches) -> Result<()> {
    let input = File::open(arg(sub, "input")?)?;
    let transactions = read_transactions(input);
    info!("Finished ingest: {} transactions", transactions.len());

    let balance = if sub.get_flag("strict") {
        try_calculate_balance(&transactions)?
    } else {
        calculate_balance(&transactions)
    };
    let summary = LedgerSummary::from_transactions(&transactions);
    debug_assert_eq!(summary.balance, balance);
    print_summary(&summary, "");
    Ok(())
}

fn arg<'a>(sub: &'a ArgMatches, id: &str) -> Result<&'a str> {
    match sub.get_one::<String>(id) {
        Some(v) => Ok(v.as_str()),
        None => bail!("missing argument `{id}`"),
    }
}

fn fmt_amount(d: Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

fn print_balance(ctx: &WalletContext) {
    println!(
        "Balance: {} {}",
        fmt_amount(ctx.wallet().balance()),
        ctx.config().currency
    );
}

fn print_summary(summary: &LedgerSummary, currency: &str) {
    let line = |label: &str, d: Decimal| println!("{label:<12} {:>16} {currency}", fmt_amount(d));
    line("deposits", summary.deposits);
    line("refunds", summary.refunds);
    line("payments", summary.payments);
    line("withdrawals", summary.withdrawals);
    println!("{:<12} {:>16}", "pending", summary.pending);
    println!("{:<12} {:>16}", "failed", summary.failed);
    line("balance", summary.balance);
}
