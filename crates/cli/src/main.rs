//! RefLedger CLI - Main entry point

use clap::{Parser, Subcommand};
use refledger_cli::{commands, AppContext};
use refledger_core::{EarningsType, Role};
use refledger_workflow::Resolution;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "refledger")]
#[command(about = "RefLedger - referral earnings ledger", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database schema
    Init,

    /// Register a member
    Register {
        /// Member ID
        id: String,
        /// Display name
        name: String,
        /// Role: member, approver or admin
        #[arg(long, default_value = "member")]
        role: String,
        /// Sponsor member ID
        #[arg(long)]
        sponsor: Option<String>,
    },

    /// Add a yield package
    AddPackage {
        /// Package ID
        id: String,
        /// Display name
        name: String,
        /// Yield percentage over the full duration
        percentage: Decimal,
        /// Duration in days until maturity
        duration_days: i64,
        /// Create the package disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Buy a package for a member
    Purchase {
        /// Member ID
        member: String,
        /// Package ID
        package: String,
        /// Purchase amount
        amount: Decimal,
    },

    /// Flag matured package connections as ready to claim
    SweepMatured,

    /// Claim a matured package connection
    Claim {
        /// Member ID
        member: String,
        /// Connection ID
        connection: String,
    },

    /// File a deposit request
    Deposit {
        /// Member ID
        member: String,
        /// Amount to deposit
        amount: Decimal,
        /// Payment reference
        account_info: String,
    },

    /// Approve or reject a deposit request
    ResolveDeposit {
        /// Request ID
        request: String,
        /// Resolving approver/admin ID
        resolver: String,
        /// Reject instead of approve
        #[arg(long)]
        reject: bool,
        /// Resolution note
        #[arg(long)]
        note: Option<String>,
    },

    /// File a withdrawal request
    Withdraw {
        /// Member ID
        member: String,
        /// Amount to withdraw (gross, before fees)
        amount: Decimal,
        /// Earnings type: package, referral or winning
        earnings_type: String,
        /// Payout bank details
        bank_info: String,
    },

    /// Approve or reject a withdrawal request
    ResolveWithdrawal {
        /// Request ID
        request: String,
        /// Resolving approver/admin ID
        resolver: String,
        /// Reject instead of approve
        #[arg(long)]
        reject: bool,
        /// Resolution note
        #[arg(long)]
        note: Option<String>,
    },

    /// Show a member's bucket balances
    Balance {
        /// Member ID
        member: String,
    },

    /// Show a member's transaction history
    History {
        /// Member ID
        member: String,
        /// Maximum number of entries to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Show bounties earned by a member
    Bounties {
        /// Member ID
        member: String,
        /// Maximum number of entries to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

fn parse_role(s: &str) -> Result<Role, anyhow::Error> {
    Role::from_str(s).ok_or_else(|| anyhow::anyhow!("Unknown role: {s}"))
}

fn parse_earnings_type(s: &str) -> Result<EarningsType, anyhow::Error> {
    EarningsType::from_str(s).ok_or_else(|| anyhow::anyhow!("Unknown earnings type: {s}"))
}

fn resolution(reject: bool) -> Resolution {
    if reject {
        Resolution::Reject
    } else {
        Resolution::Approve
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut ctx = AppContext::new(&cli.data)?;

    match cli.command {
        Commands::Init => {
            commands::init(&ctx)?;
        }

        Commands::Register {
            id,
            name,
            role,
            sponsor,
        } => {
            let role = parse_role(&role)?;
            commands::register(&mut ctx, &id, &name, role, sponsor.as_deref())?;
        }

        Commands::AddPackage {
            id,
            name,
            percentage,
            duration_days,
            disabled,
        } => {
            commands::add_package(&mut ctx, &id, &name, percentage, duration_days, disabled)?;
        }

        Commands::Purchase {
            member,
            package,
            amount,
        } => {
            commands::purchase(&mut ctx, &member, &package, amount)?;
        }

        Commands::SweepMatured => {
            commands::sweep_matured(&mut ctx)?;
        }

        Commands::Claim { member, connection } => {
            commands::claim(&mut ctx, &member, &connection)?;
        }

        Commands::Deposit {
            member,
            amount,
            account_info,
        } => {
            commands::deposit(&mut ctx, &member, amount, &account_info)?;
        }

        Commands::ResolveDeposit {
            request,
            resolver,
            reject,
            note,
        } => {
            commands::resolve_deposit(
                &mut ctx,
                &request,
                &resolver,
                resolution(reject),
                note.as_deref(),
            )?;
        }

        Commands::Withdraw {
            member,
            amount,
            earnings_type,
            bank_info,
        } => {
            let earnings_type = parse_earnings_type(&earnings_type)?;
            commands::withdraw(&mut ctx, &member, amount, earnings_type, &bank_info)?;
        }

        Commands::ResolveWithdrawal {
            request,
            resolver,
            reject,
            note,
        } => {
            commands::resolve_withdrawal(
                &mut ctx,
                &request,
                &resolver,
                resolution(reject),
                note.as_deref(),
            )?;
        }

        Commands::Balance { member } => {
            commands::balance(&mut ctx, &member)?;
        }

        Commands::History { member, limit } => {
            commands::history(&mut ctx, &member, limit)?;
        }

        Commands::Bounties { member, limit } => {
            commands::bounties(&mut ctx, &member, limit)?;
        }
    }

    Ok(())
}
