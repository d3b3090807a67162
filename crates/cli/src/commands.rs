//! CLI commands

use chrono::Utc;
use refledger_core::{Amount, EarningsType, Role};
use refledger_store::records::Package;
use refledger_workflow::Resolution;
use rust_decimal::Decimal;

use crate::context::AppContext;

/// Confirm the database exists; opening the context created the schema.
pub fn init(ctx: &AppContext) -> Result<(), anyhow::Error> {
    println!("✅ Database ready at {}", ctx.db_path().display());
    Ok(())
}

/// Register a member, optionally under a sponsor.
pub fn register(
    ctx: &mut AppContext,
    id: &str,
    name: &str,
    role: Role,
    sponsor: Option<&str>,
) -> Result<(), anyhow::Error> {
    let tx = ctx.store.transaction()?;
    let member = tx.register_member(id, name, role, sponsor, Utc::now())?;
    tx.commit()?;

    println!("✅ Registered {} ({}) as {}", member.id, name, role.as_str());
    if let Some(sponsor) = sponsor {
        println!("   Sponsor: {}", sponsor);
    }
    Ok(())
}

/// Create a package template.
pub fn add_package(
    ctx: &mut AppContext,
    id: &str,
    name: &str,
    percentage: Decimal,
    duration_days: i64,
    disabled: bool,
) -> Result<(), anyhow::Error> {
    let package = Package {
        id: id.to_string(),
        name: name.to_string(),
        percentage,
        duration_days,
        disabled,
    };
    let tx = ctx.store.transaction()?;
    tx.insert_package(&package)?;
    tx.commit()?;

    println!(
        "✅ Package {} added: {}% over {} days",
        id, percentage, duration_days
    );
    Ok(())
}

/// Buy a package: waterfall deduction, yield schedule, bounty fan-out.
pub fn purchase(
    ctx: &mut AppContext,
    member: &str,
    package: &str,
    amount: Decimal,
) -> Result<(), anyhow::Error> {
    ctx.admit(member)?;
    let amount = Amount::new(amount)?;
    let result = ctx
        .commission
        .process_purchase(&mut ctx.store, member, package, amount.value())?;

    println!(
        "✅ {} bought {} for {} (connection: {})",
        member, package, amount, result.connection_id
    );
    println!(
        "   Yield at maturity: {} | bounties paid: {}{}",
        result.yield_amount,
        result.bounties_paid,
        if result.is_reinvestment {
            " | reinvestment"
        } else {
            ""
        }
    );
    Ok(())
}

/// Flag matured connections as ready to claim.
pub fn sweep_matured(ctx: &mut AppContext) -> Result<(), anyhow::Error> {
    let flagged = ctx.commission.sweep_matured(&mut ctx.store)?;
    println!("✅ {} connection(s) matured", flagged);
    Ok(())
}

/// Claim a matured connection's principal plus yield.
pub fn claim(ctx: &mut AppContext, member: &str, connection: &str) -> Result<(), anyhow::Error> {
    ctx.admit(member)?;
    let result = ctx.commission.claim(&mut ctx.store, member, connection)?;
    println!("✅ {} claimed {} from {}", member, result.payout, connection);
    Ok(())
}

/// File a deposit request.
pub fn deposit(
    ctx: &mut AppContext,
    member: &str,
    amount: Decimal,
    account_info: &str,
) -> Result<(), anyhow::Error> {
    ctx.admit(member)?;
    let amount = Amount::new(amount)?;
    let request = ctx
        .deposits
        .create(&mut ctx.store, member, amount.value(), account_info)?;
    println!("✅ Deposit request {} filed for {}", request.id, amount);
    println!("   Credits on approval; no balance change yet");
    Ok(())
}

/// Resolve a pending deposit request.
pub fn resolve_deposit(
    ctx: &mut AppContext,
    request: &str,
    resolver: &str,
    decision: Resolution,
    note: Option<&str>,
) -> Result<(), anyhow::Error> {
    ctx.admit(resolver)?;
    let resolved = ctx
        .deposits
        .resolve(&mut ctx.store, request, resolver, decision, note)?;
    println!(
        "✅ Deposit {} {} by {}",
        resolved.id,
        resolved.status.as_str(),
        resolver
    );
    Ok(())
}

/// File a withdrawal request against one earnings bucket.
pub fn withdraw(
    ctx: &mut AppContext,
    member: &str,
    amount: Decimal,
    earnings_type: EarningsType,
    bank_info: &str,
) -> Result<(), anyhow::Error> {
    ctx.admit(member)?;
    let amount = Amount::new(amount)?;
    let request = ctx.withdrawals.create(
        &mut ctx.store,
        member,
        amount.value(),
        earnings_type,
        bank_info,
    )?;
    println!(
        "✅ Withdrawal request {} filed: {} {} (fee {}, net {})",
        request.id,
        request.amount,
        earnings_type.as_str(),
        request.fee,
        request.net_amount
    );
    match &request.approved_by {
        Some(approver) => println!("   Assigned to {}", approver),
        None => println!("   No approver available; an admin must resolve"),
    }
    Ok(())
}

/// Resolve a pending withdrawal request.
pub fn resolve_withdrawal(
    ctx: &mut AppContext,
    request: &str,
    resolver: &str,
    decision: Resolution,
    note: Option<&str>,
) -> Result<(), anyhow::Error> {
    ctx.admit(resolver)?;
    let resolved = ctx
        .withdrawals
        .resolve(&mut ctx.store, request, resolver, decision, note)?;
    println!(
        "✅ Withdrawal {} {} by {}",
        resolved.id,
        resolved.status.as_str(),
        resolver
    );
    if resolved.status == refledger_store::records::RequestStatus::Approved {
        println!("   Net payout: {}", resolved.net_amount);
    }
    Ok(())
}

/// Print a member's bucket balances.
pub fn balance(ctx: &mut AppContext, member: &str) -> Result<(), anyhow::Error> {
    let tx = ctx.store.transaction()?;
    let snapshot = tx.load_earnings(member)?;

    println!("Balance for {}:", member);
    println!("  primary:           {:>12}", snapshot.primary);
    println!("  package earnings:  {:>12}", snapshot.package_earnings);
    println!("  referral bounty:   {:>12}", snapshot.referral_bounty);
    println!("  winning earnings:  {:>12}", snapshot.winning_earnings);
    println!("  combined:          {:>12}", snapshot.combined);
    Ok(())
}

/// Print a member's recent transaction history, newest first.
pub fn history(ctx: &mut AppContext, member: &str, limit: u32) -> Result<(), anyhow::Error> {
    let tx = ctx.store.transaction()?;
    let entries = tx.list_transactions(member, limit)?;

    if entries.is_empty() {
        println!("No transactions for {}", member);
        return Ok(());
    }

    println!("Transaction history for {} ({} entries):", member, entries.len());
    println!("{:-<80}", "");
    for entry in &entries {
        println!(
            "{:>6} | {:<20} | {:>12} | {}",
            entry.id,
            entry.kind.as_str(),
            entry.amount,
            entry.note
        );
    }
    Ok(())
}

/// Print bounties a member earned, newest first.
pub fn bounties(ctx: &mut AppContext, member: &str, limit: u32) -> Result<(), anyhow::Error> {
    let tx = ctx.store.transaction()?;
    let entries = tx.list_bounties(member, limit)?;

    if entries.is_empty() {
        println!("No bounties for {}", member);
        return Ok(());
    }

    println!("Bounties for {} ({} entries):", member, entries.len());
    println!("{:-<80}", "");
    for entry in &entries {
        println!(
            "{:>6} | L{} | {:>6}% | {:>12} | from {} ({})",
            entry.id,
            entry.level,
            entry.percent,
            entry.amount,
            entry.source_member_id,
            entry.connection_id
        );
    }
    Ok(())
}
