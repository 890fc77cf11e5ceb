//! Net balances and settle-up planning.
//!
//! Balances are computed in whole cents, so they are already rounded to two
//! decimals and sum to exactly zero whenever every expense's shares add up
//! to its amount.

use crate::error::{LedgerError, Result};
use crate::model::{Expense, Group, MemberId, Settlement, Transfer};
use crate::money::Money;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use log::{debug, warn};

/// Net balance per member, in group member order.
///
/// Positive means the group owes the member; negative means the member owes
/// the group.
pub type NetBalances = IndexMap<MemberId, Money>;

/// Computes every group member's net balance.
///
/// Expenses credit the payer with the full amount and debit each share.
/// Settlements credit the member who paid and debit the one who received.
/// Records belonging to another group are skipped.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownMember`] when a payer, share, or
/// settlement party is not a member of `group`, and
/// [`LedgerError::AmountOutOfRange`] when a balance leaves the cent range.
pub fn compute_net_by_user(
    group: &Group,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Result<NetBalances> {
    let mut net: NetBalances = group
        .members
        .iter()
        .map(|m| (m.id.clone(), Money::ZERO))
        .collect();

    for expense in expenses {
        if expense.group_id != group.id {
            debug!(
                "Skipping expense {} from group {} while balancing {}",
                expense.id, expense.group_id, group.id
            );
            continue;
        }

        let record = || format!("expense {}", expense.id);
        credit(&mut net, &expense.payer, expense.amount, record)?;
        for share in &expense.shares {
            debit(&mut net, &share.member, share.amount, record)?;
        }
    }

    for settlement in settlements {
        if settlement.group_id != group.id {
            debug!(
                "Skipping settlement {} from group {} while balancing {}",
                settlement.id, settlement.group_id, group.id
            );
            continue;
        }

        let record = || format!("settlement {}", settlement.id);
        credit(&mut net, &settlement.from, settlement.amount, record)?;
        debit(&mut net, &settlement.to, settlement.amount, record)?;
    }

    Ok(net)
}

/// Suggests the transfers that would bring every balance in `group` to zero.
///
/// See [`plan_transfers`] for the matching strategy.
pub fn suggest_settlements(
    group: &Group,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Result<Vec<Transfer>> {
    let net = compute_net_by_user(group, expenses, settlements)?;
    Ok(plan_transfers(&net))
}

/// Greedily matches the largest debtor with the largest creditor.
///
/// Each step moves the smaller of the two outstanding amounts, which clears
/// at least one party, so the plan has at most `parties - 1` transfers.
/// Ties keep the order of `net`. If the balances do not sum to zero the
/// unmatched remainder is logged and left out of the plan.
pub fn plan_transfers(net: &NetBalances) -> Vec<Transfer> {
    // Owed amounts are unsigned so that `i64::MIN` has a magnitude.
    let mut debtors: Vec<(&MemberId, u64)> = net
        .iter()
        .filter(|(_, amount)| amount.is_negative())
        .map(|(member, amount)| (member, amount.cents().unsigned_abs()))
        .collect();
    let mut creditors: Vec<(&MemberId, i64)> = net
        .iter()
        .filter(|(_, amount)| amount.is_positive())
        .map(|(member, amount)| (member, amount.cents()))
        .collect();

    debtors.sort_by(|a, b| b.1.cmp(&a.1));
    creditors.sort_by(|a, b| b.1.cmp(&a.1));

    let mut transfers = Vec::new();
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let credit = creditors[c].1;
        let amount = i64::try_from(debtors[d].1).map_or(credit, |owed| owed.min(credit));
        transfers.push(Transfer {
            from: debtors[d].0.clone(),
            to: creditors[c].0.clone(),
            amount: Money::from_cents(amount),
        });

        debtors[d].1 -= amount.unsigned_abs();
        creditors[c].1 -= amount;

        if debtors[d].1 == 0 {
            d += 1;
        }
        if creditors[c].1 == 0 {
            c += 1;
        }
    }

    let owed: i128 = debtors[d..].iter().map(|(_, amount)| i128::from(*amount)).sum();
    let credited: i128 = creditors[c..].iter().map(|(_, amount)| i128::from(*amount)).sum();
    if owed != 0 || credited != 0 {
        warn!(
            "Balances do not sum to zero: {} still owed, {} still credited after {} transfers",
            format_cents(owed),
            format_cents(credited),
            transfers.len()
        );
    }

    transfers
}

fn format_cents(cents: i128) -> String {
    Decimal::try_from_i128_with_scale(cents, Money::SCALE)
        .map(|amount| format!("{:.2}", amount))
        .unwrap_or_else(|_| format!("{} cents", cents))
}

fn credit(
    net: &mut NetBalances,
    member: &MemberId,
    amount: Money,
    record: impl Fn() -> String,
) -> Result<()> {
    let balance = balance_of(net, member, &record)?;
    *balance = balance
        .checked_add(amount)
        .ok_or_else(|| out_of_range(member, &record))?;
    Ok(())
}

fn debit(
    net: &mut NetBalances,
    member: &MemberId,
    amount: Money,
    record: impl Fn() -> String,
) -> Result<()> {
    let balance = balance_of(net, member, &record)?;
    *balance = balance
        .checked_sub(amount)
        .ok_or_else(|| out_of_range(member, &record))?;
    Ok(())
}

fn balance_of<'a>(
    net: &'a mut NetBalances,
    member: &MemberId,
    record: impl Fn() -> String,
) -> Result<&'a mut Money> {
    net.get_mut(member).ok_or_else(|| LedgerError::UnknownMember {
        member: member.clone(),
        record: record(),
    })
}

fn out_of_range(member: &MemberId, record: impl Fn() -> String) -> LedgerError {
    LedgerError::AmountOutOfRange(format!("balance of {} after {}", member, record()))
}
