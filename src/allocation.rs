//! Cent-exact proportional allocation.
//!
//! Splits a total among members with the largest-remainder method: every
//! member gets the floor of its ideal share, then the leftover cents go one
//! at a time to the largest fractional remainders (ties by list order). The
//! shares always sum exactly to the total and each one is within a cent of
//! its ideal value.
//!
//! Weights are scaled to a common integer scale so ideal shares and their
//! remainders are computed exactly, not approximated.

use crate::error::{LedgerError, Result};
use crate::model::{ExpenseShare, MemberId};
use crate::money::Money;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Allocated amount per member, in the order members were given.
pub type Allocation = IndexMap<MemberId, Money>;

/// How an expense total is divided among its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "values", rename_all = "lowercase")]
pub enum SplitMode {
    /// Everyone pays the same, give or take a cent.
    Equal,

    /// Percentages per participant. They need not add up to 100.
    Percent(Vec<Decimal>),

    /// Arbitrary non-negative weights per participant.
    Weights(Vec<Decimal>),
}

/// Splits `total` among `members` in proportion to `weights`.
///
/// A negative total is split by magnitude and every share negated, so
/// refunds land on the same members as the matching charge would.
///
/// # Errors
///
/// - [`LedgerError::LengthMismatch`] if the lists differ in length
/// - [`LedgerError::NegativeWeight`] for any weight below zero
/// - [`LedgerError::WeightOutOfRange`] if the weights cannot be scaled to
///   exact integer arithmetic
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use split_ledger::{allocation::allocate_proportional, MemberId, Money};
///
/// let members = [MemberId::from("a"), MemberId::from("b"), MemberId::from("c")];
/// let weights = [Decimal::ONE, Decimal::ONE, Decimal::ONE];
/// let shares = allocate_proportional(&members, &weights, Money::from_cents(1000)).unwrap();
///
/// assert_eq!(shares[&MemberId::from("a")], Money::from_cents(334));
/// assert_eq!(shares[&MemberId::from("b")], Money::from_cents(333));
/// assert_eq!(shares[&MemberId::from("c")], Money::from_cents(333));
/// ```
pub fn allocate_proportional(
    members: &[MemberId],
    weights: &[Decimal],
    total: Money,
) -> Result<Allocation> {
    if members.len() != weights.len() {
        return Err(LedgerError::LengthMismatch {
            members: members.len(),
            weights: weights.len(),
        });
    }

    if let Some((member, weight)) = members
        .iter()
        .zip(weights)
        .find(|(_, w)| **w < Decimal::ZERO)
    {
        return Err(LedgerError::NegativeWeight {
            member: member.clone(),
            weight: weight.to_string(),
        });
    }

    let scaled = scale_weights(weights)?;
    let weight_sum = scaled
        .iter()
        .try_fold(0i128, |acc, &w| acc.checked_add(w))
        .ok_or(LedgerError::WeightOutOfRange)?;

    if weight_sum <= 0 || total.is_zero() {
        return Ok(collect(members, std::iter::repeat(0)));
    }

    let sign = i128::from(total.cents().signum());
    let units = apportion(i128::from(total.cents().unsigned_abs()), &scaled, weight_sum)?;
    let cents = units
        .into_iter()
        .map(|share| {
            i64::try_from(sign * share)
                .map_err(|_| LedgerError::AmountOutOfRange(total.to_string()))
        })
        .collect::<Result<Vec<i64>>>()?;
    Ok(collect(members, cents))
}

/// Splits `total` equally; the first members in the list absorb the
/// leftover cents.
pub fn allocate_equal(members: &[MemberId], total: Money) -> Allocation {
    if members.is_empty() {
        return Allocation::new();
    }

    // Division truncates toward zero, so shares carry the sign of the total.
    let count = members.len() as i64;
    let base = total.cents() / count;
    let extra = (total.cents() % count).abs();
    let unit = total.cents().signum();

    // Equal weights leave equal remainders, so ties fall to list order.
    let cents = (0..count).map(|idx| if idx < extra { base + unit } else { base });
    collect(members, cents)
}

/// Splits `total` using `percentages` as weights.
///
/// Percentages that do not add up to 100 still produce shares summing to
/// `total`, distributed proportionally.
pub fn allocate_percent(
    members: &[MemberId],
    percentages: &[Decimal],
    total: Money,
) -> Result<Allocation> {
    allocate_proportional(members, percentages, total)
}

/// Builds expense shares for `members` according to `mode`.
pub fn split_shares(
    members: &[MemberId],
    mode: &SplitMode,
    total: Money,
) -> Result<Vec<ExpenseShare>> {
    let allocation = match mode {
        SplitMode::Equal => allocate_equal(members, total),
        SplitMode::Percent(percentages) => allocate_percent(members, percentages, total)?,
        SplitMode::Weights(weights) => allocate_proportional(members, weights, total)?,
    };

    Ok(allocation
        .into_iter()
        .map(|(member, amount)| ExpenseShare { member, amount })
        .collect())
}

/// Converts decimal weights into integers sharing one scale.
fn scale_weights(weights: &[Decimal]) -> Result<Vec<i128>> {
    let normalized: Vec<Decimal> = weights.iter().map(|w| w.normalize()).collect();
    let scale = normalized.iter().map(|w| w.scale()).max().unwrap_or(0);

    normalized
        .iter()
        .map(|w| {
            10i128
                .checked_pow(scale - w.scale())
                .and_then(|factor| w.mantissa().checked_mul(factor))
        })
        .collect::<Option<Vec<_>>>()
        .ok_or(LedgerError::WeightOutOfRange)
}

/// Largest-remainder apportionment of `units` over integer weights.
///
/// `weight_sum` must be positive and equal to the sum of `weights`.
fn apportion(units: i128, weights: &[i128], weight_sum: i128) -> Result<Vec<i128>> {
    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());

    for &weight in weights {
        let numerator = units
            .checked_mul(weight)
            .ok_or(LedgerError::WeightOutOfRange)?;
        shares.push(numerator / weight_sum);
        remainders.push(numerator % weight_sum);
    }

    // Fractional parts are each below one, so this is below weights.len().
    let leftover = units - shares.iter().sum::<i128>();
    let leftover = usize::try_from(leftover).map_err(|_| LedgerError::WeightOutOfRange)?;

    // Stable sort keeps list order among equal remainders.
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]));
    for &idx in order.iter().take(leftover) {
        shares[idx] += 1;
    }

    Ok(shares)
}

/// Pairs signed cent shares with members, summing repeated ids.
///
/// All shares carry the sign of one total and together never exceed it in
/// magnitude, so the running sums stay in range.
fn collect(members: &[MemberId], cents: impl IntoIterator<Item = i64>) -> Allocation {
    let mut allocation = Allocation::with_capacity(members.len());
    for (member, share) in members.iter().zip(cents) {
        *allocation.entry(member.clone()).or_insert(Money::ZERO) += Money::from_cents(share);
    }
    allocation
}
