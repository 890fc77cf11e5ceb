//! CSV and JSON rendering of balances, transfer plans, and allocations.
//!
//! Amounts are always written with exactly two decimal places.

use crate::allocation::Allocation;
use crate::balances::NetBalances;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::model::{Group, MemberId, Transfer};
use crate::money::Money;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    member: &'a MemberId,
    name: &'a str,
    net: Money,
    currency: &'a str,
}

#[derive(Debug, Serialize)]
struct AllocationRow<'a> {
    member: &'a MemberId,
    amount: Money,
}

/// Writes one row per member in balance order.
///
/// `currency` is printed on every row; callers pass the group's code or a
/// configured fallback.
pub fn write_balances<W: Write>(
    writer: W,
    group: &Group,
    net: &NetBalances,
    currency: &str,
    format: OutputFormat,
) -> Result<()> {
    let rows: Vec<BalanceRow<'_>> = net
        .iter()
        .map(|(member, amount)| BalanceRow {
            member,
            name: group.member(member).map(|m| m.name.as_str()).unwrap_or(""),
            net: *amount,
            currency,
        })
        .collect();

    write_rows(writer, &["member", "name", "net", "currency"], &rows, format)
}

/// Writes a transfer plan, one transfer per row.
pub fn write_transfers<W: Write>(
    writer: W,
    transfers: &[Transfer],
    format: OutputFormat,
) -> Result<()> {
    write_rows(writer, &["from", "to", "amount"], transfers, format)
}

pub fn write_allocation<W: Write>(
    writer: W,
    allocation: &Allocation,
    format: OutputFormat,
) -> Result<()> {
    let rows: Vec<AllocationRow<'_>> = allocation
        .iter()
        .map(|(member, amount)| AllocationRow {
            member,
            amount: *amount,
        })
        .collect();

    write_rows(writer, &["member", "amount"], &rows, format)
}

fn write_rows<W: Write, T: Serialize>(
    mut writer: W,
    header: &[&str],
    rows: &[T],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut csv_writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer);

            // Written by hand so empty reports still carry a header.
            csv_writer.write_record(header)?;
            for row in rows {
                csv_writer.serialize(row)?;
            }
            csv_writer.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writeln!(writer)?;
        }
    }

    Ok(())
}
