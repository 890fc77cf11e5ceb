//! Group ledger service.
//!
//! Wires a [`GroupStore`] and a [`Notifier`] to the allocation and balances
//! engines. Referential integrity is checked here, before anything reaches
//! the store.

use crate::allocation::{split_shares, SplitMode};
use crate::balances::{compute_net_by_user, plan_transfers, NetBalances};
use crate::error::{LedgerError, Result};
use crate::model::{
    Expense, ExpenseId, GroupData, GroupId, MemberId, Settlement, SettlementId, Transfer,
};
use crate::money::Money;
use crate::notify::{Notice, Notifier};
use crate::store::GroupStore;
use chrono::{DateTime, Utc};
use log::debug;

/// A new expense before shares and an id are assigned.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub group_id: GroupId,
    pub title: String,
    pub amount: Money,
    pub payer: MemberId,

    /// Members sharing the cost, in the order shares are listed.
    pub participants: Vec<MemberId>,

    pub split: SplitMode,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Records expenses and payments for groups held in a store.
pub struct GroupLedger<S, N> {
    store: S,
    notifier: N,
}

impl<S: GroupStore, N: Notifier> GroupLedger<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        GroupLedger { store, notifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Current net balances of a group.
    pub fn balances(&self, group_id: &GroupId) -> Result<NetBalances> {
        let data = self.load(group_id)?;
        self.report(compute_net_by_user(&data.group, &data.expenses, &data.settlements))
    }

    /// Transfers that would settle a group right now.
    pub fn suggestions(&self, group_id: &GroupId) -> Result<Vec<Transfer>> {
        let net = self.balances(group_id)?;
        Ok(plan_transfers(&net))
    }

    /// Splits and saves a new expense.
    pub fn add_expense(&mut self, draft: ExpenseDraft) -> Result<Expense> {
        let result = self.build_expense(draft).and_then(|expense| {
            self.store.save_expense(expense.clone())?;
            Ok(expense)
        });

        let expense = self.report(result)?;
        self.notifier.notify(Notice::info(format!(
            "Added '{}' ({}) paid by {}",
            expense.title, expense.amount, expense.payer
        )));
        Ok(expense)
    }

    /// Records a payment from one member to another.
    pub fn record_payment(
        &mut self,
        group_id: &GroupId,
        from: MemberId,
        to: MemberId,
        amount: Money,
        timestamp: DateTime<Utc>,
    ) -> Result<Settlement> {
        let result = self
            .build_payment(group_id, from, to, amount, timestamp)
            .and_then(|settlement| {
                self.store.record_settlements(vec![settlement.clone()])?;
                Ok(settlement)
            });

        let settlement = self.report(result)?;
        self.notifier.notify(Notice::info(format!(
            "{} paid {} {}",
            settlement.from, settlement.to, settlement.amount
        )));
        Ok(settlement)
    }

    /// Records the suggested plan as settlements, zeroing every balance.
    ///
    /// Returns the settlements written; an already settled group writes
    /// nothing.
    pub fn settle_up(
        &mut self,
        group_id: &GroupId,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<Settlement>> {
        let transfers = self.suggestions(group_id)?;
        if transfers.is_empty() {
            self.notifier
                .notify(Notice::info(format!("Group {} is already settled", group_id)));
            return Ok(Vec::new());
        }

        let settlements: Vec<Settlement> = transfers
            .into_iter()
            .map(|t| t.into_settlement(group_id.clone(), timestamp))
            .collect();

        let result = self.store.record_settlements(settlements.clone());
        self.report(result)?;

        self.notifier.notify(Notice::info(format!(
            "Recorded {} settlements for group {}",
            settlements.len(),
            group_id
        )));
        Ok(settlements)
    }

    fn load(&self, group_id: &GroupId) -> Result<GroupData> {
        self.report(self.store.load_group_data(group_id))
    }

    fn build_expense(&self, draft: ExpenseDraft) -> Result<Expense> {
        if !draft.amount.is_positive() {
            return Err(LedgerError::InvalidExpense(format!(
                "amount must be positive, got {}",
                draft.amount
            )));
        }
        if draft.participants.is_empty() {
            return Err(LedgerError::InvalidExpense("no participants".to_string()));
        }

        let data = self.store.load_group_data(&draft.group_id)?;
        let record = format!("expense '{}'", draft.title);
        for member in std::iter::once(&draft.payer).chain(&draft.participants) {
            if !data.group.contains(member) {
                return Err(LedgerError::UnknownMember {
                    member: member.clone(),
                    record: record.clone(),
                });
            }
        }

        let shares = split_shares(&draft.participants, &draft.split, draft.amount)?;
        debug!("Split {} into {} shares", draft.amount, shares.len());

        Ok(Expense {
            id: ExpenseId::generate(),
            group_id: draft.group_id,
            title: draft.title,
            amount: draft.amount,
            payer: draft.payer,
            timestamp: draft.timestamp,
            note: draft.note,
            shares,
        })
    }

    fn build_payment(
        &self,
        group_id: &GroupId,
        from: MemberId,
        to: MemberId,
        amount: Money,
        timestamp: DateTime<Utc>,
    ) -> Result<Settlement> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidSettlement(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        if from == to {
            return Err(LedgerError::InvalidSettlement(format!(
                "{} cannot pay themselves",
                from
            )));
        }

        let data = self.store.load_group_data(group_id)?;
        for member in [&from, &to] {
            if !data.group.contains(member) {
                return Err(LedgerError::UnknownMember {
                    member: member.clone(),
                    record: "payment".to_string(),
                });
            }
        }

        Ok(Settlement {
            id: SettlementId::generate(),
            group_id: group_id.clone(),
            from,
            to,
            amount,
            timestamp,
        })
    }

    /// Passes errors on to the notifier before returning them.
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.notifier.notify(Notice::error(e.to_string()));
        }
        result
    }
}
