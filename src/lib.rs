//! # Split Ledger
//!
//! Tracks shared group expenses and works out who owes whom.
//!
//! ## Design Principles
//!
//! - **Integer cents**: all arithmetic on [`Money`], decimals only at the edges
//! - **Exact splits**: largest-remainder allocation, shares sum to the total
//! - **Pure engines**: balances and settle-up plans are plain functions of
//!   the records passed in
//! - **Explicit collaborators**: storage and notifications are traits handed
//!   to [`GroupLedger`], never global state
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use split_ledger::allocation::split_shares;
//! use split_ledger::balances::{compute_net_by_user, suggest_settlements};
//! use split_ledger::{Expense, ExpenseId, Group, GroupId, Member, MemberId, Money, SplitMode};
//!
//! let group = Group {
//!     id: GroupId::from("trip"),
//!     name: "Trip".to_string(),
//!     currency: "EUR".to_string(),
//!     members: vec![Member::new("a", "Ann"), Member::new("b", "Ben")],
//! };
//! let total = Money::from_cents(10_000);
//! let expense = Expense {
//!     id: ExpenseId::from("e1"),
//!     group_id: group.id.clone(),
//!     title: "Hotel".to_string(),
//!     amount: total,
//!     payer: MemberId::from("a"),
//!     timestamp: Utc::now(),
//!     note: None,
//!     shares: split_shares(&group.member_ids(), &SplitMode::Equal, total).unwrap(),
//! };
//!
//! let net = compute_net_by_user(&group, &[expense.clone()], &[]).unwrap();
//! assert_eq!(net[&MemberId::from("a")], Money::from_cents(5_000));
//!
//! let plan = suggest_settlements(&group, &[expense], &[]).unwrap();
//! assert_eq!(plan[0].from, MemberId::from("b"));
//! assert_eq!(plan[0].amount, Money::from_cents(5_000));
//! ```

pub mod allocation;
pub mod balances;
pub mod config;
pub mod error;
pub mod ledger;
pub mod model;
pub mod money;
pub mod notify;
pub mod report;
pub mod store;

pub use allocation::{
    allocate_equal, allocate_percent, allocate_proportional, Allocation, SplitMode,
};
pub use balances::{compute_net_by_user, plan_transfers, suggest_settlements, NetBalances};
pub use config::{OutputFormat, Settings};
pub use error::{LedgerError, Result};
pub use ledger::{ExpenseDraft, GroupLedger};
pub use model::{
    Expense, ExpenseId, ExpenseShare, Group, GroupData, GroupId, Member, MemberId, Settlement,
    SettlementId, Transfer,
};
pub use money::Money;
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use store::{ChangeEvent, GroupStore, JsonFileStore, MemoryStore};
