//! Group, expense, and settlement records.
//!
//! These are plain values supplied wholesale by the caller on every
//! computation. The engines read them and never mutate or persist them.

use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Creates a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Identifier of a group.
    GroupId
);
define_id!(
    /// Identifier of a member, unique within its group.
    MemberId
);
define_id!(
    /// Identifier of an expense.
    ExpenseId
);
define_id!(
    /// Identifier of a recorded settlement.
    SettlementId
);

/// A person taking part in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>) -> Self {
        Member {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A group of members sharing expenses in one currency.
///
/// Member order is for display; the engines do not depend on it except to
/// keep their output in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,

    /// ISO 4217-like currency code, e.g. `"EUR"`.
    pub currency: String,

    pub members: Vec<Member>,
}

impl Group {
    /// Returns `true` if `member` belongs to this group.
    pub fn contains(&self, member: &MemberId) -> bool {
        self.members.iter().any(|m| &m.id == member)
    }

    /// Looks up a member by identifier.
    pub fn member(&self, member: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == member)
    }

    /// Member identifiers in group order.
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }
}

/// The amount one member owes for an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseShare {
    pub member: MemberId,
    pub amount: Money,
}

/// A purchase paid by one member and shared among several.
///
/// # Invariants
///
/// - `amount` is positive and every share amount is non-negative.
/// - Shares should sum to `amount`. Shares built by
///   [`split_shares`](crate::allocation::split_shares) always do; the
///   balances engine does not re-check it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub group_id: GroupId,
    pub title: String,
    pub amount: Money,

    /// Member who paid the full amount.
    pub payer: MemberId,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub shares: Vec<ExpenseShare>,
}

impl Expense {
    /// Sum of all share amounts.
    pub fn shares_total(&self) -> Money {
        self.shares.iter().map(|s| s.amount).sum()
    }
}

/// A payment made between two members outside of expense sharing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub group_id: GroupId,

    /// Member who paid.
    pub from: MemberId,

    /// Member who received the payment.
    pub to: MemberId,

    pub amount: Money,
    pub timestamp: DateTime<Utc>,
}

/// A suggested payment that would move balances towards zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

impl Transfer {
    pub fn new(from: impl Into<MemberId>, to: impl Into<MemberId>, amount: Money) -> Self {
        Transfer {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    /// Records this transfer as a settlement with a generated identifier.
    pub fn into_settlement(self, group_id: GroupId, timestamp: DateTime<Utc>) -> Settlement {
        Settlement {
            id: SettlementId::generate(),
            group_id,
            from: self.from,
            to: self.to,
            amount: self.amount,
            timestamp,
        }
    }
}

/// Everything known about one group: the unit that is loaded and saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupData {
    pub group: Group,

    #[serde(default)]
    pub expenses: Vec<Expense>,

    #[serde(default)]
    pub settlements: Vec<Settlement>,
}

impl GroupData {
    /// Wraps a group with no expenses or settlements yet.
    pub fn new(group: Group) -> Self {
        GroupData {
            group,
            expenses: Vec::new(),
            settlements: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> Group {
        Group {
            id: GroupId::from("trip"),
            name: "Trip".to_string(),
            currency: "EUR".to_string(),
            members: vec![Member::new("a", "Alice"), Member::new("b", "Bob")],
        }
    }

    #[test]
    fn test_group_membership() {
        let group = group();
        assert!(group.contains(&MemberId::from("a")));
        assert!(!group.contains(&MemberId::from("z")));
        assert_eq!(group.member(&MemberId::from("b")).unwrap().name, "Bob");
        assert_eq!(group.member_ids(), vec![MemberId::from("a"), MemberId::from("b")]);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(SettlementId::generate(), SettlementId::generate());
    }

    #[test]
    fn test_shares_total() {
        let expense = Expense {
            id: ExpenseId::from("e1"),
            group_id: GroupId::from("trip"),
            title: "Dinner".to_string(),
            amount: Money::from_cents(1000),
            payer: MemberId::from("a"),
            timestamp: Utc::now(),
            note: None,
            shares: vec![
                ExpenseShare {
                    member: MemberId::from("a"),
                    amount: Money::from_cents(334),
                },
                ExpenseShare {
                    member: MemberId::from("b"),
                    amount: Money::from_cents(666),
                },
            ],
        };

        assert_eq!(expense.shares_total(), Money::from_cents(1000));
    }

    #[test]
    fn test_transfer_into_settlement() {
        let now = Utc::now();
        let transfer = Transfer::new("b", "a", Money::from_cents(500));
        let settlement = transfer.into_settlement(GroupId::from("trip"), now);

        assert_eq!(settlement.from, MemberId::from("b"));
        assert_eq!(settlement.to, MemberId::from("a"));
        assert_eq!(settlement.amount, Money::from_cents(500));
        assert_eq!(settlement.group_id, GroupId::from("trip"));
        assert_eq!(settlement.timestamp, now);
    }

    #[test]
    fn test_group_data_deserializes_without_records() {
        let json = r#"{"group":{"id":"g","name":"G","currency":"USD","members":[]}}"#;
        let data: GroupData = serde_json::from_str(json).unwrap();
        assert!(data.expenses.is_empty());
        assert!(data.settlements.is_empty());
    }
}
