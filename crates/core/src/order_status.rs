//! Order status values and the status transition gate.
//!
//! The gate is a declarative table keyed by the requester's relationship to
//! the order (its [`Party`]) and the order's current status. Admins bypass
//! the table entirely. Anything not listed in [`TRANSITION_RULES`] is
//! rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// Lifecycle status of an order. Stored as text in `orders.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
}

/// Statuses that occupy the provider's calendar. Must match the partial
/// exclusion constraint `excl_orders_provider_time`.
pub const BLOCKING_STATUSES: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Accepted,
    OrderStatus::InProgress,
];

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Rejected,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Completed, rejected and cancelled orders accept no further
    /// transitions from non-admin parties.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }

    pub fn blocks_calendar(self) -> bool {
        BLOCKING_STATUSES.contains(&self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid order status '{s}'. Must be one of: {}",
                    OrderStatus::ALL.map(OrderStatus::as_str).join(", ")
                ))
            })
    }
}

/// How the requester relates to a specific order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    OwningProvider,
    OwningClient,
    Admin,
}

impl Party {
    /// Resolve the requester's party for an order, or `None` when the
    /// requester is neither an owner nor an admin.
    pub fn resolve(
        role: Role,
        user_id: DbId,
        provider_id: DbId,
        client_id: Option<DbId>,
    ) -> Option<Party> {
        match role {
            Role::Admin => Some(Party::Admin),
            Role::Provider if user_id == provider_id => Some(Party::OwningProvider),
            Role::Client if client_id == Some(user_id) => Some(Party::OwningClient),
            _ => None,
        }
    }
}

/// One row of the transition table: `party` may move an order from `from`
/// to any status in `to`.
#[derive(Debug)]
pub struct TransitionRule {
    pub party: Party,
    pub from: OrderStatus,
    pub to: &'static [OrderStatus],
}

pub const TRANSITION_RULES: &[TransitionRule] = &[
    TransitionRule {
        party: Party::OwningProvider,
        from: OrderStatus::Pending,
        to: &[
            OrderStatus::Accepted,
            OrderStatus::Rejected,
            OrderStatus::Cancelled,
        ],
    },
    TransitionRule {
        party: Party::OwningProvider,
        from: OrderStatus::Accepted,
        to: &[OrderStatus::Completed, OrderStatus::Cancelled],
    },
    TransitionRule {
        party: Party::OwningClient,
        from: OrderStatus::Pending,
        to: &[OrderStatus::Cancelled],
    },
];

/// Outcome of a permitted status change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
    /// The order already has the requested status; nothing is written.
    NoChange,
    /// The new status must be persisted.
    Apply,
}

/// Target statuses `party` may request from `from` according to the table.
///
/// Admins are not listed in the table and get an empty slice here; use
/// [`authorize_transition`] for the full decision.
pub fn allowed_targets(party: Party, from: OrderStatus) -> &'static [OrderStatus] {
    TRANSITION_RULES
        .iter()
        .find(|rule| rule.party == party && rule.from == from)
        .map(|rule| rule.to)
        .unwrap_or(&[])
}

/// Decide whether `party` may move an order from `from` to `to`.
pub fn authorize_transition(
    party: Party,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<TransitionDecision, CoreError> {
    if from == to {
        return Ok(TransitionDecision::NoChange);
    }
    if party == Party::Admin || allowed_targets(party, from).contains(&to) {
        return Ok(TransitionDecision::Apply);
    }
    Err(CoreError::Forbidden(format!(
        "Cannot change order status from {from} to {to}"
    )))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const ALL_PARTIES: [Party; 3] = [Party::OwningProvider, Party::OwningClient, Party::Admin];

    #[test]
    fn parse_round_trips_every_status() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn parse_rejects_unknown_status() {
        let err = "done".parse::<OrderStatus>().unwrap_err();
        assert!(err.to_string().contains("Invalid order status"));
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
    }

    #[test]
    fn terminal_statuses_never_block_calendar() {
        for status in OrderStatus::ALL {
            assert_ne!(status.is_terminal(), status.blocks_calendar(), "{status}");
        }
    }

    #[test]
    fn provider_accepts_and_rejects_pending() {
        for to in [OrderStatus::Accepted, OrderStatus::Rejected] {
            assert_eq!(
                authorize_transition(Party::OwningProvider, OrderStatus::Pending, to).unwrap(),
                TransitionDecision::Apply
            );
        }
    }

    #[test]
    fn provider_completes_accepted() {
        assert_eq!(
            authorize_transition(
                Party::OwningProvider,
                OrderStatus::Accepted,
                OrderStatus::Completed
            )
            .unwrap(),
            TransitionDecision::Apply
        );
    }

    #[test]
    fn provider_cancels_pending_or_accepted() {
        for from in [OrderStatus::Pending, OrderStatus::Accepted] {
            assert!(
                authorize_transition(Party::OwningProvider, from, OrderStatus::Cancelled).is_ok()
            );
        }
    }

    #[test]
    fn provider_cannot_complete_pending() {
        assert_matches!(
            authorize_transition(
                Party::OwningProvider,
                OrderStatus::Pending,
                OrderStatus::Completed
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn client_only_cancels_pending() {
        assert!(authorize_transition(
            Party::OwningClient,
            OrderStatus::Pending,
            OrderStatus::Cancelled
        )
        .is_ok());
        assert_matches!(
            authorize_transition(
                Party::OwningClient,
                OrderStatus::Accepted,
                OrderStatus::Cancelled
            ),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            authorize_transition(
                Party::OwningClient,
                OrderStatus::Pending,
                OrderStatus::Accepted
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn client_cannot_cancel_completed() {
        assert_matches!(
            authorize_transition(
                Party::OwningClient,
                OrderStatus::Completed,
                OrderStatus::Cancelled
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn admin_bypasses_table() {
        assert_eq!(
            authorize_transition(Party::Admin, OrderStatus::Rejected, OrderStatus::Accepted)
                .unwrap(),
            TransitionDecision::Apply
        );
        assert_eq!(
            authorize_transition(Party::Admin, OrderStatus::Completed, OrderStatus::Pending)
                .unwrap(),
            TransitionDecision::Apply
        );
    }

    #[test]
    fn same_status_is_no_change_for_every_party() {
        for party in ALL_PARTIES {
            for status in OrderStatus::ALL {
                assert_eq!(
                    authorize_transition(party, status, status).unwrap(),
                    TransitionDecision::NoChange
                );
            }
        }
    }

    #[test]
    fn table_is_closed() {
        // Every (party, from, to) pair outside the table is rejected.
        for party in [Party::OwningProvider, Party::OwningClient] {
            for from in OrderStatus::ALL {
                for to in OrderStatus::ALL {
                    if from == to {
                        continue;
                    }
                    let listed = TRANSITION_RULES
                        .iter()
                        .any(|r| r.party == party && r.from == from && r.to.contains(&to));
                    let result = authorize_transition(party, from, to);
                    assert_eq!(result.is_ok(), listed, "{party:?} {from} -> {to}");
                }
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_rules() {
        for rule in TRANSITION_RULES {
            assert!(!rule.from.is_terminal());
        }
    }

    #[test]
    fn resolve_party_by_ownership() {
        assert_eq!(
            Party::resolve(Role::Provider, 5, 5, Some(9)),
            Some(Party::OwningProvider)
        );
        assert_eq!(
            Party::resolve(Role::Client, 9, 5, Some(9)),
            Some(Party::OwningClient)
        );
        assert_eq!(Party::resolve(Role::Admin, 1, 5, None), Some(Party::Admin));
    }

    #[test]
    fn resolve_party_rejects_strangers() {
        assert_eq!(Party::resolve(Role::Provider, 6, 5, Some(9)), None);
        assert_eq!(Party::resolve(Role::Client, 10, 5, Some(9)), None);
        assert_eq!(Party::resolve(Role::Client, 10, 5, None), None);
    }
}
