use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Lifecycle state of an order.
///
/// `Pending -> Processing -> Shipped -> Delivered`, with `Cancelled`
/// reachable from any non-terminal state. `Delivered` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether a manual transition from `self` to `to` is a legal edge.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, to),
            (Pending, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Processing, Cancelled)
                | (Shipped, Cancelled)
        )
    }

    pub fn ensure_transition(&self, to: OrderStatus) -> Result<(), DomainError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(DomainError::IllegalTransition { from: *self, to })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown order status '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const LEGAL: [(OrderStatus, OrderStatus); 6] = [
        (Pending, Processing),
        (Processing, Shipped),
        (Shipped, Delivered),
        (Pending, Cancelled),
        (Processing, Cancelled),
        (Shipped, Cancelled),
    ];

    #[test]
    fn only_listed_edges_are_legal() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = LEGAL.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for to in OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(to));
            assert!(!Cancelled.can_transition_to(to));
        }
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Shipped.is_terminal());
    }

    #[test]
    fn ensure_transition_reports_both_ends() {
        let err = Cancelled.ensure_transition(Shipped).unwrap_err();
        assert!(matches!(
            err,
            DomainError::IllegalTransition {
                from: Cancelled,
                to: Shipped
            }
        ));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), Shipped);
        assert_eq!(" Delivered ".parse::<OrderStatus>().unwrap(), Delivered);
        assert!("Refunded".parse::<OrderStatus>().is_err());
    }
}
