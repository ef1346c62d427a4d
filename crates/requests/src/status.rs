//! Status enums for each request family.

use finhub_core::{DomainError, RequestStatus};
use serde::{Deserialize, Serialize};

macro_rules! request_status {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl RequestStatus for $name {
            fn is_terminal(self) -> bool {
                self != $name::Pending
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(DomainError::validation(format!(
                        "invalid status '{other}'"
                    ))),
                }
            }
        }
    };
}

request_status!(
    /// Asset and loan orders.
    ApprovalStatus { Pending => "pending", Approved => "approved", Rejected => "rejected" }
);

request_status!(
    /// Deposit and withdrawal requests.
    SettlementStatus { Pending => "pending", Confirmed => "confirmed", Rejected => "rejected" }
);

request_status!(
    BonusStatus { Pending => "pending", Credited => "credited" }
);

request_status!(
    TransactionStatus { Pending => "pending", Completed => "completed" }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_parse_from_lowercase_text() {
        assert_eq!("approved".parse::<ApprovalStatus>().unwrap(), ApprovalStatus::Approved);
        assert_eq!("confirmed".parse::<SettlementStatus>().unwrap(), SettlementStatus::Confirmed);
        assert_eq!("credited".parse::<BonusStatus>().unwrap(), BonusStatus::Credited);
        assert_eq!("completed".parse::<TransactionStatus>().unwrap(), TransactionStatus::Completed);
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = "credited".parse::<ApprovalStatus>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn only_pending_is_not_terminal() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Rejected.is_terminal());
        assert!(BonusStatus::Credited.is_terminal());
        assert_eq!(serde_json::to_string(&SettlementStatus::Pending).unwrap(), "\"pending\"");
    }
}
