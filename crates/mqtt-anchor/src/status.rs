//! Status codes handed back to the broker.

use mqtt_anchor_core::EncodeError;

use crate::error::{PipelineError, Rejection};

/// Broker-facing result of a message callback.
///
/// Discriminants match the broker's plugin ABI error numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BrokerStatus {
    /// Message accepted; the payload has been replaced.
    Success = 0,
    /// Allocation failed.
    NoMem = 1,
    /// The payload was not acceptable input.
    Inval = 3,
    /// Any other failure.
    Unknown = 13,
}

impl BrokerStatus {
    /// Numeric code for the broker.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == BrokerStatus::Success
    }
}

impl From<&PipelineError> for BrokerStatus {
    fn from(error: &PipelineError) -> Self {
        match error {
            PipelineError::Decode(_) | PipelineError::PayloadTooLarge { .. } => BrokerStatus::Inval,
            PipelineError::Encode(EncodeError::OutOfMemory) => BrokerStatus::NoMem,
            PipelineError::Encode(_) | PipelineError::Submit(_) | PipelineError::Unknown(_) => {
                BrokerStatus::Unknown
            }
        }
    }
}

impl From<&Rejection> for BrokerStatus {
    fn from(rejection: &Rejection) -> Self {
        BrokerStatus::from(&rejection.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqtt_anchor_core::DecodeError;
    use mqtt_anchor_ledger::SubmitError;

    #[test]
    fn test_codes() {
        assert_eq!(BrokerStatus::Success.code(), 0);
        assert_eq!(BrokerStatus::NoMem.code(), 1);
        assert_eq!(BrokerStatus::Inval.code(), 3);
        assert_eq!(BrokerStatus::Unknown.code(), 13);
        assert!(BrokerStatus::Success.is_success());
        assert!(!BrokerStatus::Unknown.is_success());
    }

    #[test]
    fn test_error_mapping() {
        let decode = PipelineError::Decode(DecodeError::UnexpectedShape("not a map"));
        assert_eq!(BrokerStatus::from(&decode), BrokerStatus::Inval);

        let oom = PipelineError::Encode(EncodeError::OutOfMemory);
        assert_eq!(BrokerStatus::from(&oom), BrokerStatus::NoMem);

        let ledger = PipelineError::Submit(SubmitError::Closed);
        assert_eq!(BrokerStatus::from(&ledger), BrokerStatus::Unknown);

        let big = PipelineError::PayloadTooLarge { len: 10, limit: 5 };
        assert_eq!(BrokerStatus::from(&big), BrokerStatus::Inval);
    }
}
