//! Quota value object.

use serde::{Deserialize, Serialize};

/// Quota information returned by the quota-info query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaInfo {
    pub limit_bytes: i64,
    pub used_bytes: i64,
    pub available_bytes: i64,
}

impl QuotaInfo {
    pub fn new(limit_bytes: i64, used_bytes: i64) -> Self {
        Self {
            limit_bytes,
            used_bytes,
            available_bytes: (limit_bytes - used_bytes).max(0),
        }
    }

    /// Check if adding the given number of bytes would exceed the limit.
    pub fn would_exceed(&self, additional_bytes: i64) -> bool {
        self.used_bytes.saturating_add(additional_bytes) > self.limit_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_never_negative() {
        let quota = QuotaInfo::new(100, 150);
        assert_eq!(quota.available_bytes, 0);
    }

    #[test]
    fn test_would_exceed_boundary() {
        let quota = QuotaInfo::new(1000, 600);
        assert!(!quota.would_exceed(400));
        assert!(quota.would_exceed(401));
    }
}
