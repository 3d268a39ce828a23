//! Location - a user+host staging area on the asset-tracking platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Priority assigned to the staging location. The host platform prefers the
/// lowest number last, so the staging area only wins as a local cache of
/// last resort.
pub const STAGING_PRIORITY: i64 = 1 - i64::MAX;

/// A named staging area binding a user/host pair to a local filesystem root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Asset-tracking record id
    pub id: Uuid,

    /// Unique name, `{api_user}.{hostname}` for staging locations
    pub name: String,

    /// Human-readable description shown in the platform UI
    pub description: String,

    /// Ordering priority among candidate locations
    pub priority: i64,
}

impl Location {
    /// Derive the staging location name for a user on a host
    pub fn staging_name(api_user: &str, host: &str) -> String {
        format!("{}.{}", api_user, host)
    }

    /// Build the staging location record for a user+host pair
    pub fn staging(api_user: &str, host: &str, local_root: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: Self::staging_name(api_user, host),
            description: format!(
                "accsyn staging location for user {}, on host {}, with path {}",
                api_user, host, local_root
            ),
            priority: STAGING_PRIORITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_name_joins_user_and_host() {
        assert_eq!(Location::staging_name("alice", "laptop"), "alice.laptop");
    }

    #[test]
    fn staging_location_has_lowest_priority() {
        let location = Location::staging("alice", "laptop", "/mnt/staging");
        assert_eq!(location.priority, STAGING_PRIORITY);
        assert!(location.priority < 0);
        assert_eq!(location.name, "alice.laptop");
    }
}
