use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use shelfsight_domain::RoiId;

/// Mints millisecond-timestamp ids that are strictly increasing per minter,
/// so two commits in the same millisecond never share an id.
#[derive(Debug, Default)]
pub struct RoiIdMinter {
    last: AtomicU64,
}

impl RoiIdMinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> RoiId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        RoiId(now.max(previous + 1))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let minter = RoiIdMinter::new();
        let ids: Vec<_> = (0..500).map(|_| minter.next_id()).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
