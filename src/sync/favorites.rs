use crate::listing::{FavoriteAction, FavoriteRecord, ListingId};
use chrono::{DateTime, Utc};

/// One row of the favorites collection.
///
/// `record_id` is a local `tmp-<n>` id while the add is unconfirmed and the
/// backend's id once it is.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteEntry {
    pub target_id: ListingId,
    pub record_id: String,
    pub provisional: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<FavoriteRecord> for FavoriteEntry {
    fn from(record: FavoriteRecord) -> Self {
        Self {
            target_id: record.target_id,
            record_id: record.id,
            provisional: false,
            created_at: record.created_at,
        }
    }
}

/// Membership of one listing before an optimistic toggle.
#[derive(Debug, Clone, PartialEq)]
pub enum MembershipSnapshot {
    Absent,
    Present { position: usize, entry: FavoriteEntry },
}

impl MembershipSnapshot {
    pub fn is_present(&self) -> bool {
        matches!(self, MembershipSnapshot::Present { .. })
    }
}

/// The optimistic half of a favorite toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoritePatch {
    pub action: FavoriteAction,
    /// Temporary record id inserted for an add.
    pub provisional_id: Option<String>,
}

/// Ordered favorites of the current user.
#[derive(Debug, Default)]
pub struct Favorites {
    entries: Vec<FavoriteEntry>,
    next_temp_id: u64,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the collection with confirmed records.
    pub fn replace_all(&mut self, records: Vec<FavoriteRecord>) {
        self.entries = records.into_iter().map(FavoriteEntry::from).collect();
    }

    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, target_id: &ListingId) -> bool {
        self.position(target_id).is_some()
    }

    fn position(&self, target_id: &ListingId) -> Option<usize> {
        self.entries.iter().position(|e| &e.target_id == target_id)
    }

    pub fn snapshot(&self, target_id: &ListingId) -> MembershipSnapshot {
        match self.position(target_id) {
            Some(position) => MembershipSnapshot::Present {
                position,
                entry: self.entries[position].clone(),
            },
            None => MembershipSnapshot::Absent,
        }
    }

    /// Flip membership of `target_id` locally and describe the remote action.
    pub fn apply_toggle(&mut self, target_id: &ListingId, before: &MembershipSnapshot) -> FavoritePatch {
        let action = FavoriteAction::from_membership(before.is_present());
        let provisional_id = match before {
            MembershipSnapshot::Present { position, .. } => {
                self.entries.remove(*position);
                None
            }
            MembershipSnapshot::Absent => {
                self.next_temp_id += 1;
                let record_id = format!("tmp-{}", self.next_temp_id);
                self.entries.push(FavoriteEntry {
                    target_id: target_id.clone(),
                    record_id: record_id.clone(),
                    provisional: true,
                    created_at: None,
                });
                Some(record_id)
            }
        };
        FavoritePatch {
            action,
            provisional_id,
        }
    }

    /// Swap the provisional row `provisional_id` for the canonical record.
    ///
    /// Returns false if the provisional row is gone.
    pub fn reconcile(&mut self, provisional_id: &str, record: FavoriteRecord) -> bool {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.provisional && e.record_id == provisional_id)
        else {
            return false;
        };

        if entry.target_id != record.target_id {
            tracing::warn!(
                local = %entry.target_id,
                remote = %record.target_id,
                "Favorite record target differs from requested listing, keeping local target"
            );
        }
        entry.record_id = record.id;
        entry.provisional = false;
        entry.created_at = record.created_at;
        true
    }

    /// Put membership of `target_id` back exactly as captured.
    pub fn restore(&mut self, target_id: &ListingId, snapshot: MembershipSnapshot) {
        self.entries.retain(|e| &e.target_id != target_id);
        if let MembershipSnapshot::Present { position, entry } = snapshot {
            let position = position.min(self.entries.len());
            self.entries.insert(position, entry);
        }
    }
}
