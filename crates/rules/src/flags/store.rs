use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::schema::{CopilotFlag, FlagStatus};

use super::error::{FlagError, Result};
use super::merge::{MergePolicy, MergeSummary};

/// Flags keyed by id, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagStore {
    flags: IndexMap<String, CopilotFlag>,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `flags`. A repeated id keeps its first occurrence,
    /// the same as [`merge`](Self::merge).
    pub fn from_flags(flags: impl IntoIterator<Item = CopilotFlag>) -> Self {
        let mut store = Self::default();
        for flag in flags {
            store.flags.entry(flag.id.clone()).or_insert(flag);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CopilotFlag> {
        self.flags.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CopilotFlag> {
        self.flags.values()
    }

    /// Owned copy of every flag, in store order.
    pub fn to_vec(&self) -> Vec<CopilotFlag> {
        self.flags.values().cloned().collect()
    }

    pub fn for_entry<'a>(&'a self, entry_id: &'a str) -> impl Iterator<Item = &'a CopilotFlag> {
        self.flags.values().filter(move |f| f.entry_id == entry_id)
    }

    pub fn count_by_status(&self, status: FlagStatus) -> usize {
        self.flags.values().filter(|f| f.status == status).count()
    }

    /// Move a flag to `status`.
    ///
    /// Reviewed states record `reviewer` and `now`; reopening clears both.
    pub fn update_status(
        &mut self,
        id: &str,
        status: FlagStatus,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> Result<&CopilotFlag> {
        let flag = self
            .flags
            .get_mut(id)
            .ok_or_else(|| FlagError::UnknownFlag(id.to_string()))?;

        let previous = flag.status;
        flag.status = status;
        if status.is_reviewed() {
            flag.reviewed_by = Some(reviewer.to_string());
            flag.reviewed_at = Some(now);
        } else {
            flag.reviewed_by = None;
            flag.reviewed_at = None;
        }

        info!(flag_id = %id, from = %previous, to = %status, reviewer = %reviewer, "flag status changed");
        Ok(flag)
    }

    pub fn dismiss(&mut self, id: &str, reviewer: &str, now: DateTime<Utc>) -> Result<&CopilotFlag> {
        self.update_status(id, FlagStatus::Dismissed, reviewer, now)
    }

    pub fn resolve(&mut self, id: &str, reviewer: &str, now: DateTime<Utc>) -> Result<&CopilotFlag> {
        self.update_status(id, FlagStatus::Resolved, reviewer, now)
    }

    pub fn reopen(&mut self, id: &str, reviewer: &str, now: DateTime<Utc>) -> Result<&CopilotFlag> {
        self.update_status(id, FlagStatus::Open, reviewer, now)
    }

    /// Swap the whole collection.
    pub fn replace_all(&mut self, flags: impl IntoIterator<Item = CopilotFlag>) {
        *self = Self::from_flags(flags);
        debug!(count = self.len(), "replaced flag set");
    }

    /// Replace the stored flags with a fresh evaluation under `policy`.
    ///
    /// A repeated id in `fresh` keeps its first occurrence.
    pub fn merge(&mut self, fresh: Vec<CopilotFlag>, policy: MergePolicy) -> MergeSummary {
        let mut previous = std::mem::take(&mut self.flags);
        let mut summary = MergeSummary::default();

        for mut flag in fresh {
            if self.flags.contains_key(&flag.id) {
                continue;
            }
            match previous.shift_remove(&flag.id) {
                Some(prior) if policy == MergePolicy::PreserveReview && prior.status.is_reviewed() => {
                    flag.status = prior.status;
                    flag.reviewed_by = prior.reviewed_by;
                    flag.reviewed_at = prior.reviewed_at;
                    flag.created_at = prior.created_at;
                    summary.preserved += 1;
                }
                Some(_) => {}
                None => summary.added += 1,
            }
            self.flags.insert(flag.id.clone(), flag);
        }

        summary.dropped = previous.len();
        summary.total = self.flags.len();
        info!(
            policy = %policy,
            total = summary.total,
            added = summary.added,
            preserved = summary.preserved,
            dropped = summary.dropped,
            "merged flags"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    fn store() -> FlagStore {
        FlagStore::from_flags(vec![
            CopilotFlag::open("json::r1::e1", "e1", "big", t(8)),
            CopilotFlag::open("json::r1::e2", "e2", "big", t(8)),
            CopilotFlag::open("rule::voidnote::e3", "e3", "void", t(8)),
        ])
    }

    #[test]
    fn dismiss_records_reviewer_and_time() {
        let mut flags = store();
        let flag = flags.dismiss("json::r1::e1", "admin@bos.local", t(9)).unwrap();
        assert_eq!(flag.status, FlagStatus::Dismissed);
        assert_eq!(flag.reviewed_by.as_deref(), Some("admin@bos.local"));
        assert_eq!(flag.reviewed_at, Some(t(9)));
    }

    #[test]
    fn resolve_then_reopen_clears_review() {
        let mut flags = store();
        flags.resolve("json::r1::e2", "auditor@bos.local", t(10)).unwrap();
        assert_eq!(flags.count_by_status(FlagStatus::Resolved), 1);

        let flag = flags.reopen("json::r1::e2", "auditor@bos.local", t(11)).unwrap();
        assert!(flag.is_open());
        assert_eq!(flag.reviewed_by, None);
        assert_eq!(flag.reviewed_at, None);
    }

    #[test]
    fn unknown_flag_leaves_store_unchanged() {
        let mut flags = store();
        let before = flags.clone();
        let err = flags
            .update_status("json::nope::e1", FlagStatus::Resolved, "a", t(9))
            .unwrap_err();
        assert!(matches!(err, FlagError::UnknownFlag(ref id) if id == "json::nope::e1"));
        assert_eq!(flags, before);
    }

    #[test]
    fn from_flags_dedups_ids() {
        let flags = FlagStore::from_flags(vec![
            CopilotFlag::open("a", "e1", "first", t(8)),
            CopilotFlag::open("b", "e2", "other", t(8)),
            CopilotFlag::open("a", "e1", "second", t(9)),
        ]);
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.to_vec()[0].message, "first");
    }

    #[test]
    fn replace_all_and_overwrite_merge_agree_on_repeated_ids() {
        let fresh = vec![
            CopilotFlag::open("json::r1::e1", "e1", "from the first rule file", t(12)),
            CopilotFlag::open("json::r1::e1", "e1", "from the second rule file", t(12)),
            CopilotFlag::open("json::r2::e2", "e2", "other", t(12)),
        ];

        let mut replaced = store();
        replaced.replace_all(fresh.clone());
        let mut merged = store();
        merged.merge(fresh, MergePolicy::Overwrite);

        assert_eq!(replaced, merged);
        assert_eq!(
            merged.get("json::r1::e1").map(|f| f.message.as_str()),
            Some("from the first rule file")
        );
    }

    #[test]
    fn for_entry_filters() {
        let mut flags = store();
        flags.replace_all(vec![
            CopilotFlag::open("json::r1::e1", "e1", "big", t(8)),
            CopilotFlag::open("rule::voidnote::e1", "e1", "void", t(8)),
            CopilotFlag::open("json::r1::e2", "e2", "big", t(8)),
        ]);
        assert_eq!(flags.for_entry("e1").count(), 2);
        assert_eq!(flags.for_entry("e9").count(), 0);
    }

    #[test]
    fn overwrite_discards_reviews() {
        let mut flags = store();
        flags.dismiss("json::r1::e1", "a", t(9)).unwrap();

        let fresh = vec![
            CopilotFlag::open("json::r1::e1", "e1", "big", t(12)),
            CopilotFlag::open("json::r2::e4", "e4", "new", t(12)),
        ];
        let summary = flags.merge(fresh.clone(), MergePolicy::Overwrite);

        assert_eq!(flags.to_vec(), fresh);
        assert_eq!(
            summary,
            MergeSummary {
                total: 2,
                added: 1,
                preserved: 0,
                dropped: 2
            }
        );
    }

    #[test]
    fn preserve_review_carries_review_forward() {
        let mut flags = store();
        flags.resolve("json::r1::e1", "finance@bos.local", t(9)).unwrap();

        let summary = flags.merge(
            vec![
                CopilotFlag::open("json::r1::e1", "e1", "big (edited)", t(12)),
                CopilotFlag::open("json::r1::e2", "e2", "big", t(12)),
            ],
            MergePolicy::PreserveReview,
        );

        let kept = flags.get("json::r1::e1").unwrap();
        assert_eq!(kept.status, FlagStatus::Resolved);
        assert_eq!(kept.reviewed_by.as_deref(), Some("finance@bos.local"));
        assert_eq!(kept.reviewed_at, Some(t(9)));
        assert_eq!(kept.created_at, t(8));
        assert_eq!(kept.message, "big (edited)");

        // Still-open flags take the fresh record as is.
        assert_eq!(flags.get("json::r1::e2").unwrap().created_at, t(12));
        assert!(flags.get("rule::voidnote::e3").is_none());
        assert_eq!(summary.preserved, 1);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.added, 0);
    }

    #[test]
    fn merge_policy_names() {
        assert_eq!("overwrite".parse::<MergePolicy>().unwrap(), MergePolicy::Overwrite);
        assert_eq!("Preserve-Review".parse::<MergePolicy>().unwrap(), MergePolicy::PreserveReview);
        assert!(matches!(
            "keep".parse::<MergePolicy>(),
            Err(FlagError::UnknownMergePolicy(_))
        ));
        assert_eq!(MergePolicy::default().to_string(), "preserve-review");
        assert_eq!(
            serde_json::to_string(&MergePolicy::PreserveReview).unwrap(),
            "\"preserve-review\""
        );
    }
}
