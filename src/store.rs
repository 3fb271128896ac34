// 🗂️ Lease Record Store
//
// Owns every Lease. The only way to change a record is through this type.
//
// Persistence policy: each mutation builds the next collection, saves it
// through the backend in one write, and only then swaps it in. A failed
// save leaves the store exactly as it was.

use crate::backend::LeaseBackend;
use crate::calculator;
use crate::error::{LeaseError, LeaseResult};
use crate::lease::{Lease, LeaseDraft, LeasePatch};
use crate::summary::PortfolioSummary;
use rust_decimal::Decimal;
use std::collections::HashSet;

pub struct LeaseStore<B: LeaseBackend> {
    backend: B,
    leases: Vec<Lease>,
}

impl<B: LeaseBackend> LeaseStore<B> {
    /// Load the stored collection and take ownership of it
    ///
    /// Records repeating an earlier id are dropped so ids stay unique.
    pub fn open(backend: B) -> LeaseResult<Self> {
        let loaded = backend.load()?;
        let total = loaded.len();

        let mut seen = HashSet::new();
        let leases: Vec<Lease> = loaded
            .into_iter()
            .filter(|lease| seen.insert(lease.id.clone()))
            .collect();

        if leases.len() != total {
            tracing::warn!(
                dropped = total - leases.len(),
                "stored collection had duplicate lease ids"
            );
        }

        tracing::debug!(count = leases.len(), "lease store opened");
        Ok(LeaseStore { backend, leases })
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// All leases in insertion order
    pub fn list(&self) -> &[Lease] {
        &self.leases
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }

    pub fn get(&self, id: &str) -> LeaseResult<Lease> {
        self.leases
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| LeaseError::NotFound(id.to_string()))
    }

    pub fn summary(&self) -> LeaseResult<PortfolioSummary> {
        PortfolioSummary::from_leases(&self.leases)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Validate a draft, give it a fresh id and status "Active", append and persist
    pub fn add(&mut self, draft: LeaseDraft) -> LeaseResult<Lease> {
        let lease = draft.into_lease(unused_id(&self.ids()))?;

        let mut next = self.leases.clone();
        next.push(lease.clone());
        self.commit(next)?;

        tracing::info!(id = %lease.id, name = %lease.name, "lease added");
        Ok(lease)
    }

    /// Add many drafts in one write; nothing is stored unless every draft is valid
    pub fn import(&mut self, drafts: Vec<LeaseDraft>) -> LeaseResult<Vec<Lease>> {
        let mut created = Vec::with_capacity(drafts.len());
        let mut errors = Vec::new();
        let mut taken = self.ids();

        for (index, draft) in drafts.into_iter().enumerate() {
            let id = unused_id(&taken);
            taken.insert(id.clone());

            match draft.into_lease(id) {
                Ok(lease) => created.push(lease),
                Err(LeaseError::Validation(field_errors)) => {
                    for mut e in field_errors {
                        e.field = format!("[{}].{}", index, e.field);
                        errors.push(e);
                    }
                }
                Err(other) => return Err(other),
            }
        }

        if !errors.is_empty() {
            return Err(LeaseError::Validation(errors));
        }

        let mut next = self.leases.clone();
        next.extend(created.iter().cloned());
        self.commit(next)?;

        tracing::info!(count = created.len(), "leases imported");
        Ok(created)
    }

    /// Apply a partial update to one lease
    ///
    /// The patched record is re-validated; a stale `totalCost` is cleared when
    /// payment or term change.
    pub fn update(&mut self, id: &str, patch: &LeasePatch) -> LeaseResult<Lease> {
        let index = self.position(id)?;

        let mut updated = self.leases[index].clone();
        patch.apply(&mut updated);
        updated.validate().map_err(LeaseError::Validation)?;

        let mut next = self.leases.clone();
        next[index] = updated.clone();
        self.commit(next)?;

        tracing::info!(id = %id, "lease updated");
        Ok(updated)
    }

    /// Delete a lease; returns false (and writes nothing) when the id is absent
    pub fn remove(&mut self, id: &str) -> LeaseResult<bool> {
        let Ok(index) = self.position(id) else {
            tracing::debug!(id = %id, "remove: no such lease");
            return Ok(false);
        };

        let mut next = self.leases.clone();
        next.remove(index);
        self.commit(next)?;

        tracing::info!(id = %id, "lease removed");
        Ok(true)
    }

    /// Compute monthly payment × term, store it as `totalCost`, persist, return it
    pub fn calculate_cost(&mut self, id: &str) -> LeaseResult<Decimal> {
        let index = self.position(id)?;
        let lease = &self.leases[index];
        let cost = calculator::lease_cost(lease.monthly_payment, lease.term)?;

        if lease.total_cost != Some(cost) {
            let mut next = self.leases.clone();
            next[index].total_cost = Some(cost);
            self.commit(next)?;
        }

        tracing::info!(id = %id, total_cost = %cost, "lease cost calculated");
        Ok(cost)
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn position(&self, id: &str) -> LeaseResult<usize> {
        self.leases
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| LeaseError::NotFound(id.to_string()))
    }

    fn ids(&self) -> HashSet<String> {
        self.leases.iter().map(|l| l.id.clone()).collect()
    }

    fn commit(&mut self, next: Vec<Lease>) -> LeaseResult<()> {
        self.backend.save(&next)?;
        self.leases = next;
        Ok(())
    }
}

/// Fresh UUID v4 not present in `taken`
fn unused_id(taken: &HashSet<String>) -> String {
    loop {
        let id = uuid::Uuid::new_v4().to_string();
        if !taken.contains(&id) {
            return id;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn empty_store() -> LeaseStore<MemoryBackend> {
        LeaseStore::open(MemoryBackend::new()).unwrap()
    }

    fn office_draft() -> LeaseDraft {
        LeaseDraft::new("Office", Decimal::from(85000), 24).starting(date("2024-04-01"))
    }

    /// Backend whose saves always fail
    struct FailingBackend;

    impl LeaseBackend for FailingBackend {
        fn load(&self) -> LeaseResult<Vec<Lease>> {
            Ok(Vec::new())
        }

        fn save(&mut self, _leases: &[Lease]) -> LeaseResult<()> {
            Err(LeaseError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }
    }

    #[test]
    fn test_list_empty_store() {
        let store = empty_store();
        assert!(store.list().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_then_list_preserves_fields() {
        let mut store = empty_store();
        let mut draft = office_draft();
        draft.security_deposit = Some(Decimal::from(170000));
        draft.utilities_included = Some(true);

        let created = store.add(draft).unwrap();

        assert_eq!(store.list(), &[created.clone()]);
        assert!(!created.id.is_empty());
        assert_eq!(created.status, "Active");
        assert_eq!(created.name, "Office");
        assert_eq!(created.monthly_payment, Decimal::from(85000));
        assert_eq!(created.term, 24);
        assert_eq!(created.start_date, date("2024-04-01"));
        assert_eq!(created.security_deposit, Some(Decimal::from(170000)));
        assert!(created.utilities_included);
        assert_eq!(store.backend().save_count(), 1);
    }

    #[test]
    fn test_add_assigns_unique_ids_in_insertion_order() {
        let mut store = empty_store();
        let a = store.add(LeaseDraft::new("A", Decimal::from(1), 1)).unwrap();
        let b = store.add(LeaseDraft::new("B", Decimal::from(2), 2)).unwrap();
        let c = store.add(LeaseDraft::new("C", Decimal::from(3), 3)).unwrap();

        let ids: Vec<&str> = store.list().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);
        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
    }

    #[test]
    fn test_add_rejects_invalid_draft_without_writing() {
        let mut store = empty_store();

        let err = store.add(LeaseDraft::default()).unwrap_err();

        assert!(matches!(err, LeaseError::Validation(_)));
        assert!(store.is_empty());
        assert_eq!(store.backend().save_count(), 0);
    }

    #[test]
    fn test_remove_then_list() {
        let mut store = empty_store();
        let keep = store.add(LeaseDraft::new("Keep", Decimal::from(1), 1)).unwrap();
        let gone = store.add(LeaseDraft::new("Gone", Decimal::from(1), 1)).unwrap();

        assert!(store.remove(&gone.id).unwrap());

        assert!(store.list().iter().all(|l| l.id != gone.id));
        assert_eq!(store.list(), &[keep]);
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut store = empty_store();
        store.add(office_draft()).unwrap();
        let before = store.list().to_vec();
        let saves_before = store.backend().save_count();

        assert!(!store.remove("no-such-id").unwrap());

        assert_eq!(store.list(), before.as_slice());
        assert_eq!(store.backend().save_count(), saves_before);
    }

    #[test]
    fn test_update_name_only_touches_target() {
        let mut store = empty_store();
        let target = store.add(office_draft()).unwrap();
        let other = store.add(LeaseDraft::new("Equipment", Decimal::from(42000), 36)).unwrap();

        let updated = store.update(&target.id, &LeasePatch::rename("X")).unwrap();

        let mut expected = target.clone();
        expected.name = "X".to_string();
        assert_eq!(updated, expected);
        assert_eq!(store.get(&target.id).unwrap(), expected);
        assert_eq!(store.get(&other.id).unwrap(), other);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let mut store = empty_store();
        let err = store.update("missing", &LeasePatch::rename("X")).unwrap_err();
        assert!(matches!(err, LeaseError::NotFound(ref id) if id == "missing"));
    }

    #[test]
    fn test_update_rejects_invalid_result() {
        let mut store = empty_store();
        let lease = store.add(office_draft()).unwrap();

        let patch = LeasePatch {
            end_date: Some(Some(date("2023-01-01"))),
            ..Default::default()
        };
        let err = store.update(&lease.id, &patch).unwrap_err();

        assert_eq!(err.field_errors()[0].field, "endDate");
        assert_eq!(store.get(&lease.id).unwrap(), lease);
    }

    #[test]
    fn test_calculate_cost_office_example() {
        let mut store = empty_store();
        let lease = store.add(office_draft()).unwrap();

        let cost = store.calculate_cost(&lease.id).unwrap();

        assert_eq!(cost, Decimal::from(2040000));
        assert_eq!(store.get(&lease.id).unwrap().total_cost, Some(Decimal::from(2040000)));
    }

    #[test]
    fn test_calculate_cost_is_idempotent() {
        let mut store = empty_store();
        let lease = store.add(office_draft()).unwrap();

        let first = store.calculate_cost(&lease.id).unwrap();
        let after_first = store.list().to_vec();
        let second = store.calculate_cost(&lease.id).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list(), after_first.as_slice());
    }

    #[test]
    fn test_calculate_cost_unknown_id() {
        let mut store = empty_store();
        assert!(matches!(
            store.calculate_cost("nope"),
            Err(LeaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_total_cost_cleared_when_inputs_change() {
        let mut store = empty_store();
        let lease = store.add(office_draft()).unwrap();
        store.calculate_cost(&lease.id).unwrap();

        let patch = LeasePatch {
            monthly_payment: Some(Decimal::from(90000)),
            ..Default::default()
        };
        let updated = store.update(&lease.id, &patch).unwrap();
        assert!(updated.total_cost.is_none());

        assert_eq!(store.calculate_cost(&lease.id).unwrap(), Decimal::from(2160000));
    }

    #[test]
    fn test_reopen_restores_same_list() {
        let mut store = empty_store();
        store.add(office_draft()).unwrap();
        let second = store.add(LeaseDraft::new("Equipment", Decimal::from(42000), 36)).unwrap();
        store.calculate_cost(&second.id).unwrap();
        let before = store.list().to_vec();

        let reopened = LeaseStore::open(store.into_backend()).unwrap();

        assert_eq!(reopened.list(), before.as_slice());
    }

    #[test]
    fn test_reopen_keeps_high_precision_amounts() {
        let mut store = empty_store();
        let mut draft = LeaseDraft::new("Tower", Decimal::from_str("1234567890123.4567").unwrap(), 24);
        draft.security_deposit = Some(Decimal::from_str("987654321098765.43").unwrap());
        let lease = store.add(draft).unwrap();
        store.calculate_cost(&lease.id).unwrap();
        let before = store.list().to_vec();

        let reopened = LeaseStore::open(store.into_backend()).unwrap();

        assert_eq!(reopened.list(), before.as_slice());
        assert_eq!(
            reopened.get(&lease.id).unwrap().total_cost,
            Some(Decimal::from_str("29629629362963.04").unwrap())
        );
    }

    #[test]
    fn test_oversized_payment_is_rejected_not_panicking() {
        let mut store = empty_store();

        let err = store
            .add(LeaseDraft::new("Huge", Decimal::from_str("79228162514264337593543950335").unwrap(), 24))
            .unwrap_err();

        assert_eq!(err.field_errors()[0].field, "monthlyPayment");
        assert!(store.is_empty());
    }

    #[test]
    fn test_overflowing_stored_record_gives_err() {
        // Written by hand, never validated by add
        let raw = r#"[
            {"id":"1","name":"A","monthlyPayment":79228162514264337593543950335,"term":24,"startDate":"2024-01-01"},
            {"id":"2","name":"B","monthlyPayment":50000000000000000000000000000,"term":1,"startDate":"2024-01-01"}
        ]"#;
        let mut store = LeaseStore::open(MemoryBackend::with_raw(raw)).unwrap();
        assert_eq!(store.len(), 2);

        let err = store.calculate_cost("1").unwrap_err();
        assert_eq!(err.field_errors()[0].field, "monthlyPayment");
        assert!(store.get("1").unwrap().total_cost.is_none());

        let err = store.summary().unwrap_err();
        assert!(matches!(err, LeaseError::Validation(_)));

        assert_eq!(store.calculate_cost("2").unwrap(), Decimal::from_str("50000000000000000000000000000").unwrap());
    }

    #[test]
    fn test_update_can_clear_end_date() {
        let mut store = empty_store();
        let lease = store.add(office_draft().ending(date("2026-04-01"))).unwrap();

        let mut patch = LeasePatch::default();
        patch.clear("endDate").unwrap();
        let updated = store.update(&lease.id, &patch).unwrap();

        assert_eq!(updated.end_date, None);
        assert_eq!(store.get(&lease.id).unwrap().end_date, None);
    }

    #[test]
    fn test_open_drops_duplicate_ids() {
        let raw = r#"[
            {"id":"1","name":"A","type":"Residential","monthlyPayment":1,"term":1,"startDate":"2024-01-01","status":"Active"},
            {"id":"1","name":"B","type":"Residential","monthlyPayment":2,"term":1,"startDate":"2024-01-01","status":"Active"},
            {"id":"2","name":"C","type":"Commercial","monthlyPayment":3,"term":1,"startDate":"2024-01-01","status":"Active"}
        ]"#;

        let store = LeaseStore::open(MemoryBackend::with_raw(raw)).unwrap();

        let names: Vec<&str> = store.list().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_open_corrupt_storage_starts_empty() {
        let store = LeaseStore::open(MemoryBackend::with_raw("][")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_save_leaves_store_unchanged() {
        let mut store = LeaseStore::open(FailingBackend).unwrap();

        let err = store.add(office_draft()).unwrap_err();

        assert!(matches!(err, LeaseError::Io(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let mut store = empty_store();
        let drafts = vec![
            LeaseDraft::new("Good", Decimal::from(10), 2),
            LeaseDraft::new("", Decimal::from(10), 2),
        ];

        let err = store.import(drafts).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "[1].name");
        assert!(store.is_empty());

        let created = store
            .import(vec![
                LeaseDraft::new("One", Decimal::from(10), 2),
                LeaseDraft::new("Two", Decimal::from(20), 4),
            ])
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.backend().save_count(), 1);
    }
}
