//! Stock mutation pipeline.
//!
//! Every accepted mutation runs the same steps while the product's lock is held:
//!
//! ```text
//! resolve product (by name or id)
//!   ↓
//! lock product slot ─ re-read by id (sees every earlier writer)
//!   ↓
//! validate + mutate in memory (Product keeps quantity >= 0)
//!   ↓
//! save (store checks revision + name uniqueness)
//!   ↓
//! append audit entry ─ on failure the previous state is written back
//! ```
//!
//! Batches (`reduce_stock`, `replenish_stock`) run that pipeline once per entry,
//! in insertion order, and stop at the first failing entry. Entries applied
//! before the failure stay applied: a batch is **not** atomic across entries.

use tracing::{debug, error, info, instrument, warn};

use arka_catalog::{
    NewProduct, Product, ProductPatch, ProductView, StockAdjustment, StockAdjustments,
    StockHistoryEntry,
};
use arka_core::{BrandId, CategoryId, DomainError, DomainResult, ProductId};

use crate::audit::{AuditError, AuditTrail};
use crate::catalog::CatalogValidator;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::locks::ProductLocks;
use crate::store::{ProductStore, StoreError};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Movement {
    Reduce,
    Replenish,
}

impl Movement {
    fn apply(self, product: &mut Product, amount: i64) -> DomainResult<i64> {
        match self {
            Movement::Reduce => product.reduce(amount),
            Movement::Replenish => product.replenish(amount),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Movement::Reduce => "reduce",
            Movement::Replenish => "replenish",
        }
    }
}

/// The sole authority for changing a product's quantity.
///
/// - Per-product serialization through `ProductLocks`; no global lock.
/// - Product write + audit append form one unit of work.
/// - Errors are returned, never retried.
///
/// ## Generic Parameters
///
/// - `S`: product persistence (`ProductStore`)
/// - `A`: audit trail (`AuditTrail`)
/// - `C`: category/brand reference checks (`CatalogValidator`)
#[derive(Debug)]
pub struct StockLedger<S, A, C> {
    store: S,
    audit: A,
    catalog: C,
    locks: ProductLocks,
}

impl<S, A, C> StockLedger<S, A, C>
where
    S: ProductStore,
    A: AuditTrail,
    C: CatalogValidator,
{
    pub fn new(store: S, audit: A, catalog: C) -> Self {
        Self {
            store,
            audit,
            catalog,
            locks: ProductLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Look a product up by name.
    pub fn product(&self, name: &str) -> LedgerResult<Product> {
        debug!(product = name, "looking up product");
        Ok(self
            .store
            .find_by_name(name)?
            .ok_or_else(|| not_found_name(name))?)
    }

    /// Overwrite a product's quantity (absolute, not a delta).
    ///
    /// Appends one audit entry per call, even when the quantity does not change.
    #[instrument(skip(self), fields(product = %product_name))]
    pub fn set_stock(&self, product_name: &str, new_quantity: i64) -> LedgerResult<ProductView> {
        let id = self.resolve(product_name)?;
        self.with_locked_product(id, |previous| {
            ensure_named(&previous, product_name)?;
            let mut next = previous.clone();
            next.set_quantity(new_quantity)?;
            let (saved, entry) = self.commit(&previous, next)?;
            info!(
                product = %id,
                quantity = saved.quantity(),
                sequence = entry.sequence,
                "stock set"
            );
            Ok(saved.view())
        })
    }

    /// Take stock out, entry by entry.
    ///
    /// Each entry needs an existing product, an amount `> 0` and enough stock.
    /// On the first failing entry the error is returned and the remaining
    /// entries are skipped; entries applied before it are **not** rolled back.
    #[instrument(skip(self, adjustments), fields(entries = adjustments.len()))]
    pub fn reduce_stock(
        &self,
        adjustments: &StockAdjustments,
    ) -> LedgerResult<Vec<StockHistoryEntry>> {
        self.apply_batch(adjustments, Movement::Reduce)
    }

    /// Put stock back, entry by entry. Same batch contract as `reduce_stock`,
    /// without the sufficiency check.
    #[instrument(skip(self, adjustments), fields(entries = adjustments.len()))]
    pub fn replenish_stock(
        &self,
        adjustments: &StockAdjustments,
    ) -> LedgerResult<Vec<StockHistoryEntry>> {
        self.apply_batch(adjustments, Movement::Replenish)
    }

    /// Admit a new product and record its initial quantity.
    #[instrument(skip(self, input), fields(product = %input.name))]
    pub fn create_product(&self, input: NewProduct) -> LedgerResult<ProductView> {
        if self.store.exists_by_name(&input.name)? {
            return Err(
                DomainError::conflict(format!("product '{}' already exists", input.name)).into(),
            );
        }
        let product = Product::create(ProductId::new(), input)?;
        self.ensure_references(Some(product.category()), Some(product.brand()))?;

        let id = product.id_typed();
        let slot = self.locks.slot(id);
        let _guard = ProductLocks::acquire(&slot);

        // A concurrent create of the same name loses here (store uniqueness).
        let saved = match self.store.save(product) {
            Ok(saved) => saved,
            Err(err) => {
                self.locks.forget(&id);
                return Err(err.into());
            }
        };
        if let Err(err) = self.audit.record(id, saved.quantity()) {
            error!(product = %id, error = %err, "audit append failed; removing new product");
            let undo = self.store.delete(&saved);
            self.locks.forget(&id);
            return Err(unaudited(id, err, undo));
        }

        info!(product = %id, quantity = saved.quantity(), "product created");
        Ok(saved.view())
    }

    /// Apply the supplied fields of `patch` to the product called `name`.
    ///
    /// A supplied quantity takes the same path as `set_stock` and appends one
    /// audit entry; without it nothing is audited.
    #[instrument(skip(self, patch), fields(product = %name))]
    pub fn update_product(&self, name: &str, patch: &ProductPatch) -> LedgerResult<ProductView> {
        let id = self.resolve(name)?;
        self.with_locked_product(id, |previous| {
            ensure_named(&previous, name)?;
            if patch.is_empty() {
                debug!(product = %id, "empty patch; nothing to update");
                return Ok(previous.view());
            }

            if let Some(new_name) = patch.name.as_deref() {
                if new_name != previous.name() && self.store.exists_by_name(new_name)? {
                    let msg = format!("product '{new_name}' already exists");
                    return Err(DomainError::conflict(msg).into());
                }
            }
            self.ensure_references(patch.category, patch.brand)?;

            let mut next = previous.clone();
            next.apply_patch(patch)?;

            let saved = if patch.quantity.is_some() {
                let (saved, entry) = self.commit(&previous, next)?;
                info!(
                    product = %id,
                    quantity = saved.quantity(),
                    sequence = entry.sequence,
                    "stock set by update"
                );
                saved
            } else {
                self.store.save(next)?
            };
            info!(product = %id, "product updated");
            Ok(saved.view())
        })
    }

    /// Delete a product and, with it, its stock history.
    #[instrument(skip(self), fields(product = %name))]
    pub fn delete_product(&self, name: &str) -> LedgerResult<()> {
        let id = self.resolve(name)?;
        self.with_locked_product(id, |product| {
            ensure_named(&product, name)?;
            self.store.delete(&product)?;
            self.locks.forget(&id);
            match self.audit.purge_product(&id) {
                Ok(purged) => {
                    info!(product = %id, purged, "product deleted");
                    Ok(())
                }
                Err(err) => {
                    error!(
                        product = %id,
                        error = %err,
                        "product deleted; stock history left orphaned"
                    );
                    Err(err.into())
                }
            }
        })
    }

    fn apply_batch(
        &self,
        adjustments: &StockAdjustments,
        movement: Movement,
    ) -> LedgerResult<Vec<StockHistoryEntry>> {
        let mut applied = Vec::with_capacity(adjustments.len());
        for adjustment in adjustments {
            match self.apply_adjustment(adjustment, movement) {
                Ok(entry) => applied.push(entry),
                Err(err) => {
                    warn!(
                        movement = movement.label(),
                        product = %adjustment.product_id,
                        amount = adjustment.amount,
                        applied = applied.len(),
                        skipped = adjustments.len() - applied.len() - 1,
                        error = %err,
                        "batch entry rejected; earlier entries stay applied"
                    );
                    return Err(err);
                }
            }
        }
        Ok(applied)
    }

    fn apply_adjustment(
        &self,
        adjustment: &StockAdjustment,
        movement: Movement,
    ) -> LedgerResult<StockHistoryEntry> {
        self.with_locked_product(adjustment.product_id, |previous| {
            let mut next = previous.clone();
            movement.apply(&mut next, adjustment.amount)?;
            let (saved, entry) = self.commit(&previous, next)?;
            info!(
                movement = movement.label(),
                product = %adjustment.product_id,
                amount = adjustment.amount,
                quantity = saved.quantity(),
                "stock adjusted"
            );
            Ok(entry)
        })
    }

    /// Resolve a product name to its id.
    fn resolve(&self, name: &str) -> LedgerResult<ProductId> {
        Ok(self
            .store
            .find_by_name(name)?
            .map(|p| p.id_typed())
            .ok_or_else(|| not_found_name(name))?)
    }

    /// Run `f` on the current state of product `id` while holding its lock.
    ///
    /// The product is re-read after the lock is taken, so `f` always sees the
    /// result of every mutation that finished before it.
    fn with_locked_product<T>(
        &self,
        id: ProductId,
        f: impl FnOnce(Product) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        if self.store.find_by_id(&id)?.is_none() {
            return Err(not_found_id(id).into());
        }

        let slot = self.locks.slot(id);
        let _guard = ProductLocks::acquire(&slot);

        match self.store.find_by_id(&id)? {
            Some(product) => f(product),
            // Deleted while we waited for the lock.
            None => {
                self.locks.forget(&id);
                Err(not_found_id(id).into())
            }
        }
    }

    /// Save `next` and append its audit entry as one unit.
    ///
    /// If the append fails, `previous` is written back and the audit error is
    /// returned, so no committed quantity is left without its entry. If the
    /// write-back fails as well the error is `LedgerError::Unaudited`.
    fn commit(
        &self,
        previous: &Product,
        next: Product,
    ) -> LedgerResult<(Product, StockHistoryEntry)> {
        let saved = self.store.save(next)?;
        let id = saved.id_typed();
        match self.audit.record(id, saved.quantity()) {
            Ok(entry) => Ok((saved, entry)),
            Err(err) => {
                error!(
                    product = %id,
                    error = %err,
                    "audit append failed; restoring previous state"
                );
                let mut restore = previous.clone();
                restore.adopt_revision(&saved);
                let undo = self.store.save(restore).map(|_| ());
                Err(unaudited(id, err, undo))
            }
        }
    }

    fn ensure_references(
        &self,
        category: Option<CategoryId>,
        brand: Option<BrandId>,
    ) -> DomainResult<()> {
        if let Some(category) = category {
            if !self.catalog.category_exists(&category) {
                return Err(DomainError::not_found(format!("category {category}")));
            }
        }
        if let Some(brand) = brand {
            if !self.catalog.brand_exists(&brand) {
                return Err(DomainError::not_found(format!("brand {brand}")));
            }
        }
        Ok(())
    }
}

/// A name-addressed operation resolved the name before taking the lock; a
/// rename in between means the name no longer exists.
fn ensure_named(product: &Product, name: &str) -> DomainResult<()> {
    if product.name() != name {
        return Err(not_found_name(name));
    }
    Ok(())
}

/// The error for a write whose audit append failed, given the outcome of
/// undoing that write.
fn unaudited(id: ProductId, audit: AuditError, undo: Result<(), StoreError>) -> LedgerError {
    match undo {
        Ok(()) => LedgerError::Audit(audit),
        Err(store) => {
            error!(product = %id, error = %store, "write left in place without an audit entry");
            LedgerError::Unaudited {
                product: id,
                audit,
                store,
            }
        }
    }
}

fn not_found_name(name: &str) -> DomainError {
    DomainError::not_found(format!("product '{name}'"))
}

fn not_found_id(id: ProductId) -> DomainError {
    DomainError::not_found(format!("product {id}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use arka_catalog::{Brand, Category, Price};
    use arka_core::AggregateRoot;

    use crate::audit::InMemoryAuditTrail;
    use crate::catalog::InMemoryCatalog;
    use crate::store::InMemoryProductStore;

    /// Product store with a budget of writes (`save`/`delete`) and of id lookups.
    #[derive(Debug)]
    struct BudgetStore {
        inner: InMemoryProductStore,
        writes_left: AtomicUsize,
        lookups_left: AtomicUsize,
    }

    impl Default for BudgetStore {
        fn default() -> Self {
            Self {
                inner: InMemoryProductStore::new(),
                writes_left: AtomicUsize::new(usize::MAX),
                lookups_left: AtomicUsize::new(usize::MAX),
            }
        }
    }

    impl BudgetStore {
        fn take(budget: &AtomicUsize) -> bool {
            budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }

        fn take_write(&self) -> Result<(), StoreError> {
            if Self::take(&self.writes_left) {
                Ok(())
            } else {
                Err(StoreError::Unavailable("read-only replica".to_string()))
            }
        }
    }

    impl ProductStore for BudgetStore {
        fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
            if !Self::take(&self.lookups_left) {
                return Ok(None);
            }
            self.inner.find_by_id(id)
        }

        fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
            self.inner.find_by_name(name)
        }

        fn find_all_by_id(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
            self.inner.find_all_by_id(ids)
        }

        fn exists_by_name(&self, name: &str) -> Result<bool, StoreError> {
            self.inner.exists_by_name(name)
        }

        fn save(&self, product: Product) -> Result<Product, StoreError> {
            self.take_write()?;
            self.inner.save(product)
        }

        fn delete(&self, product: &Product) -> Result<(), StoreError> {
            self.take_write()?;
            self.inner.delete(product)
        }

        fn find_all(&self) -> Result<Vec<Product>, StoreError> {
            self.inner.find_all()
        }
    }

    /// Audit trail that can be switched into a failing state.
    #[derive(Debug, Default)]
    struct FlakyAuditTrail {
        inner: InMemoryAuditTrail,
        failing: AtomicBool,
    }

    impl FlakyAuditTrail {
        fn fail(&self, on: bool) {
            self.failing.store(on, Ordering::SeqCst);
        }
    }

    impl AuditTrail for FlakyAuditTrail {
        fn record(&self, product_id: ProductId, q: i64) -> Result<StockHistoryEntry, AuditError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AuditError::Unavailable("disk full".to_string()));
            }
            self.inner.record(product_id, q)
        }

        fn entries_for(
            &self,
            product_id: &ProductId,
        ) -> Result<Vec<StockHistoryEntry>, AuditError> {
            self.inner.entries_for(product_id)
        }

        fn purge_product(&self, product_id: &ProductId) -> Result<usize, AuditError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AuditError::Unavailable("disk full".to_string()));
            }
            self.inner.purge_product(product_id)
        }
    }

    type TestLedger = StockLedger<Arc<BudgetStore>, Arc<FlakyAuditTrail>, Arc<InMemoryCatalog>>;

    struct Fixture {
        ledger: TestLedger,
        store: Arc<BudgetStore>,
        audit: Arc<FlakyAuditTrail>,
        category: CategoryId,
        brand: BrandId,
    }

    fn setup() -> Fixture {
        let catalog = Arc::new(InMemoryCatalog::new());
        let category = catalog.add_category(Category::new("Peripherals"));
        let brand = catalog.add_brand(Brand::new("Acme"));
        let audit = Arc::new(FlakyAuditTrail::default());
        let store = Arc::new(BudgetStore::default());
        let ledger = StockLedger::new(store.clone(), audit.clone(), catalog);
        Fixture {
            ledger,
            store,
            audit,
            category,
            brand,
        }
    }

    impl Fixture {
        fn new_product(&self, name: &str, quantity: i64) -> NewProduct {
            NewProduct {
                name: name.to_string(),
                description: format!("{name} for tests"),
                quantity,
                category: self.category,
                brand: self.brand,
                price: Price::from_minor_units(1_999).unwrap(),
            }
        }

        fn create(&self, name: &str, quantity: i64) -> ProductId {
            self.ledger.create_product(self.new_product(name, quantity)).unwrap();
            self.ledger.product(name).unwrap().id_typed()
        }

        fn history(&self, id: ProductId) -> Vec<i64> {
            self.audit
                .entries_for(&id)
                .unwrap()
                .into_iter()
                .map(|e| e.changed_quantity)
                .collect()
        }
    }

    fn domain(err: LedgerError) -> DomainError {
        match err {
            LedgerError::Domain(e) => e,
            other => panic!("expected a domain error, got {other:?}"),
        }
    }

    #[test]
    fn create_records_initial_quantity() {
        let fx = setup();
        let view = fx.ledger.create_product(fx.new_product("Mouse", 3)).unwrap();
        assert_eq!(view.quantity, 3);
        assert_eq!(view.name, "Mouse");

        let id = fx.ledger.product("Mouse").unwrap().id_typed();
        assert_eq!(fx.history(id), vec![3]);
    }

    #[test]
    fn create_rejects_unknown_category_and_brand() {
        let fx = setup();
        let mut input = fx.new_product("Mouse", 3);
        input.category = CategoryId::new();
        assert!(matches!(
            domain(fx.ledger.create_product(input).unwrap_err()),
            DomainError::NotFound(_)
        ));

        let mut input = fx.new_product("Mouse", 3);
        input.brand = BrandId::new();
        assert!(matches!(
            domain(fx.ledger.create_product(input).unwrap_err()),
            DomainError::NotFound(_)
        ));
        assert!(fx.audit.inner.is_empty());
    }

    #[test]
    fn create_rejects_negative_initial_quantity() {
        let fx = setup();
        let err = fx.ledger.create_product(fx.new_product("Mouse", -1)).unwrap_err();
        assert!(matches!(domain(err), DomainError::InvalidArgument(_)));
    }

    #[test]
    fn set_stock_on_unknown_product_is_not_found() {
        let fx = setup();
        let err = fx.ledger.set_stock("Ghost", 1).unwrap_err();
        assert!(matches!(domain(err), DomainError::NotFound(_)));
    }

    #[test]
    fn set_stock_rejects_negative_quantity_without_audit() {
        let fx = setup();
        let id = fx.create("Mouse", 3);
        let err = fx.ledger.set_stock("Mouse", -4).unwrap_err();
        assert!(matches!(domain(err), DomainError::InvalidArgument(_)));
        assert_eq!(fx.history(id), vec![3]);
    }

    #[test]
    fn non_positive_batch_amount_is_invalid_argument() {
        let fx = setup();
        let id = fx.create("Mouse", 3);
        let err = fx
            .ledger
            .replenish_stock(&StockAdjustments::new().with(id, 0))
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::InvalidArgument(_)));
        assert_eq!(fx.ledger.product("Mouse").unwrap().quantity(), 3);
    }

    #[test]
    fn unknown_product_in_batch_is_not_found() {
        let fx = setup();
        let err = fx
            .ledger
            .reduce_stock(&StockAdjustments::new().with(ProductId::new(), 1))
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::NotFound(_)));
    }

    #[test]
    fn successful_batch_returns_one_entry_per_adjustment() {
        let fx = setup();
        let a = fx.create("A", 1);
        let b = fx.create("B", 2);
        let entries = fx
            .ledger
            .replenish_stock(&StockAdjustments::new().with(a, 4).with(b, 8))
            .unwrap();
        let resulting: Vec<_> = entries
            .iter()
            .map(|e| (e.product_id, e.changed_quantity))
            .collect();
        assert_eq!(resulting, vec![(a, 5), (b, 10)]);
    }

    #[test]
    fn update_without_quantity_does_not_audit() {
        let fx = setup();
        let id = fx.create("Mouse", 3);
        let view = fx
            .ledger
            .update_product("Mouse", &ProductPatch::new().with_description("Wireless"))
            .unwrap();
        assert_eq!(view.description, "Wireless");
        assert_eq!(view.quantity, 3);
        assert_eq!(fx.history(id), vec![3]);
    }

    #[test]
    fn update_with_quantity_audits_once_with_new_quantity() {
        let fx = setup();
        let id = fx.create("Mouse", 3);
        fx.ledger
            .update_product(
                "Mouse",
                &ProductPatch::new()
                    .with_quantity(12)
                    .with_price(Price::from_minor_units(500).unwrap()),
            )
            .unwrap();
        assert_eq!(fx.history(id), vec![3, 12]);
    }

    #[test]
    fn rename_to_taken_name_is_conflict() {
        let fx = setup();
        fx.create("Mouse", 3);
        fx.create("Keyboard", 3);
        let err = fx
            .ledger
            .update_product("Mouse", &ProductPatch::new().with_name("Keyboard"))
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::Conflict(_)));
    }

    #[test]
    fn rename_to_own_name_is_allowed() {
        let fx = setup();
        fx.create("Mouse", 3);
        let view = fx
            .ledger
            .update_product("Mouse", &ProductPatch::new().with_name("Mouse"))
            .unwrap();
        assert_eq!(view.name, "Mouse");
    }

    #[test]
    fn rename_moves_the_product_to_its_new_name() {
        let fx = setup();
        let id = fx.create("Mouse", 3);
        fx.ledger
            .update_product("Mouse", &ProductPatch::new().with_name("Trackball"))
            .unwrap();
        assert!(matches!(
            domain(fx.ledger.product("Mouse").unwrap_err()),
            DomainError::NotFound(_)
        ));
        assert_eq!(fx.ledger.product("Trackball").unwrap().id_typed(), id);
    }

    #[test]
    fn update_revalidates_supplied_references() {
        let fx = setup();
        fx.create("Mouse", 3);
        let err = fx
            .ledger
            .update_product(
                "Mouse",
                &ProductPatch::new().with_category(CategoryId::new()).with_quantity(9),
            )
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::NotFound(_)));
        assert_eq!(fx.ledger.product("Mouse").unwrap().quantity(), 3);
    }

    #[test]
    fn audit_failure_restores_previous_quantity() {
        let fx = setup();
        let id = fx.create("Mouse", 10);

        fx.audit.fail(true);
        let err = fx
            .ledger
            .reduce_stock(&StockAdjustments::new().with(id, 4))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Audit(_)));

        let stored = fx.ledger.product("Mouse").unwrap();
        assert_eq!(stored.quantity(), 10);
        // save + compensating write-back
        assert_eq!(stored.version(), 3);

        fx.audit.fail(false);
        fx.ledger.reduce_stock(&StockAdjustments::new().with(id, 4)).unwrap();
        assert_eq!(fx.history(id), vec![10, 6]);
    }

    #[test]
    fn audit_failure_on_create_leaves_no_product() {
        let fx = setup();
        fx.audit.fail(true);
        assert!(fx.ledger.create_product(fx.new_product("Mouse", 1)).is_err());
        assert!(fx.store.inner.is_empty());
    }

    #[test]
    fn delete_purges_history_and_frees_the_name() {
        let fx = setup();
        let id = fx.create("Mouse", 3);
        fx.ledger.set_stock("Mouse", 5).unwrap();

        fx.ledger.delete_product("Mouse").unwrap();
        assert!(fx.history(id).is_empty());
        assert!(matches!(
            domain(fx.ledger.reduce_stock(&StockAdjustments::new().with(id, 1)).unwrap_err()),
            DomainError::NotFound(_)
        ));

        fx.ledger.create_product(fx.new_product("Mouse", 1)).unwrap();
    }

    #[test]
    fn delete_unknown_product_is_not_found() {
        let fx = setup();
        assert!(matches!(
            domain(fx.ledger.delete_product("Ghost").unwrap_err()),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn failed_creates_leave_no_lock_slots() {
        let fx = setup();
        fx.audit.fail(true);
        for i in 0..5 {
            let name = format!("Mouse {i}");
            assert!(fx.ledger.create_product(fx.new_product(&name, 1)).is_err());
        }
        fx.audit.fail(false);

        fx.store.writes_left.store(0, Ordering::SeqCst);
        let err = fx.ledger.create_product(fx.new_product("Mouse", 1)).unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::Unavailable(_))));

        assert!(fx.store.inner.is_empty());
        assert!(fx.ledger.locks.is_empty());
    }

    #[test]
    fn product_vanishing_before_the_lock_is_not_found_and_leaves_no_slot() {
        let fx = setup();
        fx.create("Mouse", 3);

        // existence check sees the product, the re-read under the lock does not
        fx.store.lookups_left.store(1, Ordering::SeqCst);
        let err = fx.ledger.set_stock("Mouse", 7).unwrap_err();

        assert!(matches!(domain(err), DomainError::NotFound(_)));
        assert!(fx.ledger.locks.is_empty());
    }

    #[test]
    fn delete_forgets_the_lock_slot() {
        let fx = setup();
        fx.create("Mouse", 3);
        fx.ledger.set_stock("Mouse", 4).unwrap();
        assert_eq!(fx.ledger.locks.len(), 1);

        fx.ledger.delete_product("Mouse").unwrap();
        assert!(fx.ledger.locks.is_empty());
    }

    #[test]
    fn failed_purge_reports_error_with_product_already_gone() {
        let fx = setup();
        let id = fx.create("Mouse", 3);

        fx.audit.fail(true);
        let err = fx.ledger.delete_product("Mouse").unwrap_err();
        fx.audit.fail(false);

        assert!(matches!(err, LedgerError::Audit(_)));
        assert!(fx.store.inner.is_empty());
        assert!(fx.ledger.locks.is_empty());
        assert_eq!(fx.history(id), vec![3]);
    }

    #[test]
    fn failed_write_back_is_reported_as_unaudited() {
        let fx = setup();
        let id = fx.create("Mouse", 10);

        // the reduce itself is saved, the write-back is not
        fx.store.writes_left.store(1, Ordering::SeqCst);
        fx.audit.fail(true);
        let err = fx
            .ledger
            .reduce_stock(&StockAdjustments::new().with(id, 4))
            .unwrap_err();

        match err {
            LedgerError::Unaudited { product, .. } => assert_eq!(product, id),
            other => panic!("expected an unaudited write, got {other:?}"),
        }
        assert_eq!(fx.store.inner.find_by_id(&id).unwrap().unwrap().quantity(), 6);
        assert_eq!(fx.history(id), vec![10]);
    }

    #[test]
    fn failed_create_removal_is_reported_as_unaudited() {
        let fx = setup();
        fx.store.writes_left.store(1, Ordering::SeqCst);
        fx.audit.fail(true);

        let err = fx.ledger.create_product(fx.new_product("Mouse", 1)).unwrap_err();

        assert!(matches!(err, LedgerError::Unaudited { .. }));
        assert_eq!(fx.store.inner.len(), 1);
        assert!(fx.ledger.locks.is_empty());
    }

    #[test]
    fn update_unknown_product_is_not_found() {
        let fx = setup();
        let err = fx
            .ledger
            .update_product("Ghost", &ProductPatch::new().with_quantity(1))
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::NotFound(_)));
    }

    #[test]
    fn update_revalidates_supplied_brand() {
        let fx = setup();
        let id = fx.create("Mouse", 3);
        let err = fx
            .ledger
            .update_product(
                "Mouse",
                &ProductPatch::new().with_brand(BrandId::new()).with_description("Moved"),
            )
            .unwrap_err();

        assert!(matches!(domain(err), DomainError::NotFound(_)));
        let stored = fx.ledger.product("Mouse").unwrap();
        assert_eq!(stored.brand(), fx.brand);
        assert_eq!(stored.description(), "Mouse for tests");
        assert_eq!(fx.history(id), vec![3]);
    }

    #[test]
    fn empty_patch_writes_nothing() {
        let fx = setup();
        fx.create("Mouse", 3);
        let before = fx.ledger.product("Mouse").unwrap().version();

        let view = fx.ledger.update_product("Mouse", &ProductPatch::new()).unwrap();

        assert_eq!(view.quantity, 3);
        assert_eq!(fx.ledger.product("Mouse").unwrap().version(), before);
    }
}
