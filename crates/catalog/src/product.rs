use serde::{Deserialize, Serialize};

use arka_core::{
    AggregateRoot, BrandId, CategoryId, DomainError, DomainResult, ProductId, ValueObject,
};

/// Longest accepted product name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted product description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Unit price in the smallest currency unit (e.g. cents). Always positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Price(u64);

impl Price {
    pub fn from_minor_units(minor_units: u64) -> DomainResult<Self> {
        if minor_units == 0 {
            return Err(DomainError::invalid_argument("price must be greater than zero"));
        }
        Ok(Self(minor_units))
    }

    pub fn minor_units(self) -> u64 {
        self.0
    }
}

impl ValueObject for Price {}

impl TryFrom<u64> for Price {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_minor_units(value)
    }
}

impl From<Price> for u64 {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Input for admitting a new product into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub category: CategoryId,
    pub brand: BrandId,
    pub price: Price,
}

/// Partial update: only the fields that are `Some` are applied.
///
/// A supplied `quantity` is an absolute value, not a delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<CategoryId>,
    pub brand: Option<BrandId>,
    pub price: Option<Price>,
    pub quantity: Option<i64>,
}

impl ProductPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_brand(mut self, brand: BrandId) -> Self {
        self.brand = Some(brand);
        self
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.brand.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
    }
}

/// Response projection of a product. Never carries the audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub price: Price,
    pub category: CategoryId,
    pub brand: BrandId,
}

/// Aggregate root: Product.
///
/// Every quantity change goes through `set_quantity`, `reduce` or `replenish`,
/// which keep `quantity >= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    quantity: i64,
    price: Price,
    category: CategoryId,
    brand: BrandId,
    version: u64,
}

impl Product {
    /// Validate the input shape and build a not-yet-saved product.
    ///
    /// Name uniqueness and category/brand existence need the store and the
    /// catalog, so they are checked by the ledger, not here.
    pub fn create(id: ProductId, input: NewProduct) -> DomainResult<Self> {
        validate_name(&input.name)?;
        validate_description(&input.description)?;
        ensure_non_negative(input.quantity)?;

        Ok(Self {
            id,
            name: input.name,
            description: input.description,
            quantity: input.quantity,
            price: input.price,
            category: input.category,
            brand: input.brand,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn category(&self) -> CategoryId {
        self.category
    }

    pub fn brand(&self) -> BrandId {
        self.brand
    }

    pub fn view(&self) -> ProductView {
        ProductView {
            name: self.name.clone(),
            description: self.description.clone(),
            quantity: self.quantity,
            price: self.price,
            category: self.category,
            brand: self.brand,
        }
    }

    /// Strictly below `threshold`; the threshold itself is not low stock.
    pub fn is_below(&self, threshold: i64) -> bool {
        self.quantity < threshold
    }

    /// Overwrite the quantity (absolute set). Returns the resulting quantity.
    pub fn set_quantity(&mut self, quantity: i64) -> DomainResult<i64> {
        ensure_non_negative(quantity)?;
        self.quantity = quantity;
        Ok(self.quantity)
    }

    /// Take `amount` units out of stock. Returns the resulting quantity.
    pub fn reduce(&mut self, amount: i64) -> DomainResult<i64> {
        ensure_positive_amount(amount)?;
        if self.quantity < amount {
            return Err(DomainError::insufficient_stock(
                self.name.clone(),
                amount,
                self.quantity,
            ));
        }
        self.quantity -= amount;
        Ok(self.quantity)
    }

    /// Put `amount` units into stock. Returns the resulting quantity.
    pub fn replenish(&mut self, amount: i64) -> DomainResult<i64> {
        ensure_positive_amount(amount)?;
        self.quantity = self.quantity.checked_add(amount).ok_or_else(|| {
            DomainError::invalid_argument(format!(
                "replenishing {amount} units would overflow the stock of '{}'",
                self.name
            ))
        })?;
        Ok(self.quantity)
    }

    /// Apply the supplied fields of `patch`.
    ///
    /// All field checks run before any field is written, so a rejected patch
    /// leaves the product untouched.
    pub fn apply_patch(&mut self, patch: &ProductPatch) -> DomainResult<()> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(description) = &patch.description {
            validate_description(description)?;
        }
        if let Some(quantity) = patch.quantity {
            ensure_non_negative(quantity)?;
        }

        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(quantity) = patch.quantity {
            self.set_quantity(quantity)?;
        }
        Ok(())
    }

    /// Advance the stored revision. Called by stores after a successful write.
    pub fn mark_saved(&mut self) {
        self.version += 1;
    }

    /// Take over the stored revision of `current`, so that writing back an
    /// older state passes the store's revision check.
    pub fn adopt_revision(&mut self, current: &Product) {
        self.version = current.version;
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::invalid_argument("name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::invalid_argument(format!(
            "name cannot be longer than {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> DomainResult<()> {
    if description.trim().is_empty() {
        return Err(DomainError::invalid_argument("description cannot be empty"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::invalid_argument(format!(
            "description cannot be longer than {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

fn ensure_non_negative(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::invalid_argument(format!(
            "quantity cannot be negative (got {quantity})"
        )));
    }
    Ok(())
}

fn ensure_positive_amount(amount: i64) -> DomainResult<()> {
    if amount <= 0 {
        return Err(DomainError::invalid_argument(format!(
            "adjustment amount must be greater than zero (got {amount})"
        )));
    }
    Ok(())
}
