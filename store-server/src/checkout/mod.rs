//! Checkout pipeline — order aggregation, stock reservation, persistence
//!
//! `create_order` runs the whole pipeline: validate, resolve the customer and
//! the cart against the catalog, pick the fulfillment warehouse, pre-check
//! availability, quote shipping (absorbing provider failures), then reserve
//! and persist atomically. Everything inside the final transaction commits or
//! rolls back as a unit, so a rejected order leaves no residue.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::models::{
    Book, ItemKind, Order, OrderEntry, OrderStatus, OrderType, PaymentStatus, ShippingAddress,
    Warehouse,
};
use shared::util::{now_millis, order_number, snowflake_id};
use sqlx::SqlitePool;
use validator::Validate;

use crate::db::repository::{book, customer, order, warehouse};
use crate::shipping::{QuoteRequest, ShippingProvider};
use crate::stock::{StockKey, StockLedger};
use crate::utils::{AppError, AppResult};

/// Declared package estimate per physical item, used for the rate quote.
const EST_ITEM_WEIGHT_GRAMS: i64 = 300;
const PARCEL_LENGTH_CM: i64 = 25;
const PARCEL_WIDTH_CM: i64 = 18;
const PARCEL_HEIGHT_CM: i64 = 10;
/// Provider's standard-delivery service class
const SERVICE_TYPE_ID: i64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    /// Either `book_id` or `code` must identify the book
    pub book_id: Option<i64>,
    pub code: Option<String>,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    #[validate(length(min = 1, message = "order must contain at least one item"), nested)]
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Option<ShippingAddress>,
    #[validate(length(min = 1, message = "payment method is required"))]
    pub payment_method: String,
}

/// What the caller gets back from a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub order_number: String,
    pub order_type: OrderType,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub total: i64,
    pub status: OrderStatus,
    /// False when the rate provider was down and the order shipped without a
    /// quote
    pub shipping_quoted: bool,
}

/// A cart line resolved against the catalog.
struct ResolvedItem {
    book: Book,
    quantity: i64,
}

pub struct CheckoutService {
    pool: SqlitePool,
    ledger: Arc<StockLedger>,
    shipping: Arc<dyn ShippingProvider>,
    default_warehouse_city: String,
}

impl CheckoutService {
    pub fn new(
        pool: SqlitePool,
        ledger: Arc<StockLedger>,
        shipping: Arc<dyn ShippingProvider>,
        default_warehouse_city: String,
    ) -> Self {
        Self {
            pool,
            ledger,
            shipping,
            default_warehouse_city,
        }
    }

    /// Run the checkout pipeline for one order request.
    pub async fn create_order(&self, request: CreateOrderRequest) -> AppResult<OrderReceipt> {
        request.validate()?;

        let customer = customer::find_by_id(&self.pool, request.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Customer {} not found", request.customer_id))
            })?;

        let items = self.resolve_items(&request.items).await?;
        let order_type = derive_order_type(&items);

        let has_physical = items.iter().any(|i| i.book.kind() == ItemKind::Physical);
        let address = match (&request.shipping_address, has_physical) {
            (Some(addr), _) => Some(addr),
            (None, true) => {
                return Err(AppError::validation(
                    "Shipping address is required for physical items",
                ));
            }
            (None, false) => None,
        };

        // Fulfillment warehouse; digital-only orders never touch stock.
        let fulfillment = if has_physical {
            Some(self.pick_warehouse(address).await?)
        } else {
            None
        };

        // Optimistic pre-check outside any lock, for an early friendly error.
        if let Some(wh) = &fulfillment {
            for item in &items {
                if item.book.kind() != ItemKind::Physical {
                    continue;
                }
                let available = self
                    .ledger
                    .available(item.book.id, &wh.city)
                    .await?
                    .unwrap_or(0);
                if available < item.quantity {
                    return Err(AppError::validation(format!(
                        "Insufficient stock for \"{}\"",
                        item.book.title
                    )));
                }
            }
        }

        let subtotal: i64 = items.iter().map(|i| i.book.price * i.quantity).sum();

        // One quote attempt; a provider failure degrades to fee 0 and no
        // delivery record rather than failing the order.
        let quote = match (address, has_physical) {
            (Some(addr), true) => match self.shipping.quote(&quote_request(addr, &items)).await {
                Ok(q) => Some(q),
                Err(e) => {
                    tracing::warn!(
                        customer_id = customer.id,
                        "Shipping quote failed, proceeding without delivery info: {e}"
                    );
                    None
                }
            },
            _ => None,
        };
        let shipping_fee = quote.as_ref().map(|q| q.total).unwrap_or(0);

        let now = now_millis();
        let order_id = snowflake_id();
        let new_order = Order {
            id: order_id,
            order_number: order_number(),
            customer_id: customer.id,
            order_type,
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: request.payment_method.clone(),
            shipping_address: address
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| AppError::internal(e.to_string()))?
                .unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        // Keys locked in sorted order so concurrent multi-item checkouts
        // cannot deadlock.
        let mut keys: Vec<StockKey> = Vec::new();
        if let Some(wh) = &fulfillment {
            for item in &items {
                if item.book.kind() == ItemKind::Physical {
                    keys.push((item.book.id, wh.id));
                }
            }
            keys.sort_unstable();
        }
        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            guards.push(self.ledger.key_lock(*key).lock_owned().await);
        }

        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        if let Some(wh) = &fulfillment {
            for item in &items {
                if item.book.kind() == ItemKind::Physical {
                    self.ledger
                        .reserve(&mut tx, item.book.id, wh.id, item.quantity)
                        .await?;
                }
            }
        }

        order::insert_order(&mut tx, &new_order).await?;
        for (line_no, item) in items.iter().enumerate() {
            let entry = OrderEntry {
                id: snowflake_id(),
                order_id,
                book_id: item.book.id,
                line_no: line_no as i64,
                item_kind: item.book.kind(),
                quantity: item.quantity,
                unit_price: item.book.price,
                line_total: item.book.price * item.quantity,
            };
            order::insert_entry(&mut tx, &entry).await?;
        }
        if let (Some(q), Some(addr)) = (&quote, address) {
            let info = shared::models::DeliveryInfo {
                id: snowflake_id(),
                order_id,
                recipient_name: addr.recipient_name.clone(),
                phone: addr.phone.clone(),
                street: addr.street.clone(),
                ward: addr.ward.clone(),
                district: addr.district.clone(),
                province: addr.province.clone(),
                weight_grams: package_weight(&items),
                length_cm: PARCEL_LENGTH_CM,
                width_cm: PARCEL_WIDTH_CM,
                height_cm: PARCEL_HEIGHT_CM,
                service_id: q.service_id,
                service_type_id: q.service_type_id,
                quoted_fee: q.total,
            };
            order::insert_delivery_info(&mut tx, &info).await?;
        }

        tx.commit().await.map_err(AppError::from)?;
        drop(guards);

        tracing::info!(
            order_id,
            order_number = %new_order.order_number,
            total = new_order.total,
            "Order created"
        );

        Ok(OrderReceipt {
            order_id,
            order_number: new_order.order_number,
            order_type,
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
            status: new_order.status,
            shipping_quoted: quote.is_some(),
        })
    }

    /// Resolve cart lines against the catalog. The first unknown or inactive
    /// book fails the whole request by name.
    async fn resolve_items(&self, items: &[OrderItemRequest]) -> AppResult<Vec<ResolvedItem>> {
        let mut resolved = Vec::with_capacity(items.len());
        let mut seen = std::collections::HashSet::new();

        for item in items {
            let found = match (item.book_id, item.code.as_deref()) {
                (Some(id), _) => book::find_by_id(&self.pool, id).await?,
                (None, Some(code)) => book::find_by_code(&self.pool, code).await?,
                (None, None) => {
                    return Err(AppError::validation(
                        "Each item needs a book_id or a code",
                    ));
                }
            };

            let label = item
                .code
                .clone()
                .or(item.book_id.map(|id| id.to_string()))
                .unwrap_or_default();
            let book = found
                .filter(|b| b.is_active)
                .ok_or_else(|| {
                    AppError::validation(format!("Book {label} not found in catalog"))
                })?;

            if !seen.insert(book.id) {
                return Err(AppError::validation(format!(
                    "Duplicate item in cart: \"{}\"",
                    book.title
                )));
            }
            resolved.push(ResolvedItem {
                book,
                quantity: item.quantity,
            });
        }
        Ok(resolved)
    }

    /// Warehouse serving the destination province, falling back to the
    /// configured default city when no warehouse covers it.
    async fn pick_warehouse(&self, address: Option<&ShippingAddress>) -> AppResult<Warehouse> {
        if let Some(addr) = address
            && let Some(wh) = warehouse::find_by_city(&self.pool, &addr.province).await?
        {
            return Ok(wh);
        }

        if let Some(addr) = address {
            tracing::warn!(
                province = %addr.province,
                default = %self.default_warehouse_city,
                "No warehouse for destination province, using default"
            );
        }
        warehouse::find_by_city(&self.pool, &self.default_warehouse_city)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Default warehouse city \"{}\" has no warehouse",
                    self.default_warehouse_city
                ))
            })
    }
}

fn derive_order_type(items: &[ResolvedItem]) -> OrderType {
    let physical = items.iter().any(|i| i.book.kind() == ItemKind::Physical);
    let digital = items.iter().any(|i| i.book.kind() == ItemKind::Digital);
    match (physical, digital) {
        (true, false) => OrderType::Physical,
        (false, true) => OrderType::Digital,
        _ => OrderType::Mixed,
    }
}

fn package_weight(items: &[ResolvedItem]) -> i64 {
    items
        .iter()
        .filter(|i| i.book.kind() == ItemKind::Physical)
        .map(|i| i.quantity * EST_ITEM_WEIGHT_GRAMS)
        .sum()
}

fn quote_request(address: &ShippingAddress, items: &[ResolvedItem]) -> QuoteRequest {
    QuoteRequest {
        to_province: address.province.clone(),
        to_district: address.district.clone(),
        to_ward: address.ward.clone(),
        weight_grams: package_weight(items),
        length_cm: PARCEL_LENGTH_CM,
        width_cm: PARCEL_WIDTH_CM,
        height_cm: PARCEL_HEIGHT_CM,
        service_type_id: SERVICE_TYPE_ID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::stock_level;
    use crate::db::DbService;
    use crate::shipping::{FeeQuote, ShippingError};
    use async_trait::async_trait;
    use shared::models::{BookCreate, BookFormat};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FixedShipping {
        fee: i64,
        fail: AtomicBool,
    }

    #[async_trait]
    impl ShippingProvider for FixedShipping {
        async fn quote(&self, _request: &QuoteRequest) -> Result<FeeQuote, ShippingError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ShippingError("connection refused".into()));
            }
            Ok(FeeQuote {
                total: self.fee,
                service_id: 53320,
                service_type_id: SERVICE_TYPE_ID,
            })
        }
    }

    struct Fixture {
        pool: SqlitePool,
        service: Arc<CheckoutService>,
        ledger: Arc<StockLedger>,
        shipping: Arc<FixedShipping>,
        customer_id: i64,
        warehouse_id: i64,
    }

    async fn fixture() -> Fixture {
        let db = DbService::in_memory().await.unwrap();
        let pool = db.pool.clone();
        let shipping = Arc::new(FixedShipping {
            fee: 30000,
            ..Default::default()
        });
        let ledger = Arc::new(StockLedger::new(pool.clone()));
        let service = Arc::new(CheckoutService::new(
            pool.clone(),
            ledger.clone(),
            shipping.clone(),
            "Hanoi".to_string(),
        ));
        let customer = customer::create(&pool, "Lan Phạm", "lan@example.com")
            .await
            .unwrap();
        let wh = warehouse::create(&pool, "WH-HN", "Hanoi").await.unwrap();
        Fixture {
            pool,
            service,
            ledger,
            shipping,
            customer_id: customer.id,
            warehouse_id: wh.id,
        }
    }

    async fn seed_book(fx: &Fixture, code: &str, price: i64, format: BookFormat, stock: i64) -> i64 {
        let book = book::create(
            &fx.pool,
            BookCreate {
                code: code.into(),
                title: format!("Book {code}"),
                description: None,
                authors: vec!["Author".into()],
                genres: vec![],
                publisher: "Pub".into(),
                language: "vi".into(),
                format,
                price,
                publication_date: None,
            },
        )
        .await
        .unwrap();
        if format != BookFormat::Ebook {
            stock_level::upsert(&fx.pool, book.id, fx.warehouse_id, stock)
                .await
                .unwrap();
        }
        book.id
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            recipient_name: "Lan Phạm".into(),
            phone: "0901234567".into(),
            street: "12 Phố Huế".into(),
            ward: "Hàng Bài".into(),
            district: "Hoàn Kiếm".into(),
            province: "Hanoi".into(),
        }
    }

    fn request(customer_id: i64, items: Vec<OrderItemRequest>) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id,
            items,
            shipping_address: Some(address()),
            payment_method: "cod".into(),
        }
    }

    fn item(book_id: i64, quantity: i64) -> OrderItemRequest {
        OrderItemRequest {
            book_id: Some(book_id),
            code: None,
            quantity,
        }
    }

    #[tokio::test]
    async fn totals_are_subtotal_plus_shipping() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "BK-1", 150000, BookFormat::Paperback, 10).await;

        let receipt = fx
            .service
            .create_order(request(fx.customer_id, vec![item(book_id, 2)]))
            .await
            .unwrap();

        assert_eq!(receipt.subtotal, 300000);
        assert_eq!(receipt.shipping_fee, 30000);
        assert_eq!(receipt.total, 330000);
        assert!(receipt.shipping_quoted);

        let detail = order::find_by_id(&fx.pool, receipt.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.order.total, 330000);
        assert_eq!(detail.entries.len(), 1);
        assert_eq!(detail.entries[0].line_total, 300000);
        assert_eq!(detail.delivery_info.unwrap().quoted_fee, 30000);
    }

    #[tokio::test]
    async fn checkout_reserves_stock() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 10).await;

        fx.service
            .create_order(request(fx.customer_id, vec![item(book_id, 3)]))
            .await
            .unwrap();

        let level = stock_level::find(&fx.pool, book_id, fx.warehouse_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(level.reserved, 3);
        assert_eq!(level.available(), 7);
    }

    #[tokio::test]
    async fn shipping_outage_degrades_not_fails() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 5).await;
        fx.shipping.fail.store(true, Ordering::SeqCst);

        let receipt = fx
            .service
            .create_order(request(fx.customer_id, vec![item(book_id, 1)]))
            .await
            .unwrap();

        assert_eq!(receipt.shipping_fee, 0);
        assert_eq!(receipt.total, 100000);
        assert!(!receipt.shipping_quoted);

        let detail = order::find_by_id(&fx.pool, receipt.order_id)
            .await
            .unwrap()
            .unwrap();
        assert!(detail.delivery_info.is_none());
    }

    #[tokio::test]
    async fn digital_only_order_needs_no_address_or_stock() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "EB-1", 50000, BookFormat::Ebook, 0).await;

        let receipt = fx
            .service
            .create_order(CreateOrderRequest {
                customer_id: fx.customer_id,
                items: vec![item(book_id, 1)],
                shipping_address: None,
                payment_method: "card".into(),
            })
            .await
            .unwrap();

        assert_eq!(receipt.order_type, OrderType::Digital);
        assert_eq!(receipt.shipping_fee, 0);
        assert_eq!(receipt.total, 50000);
    }

    #[tokio::test]
    async fn mixed_cart_derives_mixed_order_type() {
        let fx = fixture().await;
        let paper = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 5).await;
        let ebook = seed_book(&fx, "EB-1", 50000, BookFormat::Ebook, 0).await;

        let receipt = fx
            .service
            .create_order(request(fx.customer_id, vec![item(paper, 1), item(ebook, 1)]))
            .await
            .unwrap();
        assert_eq!(receipt.order_type, OrderType::Mixed);
    }

    #[tokio::test]
    async fn unknown_customer_is_not_found() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 5).await;

        let err = fx
            .service
            .create_order(request(999, vec![item(book_id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_book_is_named_in_the_error() {
        let fx = fixture().await;

        let err = fx
            .service
            .create_order(request(
                fx.customer_id,
                vec![OrderItemRequest {
                    book_id: None,
                    code: Some("GHOST".into()),
                    quantity: 1,
                }],
            ))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("GHOST")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 5).await;

        let err = fx
            .service
            .create_order(request(fx.customer_id, vec![item(book_id, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_address_for_physical_item_is_rejected() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 5).await;

        let err = fx
            .service
            .create_order(CreateOrderRequest {
                customer_id: fx.customer_id,
                items: vec![item(book_id, 1)],
                shipping_address: None,
                payment_method: "cod".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn insufficient_stock_names_the_book() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 2).await;

        let err = fx
            .service
            .create_order(request(fx.customer_id, vec![item(book_id, 3)]))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("Book BK-1")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_checkout_leaves_no_residue() {
        let fx = fixture().await;
        let plenty = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 10).await;
        let scarce = seed_book(&fx, "BK-2", 100000, BookFormat::Paperback, 1).await;

        // Hold the scarce key's lock so the checkout passes its optimistic
        // pre-check, then stalls before reserving. Drain the stock while it
        // waits; the in-transaction check must then fail and roll everything
        // back.
        let held = fx
            .ledger
            .key_lock((scarce, fx.warehouse_id))
            .lock_owned()
            .await;

        let service = fx.service.clone();
        let customer_id = fx.customer_id;
        let handle = tokio::spawn(async move {
            service
                .create_order(request(customer_id, vec![item(plenty, 2), item(scarce, 1)]))
                .await
        });

        // Let the checkout reach the lock, then lose the race.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        sqlx::query("UPDATE stock_level SET reserved = 1 WHERE book_id = ?")
            .bind(scarce)
            .execute(&fx.pool)
            .await
            .unwrap();
        drop(held);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::Conflict(_) | AppError::Validation(_)));

        // First item's reservation rolled back with the order.
        let level = stock_level::find(&fx.pool, plenty, fx.warehouse_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(level.reserved, 0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&fx.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn duplicate_cart_lines_are_rejected() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 10).await;

        let err = fx
            .service
            .create_order(request(fx.customer_id, vec![item(book_id, 1), item(book_id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_province_falls_back_to_default_warehouse() {
        let fx = fixture().await;
        let book_id = seed_book(&fx, "BK-1", 100000, BookFormat::Paperback, 5).await;

        let mut req = request(fx.customer_id, vec![item(book_id, 1)]);
        req.shipping_address.as_mut().unwrap().province = "Đà Nẵng".into();

        let receipt = fx.service.create_order(req).await.unwrap();
        let level = stock_level::find(&fx.pool, book_id, fx.warehouse_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(level.reserved, 1);
        assert_eq!(receipt.status, OrderStatus::Pending);
    }
}
