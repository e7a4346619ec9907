//! Order Repository
//!
//! Inserts run inside the checkout transaction — the caller owns commit and
//! rollback. Reads assemble the [`OrderDetail`] aggregate.

use shared::models::{DeliveryInfo, Order, OrderDetail, OrderEntry};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::RepoResult;

const ORDER_SELECT: &str = "SELECT id, order_number, customer_id, order_type, subtotal, shipping_fee, total, status, payment_status, payment_method, shipping_address, created_at, updated_at FROM orders";

pub async fn insert_order(tx: &mut Transaction<'_, Sqlite>, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, customer_id, order_type, subtotal, shipping_fee, total, status, payment_status, payment_method, shipping_address, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.customer_id)
    .bind(order.order_type)
    .bind(order.subtotal)
    .bind(order.shipping_fee)
    .bind(order.total)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(&order.payment_method)
    .bind(&order.shipping_address)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_entry(tx: &mut Transaction<'_, Sqlite>, entry: &OrderEntry) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_entry (id, order_id, book_id, line_no, item_kind, quantity, unit_price, line_total) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(entry.id)
    .bind(entry.order_id)
    .bind(entry.book_id)
    .bind(entry.line_no)
    .bind(entry.item_kind)
    .bind(entry.quantity)
    .bind(entry.unit_price)
    .bind(entry.line_total)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_delivery_info(
    tx: &mut Transaction<'_, Sqlite>,
    info: &DeliveryInfo,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO delivery_info (id, order_id, recipient_name, phone, street, ward, district, province, weight_grams, length_cm, width_cm, height_cm, service_id, service_type_id, quoted_fee) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
    )
    .bind(info.id)
    .bind(info.order_id)
    .bind(&info.recipient_name)
    .bind(&info.phone)
    .bind(&info.street)
    .bind(&info.ward)
    .bind(&info.district)
    .bind(&info.province)
    .bind(info.weight_grams)
    .bind(info.length_cm)
    .bind(info.width_cm)
    .bind(info.height_cm)
    .bind(info.service_id)
    .bind(info.service_type_id)
    .bind(info.quoted_fee)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let Some(order) = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };

    let entries = sqlx::query_as::<_, OrderEntry>(
        "SELECT id, order_id, book_id, line_no, item_kind, quantity, unit_price, line_total \
         FROM order_entry WHERE order_id = ? ORDER BY line_no",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let delivery_info = sqlx::query_as::<_, DeliveryInfo>(
        "SELECT id, order_id, recipient_name, phone, street, ward, district, province, weight_grams, length_cm, width_cm, height_cm, service_id, service_type_id, quoted_fee \
         FROM delivery_info WHERE order_id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(Some(OrderDetail {
        order,
        entries,
        delivery_info,
    }))
}

pub async fn find_by_number(pool: &SqlitePool, number: &str) -> RepoResult<Option<OrderDetail>> {
    let sql = format!("{ORDER_SELECT} WHERE order_number = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(number)
        .fetch_optional(pool)
        .await?;
    match order {
        Some(o) => find_by_id(pool, o.id).await,
        None => Ok(None),
    }
}
