// src/services/order_service.rs

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, OrderRepository},
    models::{
        auth::{User, UserRole},
        orders::{Order, OrderItem, OrderLinePayload, OrderStatus, PlaceOrderPayload},
    },
};

/// Soma as quantidades de linhas repetidas do mesmo produto.
/// A ordem por id evita deadlock entre pedidos concorrentes que travam os mesmos produtos.
pub fn merge_lines(lines: &[OrderLinePayload]) -> Vec<(Uuid, i32)> {
    let mut merged: BTreeMap<Uuid, i32> = BTreeMap::new();
    for line in lines {
        *merged.entry(line.product_id).or_insert(0) += line.quantity;
    }
    merged.into_iter().collect()
}

/// Preço de uma linha a partir do produto travado. Falha se faltar estoque.
pub fn price_line(
    product_id: Uuid,
    product_name: &str,
    unit_price: Decimal,
    stock: i32,
    quantity: i32,
) -> Result<OrderItem, AppError> {
    if quantity > stock {
        return Err(AppError::InsufficientStock(product_name.to_string()));
    }

    Ok(OrderItem {
        order_id: Uuid::nil(),
        product_id,
        product_name: product_name.to_string(),
        unit_price,
        quantity,
        line_total: unit_price * Decimal::from(quantity),
    })
}

pub fn order_total(items: &[OrderItem]) -> Decimal {
    items.iter().map(|item| item.line_total).sum()
}

pub fn can_view_order(viewer: &User, order: &Order) -> bool {
    order.user_id == viewer.id || viewer.role == UserRole::Admin
}

#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    catalog: CatalogRepository,
    pool: PgPool,
}

impl OrderService {
    pub fn new(orders: OrderRepository, catalog: CatalogRepository, pool: PgPool) -> Self {
        Self { orders, catalog, pool }
    }

    pub async fn place_order(&self, user: &User, payload: &PlaceOrderPayload) -> Result<Order, AppError> {
        let lines = merge_lines(&payload.items);

        // Inicia a transação: trava, confere e baixa o estoque de cada produto
        let mut tx = self.pool.begin().await?;

        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity) in lines {
            let (name, price, stock) = self
                .catalog
                .lock_product(&mut *tx, product_id)
                .await?
                .ok_or(AppError::ProductNotFound)?;

            let item = price_line(product_id, &name, price, stock, quantity)?;
            self.catalog.adjust_stock(&mut *tx, product_id, -quantity).await?;
            items.push(item);
        }

        let total = order_total(&items);
        let mut order = self
            .orders
            .insert_order(&mut *tx, user.id, &payload.shipping_address, total)
            .await?;

        for item in items.iter_mut() {
            item.order_id = order.id;
            self.orders.insert_item(&mut *tx, item).await?;
        }

        tx.commit().await?;

        tracing::info!("🛒 Pedido {} criado por {} (total ₹{})", order.id, user.id, order.total);

        order.items = items;
        Ok(order)
    }

    pub async fn list_my_orders(&self, user: &User) -> Result<Vec<Order>, AppError> {
        let orders = self.orders.list_by_user(user.id).await?;
        self.with_items(orders).await
    }

    pub async fn list_all_orders(&self) -> Result<Vec<Order>, AppError> {
        let orders = self.orders.list_all().await?;
        self.with_items(orders).await
    }

    pub async fn get_order(&self, viewer: &User, id: Uuid) -> Result<Order, AppError> {
        let mut order = self
            .orders
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        if !can_view_order(viewer, &order) {
            return Err(AppError::OrderNotFound);
        }

        order.items = self.orders.items_for(&self.pool, &[order.id]).await?;
        Ok(order)
    }

    /// Muda o status do pedido. Cancelar devolve os itens ao estoque na mesma transação.
    pub async fn update_order_status(&self, id: Uuid, next: OrderStatus) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .orders
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        current.status.ensure_transition(next)?;

        let items = self.orders.items_for(&mut *tx, &[id]).await?;

        if next == OrderStatus::Cancelled {
            for item in &items {
                self.catalog.adjust_stock(&mut *tx, item.product_id, item.quantity).await?;
            }
        }

        let mut order = self.orders.update_status(&mut *tx, id, next).await?;

        tx.commit().await?;

        tracing::info!(
            "🚚 Pedido {}: {} -> {}",
            id,
            current.status.as_str(),
            next.as_str()
        );

        order.items = items;
        Ok(order)
    }

    // Busca os itens de vários pedidos numa consulta só
    async fn with_items(&self, mut orders: Vec<Order>) -> Result<Vec<Order>, AppError> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in self.orders.items_for(&self.pool, &ids).await? {
            by_order.entry(item.order_id).or_default().push(item);
        }

        for order in orders.iter_mut() {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(orders)
    }
}
