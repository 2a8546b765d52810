// src/db/catalog_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Product, ProductCategory, ProductPayload},
};

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.category_id, c.name AS category_name, p.name, p.description,
           p.price, p.stock, p.image_url, p.created_at, p.updated_at
    FROM products p
    JOIN product_categories c ON c.id = p.category_id
"#;

// Chave do pg_advisory_xact_lock da carga inicial
const CATALOG_SEED_LOCK: i64 = 0x6167_7269_5f73_6565;

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---
    // Categorias
    // ---

    pub async fn list_categories(&self) -> Result<Vec<ProductCategory>, AppError> {
        let categories = sqlx::query_as::<_, ProductCategory>(
            "SELECT id, name, created_at FROM product_categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn create_category(&self, name: &str) -> Result<ProductCategory, AppError> {
        sqlx::query_as::<_, ProductCategory>(
            "INSERT INTO product_categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::CategoryAlreadyExists(name.to_string());
                }
            }
            e.into()
        })
    }

    /// Insere a categoria se ainda não existir (usado pela carga inicial).
    pub async fn ensure_category<'e, E>(&self, executor: E, name: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "INSERT INTO product_categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM product_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::CategoryInUse;
                    }
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::CategoryNotFound);
        }
        Ok(())
    }

    pub async fn count_categories(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ---
    // Produtos
    // ---

    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{} WHERE ($1::text IS NULL OR lower(c.name) = lower($1)) ORDER BY p.name ASC",
            PRODUCT_SELECT
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!("{} WHERE p.id = $1", PRODUCT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        payload: &ProductPayload,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO products (category_id, name, description, price, stock, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(payload.category_id)
        .bind(payload.name.trim())
        .bind(payload.description.as_deref())
        .bind(payload.price)
        .bind(payload.stock)
        .bind(payload.image_url.as_deref())
        .fetch_one(executor)
        .await
        .map_err(map_category_fk)?;
        Ok(id)
    }

    pub async fn update_product(&self, id: Uuid, payload: &ProductPayload) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET category_id = $2, name = $3, description = $4,
                price = $5, stock = $6, image_url = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.category_id)
        .bind(payload.name.trim())
        .bind(payload.description.as_deref())
        .bind(payload.price)
        .bind(payload.stock)
        .bind(payload.image_url.as_deref())
        .execute(&self.pool)
        .await
        .map_err(map_category_fk)?;

        if result.rows_affected() == 0 {
            return Err(AppError::ProductNotFound);
        }
        Ok(())
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), AppError> {
        // Produto que já foi pedido fica preso pelos itens (ON DELETE RESTRICT)
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::ProductInUse;
                    }
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::ProductNotFound);
        }
        Ok(())
    }

    pub async fn count_products<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    /// Serializa cargas iniciais de réplicas diferentes. Liberada no fim da transação.
    pub async fn lock_catalog_seed<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CATALOG_SEED_LOCK)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Carga inicial: resolve a categoria pelo nome dentro da mesma transação
    pub async fn insert_seed_product<'e, E>(
        &self,
        executor: E,
        category_name: &str,
        name: &str,
        description: &str,
        price: Decimal,
        stock: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO products (category_id, name, description, price, stock)
            SELECT id, $2, $3, $4, $5 FROM product_categories WHERE name = $1
            "#,
        )
        .bind(category_name)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Estoque (sempre dentro da transação do pedido)
    // ---

    /// Trava a linha do produto até o fim da transação (SELECT ... FOR UPDATE).
    pub async fn lock_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<(String, Decimal, i32)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, (String, Decimal, i32)>(
            "SELECT name, price, stock FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn adjust_stock<'e, E>(&self, executor: E, id: Uuid, delta: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(executor)
            .await?;
        Ok(())
    }
}

fn map_category_fk(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::CategoryNotFound;
        }
    }
    e.into()
}
