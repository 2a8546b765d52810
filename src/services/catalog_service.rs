// src/services/catalog_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::{
        catalog::{Product, ProductCategory, ProductPayload},
        validation::blank_field_error,
    },
};

pub const DEFAULT_CATEGORIES: [&str; 5] = ["Fertilizers", "Pesticides", "Equipment", "Seeds", "Herbicides"];

pub struct SeedProduct {
    pub category: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Preço em paise (centavos de rupia)
    pub price_paise: i64,
    pub stock: i32,
}

impl SeedProduct {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_paise, 2)
    }
}

pub const DEFAULT_PRODUCTS: [SeedProduct; 8] = [
    SeedProduct {
        category: "Fertilizers",
        name: "Krishi Vikas Organic Manure (Jaivik Khad)",
        description: "Nutrient-rich organic manure that improves soil structure and fertility.",
        price_paise: 45_000,
        stock: 100,
    },
    SeedProduct {
        category: "Pesticides",
        name: "Neemastra Natural Pest Repellent",
        description: "Neem based bio-pesticide effective against sucking pests and caterpillars.",
        price_paise: 25_000,
        stock: 75,
    },
    SeedProduct {
        category: "Equipment",
        name: "Durable Manual Seed Drill",
        description: "Hand-operated seed drill for uniform sowing in small and medium plots.",
        price_paise: 250_000,
        stock: 10,
    },
    SeedProduct {
        category: "Seeds",
        name: "Basmati Rice Seeds - Pusa 1121",
        description: "High-yield, long-grain basmati variety suited to North Indian conditions.",
        price_paise: 12_000,
        stock: 200,
    },
    SeedProduct {
        category: "Equipment",
        name: "AgroFlow Drip Irrigation Kit",
        description: "Complete drip kit for up to half an acre; saves water and fertilizer.",
        price_paise: 350_000,
        stock: 25,
    },
    SeedProduct {
        category: "Fertilizers",
        name: "Kisan Shakti Urea Fertilizer",
        description: "46% nitrogen urea for strong vegetative growth.",
        price_paise: 30_000,
        stock: 150,
    },
    SeedProduct {
        category: "Seeds",
        name: "Hybrid Cotton Seeds (BT Cotton)",
        description: "Bollworm-resistant hybrid cotton seeds with high fibre quality.",
        price_paise: 85_000,
        stock: 90,
    },
    SeedProduct {
        category: "Equipment",
        name: "FarmKing Power Sprayer (16L)",
        description: "Battery-powered 16 litre knapsack sprayer for pesticides and foliar feeds.",
        price_paise: 420_000,
        stock: 15,
    },
];

#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
    pool: PgPool,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list_categories(&self) -> Result<Vec<ProductCategory>, AppError> {
        self.repo.list_categories().await
    }

    pub async fn create_category(&self, name: &str) -> Result<ProductCategory, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(blank_field_error("name"));
        }

        let category = self.repo.create_category(name).await?;
        tracing::info!("🏷️ Categoria criada: {}", category.name);
        Ok(category)
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.delete_category(id).await
    }

    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, AppError> {
        self.repo.list_products(category).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.repo.find_product(id).await?.ok_or(AppError::ProductNotFound)
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, AppError> {
        let id = self.repo.create_product(&self.pool, payload).await?;
        tracing::info!("📦 Produto criado: {} ({})", payload.name, id);
        self.get_product(id).await
    }

    pub async fn update_product(&self, id: Uuid, payload: &ProductPayload) -> Result<Product, AppError> {
        self.repo.update_product(id, payload).await?;
        self.get_product(id).await
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.delete_product(id).await?;
        tracing::info!("🗑️ Produto removido: {}", id);
        Ok(())
    }

    /// Carga inicial do catálogo. As categorias são garantidas sempre;
    /// os produtos só entram quando a tabela ainda está vazia.
    pub async fn seed_default_catalog(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        self.repo.lock_catalog_seed(&mut *tx).await?;

        let mut new_categories = 0;
        for name in DEFAULT_CATEGORIES {
            new_categories += self.repo.ensure_category(&mut *tx, name).await?;
        }

        let existing_products = self.repo.count_products(&mut *tx).await?;
        if existing_products == 0 {
            for product in &DEFAULT_PRODUCTS {
                self.repo
                    .insert_seed_product(
                        &mut *tx,
                        product.category,
                        product.name,
                        product.description,
                        product.price(),
                        product.stock,
                    )
                    .await?;
            }
            tracing::info!("🌾 Catálogo inicial: {} produtos inseridos", DEFAULT_PRODUCTS.len());
        }

        tx.commit().await?;

        if new_categories > 0 {
            tracing::info!("🌾 Catálogo inicial: {} categorias novas", new_categories);
        }
        Ok(())
    }
}
