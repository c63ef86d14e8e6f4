#![allow(dead_code)]

use axum::Router;
use crudkit::{CrudConfig, CrudController, EntityService};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection, DbErr};
use sea_orm_migration::prelude::*;
use std::sync::Arc;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use uuid::Uuid;

pub mod article;

use article::{Article, ArticleController};

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn article_service(db: DatabaseConnection, elements_per_page: u64) -> EntityService<Article> {
    EntityService::new(db, CrudConfig::new().elements_per_page(elements_per_page))
}

pub fn setup_test_app(db: DatabaseConnection, elements_per_page: u64) -> Router {
    let service = Arc::new(article_service(db, elements_per_page));
    Router::new()
        .nest(
            ArticleController::ROUTE_PREFIX,
            ArticleController::router(service),
        )
        .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
}

/// Insert an article with the given title, status and view count.
pub async fn insert_article(
    db: &DatabaseConnection,
    title: &str,
    status: &str,
    views: i32,
) -> Result<article::Model, DbErr> {
    article::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        slug: Set(crudkit::slugify(title, "-").unwrap_or_default()),
        status: Set(status.to_string()),
        views: Set(views),
        body: Set(String::new()),
    }
    .insert(db)
    .await
}

/// `count` articles titled "Article 1".."Article {count}" with views 1..=count;
/// even views are published, odd ones drafts.
pub async fn seed_articles(db: &DatabaseConnection, count: i32) -> Result<Vec<article::Model>, DbErr> {
    let mut articles = Vec::new();
    for n in 1..=count {
        let status = if n % 2 == 0 { "published" } else { "draft" };
        articles.push(insert_article(db, &format!("Article {n}"), status, n).await?);
    }
    Ok(articles)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateArticleTable)]
    }
}

pub struct CreateArticleTable;

#[async_trait::async_trait]
impl MigrationName for CreateArticleTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_article_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateArticleTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Articles::Table)
            .if_not_exists()
            .col(ColumnDef::new(Articles::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Articles::Title).string().not_null())
            .col(ColumnDef::new(Articles::Slug).string().not_null())
            .col(
                ColumnDef::new(Articles::Status)
                    .string()
                    .not_null()
                    .default("draft"),
            )
            .col(
                ColumnDef::new(Articles::Views)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(ColumnDef::new(Articles::Body).text().not_null())
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Articles::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Articles {
    Table,
    Id,
    Title,
    Slug,
    Status,
    Views,
    Body,
}
