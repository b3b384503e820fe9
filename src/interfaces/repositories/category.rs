use async_trait::async_trait;
use uuid::Uuid;
use sqlx::{self, PgPool, Postgres, QueryBuilder};

use crate::{
    entities::category::{Category, CategoryChanges, NewCategory},
    errors::AppError,
    repositories::sqlx_repo::{map_unique_violation, SqlxCategoryRepo},
};

const SLUG_CONSTRAINT: &str = "categories_slug_key";
const SLUG_CONFLICT: &str = "A category with this slug already exists";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn get_category(&self, id: &Uuid) -> Result<Category, AppError>;
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError>;
    async fn category_exists(&self, id: &Uuid) -> Result<bool, AppError>;
    async fn create_category(&self, category: &NewCategory) -> Result<Category, AppError>;
    async fn update_category(&self, id: &Uuid, changes: &CategoryChanges) -> Result<Category, AppError>;
    /// Fails with `ReferenceInUse` while any photo points at the category.
    async fn delete_category(&self, id: &Uuid) -> Result<(), AppError>;
    async fn check_connection(&self) -> Result<(), AppError>;
}

impl SqlxCategoryRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxCategoryRepo { pool }
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepo {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories
            ORDER BY display_order ASC, name ASC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn get_category(&self, id: &Uuid) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".into()))
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    async fn category_exists(&self, id: &Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, description, display_order)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, SLUG_CONSTRAINT, SLUG_CONFLICT))
    }

    async fn update_category(&self, id: &Uuid, changes: &CategoryChanges) -> Result<Category, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE categories SET updated_at = NOW()");

        if let Some(name) = &changes.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(slug) = &changes.slug {
            builder.push(", slug = ").push_bind(slug);
        }
        if let Some(description) = &changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(display_order) = changes.display_order {
            builder.push(", display_order = ").push_bind(display_order);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING *");

        builder
            .build_query_as::<Category>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, SLUG_CONSTRAINT, SLUG_CONFLICT))?
            .ok_or_else(|| AppError::NotFound("Category not found".into()))
    }

    async fn delete_category(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if locked.is_none() {
            return Err(AppError::NotFound("Category not found".into()));
        }

        let photo_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photos WHERE category_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if photo_count > 0 {
            return Err(AppError::ReferenceInUse(format!(
                "Cannot delete category: {} photo(s) are still assigned to it",
                photo_count
            )));
        }

        // The ON DELETE RESTRICT key still guards against a concurrent upload.
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
