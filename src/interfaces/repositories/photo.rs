use async_trait::async_trait;
use uuid::Uuid;
use sqlx::{self, types::Json, PgPool, Postgres, QueryBuilder, Transaction};

use crate::{
    entities::{
        category::Category,
        photo::{ColorMode, ColorView, NewPhoto, Photo, PhotoChanges, PhotoFilter, PhotoWithCategory},
    },
    errors::AppError,
    ordering::{assign_positions, plan_move, validate_reorder},
    repositories::sqlx_repo::SqlxPhotoRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Photos in display order, each with its category joined in.
    async fn list_photos(&self, filter: &PhotoFilter) -> Result<Vec<PhotoWithCategory>, AppError>;
    async fn get_photo(&self, id: &Uuid) -> Result<Photo, AppError>;
    async fn insert_photo(&self, photo: &NewPhoto) -> Result<Photo, AppError>;
    async fn update_photo(&self, id: &Uuid, changes: &PhotoChanges) -> Result<Photo, AppError>;
    /// Removes the row and hands it back so its objects can be cleaned up.
    async fn delete_photo(&self, id: &Uuid) -> Result<Photo, AppError>;
    /// Rewrites every `display_order` to the position in `ordered_ids`, which
    /// must be a permutation of all photo ids.
    async fn reorder_photos(&self, ordered_ids: &[Uuid]) -> Result<(), AppError>;
    /// Moves one photo to `to_index` and returns the resulting order.
    async fn move_photo(&self, id: &Uuid, to_index: usize) -> Result<Vec<Uuid>, AppError>;
}

#[derive(sqlx::FromRow)]
struct PhotoRow {
    #[sqlx(flatten)]
    photo: Photo,
    category: Option<Json<Category>>,
}

impl From<PhotoRow> for PhotoWithCategory {
    fn from(row: PhotoRow) -> Self {
        PhotoWithCategory {
            photo: row.photo,
            category: row.category.map(|c| c.0),
        }
    }
}

impl SqlxPhotoRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxPhotoRepo { pool }
    }

    async fn locked_order(tx: &mut Transaction<'_, Postgres>) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM photos
            ORDER BY display_order ASC, is_black_white DESC, created_at ASC
            FOR UPDATE
            "#
        )
        .fetch_all(&mut **tx)
        .await?;

        Ok(ids)
    }

    async fn apply_order(tx: &mut Transaction<'_, Postgres>, ordered_ids: &[Uuid]) -> Result<(), AppError> {
        let (ids, positions) = assign_positions(ordered_ids);

        sqlx::query(
            r#"
            UPDATE photos AS p
            SET display_order = v.position, updated_at = NOW()
            FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, position)
            WHERE p.id = v.id
            "#
        )
        .bind(&ids)
        .bind(&positions)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PhotoRepository for SqlxPhotoRepo {
    async fn list_photos(&self, filter: &PhotoFilter) -> Result<Vec<PhotoWithCategory>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT p.*,
                   CASE WHEN c.id IS NULL THEN NULL ELSE to_jsonb(c) END AS category
            FROM photos p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE TRUE
            "#
        );

        if let Some(category_id) = filter.category_id {
            builder.push(" AND p.category_id = ").push_bind(category_id);
        }
        match filter.view {
            ColorView::All => {}
            ColorView::Color => {
                builder.push(" AND p.is_black_white = FALSE");
            }
            ColorView::Bw => {
                builder.push(" AND p.is_black_white = TRUE");
            }
        }
        if filter.featured_only {
            builder.push(" AND p.is_featured = TRUE");
        }

        builder.push(" ORDER BY p.display_order ASC, p.is_black_white DESC, p.created_at ASC");
        builder.push(" LIMIT ").push_bind(filter.limit);
        builder.push(" OFFSET ").push_bind(filter.offset);

        let rows = builder
            .build_query_as::<PhotoRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PhotoWithCategory::from).collect())
    }

    async fn get_photo(&self, id: &Uuid) -> Result<Photo, AppError> {
        sqlx::query_as::<_, Photo>("SELECT * FROM photos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Photo not found".into()))
    }

    async fn insert_photo(&self, photo: &NewPhoto) -> Result<Photo, AppError> {
        let inserted = sqlx::query_as::<_, Photo>(
            r#"
            INSERT INTO photos (
                title, description, category_id, filename, file_size, width, height,
                storage_path, public_url, thumbnail_path, thumbnail_url,
                is_featured, is_black_white, display_order, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#
        )
        .bind(&photo.title)
        .bind(&photo.description)
        .bind(photo.category_id)
        .bind(&photo.filename)
        .bind(photo.file_size)
        .bind(photo.width)
        .bind(photo.height)
        .bind(&photo.storage_path)
        .bind(&photo.public_url)
        .bind(&photo.thumbnail_path)
        .bind(&photo.thumbnail_url)
        .bind(photo.is_featured)
        .bind(photo.is_black_white)
        .bind(photo.display_order)
        .bind(Json(&photo.metadata))
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn update_photo(&self, id: &Uuid, changes: &PhotoChanges) -> Result<Photo, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE photos SET updated_at = NOW()");

        if let Some(title) = &changes.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = &changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(category_id) = &changes.category_id {
            builder.push(", category_id = ").push_bind(*category_id);
        }
        if let Some(is_featured) = changes.is_featured {
            builder.push(", is_featured = ").push_bind(is_featured);
        }
        if let Some(is_black_white) = changes.is_black_white {
            builder.push(", is_black_white = ").push_bind(is_black_white);
            builder
                .push(", metadata = jsonb_set(metadata, '{colorMode}', to_jsonb(")
                .push_bind(ColorMode::from_black_white(is_black_white).as_str())
                .push("::text))");
        }
        if let Some(display_order) = changes.display_order {
            builder.push(", display_order = ").push_bind(display_order);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING *");

        builder
            .build_query_as::<Photo>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Photo not found".into()))
    }

    async fn delete_photo(&self, id: &Uuid) -> Result<Photo, AppError> {
        sqlx::query_as::<_, Photo>("DELETE FROM photos WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Photo not found".into()))
    }

    async fn reorder_photos(&self, ordered_ids: &[Uuid]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = Self::locked_order(&mut tx).await?;
        validate_reorder(&current, ordered_ids)?;
        Self::apply_order(&mut tx, ordered_ids).await?;

        tx.commit().await?;
        tracing::info!(count = ordered_ids.len(), "Photo order rewritten");
        Ok(())
    }

    async fn move_photo(&self, id: &Uuid, to_index: usize) -> Result<Vec<Uuid>, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = Self::locked_order(&mut tx).await?;
        let planned = plan_move(&current, *id, to_index)?;
        Self::apply_order(&mut tx, &planned).await?;

        tx.commit().await?;
        Ok(planned)
    }
}
