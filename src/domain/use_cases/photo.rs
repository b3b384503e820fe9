use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        option_fields::OptionField,
        photo::{Pagination, Photo, PhotoChanges, PhotoFilter, PhotoListQuery, PhotoListResponse, UpdatePhotoRequest},
    },
    errors::AppError,
    repositories::{category::CategoryRepository, photo::PhotoRepository},
    revalidate::{invalidate_best_effort, CacheInvalidator},
    storage::ObjectStorage,
    utils::valid_uuid::valid_uuid,
};

pub struct PhotoHandler {
    pub photo_repo: Arc<dyn PhotoRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub invalidator: Arc<dyn CacheInvalidator>,
    pub photos_bucket: String,
    pub thumbnails_bucket: String,
}

fn required<T>(field: OptionField<T>, name: &str) -> Result<Option<T>, AppError> {
    match field {
        OptionField::Unchanged => Ok(None),
        OptionField::SetToNull => Err(AppError::InvalidInput(format!("{} cannot be null", name))),
        OptionField::SetToValue(value) => Ok(Some(value)),
    }
}

impl PhotoHandler {
    pub fn new(
        photo_repo: Arc<dyn PhotoRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        storage: Arc<dyn ObjectStorage>,
        invalidator: Arc<dyn CacheInvalidator>,
        photos_bucket: &str,
        thumbnails_bucket: &str,
    ) -> Self {
        PhotoHandler {
            photo_repo,
            category_repo,
            storage,
            invalidator,
            photos_bucket: photos_bucket.to_string(),
            thumbnails_bucket: thumbnails_bucket.to_string(),
        }
    }

    /// Public listing. An unknown category slug is logged and the category
    /// filter dropped; the other filters still apply.
    pub async fn list_photos(&self, query: PhotoListQuery) -> Result<PhotoListResponse, AppError> {
        let (limit, offset) = query.page();

        let category_id = match query.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => match self.category_repo.find_category_by_slug(slug).await? {
                Some(category) => Some(category.id),
                None => {
                    tracing::warn!(slug, "Unknown category slug, listing without category filter");
                    None
                }
            },
            None => None,
        };

        let filter = PhotoFilter {
            category_id,
            view: query.view,
            featured_only: query.featured.unwrap_or(false),
            limit,
            offset,
        };

        let photos = self.photo_repo.list_photos(&filter).await?;
        let has_more = photos.len() as i64 == limit;

        Ok(PhotoListResponse {
            photos,
            pagination: Pagination { limit, offset, has_more },
        })
    }

    pub async fn update_photo(&self, id: &str, request: UpdatePhotoRequest) -> Result<Photo, AppError> {
        let id = valid_uuid(id, "photo")?;
        request.validate()?;

        let mut changes = PhotoChanges::default();

        if let Some(title) = required(request.title, "title")? {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::InvalidInput("Title cannot be blank".into()));
            }
            changes.title = Some(title);
        }

        changes.description = request.description.blank_as_null().into_option();

        match request.category_id {
            OptionField::Unchanged => {}
            OptionField::SetToNull => changes.category_id = Some(None),
            OptionField::SetToValue(category_id) => {
                if !self.category_repo.category_exists(&category_id).await? {
                    return Err(AppError::InvalidInput("Category does not exist".into()));
                }
                changes.category_id = Some(Some(category_id));
            }
        }

        changes.is_featured = required(request.is_featured, "is_featured")?;
        changes.is_black_white = required(request.is_black_white, "is_black_white")?;
        changes.display_order = required(request.display_order, "display_order")?;

        if changes.is_empty() {
            return self.photo_repo.get_photo(&id).await;
        }

        let photo = self.photo_repo.update_photo(&id, &changes).await?;
        tracing::info!(photo_id = %photo.id, "Photo updated");

        invalidate_best_effort(self.invalidator.as_ref()).await;
        Ok(photo)
    }

    /// Deletes the record, then both stored objects. Object cleanup is best
    /// effort: the record is gone either way.
    pub async fn delete_photo(&self, id: &str) -> Result<(), AppError> {
        let id = valid_uuid(id, "photo")?;

        let photo = self.photo_repo.delete_photo(&id).await?;
        tracing::info!(photo_id = %photo.id, "Photo record deleted");

        let objects = [
            (self.photos_bucket.as_str(), photo.storage_path.as_str()),
            (self.thumbnails_bucket.as_str(), photo.thumbnail_path.as_str()),
        ];
        for (bucket, path) in objects {
            if let Err(e) = self.storage.delete(bucket, path).await {
                tracing::warn!(photo_id = %photo.id, bucket, path, error = %e, "Failed to delete stored object");
            }
        }

        invalidate_best_effort(self.invalidator.as_ref()).await;
        Ok(())
    }

    pub async fn reorder_photos(&self, photo_ids: Vec<Uuid>) -> Result<(), AppError> {
        self.photo_repo.reorder_photos(&photo_ids).await?;
        invalidate_best_effort(self.invalidator.as_ref()).await;
        Ok(())
    }

    /// Moves one photo to `to_index` and returns the full resulting order.
    pub async fn move_photo(&self, id: &str, to_index: usize) -> Result<Vec<Uuid>, AppError> {
        let id = valid_uuid(id, "photo")?;

        let order = self.photo_repo.move_photo(&id, to_index).await?;
        tracing::info!(photo_id = %id, to_index, "Photo moved");

        invalidate_best_effort(self.invalidator.as_ref()).await;
        Ok(order)
    }
}
