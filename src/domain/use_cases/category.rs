use std::sync::Arc;

use validator::Validate;

use crate::{
    entities::{
        category::{
            slugify, Category, CategoryChanges, CategoryListResponse, CreateCategoryRequest,
            NewCategory, UpdateCategoryRequest,
        },
        option_fields::OptionField,
    },
    errors::AppError,
    repositories::category::CategoryRepository,
    revalidate::{invalidate_best_effort, CacheInvalidator},
    utils::valid_uuid::valid_uuid,
};

pub struct CategoryHandler {
    pub category_repo: Arc<dyn CategoryRepository>,
    pub invalidator: Arc<dyn CacheInvalidator>,
}

fn slug_for(name: &str) -> Result<String, AppError> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(AppError::InvalidInput(
            "Category name must contain at least one letter or digit".into(),
        ));
    }
    Ok(slug)
}

impl CategoryHandler {
    pub fn new(category_repo: Arc<dyn CategoryRepository>, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        CategoryHandler { category_repo, invalidator }
    }

    pub async fn list_categories(&self) -> Result<CategoryListResponse, AppError> {
        let categories = self.category_repo.list_categories().await?;
        Ok(CategoryListResponse { categories })
    }

    pub async fn create_category(&self, request: CreateCategoryRequest) -> Result<Category, AppError> {
        request.validate()?;

        let name = request.name.trim().to_string();
        let new_category = NewCategory {
            slug: slug_for(&name)?,
            name,
            description: request.description.filter(|d| !d.trim().is_empty()),
            display_order: request.display_order.unwrap_or(0),
        };

        let category = self.category_repo.create_category(&new_category).await?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");

        invalidate_best_effort(self.invalidator.as_ref()).await;
        Ok(category)
    }

    /// Applies a partial update. A new name also regenerates the slug.
    pub async fn update_category(&self, id: &str, request: UpdateCategoryRequest) -> Result<Category, AppError> {
        let id = valid_uuid(id, "category")?;
        request.validate()?;

        let mut changes = CategoryChanges::default();

        match request.name {
            OptionField::Unchanged => {}
            OptionField::SetToNull => {
                return Err(AppError::InvalidInput("Category name cannot be null".into()));
            }
            OptionField::SetToValue(name) => {
                let name = name.trim().to_string();
                changes.slug = Some(slug_for(&name)?);
                changes.name = Some(name);
            }
        }

        changes.description = request.description.blank_as_null().into_option();

        match request.display_order {
            OptionField::Unchanged => {}
            OptionField::SetToNull => {
                return Err(AppError::InvalidInput("display_order cannot be null".into()));
            }
            OptionField::SetToValue(order) => changes.display_order = Some(order),
        }

        if changes.is_empty() {
            return self.category_repo.get_category(&id).await;
        }

        let category = self.category_repo.update_category(&id, &changes).await?;
        tracing::info!(category_id = %category.id, "Category updated");

        invalidate_best_effort(self.invalidator.as_ref()).await;
        Ok(category)
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let id = valid_uuid(id, "category")?;

        self.category_repo.delete_category(&id).await?;
        tracing::info!(category_id = %id, "Category deleted");

        invalidate_best_effort(self.invalidator.as_ref()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::predicate::eq;
    use uuid::Uuid;

    use crate::repositories::category::MockCategoryRepository;
    use crate::revalidate::MockCacheInvalidator;

    fn category(name: &str, slug: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description: None,
            display_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn quiet_invalidator() -> Arc<dyn CacheInvalidator> {
        let mut invalidator = MockCacheInvalidator::new();
        invalidator.expect_invalidate().returning(|_| Ok(()));
        Arc::new(invalidator)
    }

    #[actix_rt::test]
    async fn create_derives_slug_and_defaults_order() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_create_category()
            .withf(|c| c.slug == "black-white" && c.name == "Black & White!!" && c.display_order == 0)
            .times(1)
            .returning(|c| Ok(category(&c.name, &c.slug)));

        let handler = CategoryHandler::new(Arc::new(repo), quiet_invalidator());
        let created = handler
            .create_category(CreateCategoryRequest {
                name: "  Black & White!!  ".into(),
                description: None,
                display_order: None,
            })
            .await
            .unwrap();

        assert_eq!(created.slug, "black-white");
    }

    #[actix_rt::test]
    async fn create_rejects_names_without_slug_characters() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_create_category().never();

        let handler = CategoryHandler::new(Arc::new(repo), quiet_invalidator());
        let err = handler
            .create_category(CreateCategoryRequest {
                name: "!!!".into(),
                description: None,
                display_order: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[actix_rt::test]
    async fn rename_regenerates_slug() {
        let id = Uuid::new_v4();
        let mut repo = MockCategoryRepository::new();
        repo.expect_update_category()
            .with(eq(id), eq(CategoryChanges {
                name: Some("Street Life".into()),
                slug: Some("street-life".into()),
                ..CategoryChanges::default()
            }))
            .times(1)
            .returning(|_, c| Ok(category(c.name.as_deref().unwrap_or_default(), c.slug.as_deref().unwrap_or_default())));

        let handler = CategoryHandler::new(Arc::new(repo), quiet_invalidator());
        let request: UpdateCategoryRequest = serde_json::from_str(r#"{"name": "Street Life"}"#).unwrap();
        let updated = handler.update_category(&id.to_string(), request).await.unwrap();

        assert_eq!(updated.slug, "street-life");
    }

    #[actix_rt::test]
    async fn empty_update_returns_current_record() {
        let id = Uuid::new_v4();
        let mut repo = MockCategoryRepository::new();
        repo.expect_update_category().never();
        repo.expect_get_category()
            .with(eq(id))
            .returning(|_| Ok(category("Portraits", "portraits")));

        let handler = CategoryHandler::new(Arc::new(repo), quiet_invalidator());
        let current = handler
            .update_category(&id.to_string(), UpdateCategoryRequest::default())
            .await
            .unwrap();

        assert_eq!(current.slug, "portraits");
    }

    #[actix_rt::test]
    async fn delete_in_use_category_surfaces_reference_error() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_delete_category()
            .returning(|_| Err(AppError::ReferenceInUse("in use".into())));

        let mut invalidator = MockCacheInvalidator::new();
        invalidator.expect_invalidate().never();

        let handler = CategoryHandler::new(Arc::new(repo), Arc::new(invalidator));
        let err = handler.delete_category(&Uuid::new_v4().to_string()).await.unwrap_err();

        assert!(matches!(err, AppError::ReferenceInUse(_)));
    }

    #[actix_rt::test]
    async fn malformed_id_is_rejected_before_the_repository() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_delete_category().never();

        let handler = CategoryHandler::new(Arc::new(repo), quiet_invalidator());
        let err = handler.delete_category("nope").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
