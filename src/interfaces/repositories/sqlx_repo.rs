use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxCategoryRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxPhotoRepo {
    pub pool: PgPool,
}

/// Maps a unique-constraint violation on `constraint` to a 409 with `message`,
/// everything else through the generic database conversion.
pub(crate) fn map_unique_violation(err: sqlx::Error, constraint: &str, message: &str) -> crate::errors::AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(constraint) {
            return crate::errors::AppError::Conflict(message.into());
        }
    }
    crate::errors::AppError::from(err)
}
