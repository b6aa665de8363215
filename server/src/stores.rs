//! Postgres implementations of the larder storage traits.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use larder_core::{
    AnalysisState, ImageHandle, NewRecord, ObjectStore, ObjectStoreError, Record, RecordId,
    RecordState, RecordStore, RecipeSuggestion, ScanState, ScannedRecipe, Status, StoreError,
    UploadTarget, UserId,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::generate_token;
use crate::db::DbPool;
use crate::models::{
    FridgeAnalysisRow, ImageData, NewFridgeAnalysis, NewImage, NewRecipeScan, NewUploadTarget,
    RecipeScanRow,
};
use crate::schema::{fridge_analyses, images, recipe_scans, upload_targets};

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn object_backend(e: impl std::fmt::Display) -> ObjectStoreError {
    ObjectStoreError::Backend(e.to_string())
}

fn parse_status(id: RecordId, status: &str) -> Result<Status, StoreError> {
    Status::parse(status).ok_or_else(|| StoreError::Corrupt {
        id,
        message: format!("unknown status {:?}", status),
    })
}

fn from_json<T: DeserializeOwned>(
    id: RecordId,
    column: &str,
    value: serde_json::Value,
) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
        id,
        message: format!("{}: {}", column, e),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(backend)
}

/// Upload targets not used within this window are swept and no longer accepted.
const UPLOAD_TARGET_TTL_MINUTES: i64 = 15;

fn upload_target_cutoff() -> chrono::DateTime<Utc> {
    Utc::now() - chrono::Duration::minutes(UPLOAD_TARGET_TTL_MINUTES)
}

/// Images stored in the `images` table, served back by `GET /api/images/{handle}`.
pub struct PgObjectStore {
    pool: Arc<DbPool>,
    public_base_url: String,
}

impl PgObjectStore {
    pub fn new(pool: Arc<DbPool>, public_base_url: impl Into<String>) -> Self {
        Self {
            pool,
            public_base_url: public_base_url.into(),
        }
    }

    /// Load an image's bytes. Unknown or malformed handles yield `None`.
    pub fn fetch(&self, handle: &str) -> Result<Option<ImageData>, ObjectStoreError> {
        let Ok(id) = Uuid::parse_str(handle) else {
            return Ok(None);
        };
        let mut conn = self.pool.get().map_err(object_backend)?;

        images::table
            .find(id)
            .select(ImageData::as_select())
            .first(&mut conn)
            .optional()
            .map_err(object_backend)
    }
}

#[async_trait]
impl ObjectStore for PgObjectStore {
    async fn request_upload_target(&self, owner: UserId) -> Result<UploadTarget, ObjectStoreError> {
        let mut conn = self.pool.get().map_err(object_backend)?;

        let swept = diesel::delete(
            upload_targets::table.filter(upload_targets::created_at.lt(upload_target_cutoff())),
        )
        .execute(&mut conn)
        .map_err(object_backend)?;
        if swept > 0 {
            tracing::debug!(count = swept, "Swept expired upload targets");
        }

        let token = generate_token();
        diesel::insert_into(upload_targets::table)
            .values(&NewUploadTarget {
                token: &token,
                user_id: owner,
            })
            .execute(&mut conn)
            .map_err(object_backend)?;

        Ok(UploadTarget {
            url: format!("postgres://upload_targets/{}", token),
            token,
        })
    }

    async fn transfer(
        &self,
        target: &UploadTarget,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<ImageHandle, ObjectStoreError> {
        if data.is_empty() {
            return Err(ObjectStoreError::EmptyUpload);
        }
        let mut conn = self.pool.get().map_err(object_backend)?;

        let image_id = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                // Deleting the target consumes it, so a second transfer finds nothing.
                let owner: Option<Uuid> = diesel::delete(
                    upload_targets::table
                        .filter(upload_targets::token.eq(&target.token))
                        .filter(upload_targets::created_at.ge(upload_target_cutoff())),
                )
                .returning(upload_targets::user_id)
                .get_result(conn)
                .optional()?;
                let Some(owner) = owner else {
                    return Ok(None);
                };

                let id: Uuid = diesel::insert_into(images::table)
                    .values(&NewImage {
                        user_id: owner,
                        content_type,
                        data: &data,
                    })
                    .returning(images::id)
                    .get_result(conn)?;
                Ok(Some(id))
            })
            .map_err(object_backend)?;

        image_id
            .map(|id| ImageHandle::new(id.to_string()))
            .ok_or(ObjectStoreError::InvalidTarget)
    }

    async fn resolve(&self, handle: &ImageHandle) -> Option<String> {
        let id = Uuid::parse_str(handle.as_str()).ok()?;
        let mut conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Database connection failed while resolving image");
                return None;
            }
        };

        let exists: bool = diesel::select(diesel::dsl::exists(images::table.find(id)))
            .get_result(&mut conn)
            .unwrap_or(false);

        exists.then(|| format!("{}/api/images/{}", self.public_base_url, handle))
    }

    async fn remove(&self, handle: &ImageHandle) -> Result<bool, ObjectStoreError> {
        let Ok(id) = Uuid::parse_str(handle.as_str()) else {
            return Ok(false);
        };
        let mut conn = self.pool.get().map_err(object_backend)?;

        let deleted = diesel::delete(images::table.find(id))
            .execute(&mut conn)
            .map_err(object_backend)?;
        Ok(deleted > 0)
    }
}

/// Record store over the `fridge_analyses` and `recipe_scans` tables.
///
/// A patch only matches rows still in `processing`, which keeps every record's
/// terminal status final.
pub struct PgRecordStore {
    pool: Arc<DbPool>,
}

impl PgRecordStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

fn analysis_from_row(row: FridgeAnalysisRow) -> Result<Record<AnalysisState>, StoreError> {
    let state = match parse_status(row.id, &row.status)? {
        Status::Processing => AnalysisState::Processing,
        Status::Failed => AnalysisState::Failed,
        Status::Completed => AnalysisState::Completed {
            ingredients: from_json::<Vec<String>>(row.id, "ingredients", row.ingredients)?,
            recipes: from_json::<Vec<RecipeSuggestion>>(row.id, "recipes", row.recipes)?,
        },
    };

    Ok(Record {
        id: row.id,
        owner: row.user_id,
        image: ImageHandle::new(row.image_handle),
        created_at: row.created_at,
        updated_at: row.updated_at,
        state,
    })
}

fn scan_from_row(row: RecipeScanRow) -> Result<Record<ScanState>, StoreError> {
    let state = match parse_status(row.id, &row.status)? {
        Status::Processing => ScanState::Processing,
        Status::Failed => ScanState::Failed,
        Status::Completed => {
            let defaults = ScannedRecipe::default();
            ScanState::Completed(ScannedRecipe {
                name: row.name.unwrap_or(defaults.name),
                ingredients: from_json(row.id, "ingredients", row.ingredients)?,
                instructions: from_json(row.id, "instructions", row.instructions)?,
                cooking_time: row.cooking_time,
                servings: row.servings,
                difficulty: row.difficulty,
                category: row.category,
            })
        }
    };

    Ok(Record {
        id: row.id,
        owner: row.user_id,
        image: ImageHandle::new(row.image_handle),
        created_at: row.created_at,
        updated_at: row.updated_at,
        state,
    })
}

/// A patch that matched no row either hit a terminal record or a missing one.
fn unpatched(id: RecordId, exists: bool) -> StoreError {
    if exists {
        StoreError::AlreadyTerminal(id)
    } else {
        StoreError::NotFound(id)
    }
}

#[async_trait]
impl RecordStore<AnalysisState> for PgRecordStore {
    async fn insert(&self, new: NewRecord) -> Result<Record<AnalysisState>, StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;

        let row: FridgeAnalysisRow = diesel::insert_into(fridge_analyses::table)
            .values(&NewFridgeAnalysis {
                user_id: new.owner,
                image_handle: new.image.as_str(),
            })
            .returning(FridgeAnalysisRow::as_returning())
            .get_result(&mut conn)
            .map_err(backend)?;

        analysis_from_row(row)
    }

    async fn patch(&self, id: RecordId, state: AnalysisState) -> Result<(), StoreError> {
        let status = state.status();
        if !status.is_terminal() {
            return Err(StoreError::InvalidTransition);
        }
        let (ingredients, recipes) = match &state {
            AnalysisState::Completed {
                ingredients,
                recipes,
            } => (to_json(ingredients)?, to_json(recipes)?),
            _ => (serde_json::json!([]), serde_json::json!([])),
        };

        let mut conn = self.pool.get().map_err(backend)?;
        let updated = diesel::update(
            fridge_analyses::table
                .filter(fridge_analyses::id.eq(id))
                .filter(fridge_analyses::status.eq(Status::Processing.as_str())),
        )
        .set((
            fridge_analyses::status.eq(status.as_str()),
            fridge_analyses::ingredients.eq(ingredients),
            fridge_analyses::recipes.eq(recipes),
            fridge_analyses::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .map_err(backend)?;

        if updated == 0 {
            let exists: bool =
                diesel::select(diesel::dsl::exists(fridge_analyses::table.find(id)))
                    .get_result(&mut conn)
                    .map_err(backend)?;
            return Err(unpatched(id, exists));
        }
        Ok(())
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record<AnalysisState>>, StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;

        fridge_analyses::table
            .find(id)
            .select(FridgeAnalysisRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(backend)?
            .map(analysis_from_row)
            .transpose()
    }

    async fn query(
        &self,
        owner: UserId,
        limit: usize,
    ) -> Result<Vec<Record<AnalysisState>>, StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;

        fridge_analyses::table
            .filter(fridge_analyses::user_id.eq(owner))
            .order(fridge_analyses::created_at.desc())
            .limit(limit as i64)
            .select(FridgeAnalysisRow::as_select())
            .load(&mut conn)
            .map_err(backend)?
            .into_iter()
            .map(analysis_from_row)
            .collect()
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;

        let deleted = diesel::delete(fridge_analyses::table.find(id))
            .execute(&mut conn)
            .map_err(backend)?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl RecordStore<ScanState> for PgRecordStore {
    async fn insert(&self, new: NewRecord) -> Result<Record<ScanState>, StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;

        let row: RecipeScanRow = diesel::insert_into(recipe_scans::table)
            .values(&NewRecipeScan {
                user_id: new.owner,
                image_handle: new.image.as_str(),
            })
            .returning(RecipeScanRow::as_returning())
            .get_result(&mut conn)
            .map_err(backend)?;

        scan_from_row(row)
    }

    async fn patch(&self, id: RecordId, state: ScanState) -> Result<(), StoreError> {
        let status = state.status();
        if !status.is_terminal() {
            return Err(StoreError::InvalidTransition);
        }
        let (name, recipe) = match state {
            ScanState::Completed(recipe) => (Some(recipe.name.clone()), recipe),
            ScanState::Processing | ScanState::Failed => (None, ScannedRecipe::default()),
        };
        let ingredients = to_json(&recipe.ingredients)?;
        let instructions = to_json(&recipe.instructions)?;

        let mut conn = self.pool.get().map_err(backend)?;
        let updated = diesel::update(
            recipe_scans::table
                .filter(recipe_scans::id.eq(id))
                .filter(recipe_scans::status.eq(Status::Processing.as_str())),
        )
        .set((
            recipe_scans::status.eq(status.as_str()),
            recipe_scans::name.eq(name),
            recipe_scans::ingredients.eq(ingredients),
            recipe_scans::instructions.eq(instructions),
            recipe_scans::cooking_time.eq(recipe.cooking_time),
            recipe_scans::servings.eq(recipe.servings),
            recipe_scans::difficulty.eq(recipe.difficulty),
            recipe_scans::category.eq(recipe.category),
            recipe_scans::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .map_err(backend)?;

        if updated == 0 {
            let exists: bool = diesel::select(diesel::dsl::exists(recipe_scans::table.find(id)))
                .get_result(&mut conn)
                .map_err(backend)?;
            return Err(unpatched(id, exists));
        }
        Ok(())
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record<ScanState>>, StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;

        recipe_scans::table
            .find(id)
            .select(RecipeScanRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(backend)?
            .map(scan_from_row)
            .transpose()
    }

    async fn query(&self, owner: UserId, limit: usize) -> Result<Vec<Record<ScanState>>, StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;

        recipe_scans::table
            .filter(recipe_scans::user_id.eq(owner))
            .order(recipe_scans::created_at.desc())
            .limit(limit as i64)
            .select(RecipeScanRow::as_select())
            .load(&mut conn)
            .map_err(backend)?
            .into_iter()
            .map(scan_from_row)
            .collect()
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;

        let deleted = diesel::delete(recipe_scans::table.find(id))
            .execute(&mut conn)
            .map_err(backend)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_target_cutoff_is_one_ttl_ago() {
        let age = Utc::now() - upload_target_cutoff();
        assert!(age >= chrono::Duration::minutes(UPLOAD_TARGET_TTL_MINUTES));
        assert!(age < chrono::Duration::minutes(UPLOAD_TARGET_TTL_MINUTES + 1));
    }
}
