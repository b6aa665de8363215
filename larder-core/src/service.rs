//! Caller-facing operations: submit photos, then read or delete results.

use std::sync::Arc;

use crate::ai::AiClient;
use crate::error::LarderError;
use crate::identity::Caller;
use crate::photo::is_image_content_type;
use crate::pipeline::{run_fridge_analysis, run_recipe_scan, AnalysisContext};
use crate::scheduler::TaskScheduler;
use crate::store::{ObjectStore, RecordStore};
use crate::types::{
    AnalysisState, AnalysisView, ImageHandle, NewRecord, RecipeView, RecordId, ScanState, Status,
    UserId,
};

/// Maximum number of records returned by a list operation.
pub const LIST_LIMIT: usize = 20;

/// An uploaded photo as received from the caller.
#[derive(Debug, Clone)]
pub struct Upload {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            data,
        }
    }
}

/// Returned as soon as a submission is accepted. The analysis runs later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    pub id: RecordId,
    pub status: Status,
}

pub struct Larder {
    ai: Arc<dyn AiClient>,
    objects: Arc<dyn ObjectStore>,
    analyses: Arc<dyn RecordStore<AnalysisState>>,
    recipes: Arc<dyn RecordStore<ScanState>>,
    scheduler: Arc<dyn TaskScheduler>,
}

impl Larder {
    pub fn new(
        ai: Arc<dyn AiClient>,
        objects: Arc<dyn ObjectStore>,
        analyses: Arc<dyn RecordStore<AnalysisState>>,
        recipes: Arc<dyn RecordStore<ScanState>>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        Self {
            ai,
            objects,
            analyses,
            recipes,
            scheduler,
        }
    }

    fn context(&self) -> AnalysisContext {
        AnalysisContext {
            ai: self.ai.clone(),
            objects: self.objects.clone(),
        }
    }

    /// Validate the upload and move it into the object store.
    async fn store_upload(&self, owner: UserId, upload: Upload) -> Result<ImageHandle, LarderError> {
        if !is_image_content_type(&upload.content_type) {
            return Err(LarderError::InvalidUpload(format!(
                "Expected an image, got {}",
                upload.content_type
            )));
        }
        if upload.data.is_empty() {
            return Err(LarderError::InvalidUpload("Empty upload".to_string()));
        }

        let target = self.objects.request_upload_target(owner).await?;
        let handle = self
            .objects
            .transfer(&target, &upload.content_type, upload.data)
            .await?;
        Ok(handle)
    }

    /// Accept a fridge photo and schedule ingredient detection plus recipe
    /// generation.
    pub async fn submit_fridge_photo(
        &self,
        caller: Caller,
        upload: Upload,
    ) -> Result<Submitted, LarderError> {
        let owner = caller.require()?;
        let image = self.store_upload(owner, upload).await?;
        let record = self
            .analyses
            .insert(NewRecord {
                owner,
                image: image.clone(),
            })
            .await?;

        tracing::info!(record_id = %record.id, owner = %owner, "Fridge analysis submitted");
        self.scheduler.schedule(
            "fridge_analysis",
            record.id,
            Box::pin(run_fridge_analysis(
                self.context(),
                self.analyses.clone(),
                record.id,
                image,
            )),
        );

        Ok(Submitted {
            id: record.id,
            status: record.status(),
        })
    }

    /// Accept a recipe card photo and schedule its digitization.
    pub async fn submit_recipe_scan(
        &self,
        caller: Caller,
        upload: Upload,
    ) -> Result<Submitted, LarderError> {
        let owner = caller.require()?;
        let image = self.store_upload(owner, upload).await?;
        let record = self
            .recipes
            .insert(NewRecord {
                owner,
                image: image.clone(),
            })
            .await?;

        tracing::info!(record_id = %record.id, owner = %owner, "Recipe scan submitted");
        self.scheduler.schedule(
            "recipe_scan",
            record.id,
            Box::pin(run_recipe_scan(
                self.context(),
                self.recipes.clone(),
                record.id,
                image,
            )),
        );

        Ok(Submitted {
            id: record.id,
            status: record.status(),
        })
    }

    /// A single analysis, or `None` when it does not exist or belongs to
    /// someone else.
    pub async fn get_analysis(
        &self,
        caller: Caller,
        id: RecordId,
    ) -> Result<Option<AnalysisView>, LarderError> {
        let user = caller.require()?;
        let Some(record) = self.analyses.get(id).await? else {
            return Ok(None);
        };
        if !record.is_owned_by(user) {
            return Ok(None);
        }

        let image_url = self.objects.resolve(&record.image).await;
        Ok(Some(AnalysisView::new(record, image_url)))
    }

    /// The caller's most recent analyses, newest first.
    pub async fn list_analyses(&self, caller: Caller) -> Result<Vec<AnalysisView>, LarderError> {
        let user = caller.require()?;
        let records = self.analyses.query(user, LIST_LIMIT).await?;

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let image_url = self.objects.resolve(&record.image).await;
            views.push(AnalysisView::new(record, image_url));
        }
        Ok(views)
    }

    pub async fn get_recipe(
        &self,
        caller: Caller,
        id: RecordId,
    ) -> Result<Option<RecipeView>, LarderError> {
        let user = caller.require()?;
        let Some(record) = self.recipes.get(id).await? else {
            return Ok(None);
        };
        if !record.is_owned_by(user) {
            return Ok(None);
        }

        let image_url = self.objects.resolve(&record.image).await;
        Ok(Some(RecipeView::new(record, image_url)))
    }

    /// The caller's most recent recipe scans, newest first.
    pub async fn list_recipes(&self, caller: Caller) -> Result<Vec<RecipeView>, LarderError> {
        let user = caller.require()?;
        let records = self.recipes.query(user, LIST_LIMIT).await?;

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let image_url = self.objects.resolve(&record.image).await;
            views.push(RecipeView::new(record, image_url));
        }
        Ok(views)
    }

    /// Delete one of the caller's recipe scans. Missing records and records
    /// owned by someone else are both reported as [`LarderError::NotAuthorized`].
    pub async fn delete_recipe(&self, caller: Caller, id: RecordId) -> Result<(), LarderError> {
        let user = caller.require()?;
        let image = match self.recipes.get(id).await? {
            Some(record) if record.is_owned_by(user) => record.image,
            _ => return Err(LarderError::NotAuthorized),
        };

        if !self.recipes.delete(id).await? {
            return Err(LarderError::NotAuthorized);
        }
        tracing::info!(record_id = %id, "Recipe scan deleted");

        if let Err(e) = self.objects.remove(&image).await {
            tracing::warn!(record_id = %id, image = %image, error = %e, "Failed to delete image");
        }
        Ok(())
    }
}
