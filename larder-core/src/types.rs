//! Record types shared by the pipeline, the stores, and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type RecordId = Uuid;

/// Opaque reference to an uploaded image, issued by an [`ObjectStore`](crate::store::ObjectStore).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(String);

impl ImageHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Processing,
    Completed,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Status::Processing),
            "completed" => Some(Status::Completed),
            "failed" => Some(Status::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Processing)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recipe generated from the ingredients found in a fridge photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSuggestion {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub cooking_time: String,
    #[serde(default)]
    pub difficulty: String,
}

/// A recipe digitized from a photographed recipe card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedRecipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub cooking_time: Option<String>,
    pub servings: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
}

impl Default for ScannedRecipe {
    fn default() -> Self {
        Self {
            name: DEFAULT_SCAN_NAME.to_string(),
            ingredients: vec![],
            instructions: vec![],
            cooking_time: None,
            servings: None,
            difficulty: None,
            category: None,
        }
    }
}

/// Name given to a scanned recipe when the model did not supply one.
pub const DEFAULT_SCAN_NAME: &str = "Scanned Recipe";
/// Name shown for a scan whose analysis failed.
pub const FAILED_SCAN_NAME: &str = "Scan Failed";
/// Name shown for a scan that is still being analyzed.
pub const PROCESSING_SCAN_NAME: &str = "Processing...";

/// Common behaviour of the per-use-case state enums.
pub trait RecordState: Clone + fmt::Debug + Send + Sync + 'static {
    /// The state a freshly inserted record starts in.
    fn processing() -> Self;

    /// The state persisted when analysis fails.
    fn failed() -> Self;

    fn status(&self) -> Status;
}

/// Fridge analysis payload, tagged by status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Processing,
    Completed {
        ingredients: Vec<String>,
        recipes: Vec<RecipeSuggestion>,
    },
    Failed,
}

impl RecordState for AnalysisState {
    fn processing() -> Self {
        AnalysisState::Processing
    }

    fn failed() -> Self {
        AnalysisState::Failed
    }

    fn status(&self) -> Status {
        match self {
            AnalysisState::Processing => Status::Processing,
            AnalysisState::Completed { .. } => Status::Completed,
            AnalysisState::Failed => Status::Failed,
        }
    }
}

impl AnalysisState {
    pub fn ingredients(&self) -> &[String] {
        match self {
            AnalysisState::Completed { ingredients, .. } => ingredients,
            _ => &[],
        }
    }

    pub fn recipes(&self) -> &[RecipeSuggestion] {
        match self {
            AnalysisState::Completed { recipes, .. } => recipes,
            _ => &[],
        }
    }
}

/// Recipe scan payload, tagged by status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Processing,
    Completed(ScannedRecipe),
    Failed,
}

impl RecordState for ScanState {
    fn processing() -> Self {
        ScanState::Processing
    }

    fn failed() -> Self {
        ScanState::Failed
    }

    fn status(&self) -> Status {
        match self {
            ScanState::Processing => Status::Processing,
            ScanState::Completed(_) => Status::Completed,
            ScanState::Failed => Status::Failed,
        }
    }
}

/// A persisted record owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<S> {
    pub id: RecordId,
    pub owner: UserId,
    pub image: ImageHandle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: S,
}

impl<S: RecordState> Record<S> {
    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }
}

pub type AnalysisRecord = Record<AnalysisState>;
pub type RecipeRecord = Record<ScanState>;

/// Fields supplied when a record is first inserted.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub owner: UserId,
    pub image: ImageHandle,
}

/// Flat view of a fridge analysis, annotated with a freshly resolved image URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisView {
    pub id: RecordId,
    pub image_url: Option<String>,
    pub status: Status,
    pub ingredients: Vec<String>,
    pub recipes: Vec<RecipeSuggestion>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisView {
    pub fn new(record: AnalysisRecord, image_url: Option<String>) -> Self {
        let status = record.status();
        let (ingredients, recipes) = match record.state {
            AnalysisState::Completed {
                ingredients,
                recipes,
            } => (ingredients, recipes),
            AnalysisState::Processing | AnalysisState::Failed => (vec![], vec![]),
        };

        Self {
            id: record.id,
            image_url,
            status,
            ingredients,
            recipes,
            created_at: record.created_at,
        }
    }
}

/// Flat view of a recipe scan, annotated with a freshly resolved image URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeView {
    pub id: RecordId,
    pub image_url: Option<String>,
    pub status: Status,
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub cooking_time: Option<String>,
    pub servings: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RecipeView {
    pub fn new(record: RecipeRecord, image_url: Option<String>) -> Self {
        let status = record.status();
        let recipe = match record.state {
            ScanState::Completed(recipe) => recipe,
            ScanState::Processing => ScannedRecipe {
                name: PROCESSING_SCAN_NAME.to_string(),
                ..ScannedRecipe::default()
            },
            ScanState::Failed => ScannedRecipe {
                name: FAILED_SCAN_NAME.to_string(),
                ..ScannedRecipe::default()
            },
        };

        Self {
            id: record.id,
            image_url,
            status,
            name: recipe.name,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            cooking_time: recipe.cooking_time,
            servings: recipe.servings,
            difficulty: recipe.difficulty,
            category: recipe.category,
            created_at: record.created_at,
        }
    }
}
