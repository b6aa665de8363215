pub mod ai;
pub mod error;
pub mod identity;
pub mod parse;
pub mod photo;
pub mod pipeline;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod types;

pub use error::LarderError;
pub use identity::Caller;
pub use photo::{is_image_content_type, validate_image};
pub use parse::ParseOutcome;
pub use pipeline::{analyze_fridge, scan_recipe, AnalysisContext, AnalysisError};
pub use scheduler::{ManualScheduler, Task, TaskScheduler, TokioScheduler};
pub use service::{Larder, Submitted, Upload, LIST_LIMIT};
pub use store::{
    MemoryObjectStore, MemoryRecordStore, ObjectStore, ObjectStoreError, RecordStore, StoreError,
    UploadTarget,
};
pub use types::{
    AnalysisRecord, AnalysisState, AnalysisView, ImageHandle, NewRecord, RecipeRecord,
    RecipeSuggestion, RecipeView, Record, RecordId, RecordState, ScanState, ScannedRecipe, Status,
    UserId,
};
