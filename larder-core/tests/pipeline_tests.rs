//! End-to-end tests for submission, background analysis and querying.
//!
//! Each test wires a [`Larder`] to in-memory stores, a fake AI client and a
//! manual scheduler, so the moment analysis runs is under test control.

use async_trait::async_trait;
use larder_core::ai::FakeAiClient;
use larder_core::{
    AnalysisState, Caller, ImageHandle, Larder, LarderError, ManualScheduler, MemoryObjectStore,
    MemoryRecordStore, NewRecord, ObjectStore, ObjectStoreError, Record, RecordId, RecordState,
    RecordStore, ScanState, Status, StoreError, Upload, UploadTarget, UserId, LIST_LIMIT,
};
use std::sync::Arc;
use uuid::Uuid;

const INGREDIENTS_PROMPT: &str = "refrigerator";
const RECIPES_PROMPT: &str = "suggest 3 recipes";
const SCAN_PROMPT: &str = "recipe extraction";

const THREE_RECIPES: &str = r#"[
  {"name": "French Toast", "ingredients": ["2 eggs", "1 cup milk", "4 slices bread"], "instructions": ["Whisk eggs and milk", "Soak bread", "Fry until golden"], "cookingTime": "15 minutes", "difficulty": "Easy"},
  {"name": "Bread Pudding", "ingredients": ["3 eggs", "2 cups milk", "6 slices bread"], "instructions": ["Cube bread", "Pour custard over", "Bake 40 minutes"], "cookingTime": "50 minutes", "difficulty": "Medium"},
  {"name": "Egg in a Hole", "ingredients": ["1 egg", "1 slice bread"], "instructions": ["Cut a hole in the bread", "Fry with egg in the middle"], "cookingTime": "10 minutes", "difficulty": "Easy"}
]"#;

struct Harness {
    larder: Larder,
    ai: Arc<FakeAiClient>,
    objects: Arc<MemoryObjectStore>,
    analyses: Arc<MemoryRecordStore<AnalysisState>>,
    recipes: Arc<MemoryRecordStore<ScanState>>,
    scheduler: Arc<ManualScheduler>,
}

impl Harness {
    fn new(ai: FakeAiClient) -> Self {
        let ai = Arc::new(ai);
        let objects = Arc::new(MemoryObjectStore::new());
        Self::with_objects(ai, objects.clone(), objects)
    }

    fn with_objects(
        ai: Arc<FakeAiClient>,
        objects: Arc<MemoryObjectStore>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        let analyses = Arc::new(MemoryRecordStore::new());
        let recipes = Arc::new(MemoryRecordStore::new());
        let scheduler = Arc::new(ManualScheduler::new());
        let larder = Larder::new(
            ai.clone(),
            object_store,
            analyses.clone(),
            recipes.clone(),
            scheduler.clone(),
        );

        Self {
            larder,
            ai,
            objects,
            analyses,
            recipes,
            scheduler,
        }
    }
}

fn photo() -> Upload {
    Upload::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3])
}

fn user() -> (UserId, Caller) {
    let id = Uuid::new_v4();
    (id, Caller::authenticated(id))
}

#[tokio::test]
async fn test_fridge_analysis_is_processing_until_task_runs() {
    let h = Harness::new(
        FakeAiClient::new()
            .respond(INGREDIENTS_PROMPT, r#"["eggs", "milk", "bread"]"#)
            .respond(RECIPES_PROMPT, THREE_RECIPES),
    );
    let (_, caller) = user();

    let submitted = h.larder.submit_fridge_photo(caller, photo()).await.unwrap();
    assert_eq!(submitted.status, Status::Processing);

    let view = h
        .larder
        .get_analysis(caller, submitted.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.status, Status::Processing);
    assert!(view.ingredients.is_empty());
    assert!(view.recipes.is_empty());
    assert!(h.ai.calls().is_empty());
    assert_eq!(h.scheduler.pending(), 1);
}

#[tokio::test]
async fn test_fridge_analysis_completes_with_ingredients_and_recipes() {
    let h = Harness::new(
        FakeAiClient::new()
            .respond(INGREDIENTS_PROMPT, r#"["eggs", "milk", "bread"]"#)
            .respond(RECIPES_PROMPT, THREE_RECIPES),
    );
    let (_, caller) = user();

    let submitted = h.larder.submit_fridge_photo(caller, photo()).await.unwrap();
    assert_eq!(h.scheduler.run_pending().await, 1);

    let view = h
        .larder
        .get_analysis(caller, submitted.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.status, Status::Completed);
    assert_eq!(view.ingredients, vec!["eggs", "milk", "bread"]);
    assert_eq!(view.recipes.len(), 3);
    assert_eq!(view.recipes[0].name, "French Toast");
    assert_eq!(view.recipes[1].difficulty, "Medium");
    assert!(view
        .image_url
        .as_deref()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));

    let calls = h.ai.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].prompt_name, "fridge_ingredients");
    assert_eq!(calls[0].image_urls.len(), 1);
    assert_eq!(calls[0].max_tokens, Some(500));
    assert_eq!(calls[1].prompt_name, "fridge_recipes");
    assert!(calls[1].image_urls.is_empty());
    assert!(calls[1].prompt.contains("eggs, milk, bread"));
    assert_eq!(calls[1].max_tokens, Some(2000));
}

#[tokio::test]
async fn test_fridge_analysis_with_no_ingredients_fails_without_recipe_call() {
    let h = Harness::new(
        FakeAiClient::new()
            .respond(INGREDIENTS_PROMPT, "[]")
            .respond(RECIPES_PROMPT, THREE_RECIPES),
    );
    let (_, caller) = user();

    let submitted = h.larder.submit_fridge_photo(caller, photo()).await.unwrap();
    h.scheduler.run_pending().await;

    let view = h
        .larder
        .get_analysis(caller, submitted.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.status, Status::Failed);
    assert!(view.ingredients.is_empty());
    assert_eq!(h.ai.calls().len(), 1);
}

#[tokio::test]
async fn test_fridge_analysis_falls_back_when_recipes_are_unparseable() {
    let h = Harness::new(
        FakeAiClient::new()
            .respond(INGREDIENTS_PROMPT, "- eggs\n- spinach\n- feta")
            .respond(RECIPES_PROMPT, "Sorry, I can't think of anything right now."),
    );
    let (_, caller) = user();

    let submitted = h.larder.submit_fridge_photo(caller, photo()).await.unwrap();
    h.scheduler.run_pending().await;

    let view = h
        .larder
        .get_analysis(caller, submitted.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.status, Status::Completed);
    assert_eq!(view.ingredients, vec!["eggs", "spinach", "feta"]);
    assert_eq!(view.recipes.len(), 1);
    assert_eq!(view.recipes[0].ingredients, vec!["eggs", "spinach", "feta"]);
}

#[tokio::test]
async fn test_inference_error_marks_record_failed() {
    let h = Harness::new(FakeAiClient::new().fail_on(INGREDIENTS_PROMPT, "upstream 502"));
    let (_, caller) = user();

    let submitted = h.larder.submit_fridge_photo(caller, photo()).await.unwrap();
    h.scheduler.run_pending().await;

    let record = h.analyses.get(submitted.id).await.unwrap().unwrap();
    assert_eq!(record.status(), Status::Failed);
}

#[tokio::test]
async fn test_unresolvable_image_marks_record_failed() {
    let h = Harness::new(FakeAiClient::new().with_default_response(r#"["eggs"]"#));
    let (_, caller) = user();

    let submitted = h.larder.submit_fridge_photo(caller, photo()).await.unwrap();
    let record = h.analyses.get(submitted.id).await.unwrap().unwrap();
    assert!(h.objects.remove(&record.image).await.unwrap());

    h.scheduler.run_pending().await;

    let view = h
        .larder
        .get_analysis(caller, submitted.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.status, Status::Failed);
    assert!(view.image_url.is_none());
    assert!(h.ai.calls().is_empty());
}

#[tokio::test]
async fn test_recipe_scan_structured() {
    let h = Harness::new(FakeAiClient::with_response(
        SCAN_PROMPT,
        r#"```json
{"name": "Grandma's Pancakes", "ingredients": ["1 cup flour", "1 egg"], "instructions": ["Mix everything", "Cook on a griddle"], "servings": 4}
```"#,
    ));
    let (_, caller) = user();

    let submitted = h.larder.submit_recipe_scan(caller, photo()).await.unwrap();
    let before = h.larder.get_recipe(caller, submitted.id).await.unwrap().unwrap();
    assert_eq!(before.status, Status::Processing);
    assert_eq!(before.name, "Processing...");

    h.scheduler.run_pending().await;

    let view = h.larder.get_recipe(caller, submitted.id).await.unwrap().unwrap();
    assert_eq!(view.status, Status::Completed);
    assert_eq!(view.name, "Grandma's Pancakes");
    assert_eq!(view.ingredients, vec!["1 cup flour", "1 egg"]);
    assert_eq!(view.instructions.len(), 2);
    assert_eq!(view.servings.as_deref(), Some("4"));

    let calls = h.ai.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt_name, "recipe_scan");
    assert_eq!(calls[0].max_tokens, Some(1500));
}

#[tokio::test]
async fn test_recipe_scan_heuristic_text() {
    let h = Harness::new(FakeAiClient::with_response(
        SCAN_PROMPT,
        "Recipe: Simple Bread\n2 cups flour\n1 tsp salt\nMix the flour and salt with warm water, then bake for 30 minutes.",
    ));
    let (_, caller) = user();

    let submitted = h.larder.submit_recipe_scan(caller, photo()).await.unwrap();
    h.scheduler.run_pending().await;

    let view = h.larder.get_recipe(caller, submitted.id).await.unwrap().unwrap();
    assert_eq!(view.status, Status::Completed);
    assert_eq!(view.name, "Simple Bread");
    assert!(view.ingredients.contains(&"2 cups flour".to_string()));
    assert!(view.ingredients.contains(&"1 tsp salt".to_string()));
    assert_eq!(view.instructions.len(), 1);
}

#[tokio::test]
async fn test_recipe_scan_failure() {
    let h = Harness::new(FakeAiClient::new().fail_on(SCAN_PROMPT, "timeout"));
    let (_, caller) = user();

    let submitted = h.larder.submit_recipe_scan(caller, photo()).await.unwrap();
    h.scheduler.run_pending().await;

    let view = h.larder.get_recipe(caller, submitted.id).await.unwrap().unwrap();
    assert_eq!(view.status, Status::Failed);
    assert_eq!(view.name, "Scan Failed");
    assert!(view.ingredients.is_empty());
}

#[tokio::test]
async fn test_records_are_isolated_by_owner() {
    let h = Harness::new(FakeAiClient::new().with_default_response("[]"));
    let (_, alice) = user();
    let (_, bob) = user();

    let analysis = h.larder.submit_fridge_photo(alice, photo()).await.unwrap();
    let scan = h.larder.submit_recipe_scan(alice, photo()).await.unwrap();

    assert!(h.larder.get_analysis(bob, analysis.id).await.unwrap().is_none());
    assert!(h.larder.get_recipe(bob, scan.id).await.unwrap().is_none());
    assert!(h.larder.list_analyses(bob).await.unwrap().is_empty());
    assert!(h.larder.list_recipes(bob).await.unwrap().is_empty());

    assert!(matches!(
        h.larder.delete_recipe(bob, scan.id).await,
        Err(LarderError::NotAuthorized)
    ));
    assert!(h.larder.get_recipe(alice, scan.id).await.unwrap().is_some());

    assert_eq!(h.larder.list_analyses(alice).await.unwrap().len(), 1);
    assert_eq!(h.larder.list_recipes(alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_recipe() {
    let h = Harness::new(FakeAiClient::new());
    let (_, caller) = user();

    let scan = h.larder.submit_recipe_scan(caller, photo()).await.unwrap();
    let image = h.recipes.get(scan.id).await.unwrap().unwrap().image;
    h.larder.delete_recipe(caller, scan.id).await.unwrap();

    assert!(h.larder.get_recipe(caller, scan.id).await.unwrap().is_none());
    assert!(h.objects.fetch(&image).await.is_none());
    assert!(matches!(
        h.larder.delete_recipe(caller, scan.id).await,
        Err(LarderError::NotAuthorized)
    ));
    assert!(matches!(
        h.larder.delete_recipe(caller, Uuid::new_v4()).await,
        Err(LarderError::NotAuthorized)
    ));
}

#[tokio::test]
async fn test_deleted_scan_result_is_discarded() {
    let h = Harness::new(FakeAiClient::with_response(
        SCAN_PROMPT,
        r#"{"name": "Soup", "ingredients": ["water"], "instructions": ["Boil"]}"#,
    ));
    let (_, caller) = user();

    let scan = h.larder.submit_recipe_scan(caller, photo()).await.unwrap();
    h.larder.delete_recipe(caller, scan.id).await.unwrap();
    h.scheduler.run_pending().await;

    assert!(h.recipes.get(scan.id).await.unwrap().is_none());
    assert!(h.larder.list_recipes(caller).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_is_capped_and_newest_first() {
    let h = Harness::new(FakeAiClient::new());
    let (_, caller) = user();

    let mut ids = Vec::new();
    for _ in 0..LIST_LIMIT + 5 {
        ids.push(h.larder.submit_fridge_photo(caller, photo()).await.unwrap().id);
    }

    let listed: Vec<_> = h
        .larder
        .list_analyses(caller)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect();
    assert_eq!(listed.len(), LIST_LIMIT);

    let expected: Vec<_> = ids.iter().rev().take(LIST_LIMIT).copied().collect();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let h = Harness::new(FakeAiClient::new());
    let (owner, caller) = user();

    let result = h
        .larder
        .submit_fridge_photo(caller, Upload::new("application/pdf", vec![1, 2, 3]))
        .await;
    assert!(matches!(result, Err(LarderError::InvalidUpload(_))));

    let result = h
        .larder
        .submit_recipe_scan(caller, Upload::new("image/png", vec![]))
        .await;
    assert!(matches!(result, Err(LarderError::InvalidUpload(_))));

    assert!(h.analyses.query(owner, 100).await.unwrap().is_empty());
    assert!(h.recipes.query(owner, 100).await.unwrap().is_empty());
    assert_eq!(h.scheduler.pending(), 0);
}

#[tokio::test]
async fn test_anonymous_caller_is_rejected() {
    let h = Harness::new(FakeAiClient::new());
    let anonymous = Caller::anonymous();

    assert!(matches!(
        h.larder.submit_fridge_photo(anonymous, photo()).await,
        Err(LarderError::Unauthenticated)
    ));
    assert!(matches!(
        h.larder.submit_recipe_scan(anonymous, photo()).await,
        Err(LarderError::Unauthenticated)
    ));
    assert!(matches!(
        h.larder.list_analyses(anonymous).await,
        Err(LarderError::Unauthenticated)
    ));
    assert!(matches!(
        h.larder.get_recipe(anonymous, Uuid::new_v4()).await,
        Err(LarderError::Unauthenticated)
    ));
    assert!(matches!(
        h.larder.delete_recipe(anonymous, Uuid::new_v4()).await,
        Err(LarderError::Unauthenticated)
    ));
    assert_eq!(h.scheduler.pending(), 0);
}

/// Object store whose transfers always fail.
struct BrokenObjectStore;

#[async_trait]
impl ObjectStore for BrokenObjectStore {
    async fn request_upload_target(&self, _owner: UserId) -> Result<UploadTarget, ObjectStoreError> {
        Ok(UploadTarget {
            token: "t".to_string(),
            url: "broken://t".to_string(),
        })
    }

    async fn transfer(
        &self,
        _target: &UploadTarget,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> Result<ImageHandle, ObjectStoreError> {
        Err(ObjectStoreError::Backend("disk full".to_string()))
    }

    async fn resolve(&self, _handle: &ImageHandle) -> Option<String> {
        None
    }

    async fn remove(&self, _handle: &ImageHandle) -> Result<bool, ObjectStoreError> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_upload_failure_is_surfaced_and_nothing_persisted() {
    let h = Harness::with_objects(
        Arc::new(FakeAiClient::new()),
        Arc::new(MemoryObjectStore::new()),
        Arc::new(BrokenObjectStore),
    );
    let (owner, caller) = user();

    let result = h.larder.submit_fridge_photo(caller, photo()).await;
    assert!(matches!(
        result,
        Err(LarderError::Upload(ObjectStoreError::Backend(_)))
    ));
    assert!(h.analyses.query(owner, 100).await.unwrap().is_empty());
    assert_eq!(h.scheduler.pending(), 0);
}

#[tokio::test]
async fn test_terminal_status_never_changes() {
    let h = Harness::new(
        FakeAiClient::new()
            .respond(INGREDIENTS_PROMPT, r#"["eggs"]"#)
            .respond(RECIPES_PROMPT, THREE_RECIPES),
    );
    let (_, caller) = user();

    let submitted = h.larder.submit_fridge_photo(caller, photo()).await.unwrap();
    h.scheduler.run_pending().await;

    let result = h.analyses.patch(submitted.id, AnalysisState::Failed).await;
    assert!(matches!(result, Err(StoreError::AlreadyTerminal(_))));

    let record = h.analyses.get(submitted.id).await.unwrap().unwrap();
    assert_eq!(record.status(), Status::Completed);
}

/// Record store that refuses to persist completed results.
struct RejectingCompletedStore {
    inner: MemoryRecordStore<ScanState>,
}

#[async_trait]
impl RecordStore<ScanState> for RejectingCompletedStore {
    async fn insert(&self, new: NewRecord) -> Result<Record<ScanState>, StoreError> {
        self.inner.insert(new).await
    }

    async fn patch(&self, id: RecordId, state: ScanState) -> Result<(), StoreError> {
        if state.status() == Status::Completed {
            return Err(StoreError::Backend("value too long for column".to_string()));
        }
        self.inner.patch(id, state).await
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record<ScanState>>, StoreError> {
        self.inner.get(id).await
    }

    async fn query(
        &self,
        owner: UserId,
        limit: usize,
    ) -> Result<Vec<Record<ScanState>>, StoreError> {
        self.inner.query(owner, limit).await
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }
}

#[tokio::test]
async fn test_unpersistable_result_marks_record_failed() {
    let ai = Arc::new(FakeAiClient::with_response(
        SCAN_PROMPT,
        r#"{"name": "Soup", "ingredients": ["water"], "instructions": ["Boil"]}"#,
    ));
    let recipes = Arc::new(RejectingCompletedStore {
        inner: MemoryRecordStore::new(),
    });
    let scheduler = Arc::new(ManualScheduler::new());
    let larder = Larder::new(
        ai,
        Arc::new(MemoryObjectStore::new()),
        Arc::new(MemoryRecordStore::<AnalysisState>::new()),
        recipes,
        scheduler.clone(),
    );
    let (_, caller) = user();

    let submitted = larder.submit_recipe_scan(caller, photo()).await.unwrap();
    scheduler.run_pending().await;

    let view = larder.get_recipe(caller, submitted.id).await.unwrap().unwrap();
    assert_eq!(view.status, Status::Failed);
    assert_eq!(view.name, "Scan Failed");
}
