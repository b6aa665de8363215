use anyhow::{anyhow, Context, Result};
use larder_core::ai::CachingAiClient;
use larder_core::{
    validate_image, AnalysisState, Caller, Larder, ManualScheduler, MemoryObjectStore,
    MemoryRecordStore, ScanState, Status, Upload,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// A single-user larder backed by in-memory stores. Tasks run when
/// `scheduler.run_pending()` is awaited.
struct LocalLarder {
    larder: Larder,
    scheduler: Arc<ManualScheduler>,
    caller: Caller,
}

impl LocalLarder {
    fn from_env() -> Result<Self> {
        let ai = CachingAiClient::from_env().context("Failed to configure AI client")?;
        tracing::info!(model = ai.model(), "Using model");

        let scheduler = Arc::new(ManualScheduler::new());
        let larder = Larder::new(
            Arc::new(ai),
            Arc::new(MemoryObjectStore::new()),
            Arc::new(MemoryRecordStore::<AnalysisState>::new()),
            Arc::new(MemoryRecordStore::<ScanState>::new()),
            scheduler.clone(),
        );

        Ok(Self {
            larder,
            scheduler,
            caller: Caller::authenticated(Uuid::new_v4()),
        })
    }
}

/// Read a photo and detect its format from the bytes.
pub fn read_photo(path: &Path) -> Result<Upload> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read image: {}", path.display()))?;
    let content_type = validate_image(&data)
        .map_err(|e| anyhow!("{}: {}", path.display(), e))?;
    Ok(Upload::new(content_type, data))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run a fridge analysis end to end and print the resulting record.
pub async fn analyze_fridge(image: &Path) -> Result<()> {
    let upload = read_photo(image)?;
    let local = LocalLarder::from_env()?;

    let submitted = local.larder.submit_fridge_photo(local.caller, upload).await?;
    local.scheduler.run_pending().await;

    let view = local
        .larder
        .get_analysis(local.caller, submitted.id)
        .await?
        .ok_or_else(|| anyhow!("Analysis {} disappeared", submitted.id))?;
    print_json(&view)?;

    if view.status == Status::Failed {
        // Return error so exit code is non-zero
        return Err(anyhow!("Fridge analysis failed"));
    }
    Ok(())
}

/// Run a recipe scan end to end and print the resulting record.
pub async fn scan_recipe(image: &Path) -> Result<()> {
    let upload = read_photo(image)?;
    let local = LocalLarder::from_env()?;

    let submitted = local.larder.submit_recipe_scan(local.caller, upload).await?;
    local.scheduler.run_pending().await;

    let view = local
        .larder
        .get_recipe(local.caller, submitted.id)
        .await?
        .ok_or_else(|| anyhow!("Recipe scan {} disappeared", submitted.id))?;
    print_json(&view)?;

    if view.status == Status::Failed {
        return Err(anyhow!("Recipe scan failed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Smallest valid GIF: 1x1, one color
    const TINY_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3B,
    ];

    #[test]
    fn test_read_photo_detects_format() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TINY_GIF).unwrap();

        let upload = read_photo(file.path()).unwrap();
        assert_eq!(upload.content_type, "image/gif");
        assert_eq!(upload.data, TINY_GIF);
    }

    #[test]
    fn test_read_photo_rejects_non_images() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not an image").unwrap();

        assert!(read_photo(file.path()).is_err());
        assert!(read_photo(Path::new("/definitely/not/here.jpg")).is_err());
    }
}
