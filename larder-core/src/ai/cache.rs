//! Disk-based AI response cache.
//!
//! Only used when `LARDER_AI_CACHE_DIR` is set. Handy for replaying prompt
//! changes against the same photos from the CLI without paying for every call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{ChatMessage, ChatResponse, Usage};

pub struct AiCache {
    cache_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAiResponse {
    pub content: String,
    pub usage: Usage,
    pub cached_at: DateTime<Utc>,
    pub model: String,
}

impl From<CachedAiResponse> for ChatResponse {
    fn from(cached: CachedAiResponse) -> Self {
        Self {
            content: cached.content,
            usage: cached.usage,
            cached: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheKey {
    pub prompt_name: String,
    pub model: String,
    pub input_hash: String,
}

impl CacheKey {
    pub fn new(prompt_name: &str, model: &str, messages: &[ChatMessage]) -> Self {
        let input_json = serde_json::to_string(messages).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(input_json.as_bytes());

        Self {
            prompt_name: prompt_name.to_string(),
            model: model.to_string(),
            input_hash: hex::encode(hasher.finalize()),
        }
    }

    /// Format: {prompt_name}/{model_safe}/{hash[0:2]}/{hash}.json
    pub fn to_path(&self) -> PathBuf {
        let model_safe = self.model.replace('/', "--");

        PathBuf::new()
            .join(&self.prompt_name)
            .join(model_safe)
            .join(&self.input_hash[..2])
            .join(format!("{}.json", self.input_hash))
    }
}

impl AiCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedAiResponse> {
        let content = fs::read_to_string(self.cache_dir.join(key.to_path())).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn put(&self, key: &CacheKey, response: &ChatResponse, model: &str) -> std::io::Result<()> {
        let path = self.cache_dir.join(key.to_path());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let cached = CachedAiResponse {
            content: response.content.clone(),
            usage: response.usage.clone(),
            cached_at: Utc::now(),
            model: model.to_string(),
        };

        let json = serde_json::to_string_pretty(&cached)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(&path, json)
    }

    /// Number of cached responses on disk.
    pub fn len(&self) -> usize {
        fn count_json_files(dir: &Path) -> usize {
            let Ok(entries) = fs::read_dir(dir) else {
                return 0;
            };
            entries
                .filter_map(|e| e.ok())
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        count_json_files(&path)
                    } else if path.extension().is_some_and(|ext| ext == "json") {
                        1
                    } else {
                        0
                    }
                })
                .sum()
        }

        count_json_files(&self.cache_dir)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn response(content: &str) -> ChatResponse {
        ChatResponse {
            content: content.to_string(),
            usage: Usage::default(),
            cached: false,
        }
    }

    #[test]
    fn test_cache_key_path() {
        let key = CacheKey::new(
            "fridge_ingredients",
            "openai/gpt-4o-mini",
            &[ChatMessage::user("test")],
        );

        let path = key.to_path();
        assert!(path.starts_with("fridge_ingredients/openai--gpt-4o-mini/"));
        assert!(path.to_string_lossy().ends_with(".json"));
    }

    #[test]
    fn test_image_url_changes_key() {
        let a = CacheKey::new(
            "scan",
            "m",
            &[ChatMessage::user_with_image("read this", "https://a/1.jpg")],
        );
        let b = CacheKey::new(
            "scan",
            "m",
            &[ChatMessage::user_with_image("read this", "https://a/2.jpg")],
        );
        assert_ne!(a.input_hash, b.input_hash);
    }

    #[test]
    fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = AiCache::new(dir.path().to_path_buf());
        let key = CacheKey::new("p", "m", &[ChatMessage::user("hi")]);

        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());

        cache.put(&key, &response("hello"), "m").unwrap();

        let cached: ChatResponse = cache.get(&key).unwrap().into();
        assert_eq!(cached.content, "hello");
        assert!(cached.cached);
        assert_eq!(cache.len(), 1);
    }
}
