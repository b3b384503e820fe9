use async_trait::async_trait;
use chrono::{Datelike, Utc};
use derive_more::Display;
use rand::Rng;

pub mod local;
pub mod supabase;

pub use local::LocalStorage;
pub use supabase::SupabaseStorage;

#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Storage upload failed: {_0}")]
    Upload(String),

    #[display("Storage delete failed: {_0}")]
    Delete(String),

    #[display("Object not found: {_0}")]
    NotFound(String),

    #[display("Invalid object path: {_0}")]
    InvalidPath(String),

    #[display("Storage I/O error: {_0}")]
    Io(String),
}

/// An object written to a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub public_url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    fn backend_name(&self) -> &'static str;
}

const KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const KEY_TOKEN_LEN: usize = 7;

/// Extension taken from an uploaded filename: lowercased, alphanumeric only,
/// `jpg` when nothing usable remains.
pub fn file_extension(filename: &str) -> String {
    let ext: String = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() { "jpg".to_string() } else { ext }
}

/// Object key of the form `{year}/{unix_millis}-{token}.{ext}`. Keys are
/// grouped by year to keep listings small.
pub fn generate_storage_key(extension: &str) -> String {
    let now = Utc::now();
    let mut rng = rand::thread_rng();
    let token: String = (0..KEY_TOKEN_LEN)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect();

    format!("{}/{}-{}.{}", now.year(), now.timestamp_millis(), token, extension)
}

/// Rejects keys that could escape a bucket.
pub fn validate_object_path(path: &str) -> Result<(), StorageError> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if bad {
        Err(StorageError::InvalidPath(path.to_string()))
    } else {
        Ok(())
    }
}
