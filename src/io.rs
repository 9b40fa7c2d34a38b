use std::io::Write;
use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("cannot access {path}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: &Path, object: &T) -> Result<(), IoError> {
    let path = output_path.display().to_string();
    let j = serde_json::to_string_pretty(object).map_err(|source| IoError::Json {
        path: path.clone(),
        source,
    })?;
    let mut file = std::fs::File::create(output_path).map_err(|source| IoError::File {
        path: path.clone(),
        source,
    })?;
    file.write_all(j.as_bytes())
        .map_err(|source| IoError::File { path, source })
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &Path) -> Result<T, IoError> {
    let path = file_path.display().to_string();
    let contents = std::fs::read_to_string(file_path).map_err(|source| IoError::File {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| IoError::Json { path, source })
}
