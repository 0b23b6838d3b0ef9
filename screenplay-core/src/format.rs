//! The response-format document sent to OpenRouter as `response_format`.
//!
//! The file on disk is loaded once and kept as an immutable template. Each
//! generation call works on its own copy with that request's values written
//! in as schema defaults, so nothing a request does is visible to another.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::read_json_file;
use crate::error::{Result, ScreenplayError};
use crate::request::GenerationRequest;

/// Properties whose `default` mirrors the incoming request.
pub const ECHOED_PROPERTIES: [&str; 3] =
    ["story_pitch", "languages_used", "default_screenplay_language"];

/// Checks the document has an object at `jsonSchema.schema.properties.<name>`
/// for every echoed property.
pub fn validate(format: &Value) -> Result<()> {
    let properties = format
        .pointer("/jsonSchema/schema/properties")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ScreenplayError::InvalidConfig(
                "response format has no jsonSchema.schema.properties object".to_string(),
            )
        })?;

    for name in ECHOED_PROPERTIES {
        if !properties.get(name).is_some_and(Value::is_object) {
            return Err(ScreenplayError::InvalidConfig(format!(
                "response format is missing property '{}'",
                name
            )));
        }
    }
    Ok(())
}

/// Returns a copy of `template` whose echoed properties carry the request
/// values as `default`. Absent values remove the `default` key.
pub fn with_request_defaults(template: &Value, request: &GenerationRequest) -> Result<Value> {
    let mut format = template.clone();
    let properties = format
        .pointer_mut("/jsonSchema/schema/properties")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            ScreenplayError::InvalidConfig(
                "response format has no jsonSchema.schema.properties object".to_string(),
            )
        })?;

    set_default(
        properties,
        "default_screenplay_language",
        request.default_screenplay_language.clone().map(Value::from),
    )?;
    set_default(
        properties,
        "languages_used",
        request.languages_used.clone().map(Value::from),
    )?;
    set_default(
        properties,
        "story_pitch",
        request.story_pitch.clone().map(Value::from),
    )?;

    Ok(format)
}

fn set_default(
    properties: &mut Map<String, Value>,
    name: &str,
    value: Option<Value>,
) -> Result<()> {
    let property = properties
        .get_mut(name)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            ScreenplayError::InvalidConfig(format!(
                "response format is missing property '{}'",
                name
            ))
        })?;

    match value {
        Some(value) => {
            property.insert("default".to_string(), value);
        }
        None => {
            property.remove("default");
        }
    }
    Ok(())
}

/// Lazily loaded, process-wide response-format template.
///
/// A failed load is not cached; the next caller tries the file again.
#[derive(Debug)]
pub struct FormatStore {
    path: PathBuf,
    template: OnceCell<Arc<Value>>,
}

impl FormatStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            template: OnceCell::new(),
        }
    }

    /// A store that is already populated and never touches the filesystem.
    pub fn from_value(template: Value) -> Result<Self> {
        validate(&template)?;
        Ok(Self {
            path: PathBuf::new(),
            template: OnceCell::new_with(Some(Arc::new(template))),
        })
    }

    pub async fn template(&self) -> Result<Arc<Value>> {
        let template = self
            .template
            .get_or_try_init(|| async {
                let format = read_json_file(&self.path).await?;
                validate(&format)?;
                info!(path = %self.path.display(), "Loaded response format");
                Ok::<_, ScreenplayError>(Arc::new(format))
            })
            .await?;

        debug!("Using cached response format");
        Ok(template.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_format() -> Value {
        json!({
            "type": "json_schema",
            "jsonSchema": {
                "name": "screenplay",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "story_pitch": { "type": "string" },
                        "languages_used": { "type": "array", "items": { "type": "string" } },
                        "default_screenplay_language": { "type": "string", "default": "Hebrew" },
                        "title": { "type": "string" }
                    }
                }
            }
        })
    }

    #[test]
    fn test_validate_rejects_missing_property() {
        let mut format = sample_format();
        format["jsonSchema"]["schema"]["properties"]
            .as_object_mut()
            .unwrap()
            .remove("languages_used");
        assert!(matches!(
            validate(&format),
            Err(ScreenplayError::InvalidConfig(msg)) if msg.contains("languages_used")
        ));
        assert!(validate(&json!({ "jsonSchema": {} })).is_err());
    }

    #[test]
    fn test_shipped_format_is_valid() {
        let format: Value =
            serde_json::from_str(include_str!("../../responseFormat.json")).unwrap();
        validate(&format).unwrap();
    }

    #[test]
    fn test_defaults_written_to_copy_only() {
        let template = sample_format();
        let request: GenerationRequest = serde_json::from_value(json!({
            "story_pitch": "Two rival chefs",
            "languages_used": ["Italian"],
            "default_screenplay_language": "English"
        }))
        .unwrap();

        let format = with_request_defaults(&template, &request).unwrap();
        let properties = &format["jsonSchema"]["schema"]["properties"];
        assert_eq!(properties["story_pitch"]["default"], "Two rival chefs");
        assert_eq!(properties["languages_used"]["default"], json!(["Italian"]));
        assert_eq!(properties["default_screenplay_language"]["default"], "English");
        assert_eq!(properties["title"], json!({ "type": "string" }));

        assert_eq!(template, sample_format());
    }

    #[test]
    fn test_absent_values_remove_default() {
        let format = with_request_defaults(&sample_format(), &GenerationRequest::default()).unwrap();
        let properties = &format["jsonSchema"]["schema"]["properties"];
        assert!(properties["default_screenplay_language"].get("default").is_none());
        assert!(properties["story_pitch"].get("default").is_none());
    }

    #[tokio::test]
    async fn test_store_loads_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("responseFormat.json");
        std::fs::write(&path, sample_format().to_string()).unwrap();

        let store = FormatStore::new(&path);
        let first = store.template().await.unwrap();

        std::fs::write(&path, "not json").unwrap();
        let second = store.template().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_store_retries_after_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("responseFormat.json");

        let store = FormatStore::new(&path);
        assert!(matches!(
            store.template().await,
            Err(ScreenplayError::ConfigRead { .. })
        ));

        std::fs::write(&path, sample_format().to_string()).unwrap();
        assert_eq!(*store.template().await.unwrap(), sample_format());
    }
}
