use crate::core::error::{FieldError, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_SCENES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneLimits {
    pub max_scenes: usize,
}

impl Default for SceneLimits {
    fn default() -> Self {
        Self {
            max_scenes: DEFAULT_MAX_SCENES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VideoFormat {
    #[default]
    TikTok,
    #[serde(rename = "Instagram Reel")]
    InstagramReel,
    #[serde(rename = "YouTube Short")]
    YouTubeShort,
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 3] = [
        VideoFormat::TikTok,
        VideoFormat::InstagramReel,
        VideoFormat::YouTubeShort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoFormat::TikTok => "TikTok",
            VideoFormat::InstagramReel => "Instagram Reel",
            VideoFormat::YouTubeShort => "YouTube Short",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VideoStyle {
    #[default]
    Listicle,
    Skit,
    Storytime,
    #[serde(rename = "How-To")]
    HowTo,
}

impl VideoStyle {
    pub const ALL: [VideoStyle; 4] = [
        VideoStyle::Listicle,
        VideoStyle::Skit,
        VideoStyle::Storytime,
        VideoStyle::HowTo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStyle::Listicle => "Listicle",
            VideoStyle::Skit => "Skit",
            VideoStyle::Storytime => "Storytime",
            VideoStyle::HowTo => "How-To",
        }
    }
}

macro_rules! closed_enum_text {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let allowed = <$ty>::ALL
                            .iter()
                            .map(|v| format!("'{}'", v.as_str()))
                            .collect::<Vec<_>>()
                            .join(", ");
                        format!("'{}' is not one of {}", s, allowed)
                    })
            }
        }
    };
}

closed_enum_text!(VideoFormat);
closed_enum_text!(VideoStyle);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub text: String,
    pub visual_suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub hook: String,
    pub scenes: Vec<Scene>,
    pub cta: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub format: VideoFormat,
    pub style: VideoStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub original_script: Script,
    pub adjustment_request: String,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, format: VideoFormat, style: VideoStyle) -> Self {
        Self {
            topic: topic.into(),
            format,
            style,
        }
    }
}

impl AdjustmentRequest {
    pub fn new(original_script: Script, adjustment_request: impl Into<String>) -> Self {
        Self {
            original_script,
            adjustment_request: adjustment_request.into(),
        }
    }
}

// --- Validation of typed values ---

/// Checks the invariants serde cannot express (non-empty text, scene bounds).
pub trait Validate {
    fn collect_errors(&self, path: &str, limits: &SceneLimits, errors: &mut Vec<FieldError>);

    fn validate(&self, limits: &SceneLimits) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        self.collect_errors("", limits, &mut errors);
        ValidationError::check(errors)
    }
}

fn join_path(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", path, field)
    }
}

fn check_text(value: &str, path: &str, field: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(join_path(path, field), "must not be empty"));
    }
}

fn check_scene_count(count: usize, path: &str, limits: &SceneLimits, errors: &mut Vec<FieldError>) {
    if count == 0 {
        errors.push(FieldError::new(
            join_path(path, "scenes"),
            "must contain at least one scene",
        ));
    } else if count > limits.max_scenes {
        errors.push(FieldError::new(
            join_path(path, "scenes"),
            format!(
                "contains {} scenes, at most {} are allowed",
                count, limits.max_scenes
            ),
        ));
    }
}

impl Validate for Scene {
    fn collect_errors(&self, path: &str, _limits: &SceneLimits, errors: &mut Vec<FieldError>) {
        check_text(&self.text, path, "text", errors);
        check_text(&self.visual_suggestion, path, "visualSuggestion", errors);
    }
}

impl Validate for Script {
    fn collect_errors(&self, path: &str, limits: &SceneLimits, errors: &mut Vec<FieldError>) {
        check_text(&self.hook, path, "hook", errors);
        check_scene_count(self.scenes.len(), path, limits, errors);
        for (i, scene) in self.scenes.iter().enumerate() {
            scene.collect_errors(&join_path(path, &format!("scenes[{}]", i)), limits, errors);
        }
        check_text(&self.cta, path, "cta", errors);
    }
}

impl Validate for GenerationRequest {
    fn collect_errors(&self, path: &str, _limits: &SceneLimits, errors: &mut Vec<FieldError>) {
        // format and style are closed enums once typed
        check_text(&self.topic, path, "topic", errors);
    }
}

impl Validate for AdjustmentRequest {
    fn collect_errors(&self, path: &str, limits: &SceneLimits, errors: &mut Vec<FieldError>) {
        self.original_script
            .collect_errors(&join_path(path, "originalScript"), limits, errors);
        check_text(&self.adjustment_request, path, "adjustmentRequest", errors);
    }
}

// --- Shape checking of untrusted JSON ---

/// Conversion of an arbitrary JSON value into a typed, validated value.
/// Every offending field is reported, not just the first one.
pub trait Shape: Sized {
    fn read(value: &Value, path: &str, limits: &SceneLimits, errors: &mut Vec<FieldError>) -> Option<Self>;

    fn from_value(value: &Value, limits: &SceneLimits) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();
        let parsed = Self::read(value, "", limits, &mut errors);
        match parsed {
            Some(v) if errors.is_empty() => Ok(v),
            _ => {
                if errors.is_empty() {
                    errors.push(FieldError::new("(root)", "does not match the expected shape"));
                }
                Err(ValidationError { fields: errors })
            }
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn read_object<'a>(
    value: &'a Value,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a Map<String, Value>> {
    match value.as_object() {
        Some(obj) => Some(obj),
        None => {
            let field = if path.is_empty() { "(root)" } else { path };
            errors.push(FieldError::new(
                field,
                format!("expected an object, found {}", value_kind(value)),
            ));
            None
        }
    }
}

fn read_text(
    obj: &Map<String, Value>,
    path: &str,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None => {
            errors.push(FieldError::new(join_path(path, field), "is missing"));
            None
        }
        Some(Value::String(s)) => {
            check_text(s, path, field, errors);
            Some(s.clone())
        }
        Some(other) => {
            errors.push(FieldError::new(
                join_path(path, field),
                format!("expected a string, found {}", value_kind(other)),
            ));
            None
        }
    }
}

fn read_enum<T: FromStr<Err = String>>(
    obj: &Map<String, Value>,
    path: &str,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match obj.get(field) {
        None => {
            errors.push(FieldError::new(join_path(path, field), "is missing"));
            None
        }
        Some(Value::String(s)) => match s.parse::<T>() {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push(FieldError::new(join_path(path, field), e));
                None
            }
        },
        Some(other) => {
            errors.push(FieldError::new(
                join_path(path, field),
                format!("expected a string, found {}", value_kind(other)),
            ));
            None
        }
    }
}

impl Shape for Scene {
    fn read(value: &Value, path: &str, _limits: &SceneLimits, errors: &mut Vec<FieldError>) -> Option<Self> {
        let obj = read_object(value, path, errors)?;
        let text = read_text(obj, path, "text", errors);
        let visual_suggestion = read_text(obj, path, "visualSuggestion", errors);
        Some(Scene {
            text: text?,
            visual_suggestion: visual_suggestion?,
        })
    }
}

impl Shape for Script {
    fn read(value: &Value, path: &str, limits: &SceneLimits, errors: &mut Vec<FieldError>) -> Option<Self> {
        let obj = read_object(value, path, errors)?;
        let hook = read_text(obj, path, "hook", errors);

        let scenes_path = join_path(path, "scenes");
        let scenes = match obj.get("scenes") {
            None => {
                errors.push(FieldError::new(scenes_path, "is missing"));
                None
            }
            Some(Value::Array(items)) => {
                check_scene_count(items.len(), path, limits, errors);
                let read: Vec<Option<Scene>> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        Scene::read(item, &format!("{}[{}]", scenes_path, i), limits, errors)
                    })
                    .collect();
                read.into_iter().collect::<Option<Vec<_>>>()
            }
            Some(other) => {
                errors.push(FieldError::new(
                    scenes_path,
                    format!("expected an array, found {}", value_kind(other)),
                ));
                None
            }
        };

        let cta = read_text(obj, path, "cta", errors);
        Some(Script {
            hook: hook?,
            scenes: scenes?,
            cta: cta?,
        })
    }
}

impl Shape for GenerationRequest {
    fn read(value: &Value, path: &str, _limits: &SceneLimits, errors: &mut Vec<FieldError>) -> Option<Self> {
        let obj = read_object(value, path, errors)?;
        let topic = read_text(obj, path, "topic", errors);
        let format = read_enum::<VideoFormat>(obj, path, "format", errors);
        let style = read_enum::<VideoStyle>(obj, path, "style", errors);
        Some(GenerationRequest {
            topic: topic?,
            format: format?,
            style: style?,
        })
    }
}

impl Shape for AdjustmentRequest {
    fn read(value: &Value, path: &str, limits: &SceneLimits, errors: &mut Vec<FieldError>) -> Option<Self> {
        let obj = read_object(value, path, errors)?;
        let script_path = join_path(path, "originalScript");
        let original_script = match obj.get("originalScript") {
            Some(v) => Script::read(v, &script_path, limits, errors),
            None => {
                errors.push(FieldError::new(script_path, "is missing"));
                None
            }
        };
        let adjustment_request = read_text(obj, path, "adjustmentRequest", errors);
        Some(AdjustmentRequest {
            original_script: original_script?,
            adjustment_request: adjustment_request?,
        })
    }
}

impl Script {
    /// JSON Schema of the Script shape, handed to the model alongside the prompt.
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "hook": {
                    "type": "string",
                    "description": "A catchy hook to grab the viewer's attention."
                },
                "scenes": {
                    "type": "array",
                    "description": "An array of scenes with text and visual suggestions.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "text": {
                                "type": "string",
                                "description": "The text for the scene."
                            },
                            "visualSuggestion": {
                                "type": "string",
                                "description": "A suggestion for the visuals in the scene."
                            }
                        },
                        "required": ["text", "visualSuggestion"]
                    }
                },
                "cta": {
                    "type": "string",
                    "description": "A closing call to action."
                }
            },
            "required": ["hook", "scenes", "cta"]
        })
    }

    /// Plain-text rendering used for copying or saving a script.
    pub fn to_plain_text(&self) -> String {
        let scenes = self
            .scenes
            .iter()
            .enumerate()
            .map(|(i, scene)| {
                format!(
                    "Scene {}:\nText: {}\nVisual: {}",
                    i + 1,
                    scene.text,
                    scene.visual_suggestion
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "Hook:\n{}\n\nScenes:\n{}\n\nCTA:\n{}",
            self.hook, scenes, self.cta
        )
    }
}
