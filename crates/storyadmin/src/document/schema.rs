//! Typed view of the story configuration document.
//!
//! The document is schema-loose: every field may be missing or hold an
//! unexpected value, and unknown fields are carried through `extra`. Each
//! known field is a [`Field`], so a typed round trip writes back exactly
//! what was read unless the field was edited.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::field::Field;

/// The whole editable story-generation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDocument {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub version: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub last_updated: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub step_titles: Field<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub story_themes: Field<Vec<ThemeCategory>>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub story_type: Field<Vec<StoryType>>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub locations: Field<Vec<Location>>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub ai_prompts: Field<AiPrompts>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigurationDocument {
    /// Parses a JSON value into the typed document. Only fails when `value`
    /// is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Converts the typed document back into a JSON value.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn story_themes_mut(&mut self) -> &mut Vec<ThemeCategory> {
        self.story_themes.get_or_insert_with(Vec::new)
    }

    pub fn story_types_mut(&mut self) -> &mut Vec<StoryType> {
        self.story_type.get_or_insert_with(Vec::new)
    }

    pub fn locations_mut(&mut self) -> &mut Vec<Location> {
        self.locations.get_or_insert_with(Vec::new)
    }

    pub fn step_titles_mut(&mut self) -> &mut Map<String, Value> {
        self.step_titles.get_or_insert_with(Map::new)
    }

    pub fn ai_prompts_mut(&mut self) -> &mut AiPrompts {
        self.ai_prompts.get_or_insert_with(AiPrompts::default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeCategory {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub category: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub themes: Field<Vec<Theme>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ThemeCategory {
    pub fn themes_mut(&mut self) -> &mut Vec<Theme> {
        self.themes.get_or_insert_with(Vec::new)
    }
}

impl Default for ThemeCategory {
    fn default() -> Self {
        Self {
            category: "New Category".into(),
            description: "".into(),
            icon: "flask-blue".into(),
            themes: Vec::new().into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub theme: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub age_range: Field<Bounds>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub word_count: Field<Bounds>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            theme: "New Theme".into(),
            description: "".into(),
            age_range: Bounds::new(3, 12).into(),
            word_count: Bounds::new(400, 1200).into(),
            extra: Map::new(),
        }
    }
}

/// Inclusive `{min, max}` pair used for age ranges and word counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub min: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub max: Field<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bounds {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            extra: Map::new(),
        }
    }
}

/// Which end of a [`Bounds`] an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageJustification {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryType {
    #[serde(rename = "type", default, skip_serializing_if = "Field::is_missing")]
    pub kind: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub image_url: Field<String>,
    /// Values other than `left`/`right` are kept raw.
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub image_justification: Field<ImageJustification>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for StoryType {
    fn default() -> Self {
        Self {
            kind: "New Type".into(),
            description: "".into(),
            image_url: "".into(),
            image_justification: ImageJustification::Left.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub image_url: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub places: Field<Vec<Place>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Location {
    pub fn places_mut(&mut self) -> &mut Vec<Place> {
        self.places.get_or_insert_with(Vec::new)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            name: "New Location".into(),
            image_url: "".into(),
            places: Vec::new().into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub place_name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub place_description: Field<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Place {
    fn default() -> Self {
        Self {
            place_name: "New Place".into(),
            place_description: "".into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiPrompts {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub story_generation: Field<StoryGenerationPrompts>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub image_generation: Field<ImageGenerationPrompts>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AiPrompts {
    pub fn story_generation_mut(&mut self) -> &mut StoryGenerationPrompts {
        self.story_generation
            .get_or_insert_with(StoryGenerationPrompts::default)
    }

    pub fn image_generation_mut(&mut self) -> &mut ImageGenerationPrompts {
        self.image_generation
            .get_or_insert_with(ImageGenerationPrompts::default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryGenerationPrompts {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub base_prompt: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub child_info_template: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub generation_config: Field<GenerationConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoryGenerationPrompts {
    pub fn generation_config_mut(&mut self) -> &mut GenerationConfig {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub temperature: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub max_output_tokens: Field<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationPrompts {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub cover_prompt: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub scene_prompt: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub thumbnail_prompt: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub image_requirements: Field<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
