//! Client-side working copy of the configuration document.
//!
//! An [`EditSession`] fetches the document once, lets the caller mutate it
//! field by field and writes the whole document back on [`EditSession::save`].
//! Every indexed operation addresses the *current* state of a sequence, so a
//! removal shifts the indices of everything after it.

use async_trait::async_trait;
use serde_json::Value;

use crate::document::{
    Bound, Bounds, ConfigStore, ConfigurationDocument, Field, Location, Place, StoryType, Theme,
    ThemeCategory,
};
use crate::error::{AdminError, SessionError};

type Result<T> = std::result::Result<T, AdminError>;

/// Where an [`EditSession`] loads from and saves to.
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    async fn fetch_config(&self) -> Result<Value>;
    async fn save_config(&self, document: &Value) -> Result<()>;
}

#[async_trait]
impl ConfigBackend for ConfigStore {
    async fn fetch_config(&self) -> Result<Value> {
        Ok(self.get()?)
    }

    async fn save_config(&self, document: &Value) -> Result<()> {
        Ok(self.replace(document.clone()).await?)
    }
}

#[async_trait]
impl<T: ConfigBackend + ?Sized> ConfigBackend for std::sync::Arc<T> {
    async fn fetch_config(&self) -> Result<Value> {
        (**self).fetch_config().await
    }

    async fn save_config(&self, document: &Value) -> Result<()> {
        (**self).save_config(document).await
    }
}

/// Text prompts under `aiPrompts.storyGeneration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryPrompt {
    BasePrompt,
    ChildInfoTemplate,
}

/// Text prompts under `aiPrompts.imageGeneration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePrompt {
    Cover,
    Scene,
    Thumbnail,
    Requirements,
}

/// Entry whose `imageUrl` an uploaded image is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    StoryType(usize),
    Location(usize),
}

pub struct EditSession<B> {
    backend: B,
    document: ConfigurationDocument,
    dirty: bool,
}

impl<B: ConfigBackend> EditSession<B> {
    /// Fetches the current document from `backend`.
    pub async fn open(backend: B) -> Result<Self> {
        let document = fetch_document(&backend).await?;
        Ok(Self {
            backend,
            document,
            dirty: false,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn document(&self) -> &ConfigurationDocument {
        &self.document
    }

    /// Whether the working copy has changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Discards local changes and re-fetches the document.
    pub async fn reload(&mut self) -> Result<()> {
        self.document = fetch_document(&self.backend).await?;
        self.dirty = false;
        Ok(())
    }

    /// Writes the whole working copy back to the backend.
    pub async fn save(&mut self) -> Result<()> {
        let value = self
            .document
            .to_value()
            .map_err(SessionError::InvalidDocument)?;
        self.backend.save_config(&value).await?;
        self.dirty = false;
        Ok(())
    }

    // Basic info

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.touch().version.set(version.into());
    }

    pub fn set_last_updated(&mut self, last_updated: impl Into<String>) {
        self.touch().last_updated.set(last_updated.into());
    }

    pub fn set_step_title(&mut self, key: impl Into<String>, title: impl Into<String>) {
        self.touch()
            .step_titles_mut()
            .insert(key.into(), Value::String(title.into()));
    }

    // Additions append an entry with default values and return its index.

    pub fn add_theme_category(&mut self) -> usize {
        push_default(self.touch().story_themes_mut())
    }

    pub fn add_theme(&mut self, category: usize) -> Result<usize> {
        Ok(push_default(self.theme_category_mut(category)?.themes_mut()))
    }

    pub fn add_story_type(&mut self) -> usize {
        push_default(self.touch().story_types_mut())
    }

    pub fn add_location(&mut self) -> usize {
        push_default(self.touch().locations_mut())
    }

    pub fn add_place(&mut self, location: usize) -> Result<usize> {
        Ok(push_default(self.location_mut(location)?.places_mut()))
    }

    // Removals. Indices are checked before anything is touched, so a
    // rejected edit leaves the session clean.

    pub fn remove_theme_category(&mut self, index: usize) -> Result<ThemeCategory> {
        self.theme_category(index)?;
        Ok(self.touch().story_themes_mut().remove(index))
    }

    pub fn remove_theme(&mut self, category: usize, index: usize) -> Result<Theme> {
        entry(items(&self.theme_category(category)?.themes), "themes", index)?;
        Ok(self.theme_category_mut(category)?.themes_mut().remove(index))
    }

    pub fn remove_story_type(&mut self, index: usize) -> Result<StoryType> {
        entry(items(&self.document.story_type), "storyType", index)?;
        Ok(self.touch().story_types_mut().remove(index))
    }

    pub fn remove_location(&mut self, index: usize) -> Result<Location> {
        self.location(index)?;
        Ok(self.touch().locations_mut().remove(index))
    }

    pub fn remove_place(&mut self, location: usize, index: usize) -> Result<Place> {
        entry(items(&self.location(location)?.places), "places", index)?;
        Ok(self.location_mut(location)?.places_mut().remove(index))
    }

    // Field updates. Borrowing an entry mutably marks the session dirty.

    pub fn theme_category_mut(&mut self, index: usize) -> Result<&mut ThemeCategory> {
        self.theme_category(index)?;
        Ok(&mut self.touch().story_themes_mut()[index])
    }

    pub fn theme_mut(&mut self, category: usize, index: usize) -> Result<&mut Theme> {
        entry(items(&self.theme_category(category)?.themes), "themes", index)?;
        Ok(&mut self.theme_category_mut(category)?.themes_mut()[index])
    }

    pub fn story_type_mut(&mut self, index: usize) -> Result<&mut StoryType> {
        entry(items(&self.document.story_type), "storyType", index)?;
        Ok(&mut self.touch().story_types_mut()[index])
    }

    pub fn location_mut(&mut self, index: usize) -> Result<&mut Location> {
        self.location(index)?;
        Ok(&mut self.touch().locations_mut()[index])
    }

    pub fn place_mut(&mut self, location: usize, index: usize) -> Result<&mut Place> {
        entry(items(&self.location(location)?.places), "places", index)?;
        Ok(&mut self.location_mut(location)?.places_mut()[index])
    }

    pub fn set_age_range(
        &mut self,
        category: usize,
        theme: usize,
        bound: Bound,
        value: i64,
    ) -> Result<()> {
        let theme = self.theme_mut(category, theme)?;
        set_bound(theme.age_range.get_or_insert_with(Bounds::default), bound, value);
        Ok(())
    }

    pub fn set_word_count(
        &mut self,
        category: usize,
        theme: usize,
        bound: Bound,
        value: i64,
    ) -> Result<()> {
        let theme = self.theme_mut(category, theme)?;
        set_bound(theme.word_count.get_or_insert_with(Bounds::default), bound, value);
        Ok(())
    }

    pub fn set_story_prompt(&mut self, prompt: StoryPrompt, text: impl Into<String>) {
        let prompts = self.touch().ai_prompts_mut().story_generation_mut();
        let slot = match prompt {
            StoryPrompt::BasePrompt => &mut prompts.base_prompt,
            StoryPrompt::ChildInfoTemplate => &mut prompts.child_info_template,
        };
        slot.set(text.into());
    }

    pub fn set_image_prompt(&mut self, prompt: ImagePrompt, text: impl Into<String>) {
        let prompts = self.touch().ai_prompts_mut().image_generation_mut();
        let slot = match prompt {
            ImagePrompt::Cover => &mut prompts.cover_prompt,
            ImagePrompt::Scene => &mut prompts.scene_prompt,
            ImagePrompt::Thumbnail => &mut prompts.thumbnail_prompt,
            ImagePrompt::Requirements => &mut prompts.image_requirements,
        };
        slot.set(text.into());
    }

    pub fn set_generation_temperature(&mut self, temperature: f64) {
        self.touch()
            .ai_prompts_mut()
            .story_generation_mut()
            .generation_config_mut()
            .temperature
            .set(temperature);
    }

    pub fn set_generation_max_tokens(&mut self, max_output_tokens: i64) {
        self.touch()
            .ai_prompts_mut()
            .story_generation_mut()
            .generation_config_mut()
            .max_output_tokens
            .set(max_output_tokens);
    }

    /// Points the target entry's `imageUrl` at an uploaded asset.
    pub fn apply_uploaded_image(&mut self, target: ImageTarget, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        match target {
            ImageTarget::StoryType(index) => self.story_type_mut(index)?.image_url.set(url),
            ImageTarget::Location(index) => self.location_mut(index)?.image_url.set(url),
        }
        Ok(())
    }

    // Raw JSON editing

    /// The working copy as pretty-printed JSON.
    pub fn to_raw_json(&self) -> Result<String> {
        let value = self
            .document
            .to_value()
            .map_err(SessionError::InvalidDocument)?;
        Ok(serde_json::to_string_pretty(&value).map_err(SessionError::InvalidDocument)?)
    }

    /// Replaces the working copy with `text`. Invalid input leaves the working
    /// copy untouched.
    pub fn apply_raw_json(&mut self, text: &str) -> Result<()> {
        let value: Value = serde_json::from_str(text).map_err(SessionError::InvalidRawJson)?;
        let document =
            ConfigurationDocument::from_value(value).map_err(SessionError::InvalidRawJson)?;
        self.document = document;
        self.dirty = true;
        Ok(())
    }

    fn theme_category(&self, index: usize) -> Result<&ThemeCategory> {
        entry(items(&self.document.story_themes), "storyThemes", index)
    }

    fn location(&self, index: usize) -> Result<&Location> {
        entry(items(&self.document.locations), "locations", index)
    }

    fn touch(&mut self) -> &mut ConfigurationDocument {
        self.dirty = true;
        &mut self.document
    }
}

async fn fetch_document<B: ConfigBackend>(backend: &B) -> Result<ConfigurationDocument> {
    let value = backend.fetch_config().await?;
    Ok(ConfigurationDocument::from_value(value).map_err(SessionError::InvalidDocument)?)
}

fn push_default<T: Default>(items: &mut Vec<T>) -> usize {
    items.push(T::default());
    items.len() - 1
}

/// Entries of a sequence field. A missing or non-array value has none.
fn items<T>(field: &Field<Vec<T>>) -> &[T] {
    field.get().map(Vec::as_slice).unwrap_or_default()
}

fn entry<'a, T>(items: &'a [T], collection: &'static str, index: usize) -> Result<&'a T> {
    items.get(index).ok_or_else(|| {
        SessionError::IndexOutOfRange {
            collection,
            index,
            len: items.len(),
        }
        .into()
    })
}

fn set_bound(bounds: &mut Bounds, bound: Bound, value: i64) {
    match bound {
        Bound::Min => bounds.min.set(value),
        Bound::Max => bounds.max.set(value),
    }
}
