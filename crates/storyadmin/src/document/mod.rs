pub mod field;
pub mod schema;
pub mod store;

pub use field::Field;
pub use schema::{
    AiPrompts, Bound, Bounds, ConfigurationDocument, GenerationConfig, ImageGenerationPrompts,
    ImageJustification, Location, Place, StoryGenerationPrompts, StoryType, Theme, ThemeCategory,
};
pub use store::ConfigStore;
