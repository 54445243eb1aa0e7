pub mod ai;
pub mod blend;
pub mod color;
pub mod composite;
pub mod config;
pub mod filters;
pub mod fonts;
pub mod image_store;
pub mod layer_store;
pub mod layers;
pub mod pipeline;
pub mod print;
pub mod state;
pub mod tools;

pub use config::EditorConfig;
pub use state::AppState;
