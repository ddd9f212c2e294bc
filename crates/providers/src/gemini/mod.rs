//! Script, scene and metadata generation through the Gemini API.

mod client;
mod prompts;
mod types;

pub use client::{GeminiClient, GeminiScriptService};
pub use prompts::{metadata_prompt, scenes_prompt, script_prompt};
