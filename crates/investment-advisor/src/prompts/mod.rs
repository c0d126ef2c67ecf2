//! Prompt templates for the four stages
//!
//! - `system`: fixed system prompts, one per stage
//! - `user`: MiniJinja templates rendered from the pipeline state

mod system;
mod user;

pub use system::*;
pub use user::*;

use crate::error::Result;
use minijinja::Environment;
use serde::Serialize;
use tracing::debug;

/// Render a template string against `ctx`
pub(crate) fn render<S: Serialize>(name: &str, template: &str, ctx: S) -> Result<String> {
    let env = Environment::new();
    let rendered = env.render_str(template, ctx)?;
    debug!("Rendered prompt '{}' ({} chars)", name, rendered.len());
    Ok(rendered)
}
