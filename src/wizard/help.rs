use crate::context::Context;
use crate::traits::{Prompt, Reply};
use anyhow::{Context as _, Result};

/// General help document, relative to the base URL
pub const README_PATH: &str = "README";

/// Fetch a help document relative to the base URL and show it in a message box
pub fn show(ctx: &Context, path: &str) -> Result<Reply> {
    let url = ctx.settings.resolve(path)?;
    log::debug!("Loading help from {}", url);

    let text = ctx
        .http
        .get_text(url.as_str())
        .with_context(|| format!("Failed to load help from {}", url))?;

    ctx.input.ask(Prompt::Message {
        title: "Help",
        text: text.trim_end(),
    })
}
