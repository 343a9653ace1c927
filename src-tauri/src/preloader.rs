use crate::markdown::LinkMarkdown;
use tauri::{AppHandle, Manager};

/// Compile the markdown rule set in the background so the first
/// `render_markdown` call does not pay for it.
pub async fn preload_markdown_rules(app_handle: AppHandle) {
    let Some(markdown) = app_handle.try_state::<LinkMarkdown>() else {
        log::warn!("markdown service not registered, skipping warm-up");
        return;
    };

    let start_time = std::time::Instant::now();
    match markdown.warm_up() {
        Ok(()) => log::info!(
            "markdown rules compiled in {:.1}ms",
            start_time.elapsed().as_secs_f64() * 1000.0
        ),
        // Not fatal: the next render retries compilation.
        Err(e) => log::warn!("markdown warm-up failed: {}", e),
    }
}
