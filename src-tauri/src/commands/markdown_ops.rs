/// Markdown rendering commands backed by the shared compiled rule set
use crate::ipc::BridgeDispatcher;
use crate::markdown::{Element, LinkMarkdown};
use tauri::State;

#[tauri::command]
pub async fn render_markdown(
    markdown: State<'_, LinkMarkdown>,
    dispatcher: State<'_, BridgeDispatcher>,
    text: String,
    inline: Option<bool>,
) -> Result<Vec<Element>, String> {
    let inline = inline.unwrap_or_else(|| dispatcher.preferences().markdown_inline_default);
    markdown
        .render(&text, inline)
        .map_err(|e| e.to_frontend_message())
}

#[tauri::command]
pub async fn markdown_to_html(
    markdown: State<'_, LinkMarkdown>,
    dispatcher: State<'_, BridgeDispatcher>,
    text: String,
    inline: Option<bool>,
) -> Result<String, String> {
    let inline = inline.unwrap_or_else(|| dispatcher.preferences().markdown_inline_default);
    markdown
        .render_html(&text, inline)
        .map_err(|e| e.to_frontend_message())
}
