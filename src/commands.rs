use crate::chat::{ChatHandle, ChatSnapshot};
use crate::config::{AppPaths, Palette, ResponseLength, SettingChange, Settings, Theme};
use crate::postprocessing;
use crate::preprocessing::QuickCommand;
use tauri::State;

/// Shared with every command through `tauri::State`.
pub struct DesktopState {
    pub chat: ChatHandle,
    pub paths: AppPaths,
}

/* ---------- 1.  CHAT ---------- */

#[tauri::command]
pub async fn send_message(text: String, state: State<'_, DesktopState>) -> Result<(), String> {
    state.chat.submit(text).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn quick_command(
    command: QuickCommand,
    state: State<'_, DesktopState>,
) -> Result<(), String> {
    state
        .chat
        .quick_command(command)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn clear_chat(state: State<'_, DesktopState>) -> Result<(), String> {
    state.chat.clear_chat().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn clear_memory(state: State<'_, DesktopState>) -> Result<(), String> {
    state.chat.clear_memory().await.map_err(|e| e.to_string())
}

/// Returns the written file path for the confirmation dialog.
#[tauri::command]
pub async fn export_chat(state: State<'_, DesktopState>) -> Result<String, String> {
    let path = state
        .chat
        .export_chat(state.paths.export_dir())
        .await
        .map_err(|e| e.to_string())?;
    Ok(path.display().to_string())
}

/// Initial load; afterwards the UI follows `chat-event`.
#[tauri::command]
pub async fn chat_snapshot(state: State<'_, DesktopState>) -> Result<ChatSnapshot, String> {
    state.chat.snapshot().await.map_err(|e| e.to_string())
}

/* ---------- 2.  SETTINGS ---------- */

#[tauri::command]
pub async fn update_setting(
    change: SettingChange,
    state: State<'_, DesktopState>,
) -> Result<Settings, String> {
    state
        .chat
        .update_setting(change)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn theme_palette(theme: Theme) -> Palette {
    theme.palette()
}

/* ---------- 3.  UTILITIES ---------- */

#[tauri::command]
pub fn filter_text(text: String, length: ResponseLength) -> String {
    postprocessing::filter_response(&text, length)
}
