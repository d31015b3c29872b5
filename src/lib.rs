// Learn more about Tauri commands at https://tauri.app/develop/calling-rust/

pub mod app;
pub mod chat;
pub mod config;
pub mod llama;
pub mod logging;
pub mod memory;
pub mod postprocessing;
pub mod preprocessing;
pub mod storage;
pub mod transcript;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use crate::app::AppBootstrap;
    use crate::commands::*;
    use crate::config::AppPaths;
    use tauri::Emitter;
    use tokio::sync::broadcast::error::RecvError;

    dotenv::dotenv().ok();

    let started = AppPaths::discover()
        .map_err(anyhow::Error::from)
        .and_then(|paths| {
            let guard = logging::init(&paths.log_dir());
            AppBootstrap::load(paths).map(|boot| (boot, guard))
        });
    let (boot, _log_guard) = match started {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "Start-up failed");
            eprintln!("Failed to start:\n\n{:#}", e);
            std::process::exit(1);
        }
    };

    let paths = boot.paths.clone();
    let (_controller, chat) = tauri::async_runtime::block_on(async move { boot.start() });
    let mut events = chat.subscribe();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(DesktopState { chat, paths })
        .setup(move |app| {
            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => {
                            if let Err(e) = app_handle.emit("chat-event", &event) {
                                tracing::warn!(error = %e, "Failed to emit chat-event");
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "UI fell behind on chat events");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            send_message,
            quick_command,
            clear_chat,
            clear_memory,
            export_chat,
            chat_snapshot,
            update_setting,
            theme_palette,
            filter_text
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
