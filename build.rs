fn main() {
    // The desktop shell is optional; the core library builds without a webview toolchain.
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
