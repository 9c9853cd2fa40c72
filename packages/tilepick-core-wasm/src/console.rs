// Routes `log` records to the browser console when running as WebAssembly.
// Native builds leave logger installation to the host (tests use env_logger).

#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: log::Level) {
    if console_log::init_with_level(level).is_err() {
        // A logger was already installed by the host page
        log::debug!("console logger already initialized");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: log::Level) {
    log::set_max_level(level.to_level_filter());
}
