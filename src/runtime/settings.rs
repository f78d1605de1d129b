use crate::config;

/// Load and validate settings. Failures fall back to defaults; the returned
/// message says why so it can be logged once logging is up.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => match s.validate() {
            Ok(()) => (s, None),
            Err(e) => {
                let msg = format!("{e}, using defaults");
                eprintln!("cadenza: {msg}");
                (config::Settings::default(), Some(msg))
            }
        },
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            let msg = format!("failed to load config, using defaults: {e}");
            eprintln!("cadenza: {msg}");
            (config::Settings::default(), Some(msg))
        }
    }
}
