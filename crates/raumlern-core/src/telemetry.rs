//! Dünne Logging-Schicht.
//!
//! Mit dem Feature `telemetry` gehen Meldungen an `tracing`, sonst landen
//! Warnungen und Infos per `eprintln!` auf stderr. Ist trotz Feature kein
//! Subscriber installiert, gilt ebenfalls der stderr-Weg. Debug-Meldungen
//! werden ohne Subscriber verworfen. Stdout bleibt für die Episodenzeilen frei.

#[cfg(not(feature = "telemetry"))]
pub fn warn(message: &str) {
    eprintln!("[warn] {message}");
}

#[cfg(feature = "telemetry")]
pub fn warn(message: &str) {
    if tracing::dispatcher::has_been_set() {
        tracing::warn!("{message}");
    } else {
        eprintln!("[warn] {message}");
    }
}

#[cfg(not(feature = "telemetry"))]
pub fn info(message: &str) {
    eprintln!("[info] {message}");
}

#[cfg(feature = "telemetry")]
pub fn info(message: &str) {
    if tracing::dispatcher::has_been_set() {
        tracing::info!("{message}");
    } else {
        eprintln!("[info] {message}");
    }
}

#[cfg(not(feature = "telemetry"))]
pub fn debug(_message: &str) {}

#[cfg(feature = "telemetry")]
pub fn debug(message: &str) {
    tracing::debug!("{message}");
}
