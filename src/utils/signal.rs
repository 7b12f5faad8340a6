use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Block the calling thread until SIGINT/SIGTERM arrives.
///
/// Intended for binary hosts: wire and start the application, park here,
/// then stop it.
pub fn wait_for_termination() {
    let term = Arc::new(AtomicBool::new(false));
    for sig in TERM_SIGNALS {
        let _ = flag::register(*sig, term.clone());
    }
    while !term.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));
    }
}
