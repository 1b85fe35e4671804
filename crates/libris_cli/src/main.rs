//! Interactive catalog manager entry point.
//!
//! # Responsibility
//! - Wire configuration, logging, and the JSON-file library together.
//! - Hand stdin/stdout to the menu session and always exit cleanly.

mod menu;

use libris_core::{init_from_config, Library, LibraryConfig};
use log::error;

fn main() {
    let config = LibraryConfig::default();
    if let Err(err) = init_from_config(&config) {
        eprintln!("Logging disabled: {err}");
    }

    let mut library = Library::open(&config);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(err) = menu::run(&mut library, stdin.lock(), stdout.lock()) {
        error!("event=session_end module=cli status=error error={}", err);
        eprintln!("Session ended unexpectedly: {err}");
    }
}
