//! Logging and tracing configuration
//!
//! Logs always go to stderr so stdout carries only the step progress and
//! the final report. Response previews are emitted under the
//! `apiprobe::preview` target and can be silenced independently, e.g.
//! `RUST_LOG=apiprobe=info,apiprobe::preview=off`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive, or the verbose one when `-v` is given
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "apiprobe=debug,warn"
    } else {
        "apiprobe=info,warn"
    }
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    // A second init (e.g. from tests) is not an error worth reporting
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
