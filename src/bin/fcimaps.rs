//! Command line runner for the `fcimaps` library.

#[cfg(not(feature = "for-testing"))]
#[quit::main]
fn main() {
    #[cfg(feature = "cli")]
    fcimaps::cli::run::run();
}

#[cfg(feature = "for-testing")]
fn main() {
    #[cfg(feature = "cli")]
    {
        eprintln!(
            "Warning: The `for-testing` feature is enabled, which will turn errors into panics"
        );
        fcimaps::cli::run::run();
    }
}
