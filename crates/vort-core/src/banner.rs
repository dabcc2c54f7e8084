//! Generator version and the banner prepended to every emitted source unit.

/// Version of the generator, taken from the crate metadata.
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Renders the comment banner that opens every emitted source unit.
///
/// The banner is always the first bytes of generator output so that any
/// artifact found on disk can be traced back to the generator version that
/// produced it.
pub fn version_banner() -> String {
    format!(
        "/***********************************************************************\n\
         * this code automatically generated by vort\n\
         * version {GENERATOR_VERSION}\n\
         ***********************************************************************/\n\n\n"
    )
}
