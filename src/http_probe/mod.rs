pub mod probe;
pub mod resolver;
pub mod result;

pub mod prelude {
    pub use super::probe::{HttpProber, Prober};
    pub use super::result::{ErrorKind, Outcome, ProbeResult, Target};
}

use std::fmt::Write;

/// Renders an error and all of its causes on a single line.
pub fn error_chain(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": caused by: {}", src);
        err = src;
    }
    s
}
