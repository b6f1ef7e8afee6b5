//! Local machine identity.

use tracing::warn;

/// Name used when the system hostname cannot be determined.
pub const FALLBACK_HOSTNAME: &str = "localhost";

/// Reads the system hostname, falling back to [`FALLBACK_HOSTNAME`].
#[must_use]
pub fn system_hostname() -> String {
    match hostname::get() {
        Err(e) => {
            warn!("Unable to get hostname, using default. {}", e);
            FALLBACK_HOSTNAME.into()
        }
        Ok(name) => match name.into_string() {
            Err(e) => {
                warn!("Unable to use hostname, using default. {:?}", e);
                FALLBACK_HOSTNAME.into()
            }
            Ok(name) if name.trim().is_empty() => FALLBACK_HOSTNAME.into(),
            Ok(name) => name,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_empty() {
        assert!(!system_hostname().is_empty());
    }
}
