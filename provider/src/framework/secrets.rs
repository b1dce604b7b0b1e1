// provider/src/framework/secrets.rs

use secrecy::{ExposeSecret, Secret};

/// WriteOnlyString holds the value of a write-only attribute for the
/// duration of one call.
///
/// 1. It cannot be accidentally logged (`{:?}` prints `[REDACTED]`).
/// 2. The heap buffer is zeroized when the wrapper is dropped.
///
/// The only way to turn it back into a plain `String` is [`reveal`], which
/// is exactly the operation the revealer resource exists to perform.
///
/// [`reveal`]: WriteOnlyString::reveal
pub struct WriteOnlyString {
    value: Secret<String>,
}

impl WriteOnlyString {
    /// Takes ownership of the plaintext so no second copy is left behind.
    pub fn new(value: String) -> Self {
        Self {
            value: Secret::new(value),
        }
    }

    /// Exposes the value to `action` without letting the borrow escape.
    pub fn use_secret<F, R>(&self, action: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        action(self.value.expose_secret().as_str())
    }

    /// Copies the value out into an ordinary, persistable string.
    pub fn reveal(&self) -> String {
        self.use_secret(str::to_owned)
    }
}

impl std::fmt::Debug for WriteOnlyString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WriteOnlyString([REDACTED])")
    }
}
