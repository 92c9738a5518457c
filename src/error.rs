/// Returned by checked move-out when the requested alternative is not the
/// active one. The untouched value is handed back.
#[derive(Debug, thiserror::Error)]
#[error("expected alternative {expected}, found alternative {found}")]
pub struct WrongTag<V> {
    value: V,
    expected: u8,
    found: u8,
}

impl<V> WrongTag<V> {
    pub(crate) fn new(value: V, expected: u8, found: u8) -> Self {
        WrongTag {
            value,
            expected,
            found,
        }
    }

    /// The discriminator that was asked for.
    pub fn expected(&self) -> u8 {
        self.expected
    }

    /// The discriminator that was actually active.
    pub fn found(&self) -> u8 {
        self.found
    }

    pub fn into_inner(self) -> V {
        self.value
    }

    /// Rewraps the rejected value, keeping both discriminators.
    pub fn map<W>(self, f: impl FnOnce(V) -> W) -> WrongTag<W> {
        WrongTag {
            value: f(self.value),
            expected: self.expected,
            found: self.found,
        }
    }
}
