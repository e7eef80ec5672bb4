/// A replicated value tagged with the sequence number that last wrote it.
///
/// Writes with a sequence number at or below the current version are
/// ignored, which makes duplicate and reordered deliveries harmless.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Versioned<T> {
    value: T,
    version: u64,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: u64) -> Self {
        Self { value, version }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stores `value` if `version` is newer. Returns `true` when it did.
    pub fn set_if_newer(&mut self, value: T, version: u64) -> bool {
        if version <= self.version {
            return false;
        }
        self.value = value;
        self.version = version;
        true
    }
}

impl<T: Copy> Versioned<T> {
    pub fn value(&self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_and_duplicate_writes_are_ignored() {
        let mut health = Versioned::new(100.0_f32, 1);

        assert!(health.set_if_newer(80.0, 5));
        assert!(!health.set_if_newer(90.0, 3));
        assert!(!health.set_if_newer(80.0, 5));

        assert_eq!(health.value(), 80.0);
        assert_eq!(health.version(), 5);
    }
}
