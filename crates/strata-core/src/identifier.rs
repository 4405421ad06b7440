//! Timeline entry identifiers backed by a process-wide string interner.
//!
//! Entry ids are compared and hashed constantly while relations are resolved
//! and clusters are built, so they are interned once and passed around as a
//! `Copy` symbol.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Identifier of a timeline entry.
///
/// # Examples
///
/// ```
/// use strata_core::identifier::Id;
///
/// let latin = Id::new("latin");
/// let again: Id = "latin".into();
///
/// assert_eq!(latin, again);
/// assert_eq!(latin, "latin");
/// assert_eq!(latin.to_string(), "latin");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns the identifier if `name` was interned before, without interning it.
    ///
    /// Useful when resolving references: a name nobody declared cannot be the
    /// id of any entry.
    ///
    /// ```
    /// use strata_core::identifier::Id;
    ///
    /// let _declared = Id::new("declared-entry");
    /// assert!(Id::lookup("declared-entry").is_some());
    /// assert!(Id::lookup("never-declared-anywhere").is_none());
    /// ```
    pub fn lookup(name: &str) -> Option<Self> {
        interner().get(name).map(Self)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let value = interner.resolve(self.0).unwrap_or_default();
        f.write_str(value)
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        interner().resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_new_interns_once() {
        let id1 = Id::new("old-english");
        let id2 = Id::new("old-english");
        let id3 = Id::new("middle-english");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "old-english");
    }

    #[test]
    fn test_lookup() {
        let id = Id::new("lookup-target");
        assert_eq!(Id::lookup("lookup-target"), Some(id));
        assert_eq!(Id::lookup("lookup-missing-name"), None);
    }

    #[test]
    fn test_display() {
        let id = Id::new("display_test");
        assert_eq!(format!("{id}"), "display_test");
    }

    #[test]
    fn test_hash_and_eq() {
        let id1 = Id::new("key1");
        let id2 = Id::new("key1");
        let id3 = Id::new("key2");

        let mut map = HashMap::new();
        map.insert(id1, "value1");
        map.insert(id3, "value2");

        assert_eq!(map.get(&id2), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_partial_eq_str() {
        let id = Id::new("gothic");

        assert!(id == "gothic");
        assert!(id != "vandalic");

        let name = String::from("gothic");
        assert!(id == name.as_str());
    }
}
