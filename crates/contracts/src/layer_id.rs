//! LayerId - Cheap-to-clone layer identifier
//!
//! Uses Arc<str> internally for O(1) clone operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Layer identifier with cheap cloning.
///
/// Internally uses `Arc<str>` so cloning only increments a reference count
/// instead of allocating new memory. Layer ids are created once when the
/// blueprint is loaded and cloned on every tick and every load event.
///
/// # Examples
/// ```
/// use contracts::LayerId;
///
/// let id: LayerId = "radar_composite".into();
/// let id2 = id.clone();  // O(1) - just increments ref count
/// assert_eq!(id, id2);
/// assert_eq!(id.as_str(), "radar_composite");
/// ```
#[derive(Clone, Default)]
pub struct LayerId(Arc<str>);

impl LayerId {
    /// Create a new LayerId from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Deref to &str for easy string operations
impl Deref for LayerId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for LayerId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LayerId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Conversions
impl From<&str> for LayerId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for LayerId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<Arc<str>> for LayerId {
    #[inline]
    fn from(s: Arc<str>) -> Self {
        Self(s)
    }
}

// Display and Debug
impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({:?})", self.0)
    }
}

// Equality - can compare with &str, String, etc.
impl PartialEq for LayerId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for LayerId {}

impl PartialEq<str> for LayerId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for LayerId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialEq<String> for LayerId {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        self.0.as_ref() == other
    }
}

// Hash - same as str hash for HashMap compatibility
impl Hash for LayerId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

// Serde support
impl Serialize for LayerId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_clone_is_cheap() {
        let id1: LayerId = "goes_ir".into();
        let id2 = id1.clone();

        // Both should point to same underlying data (Arc clone is O(1))
        assert_eq!(id1.as_str().as_ptr(), id2.as_str().as_ptr());
    }

    #[test]
    fn test_equality() {
        let id: LayerId = "radar".into();
        assert_eq!(id, "radar");
        assert_eq!(id, String::from("radar"));
        assert_eq!(id, LayerId::from("radar"));
    }

    #[test]
    fn test_hashmap_key() {
        let mut map: HashMap<LayerId, i32> = HashMap::new();
        map.insert("layer1".into(), 1);
        map.insert("layer2".into(), 2);

        // Can lookup with &str
        assert_eq!(map.get("layer1"), Some(&1));
        assert_eq!(map.get("layer2"), Some(&2));
    }

    #[test]
    fn test_serde() {
        let id: LayerId = "test".into();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"test\"");

        let parsed: LayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
