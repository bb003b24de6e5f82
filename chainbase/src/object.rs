use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Identity of a record inside its index.
///
/// Ids are assigned by the index at creation time, grow monotonically and are
/// never handed out twice (unless the creation itself is undone).
pub struct ObjectId<T> {
    value: u64,
    marker: PhantomData<fn() -> T>,
}

impl<T> ObjectId<T> {
    pub const fn new(value: u64) -> Self {
        ObjectId {
            value,
            marker: PhantomData,
        }
    }

    pub const fn value(self) -> u64 {
        self.value
    }
}

impl<T> Clone for ObjectId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ObjectId<T> {}

impl<T> PartialEq for ObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for ObjectId<T> {}

impl<T> PartialOrd for ObjectId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ObjectId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> Hash for ObjectId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<T> Default for ObjectId<T> {
    fn default() -> Self {
        ObjectId::new(0)
    }
}

impl<T> fmt::Debug for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.value)
    }
}

impl<T> fmt::Display for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T> Serialize for ObjectId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for ObjectId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(ObjectId::new)
    }
}

/// A record stored in an [`Index`](crate::Index).
///
/// Records are fixed shape values owning no other record: relations are
/// expressed with [`ObjectId`]s and resolved through the owning index.
pub trait Object: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + 'static {
    /// name used in diagnostics and as the snapshot section tag
    const TYPE_NAME: &'static str;

    fn id(&self) -> ObjectId<Self>;

    /// Secondary orderings maintained by the index, addressed by position
    /// with a [`KeyId`].
    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        Vec::new()
    }
}

/// One component of a composite [`Key`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    Int(i128),
    Str(String),
}

macro_rules! key_part_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for KeyPart {
                fn from(v: $ty) -> Self {
                    KeyPart::Int(v as i128)
                }
            }
        )*
    };
}

key_part_from_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl From<bool> for KeyPart {
    fn from(v: bool) -> Self {
        KeyPart::Int(v as i128)
    }
}

impl From<&str> for KeyPart {
    fn from(v: &str) -> Self {
        KeyPart::Str(v.to_owned())
    }
}

impl From<String> for KeyPart {
    fn from(v: String) -> Self {
        KeyPart::Str(v)
    }
}

impl<T> From<ObjectId<T>> for KeyPart {
    fn from(id: ObjectId<T>) -> Self {
        KeyPart::Int(id.value() as i128)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Int(v) => v.fmt(f),
            KeyPart::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Ordered composite key, compared lexicographically part by part.
///
/// A shorter key sorts before every key it is a prefix of, which is what
/// makes [`Index::range_by`](crate::Index::range_by) usable as a lower bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Vec<KeyPart>);

impl Key {
    pub fn new() -> Self {
        Key(Vec::new())
    }

    pub fn from_parts(parts: Vec<KeyPart>) -> Self {
        Key(parts)
    }

    pub fn with<P: Into<KeyPart>>(mut self, part: P) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            part.fmt(f)?;
        }
        f.write_str(")")
    }
}

/// Build a [`Key`] out of anything convertible into [`KeyPart`]s.
///
/// ```
/// use chainbase::{key, Key};
///
/// let k = key!["alice", 3u32];
/// assert_eq!(k, Key::new().with("alice").with(3u32));
/// ```
#[macro_export]
macro_rules! key {
    ($($part:expr),* $(,)?) => {
        $crate::Key::from_parts(vec![$($crate::KeyPart::from($part)),*])
    };
}

/// Position of a secondary key in [`Object::secondary_keys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyId(pub usize);

/// Declaration of a secondary ordering.
pub struct SecondaryKey<T> {
    name: &'static str,
    unique: bool,
    extract: fn(&T) -> Key,
}

impl<T> SecondaryKey<T> {
    pub fn unique(name: &'static str, extract: fn(&T) -> Key) -> Self {
        SecondaryKey {
            name,
            unique: true,
            extract,
        }
    }

    pub fn non_unique(name: &'static str, extract: fn(&T) -> Key) -> Self {
        SecondaryKey {
            name,
            unique: false,
            extract,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn extract(&self, object: &T) -> Key {
        (self.extract)(object)
    }
}
