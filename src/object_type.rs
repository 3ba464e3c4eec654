use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// Kind of a directory object living in a trusted domain, as reported by the
/// local name service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum ObjectType {
    /// A user account.
    User = 1,

    /// A group.
    Group = 2,

    /// A user with a private group of the same name (user and group at once).
    Both = 3,
}

impl ObjectType {
    /// Classifies a directory entry from its `objectClass` values.
    #[must_use]
    #[inline]
    pub fn from_object_classes<'a, I>(classes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut found = None;
        for class in classes {
            if class.eq_ignore_ascii_case("group") {
                return Some(Self::Group);
            }
            if class.eq_ignore_ascii_case("user") {
                found = Some(Self::User);
            }
        }
        found
    }
}
