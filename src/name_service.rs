use num_enum::{TryFromPrimitive, TryFromPrimitiveError};

use crate::{ObjectType, SecurityIdentifier};

/// This struct represents an answer of the local name service (the SSSD cache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameServiceEntry {
    /// The SID string or the `name@domain` name, depending on the query.
    pub value: String,
    /// The raw id type value reported by the name service.
    pub id_type_raw: i32,
}

impl NameServiceEntry {
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            value: value.into(),
            id_type_raw: object_type.into(),
        }
    }

    /// Get the object type as an enum.
    /// # Errors
    /// Return a [`TryFromPrimitiveError<ObjectType>`] error if the raw id type value is unknown.
    #[inline]
    pub fn object_type(&self) -> Result<ObjectType, TryFromPrimitiveError<ObjectType>> {
        ObjectType::try_from_primitive(self.id_type_raw)
    }
}

/// Local name-service cache, the fast path of every resolution.
///
/// A `None` answer is a cache miss, never an error.
pub trait NameService {
    /// SID of the object called `name`.
    fn sid_by_name(&self, name: &str) -> Option<NameServiceEntry>;

    /// `name@domain` of the object owning `sid`.
    fn name_by_sid(&self, sid: &SecurityIdentifier) -> Option<NameServiceEntry>;

    /// Names of the groups `name` is a member of.
    fn groups_of(&self, name: &str) -> Option<Vec<String>>;
}
