//! Entity identity and lifecycle primitives
//!
//! Everything the referral core references (referrals themselves, users,
//! units, answer versions, validation requests) is identified by a
//! phantom-typed [`EntityId`]. The phantom parameter costs nothing at
//! runtime and makes it a compile error to hand a unit ID to an API that
//! wants a user ID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::time::SystemTime;
use uuid::Uuid;

/// Identity plus creation/update bookkeeping for a domain entity
///
/// # Examples
///
/// ```rust
/// use referral_domain::{Entity, EntityId};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// struct Dossier;
///
/// // Fresh entity, fresh ID, both timestamps equal.
/// let dossier = Entity::<Dossier>::new();
/// assert_eq!(dossier.created_at, dossier.updated_at);
///
/// // Rehydrating with a known ID keeps that ID.
/// let id = EntityId::<Dossier>::new();
/// assert_eq!(Entity::with_id(id).id, id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity<T> {
    /// The unique identifier for this entity
    pub id: EntityId<T>,
    /// When this entity was created
    pub created_at: SystemTime,
    /// When this entity was last updated
    pub updated_at: SystemTime,
}

impl<T> Entity<T> {
    /// Create a new entity with a generated ID
    pub fn new() -> Self {
        Self::with_id(EntityId::new())
    }

    /// Create an entity carrying a caller-chosen ID
    pub fn with_id(id: EntityId<T>) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump the update timestamp
    pub fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }
}

impl<T> Default for Entity<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Globally unique, phantom-typed identifier
///
/// The `T` parameter exists only at compile time; two IDs of different
/// entity kinds never unify even when they wrap the same UUID.
///
/// # Examples
///
/// ```rust
/// use referral_domain::EntityId;
///
/// #[derive(Clone, Copy)]
/// struct User;
/// #[derive(Clone, Copy)]
/// struct Unit;
///
/// let user_id = EntityId::<User>::new();
///
/// // let wrong: EntityId<Unit> = user_id; // does not compile
///
/// // Crossing the boundary takes an explicit cast.
/// let unit_id: EntityId<Unit> = user_id.cast();
/// assert_eq!(user_id.as_uuid(), unit_id.as_uuid());
/// ```
// Transparent serde representation: an entity ID reads and writes as its
// bare UUID, which also lets it serve as a JSON map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Generate a fresh random ID
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Borrow the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }

    /// Reinterpret as an ID of another entity kind
    ///
    /// Deliberately explicit; reach for this only at serialization
    /// boundaries where the kind is re-established by context.
    pub fn cast<U>(self) -> EntityId<U> {
        EntityId::from_uuid(self.id)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

impl<T> From<&EntityId<T>> for Uuid {
    fn from(id: &EntityId<T>) -> Self {
        id.id
    }
}

// Schema-wise an entity ID is just its UUID; the phantom parameter only
// exists at compile time.
impl<T> schemars::JsonSchema for EntityId<T> {
    fn schema_name() -> String {
        "EntityId".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <Uuid as schemars::JsonSchema>::json_schema(gen)
    }
}

/// Contract of an aggregate root
///
/// The root is the only entry point for mutating anything inside its
/// boundary: assignments, validation requests and history records are
/// created by referral transitions, never on their own. The version number
/// supports optimistic concurrency at the persistence boundary.
pub trait AggregateRoot: Sized {
    /// The type of ID for this aggregate
    type Id: Copy + Eq + Send + Sync;

    /// Get the aggregate's ID
    fn id(&self) -> Self::Id;

    /// Get the aggregate's version for optimistic concurrency
    fn version(&self) -> u64;

    /// Increment the version
    fn increment_version(&mut self);
}

// Marker types for entity IDs

/// Marker for referral aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferralMarker;

/// Marker for users (requesters, observers, unit members)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserMarker;

/// Marker for handling units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitMarker;

/// Marker for answers / report versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerMarker;

/// Marker for validation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationRequestMarker;

/// Marker for topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicMarker;

/// Marker for knowledge-base notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteMarker;

/// Marker for command entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandMarker;
