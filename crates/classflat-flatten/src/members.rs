//! Member identities and ordered member sets.
//!
//! A `MemberSet` is nine insertion-ordered buckets plus an optional
//! constructor. Buckets are keyed by `MemberIdentity`, so inserting an
//! identity that is already present is an override: the old entry is removed
//! and the new one appended at the end of its bucket.

use classflat_parser::{ClassMember, MemberKind};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentityKind {
    Field,
    Method,
    Accessor,
    Constructor,
    StaticBlock,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Public,
    Private,
}

/// The key that decides whether two members in a chain are the same slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberIdentity {
    pub is_static: bool,
    pub kind: IdentityKind,
    pub visibility: Visibility,
    /// Normalized name (see `PropertyName::key`).
    pub name: String,
}

impl MemberIdentity {
    pub fn new(is_static: bool, kind: IdentityKind, visibility: Visibility, name: impl Into<String>) -> Self {
        MemberIdentity {
            is_static,
            kind,
            visibility,
            name: name.into(),
        }
    }

    /// Identity of a parsed member. Static blocks have no name of their own,
    /// so the caller supplies a discriminator that keeps them unique.
    pub fn of_member(member: &ClassMember, owner: &str, index: usize) -> Self {
        let visibility = if member.is_private() {
            Visibility::Private
        } else {
            Visibility::Public
        };
        let kind = match member.kind {
            MemberKind::Property => IdentityKind::Field,
            MemberKind::Method => IdentityKind::Method,
            MemberKind::GetAccessor | MemberKind::SetAccessor => IdentityKind::Accessor,
            MemberKind::Constructor => IdentityKind::Constructor,
            MemberKind::StaticBlock => {
                return MemberIdentity::new(
                    true,
                    IdentityKind::StaticBlock,
                    Visibility::Public,
                    format!("{owner}#{index}"),
                );
            }
        };
        MemberIdentity::new(member.is_static(), kind, visibility, member.key())
    }

    /// The identity that shares this one's prototype slot: a method and an
    /// accessor with the same name cannot both live on one prototype.
    pub fn prototype_rival(&self) -> Option<MemberIdentity> {
        let kind = match self.kind {
            IdentityKind::Method => IdentityKind::Accessor,
            IdentityKind::Accessor => IdentityKind::Method,
            _ => return None,
        };
        Some(MemberIdentity {
            kind,
            ..self.clone()
        })
    }

    pub fn bucket(&self) -> MemberBucket {
        let private = self.visibility == Visibility::Private;
        match (self.kind, self.is_static, private) {
            (IdentityKind::Accessor, _, _) => MemberBucket::Accessors,
            (IdentityKind::StaticBlock, _, _) => MemberBucket::StaticPublicFields,
            (IdentityKind::Field, true, true) => MemberBucket::StaticPrivateFields,
            (IdentityKind::Field, true, false) => MemberBucket::StaticPublicFields,
            (IdentityKind::Field, false, true) => MemberBucket::InstancePrivateFields,
            (IdentityKind::Field, false, false) => MemberBucket::InstancePublicFields,
            (_, true, true) => MemberBucket::StaticPrivateMethods,
            (_, true, false) => MemberBucket::StaticPublicMethods,
            (_, false, true) => MemberBucket::InstancePrivateMethods,
            (_, false, false) => MemberBucket::InstancePublicMethods,
        }
    }
}

impl fmt::Display for MemberIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            f.write_str("static ")?;
        }
        let kind = match self.kind {
            IdentityKind::Field => "field",
            IdentityKind::Method => "method",
            IdentityKind::Accessor => "accessor",
            IdentityKind::Constructor => "constructor",
            IdentityKind::StaticBlock => "static block",
        };
        write!(f, "{kind} {}", self.name)
    }
}

/// Output buckets, in emission order. The constructor is emitted between
/// `InstancePublicFields` and `Accessors`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberBucket {
    StaticPrivateFields,
    StaticPublicFields,
    StaticPrivateMethods,
    StaticPublicMethods,
    InstancePrivateFields,
    InstancePublicFields,
    Accessors,
    InstancePrivateMethods,
    InstancePublicMethods,
}

impl MemberBucket {
    pub const ALL: [MemberBucket; 9] = [
        MemberBucket::StaticPrivateFields,
        MemberBucket::StaticPublicFields,
        MemberBucket::StaticPrivateMethods,
        MemberBucket::StaticPublicMethods,
        MemberBucket::InstancePrivateFields,
        MemberBucket::InstancePublicFields,
        MemberBucket::Accessors,
        MemberBucket::InstancePrivateMethods,
        MemberBucket::InstancePublicMethods,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Where a member's declaration lives: an index into the owning class's
/// member list, or a getter/setter pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberSlot {
    Member(usize),
    Accessor {
        getter: Option<usize>,
        setter: Option<usize>,
    },
}

impl MemberSlot {
    /// Member indices in emission order (getter before setter).
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let (a, b) = match *self {
            MemberSlot::Member(idx) => (Some(idx), None),
            MemberSlot::Accessor { getter, setter } => (getter, setter),
        };
        a.into_iter().chain(b)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
    /// Name of the class that declares the member.
    pub owner: String,
    pub slot: MemberSlot,
}

impl MemberEntry {
    pub fn new(owner: impl Into<String>, slot: MemberSlot) -> Self {
        MemberEntry {
            owner: owner.into(),
            slot,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemberSet {
    pub constructor: Option<MemberEntry>,
    buckets: [IndexMap<MemberIdentity, MemberEntry>; 9],
}

impl MemberSet {
    pub fn new() -> Self {
        MemberSet::default()
    }

    pub fn bucket(&self, bucket: MemberBucket) -> &IndexMap<MemberIdentity, MemberEntry> {
        &self.buckets[bucket.index()]
    }

    pub fn get(&self, identity: &MemberIdentity) -> Option<&MemberEntry> {
        self.buckets[identity.bucket().index()].get(identity)
    }

    pub fn contains(&self, identity: &MemberIdentity) -> bool {
        self.get(identity).is_some()
    }

    /// Insert with override semantics.
    ///
    /// An entry with the same identity, or one competing for the same
    /// prototype slot, is removed first. Returns the entries that were
    /// displaced.
    pub fn insert(&mut self, identity: MemberIdentity, entry: MemberEntry) -> Vec<MemberEntry> {
        let mut displaced = Vec::new();
        if let Some(rival) = identity.prototype_rival() {
            if let Some(old) = self.buckets[rival.bucket().index()].shift_remove(&rival) {
                displaced.push(old);
            }
        }
        let bucket = &mut self.buckets[identity.bucket().index()];
        if let Some(old) = bucket.shift_remove(&identity) {
            displaced.push(old);
        }
        bucket.insert(identity, entry);
        displaced
    }

    /// Record a getter or setter of one class, pairing it with an accessor
    /// of the same identity already recorded for the same owner.
    pub fn insert_accessor_half(
        &mut self,
        identity: MemberIdentity,
        owner: &str,
        index: usize,
        is_getter: bool,
    ) {
        let bucket = &mut self.buckets[MemberBucket::Accessors.index()];
        if let Some(existing) = bucket.get_mut(&identity) {
            if existing.owner == owner {
                if let MemberSlot::Accessor { getter, setter } = &mut existing.slot {
                    if is_getter {
                        *getter = Some(index);
                    } else {
                        *setter = Some(index);
                    }
                    return;
                }
            }
        }
        let slot = if is_getter {
            MemberSlot::Accessor {
                getter: Some(index),
                setter: None,
            }
        } else {
            MemberSlot::Accessor {
                getter: None,
                setter: Some(index),
            }
        };
        self.insert(identity, MemberEntry::new(owner, slot));
    }

    /// All entries in emission order, excluding the constructor.
    pub fn iter(&self) -> impl Iterator<Item = (&MemberIdentity, &MemberEntry)> {
        self.buckets.iter().flat_map(|bucket| bucket.iter())
    }

    /// Entries of the buckets emitted before the constructor.
    pub fn iter_before_constructor(&self) -> impl Iterator<Item = (&MemberIdentity, &MemberEntry)> {
        self.buckets[..MemberBucket::Accessors.index()]
            .iter()
            .flat_map(|bucket| bucket.iter())
    }

    /// Entries of the buckets emitted after the constructor.
    pub fn iter_after_constructor(&self) -> impl Iterator<Item = (&MemberIdentity, &MemberEntry)> {
        self.buckets[MemberBucket::Accessors.index()..]
            .iter()
            .flat_map(|bucket| bucket.iter())
    }

    /// Number of member entries, not counting the constructor.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.constructor.is_none()
    }

    /// Whether any member is named `name`.
    pub fn has_member_named(&self, name: &str) -> bool {
        self.iter().any(|(identity, _)| identity.name == name)
    }
}

/// Every definition of an identity along a chain, base first.
pub type MethodHistory = IndexMap<MemberIdentity, Vec<MemberEntry>>;

/// Explicit constructors along a chain, base first.
pub type ConstructorChain = Vec<MemberEntry>;
