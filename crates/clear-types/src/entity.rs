//! Legal entities: the organisations owning accounts and users

use crate::permissions::{Perm, Permissioned};
use clear_primitives::Address;
use serde::Serialize;
use std::fmt;

/// Kind of a legal entity
///
/// The kind selects the entity's permission mask; the byte tags are part of
/// the wire format of `CreateLegalEntity` transactions and must stay stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    /// Clearing house: full permission set
    ClearingHouse,
    /// General clearing member: everything except creating legal entities
    GeneralClearingMember,
    /// Custodian: transfers and user management only
    Custodian,
}

impl EntityKind {
    /// Stable byte tag of the kind
    pub const fn as_byte(self) -> u8 {
        match self {
            EntityKind::ClearingHouse => 0x01,
            EntityKind::GeneralClearingMember => 0x02,
            EntityKind::Custodian => 0x03,
        }
    }

    /// Decode a kind from its byte tag
    pub fn from_byte(byte: u8) -> Option<EntityKind> {
        match byte {
            0x01 => Some(EntityKind::ClearingHouse),
            0x02 => Some(EntityKind::GeneralClearingMember),
            0x03 => Some(EntityKind::Custodian),
            _ => None,
        }
    }

    /// Permission mask granted to entities of this kind
    pub fn base_permissions(self) -> Perm {
        match self {
            EntityKind::ClearingHouse => Perm::TRANSFER
                .add(Perm::CREATE_ACCOUNT)
                .add(Perm::CREATE_LEGAL_ENTITY)
                .add(Perm::CREATE_USER),
            EntityKind::GeneralClearingMember => Perm::TRANSFER
                .add(Perm::CREATE_ACCOUNT)
                .add(Perm::CREATE_USER),
            EntityKind::Custodian => Perm::TRANSFER.add(Perm::CREATE_USER),
        }
    }
}

/// A legal entity
///
/// Created by a `CreateLegalEntity` transaction, immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LegalEntity {
    /// Identifier (UUID string)
    pub id: String,
    /// Kind, fixing the permission mask
    pub kind: EntityKind,
    /// Display name
    pub name: String,
    /// Address of the creating user
    pub creator: Address,
    /// Identifier of the parent entity (empty for top-level entities)
    pub parent_id: String,
    /// Permission mask derived from the kind
    pub permissions: Perm,
}

impl LegalEntity {
    /// Create a new legal entity with the mask of its kind
    pub fn new(
        id: String,
        kind: EntityKind,
        name: String,
        creator: Address,
        parent_id: String,
    ) -> Self {
        LegalEntity {
            id,
            kind,
            name,
            creator,
            parent_id,
            permissions: kind.base_permissions(),
        }
    }
}

impl Permissioned for LegalEntity {
    fn permissions(&self) -> Perm {
        self.permissions
    }
}

impl fmt::Display for LegalEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LegalEntity{{{} {:?} {}}}", self.id, self.kind, self.name)
    }
}

/// Query payload wrapper for legal entity lookups
#[derive(Debug, Serialize)]
pub struct LegalEntitiesReturned {
    /// Entities in request order
    pub legal_entities: Vec<LegalEntity>,
}
