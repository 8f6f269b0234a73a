//! LOB handles and the table-scoped identity namespace.

use crate::spool::SpooledLob;
use crate::{Error, Result};
use std::fmt;

/// Flat owner id of a LOB held only as a session-scoped variable.
pub const SESSION_VARIABLE_ID: i32 = -1;
/// Flat owner id of an ephemeral LOB not attached to any object.
pub const TEMPORARY_ID: i32 = -2;
/// Flat owner id of a LOB produced by a query and alive while its result set is open.
pub const RESULT_SET_ID: i32 = -3;

/// Distinguishes binary from character LOB content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobKind {
    /// Byte content; lengths and bounds count bytes.
    Blob,
    /// Text content; lengths and bounds count characters.
    Clob,
}

/**
    The owner a LOB is associated with: one table's row, or one of three
    reserved pseudo-owners.

    External stores encode the owner as a flat signed integer where the
    reserved owners occupy -1, -2 and -3. `table_id` produces that form and
    `try_from` decodes it, so the magic numbers never travel beyond the edges
    of the crate.

    ```
    use lobby::LobOwner;

    assert_eq!(LobOwner::Table(7).table_id()?, 7);
    assert_eq!(LobOwner::ResultSet.table_id()?, -3);
    assert_eq!(LobOwner::try_from(-2)?, LobOwner::Temporary);
    assert!(LobOwner::try_from(-9).is_err());
    # Ok::<(),lobby::Error>(())
    ```
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobOwner {
    /// Referenced by a row of the table with this id.
    Table(u32),
    /// Held only as a session-scoped variable, not attached to table storage.
    SessionVariable,
    /// Ephemeral, not attached to any object.
    Temporary,
    /// Produced by a query result; outlives the statement only as long as the result set is open.
    ResultSet,
}

impl LobOwner {
    /**
        Returns the flat integer form external stores use for this owner.

        Table ids above `i32::MAX` have no flat form - encoding them would
        wrap into the reserved negative range - so they are rejected here
        rather than silently aliased to a pseudo-owner.
    */
    pub fn table_id(self) -> Result<i32> {
        match self {
            LobOwner::Table(id) => i32::try_from(id)
                .map_err(|_| Error::arg(format!("table id {} exceeds the encodable range", id))),
            LobOwner::SessionVariable => Ok(SESSION_VARIABLE_ID),
            LobOwner::Temporary       => Ok(TEMPORARY_ID),
            LobOwner::ResultSet       => Ok(RESULT_SET_ID),
        }
    }
}

impl TryFrom<i32> for LobOwner {
    type Error = Error;

    /// Decodes the flat integer form. Negative ids outside the reserved range are invalid.
    fn try_from(id: i32) -> Result<Self> {
        match id {
            SESSION_VARIABLE_ID => Ok(LobOwner::SessionVariable),
            TEMPORARY_ID        => Ok(LobOwner::Temporary),
            RESULT_SET_ID       => Ok(LobOwner::ResultSet),
            id if id >= 0       => Ok(LobOwner::Table(id as u32)),
            other => Err(Error::arg(format!("{} is not a table id or a reserved owner id", other))),
        }
    }
}

/// Store-assigned identity of a remote LOB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LobId(u64);

impl LobId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/**
    Opaque token proving the caller is entitled to read a specific remote
    LOB's content. It is produced by the remote store and presented back,
    unmodified, when a stream over that LOB is opened. No particular MAC
    algorithm is assumed.

    The `Debug` form reports only the token length, so handles can be logged
    without leaking the token itself.
*/
#[derive(Clone, PartialEq, Eq)]
pub struct Authenticator(Vec<u8>);

impl Authenticator {
    pub fn new(token: impl Into<Vec<u8>>) -> Self {
        Self(token.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Authenticator({} bytes)", self.0.len())
    }
}

/// Where a handle's content lives. Immutable after creation.
#[derive(Debug, Clone)]
pub enum LobOrigin {
    /// Content lives in a server-side store and is fetched by authenticated streaming.
    Remote {
        id: LobId,
        authenticator: Authenticator,
    },
    /// Content was ingested by this client and spooled to local temporary storage.
    LocalTemporary(SpooledLob),
}

/**
    A lightweight reference to LOB content, not the content itself.

    Remote handles are minted by the server-side store and carry the LOB id
    and authenticator needed to stream their content back. Local-temporary
    handles come out of [`LobStore::create_blob`](crate::LobStore::create_blob)
    and [`create_clob`](crate::LobStore::create_clob); they reference content
    spooled on this client, always report owner [`LobOwner::Temporary`] and a
    known length, and carry no authenticator.
*/
#[derive(Debug, Clone)]
pub struct LobHandle {
    kind: LobKind,
    owner: LobOwner,
    length: Option<u64>,
    origin: LobOrigin,
}

impl LobHandle {
    /**
        Builds a handle for content held by a remote store.

        `length` is the known content length in value units - bytes for a
        BLOB, characters for a CLOB - or `None` when the store did not report
        one; an unknown length is resolved lazily while streaming.
    */
    pub fn remote(kind: LobKind, owner: LobOwner, length: Option<u64>, id: LobId, authenticator: Authenticator) -> Self {
        Self { kind, owner, length, origin: LobOrigin::Remote { id, authenticator } }
    }

    pub(crate) fn local_temporary(kind: LobKind, spool: SpooledLob) -> Self {
        let length = spool.length();
        Self { kind, owner: LobOwner::Temporary, length: Some(length), origin: LobOrigin::LocalTemporary(spool) }
    }

    pub fn kind(&self) -> LobKind {
        self.kind
    }

    pub fn owner(&self) -> LobOwner {
        self.owner
    }

    /// Content length in value units (bytes for BLOB, characters for CLOB), if known.
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn origin(&self) -> &LobOrigin {
        &self.origin
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.origin, LobOrigin::Remote { .. })
    }

    pub fn is_local_temporary(&self) -> bool {
        matches!(self.origin, LobOrigin::LocalTemporary(_))
    }

    /// Store-assigned id, for remote handles.
    pub fn id(&self) -> Option<LobId> {
        match &self.origin {
            LobOrigin::Remote { id, .. } => Some(*id),
            LobOrigin::LocalTemporary(_) => None,
        }
    }

    /// The token the remote store issued for this handle, for remote handles.
    pub fn authenticator(&self) -> Option<&Authenticator> {
        match &self.origin {
            LobOrigin::Remote { authenticator, .. } => Some(authenticator),
            LobOrigin::LocalTemporary(_) => None,
        }
    }

    /// The spooled content this handle references, for local-temporary handles.
    pub fn spool(&self) -> Option<&SpooledLob> {
        match &self.origin {
            LobOrigin::LocalTemporary(spool) => Some(spool),
            LobOrigin::Remote { .. } => None,
        }
    }
}
