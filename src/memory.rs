//! An in-memory remote store, standing in for the server side of a split deployment.

use crate::handle::{Authenticator, LobHandle, LobId, LobKind, LobOwner};
use crate::handler::{CharRead, RemoteChannel, ResourceHandler};
use crate::spool::{SpoolHandler, SpooledLob};
use crate::{Error, Result};
use log::trace;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque per-LOB token. A stand-in, not a real MAC.
fn mint_token(id: u64) -> [u8; 8] {
    (id ^ 0x9e37_79b9_7f4a_7c15).to_be_bytes()
}

struct StoredLob {
    data: Arc<[u8]>,
    authenticator: Authenticator,
}

/**
    A thread-safe, map-backed remote LOB store.

    Content put into it comes back as a fully formed remote handle whose
    authenticator gates streaming access: an unknown id fails with
    [`LobNotFound`](crate::Error::LobNotFound), a wrong token with
    [`AuthenticationFailed`](crate::Error::AuthenticationFailed), before any
    content byte is produced. The store also forwards the resource-handler
    contract to an inner [`SpoolHandler`], so a single
    `Arc<MemoryRemoteStore>` satisfies everything a
    [`LobFrontend`](crate::LobFrontend) needs.

    ```
    use lobby::{LobFrontend, LobStore, MemoryRemoteStore};
    use std::io::Read;
    use std::sync::Arc;

    let store = Arc::new(MemoryRemoteStore::new());
    let lob = store.put_clob("tête-à-tête");
    assert_eq!(lob.length(), Some(11));

    let auth = lob.authenticator().expect("remote handle").clone();
    let frontend = LobFrontend::new(store);
    let mut text = String::new();
    frontend.input_stream(&lob, &auth, -1)?.read_to_string(&mut text)?;
    assert_eq!(text, "tête-à-tête");
    # Ok::<(),Box<dyn std::error::Error>>(())
    ```
*/
pub struct MemoryRemoteStore {
    lobs: RwLock<HashMap<u64, StoredLob>>,
    next_id: AtomicU64,
    spool: SpoolHandler,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            lobs: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            spool: SpoolHandler::new(),
        }
    }

    /// Replaces the spool handler backing the resource-handler side.
    pub fn with_spool_handler(mut self, spool: SpoolHandler) -> Self {
        self.spool = spool;
        self
    }

    /// Stores byte content; the returned remote handle reads it back.
    pub fn put_blob(&self, bytes: impl Into<Vec<u8>>) -> LobHandle {
        let data: Arc<[u8]> = bytes.into().into();
        let length = data.len() as u64;
        self.put(LobKind::Blob, data, length)
    }

    /// Stores text content; the returned remote handle's length counts characters.
    pub fn put_clob(&self, text: &str) -> LobHandle {
        let length = text.chars().count() as u64;
        self.put(LobKind::Clob, text.as_bytes().into(), length)
    }

    fn put(&self, kind: LobKind, data: Arc<[u8]>, length: u64) -> LobHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let authenticator = Authenticator::new(mint_token(id));
        self.lobs.write().insert(id, StoredLob { data, authenticator: authenticator.clone() });
        trace!("stored {} unit LOB {}", length, id);
        LobHandle::remote(kind, LobOwner::Temporary, Some(length), LobId::new(id), authenticator)
    }

    /// Number of LOBs currently stored.
    pub fn len(&self) -> usize {
        self.lobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lobs.read().is_empty()
    }
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteChannel for MemoryRemoteStore {
    fn open_lob(&self, lob: LobId, authenticator: &Authenticator) -> Result<Box<dyn Read + Send>> {
        let lobs = self.lobs.read();
        let stored = lobs.get(&lob.value()).ok_or(Error::LobNotFound(lob))?;
        if stored.authenticator != *authenticator {
            return Err(Error::AuthenticationFailed { lob });
        }
        trace!("opened channel over LOB {}", lob);
        Ok(Box::new(Cursor::new(stored.data.clone())))
    }
}

impl ResourceHandler for MemoryRemoteStore {
    fn create_temp_blob(&self, source: &mut dyn Read, max_length: i64) -> Result<SpooledLob> {
        self.spool.create_temp_blob(source, max_length)
    }

    fn create_temp_clob(&self, source: &mut dyn CharRead, max_length: i64) -> Result<SpooledLob> {
        self.spool.create_temp_clob(source, max_length)
    }
}
