//! The LOB store interface and its client-side frontend.

use crate::handle::{Authenticator, LobHandle, LobKind, LobOwner};
use crate::handler::{unbounded_if_negative, CharRead, DataHandler};
use crate::stream::{RemoteLobStream, DEFAULT_READ_BUFFER_SIZE};
use crate::{Error, LobInputStream, Result};
use log::trace;
use std::io::{BufReader, Read};
use std::sync::Arc;

/// What a store implementation can structurally do in its deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Can ingest new content into local-temporary handles.
    pub ingest: bool,
    /// Can stream existing remote content.
    pub remote_read: bool,
    /// Can mutate server-side LOB state (copy, bulk removal).
    pub server_maintenance: bool,
}

/**
    Uniform entry point for LOB lifecycle operations.

    Implementations differ by deployment mode. [`capabilities`](LobStore::capabilities)
    reports what a mode can structurally do; operations outside of that fail
    with [`Unsupported`](crate::Error::Unsupported) no matter the arguments,
    and callers must route them to a component with the missing authority
    rather than retry.
*/
pub trait LobStore {
    /**
        Ingests byte content as a new LOB.

        The source is copied to local temporary storage, never directly into
        remote storage: it may itself be backed by a query against the very
        store being written, and read-while-write over one connection is
        deadlock-prone. The returned handle is local-temporary and fully
        independent of `source`. Copying stops after `max_length` bytes; a
        negative `max_length` means "until the source is exhausted".

        Either a fully valid handle is returned or an error is raised and no
        handle exists; a failed ingestion leaves nothing behind.
    */
    fn create_blob(&self, source: &mut dyn Read, max_length: i64) -> Result<LobHandle>;

    /**
        Ingests character content as a new LOB. Same contract as
        [`create_blob`](LobStore::create_blob) with `max_length` and the
        handle length counted in characters.
    */
    fn create_clob(&self, source: &mut dyn CharRead, max_length: i64) -> Result<LobHandle>;

    /**
        Opens buffered sequential access to the content of a remote handle.

        The authenticator is validated at open time, before any content byte
        is delivered. The stream never delivers more than `byte_count` bytes;
        a negative `byte_count` stands for "until remote end of content" and
        is substituted with the maximum bound. A local-temporary handle is
        rejected with an invalid-argument error; its content is already on
        this client and is read via [`LobHandle::spool`].
    */
    fn input_stream(&self, lob: &LobHandle, authenticator: &Authenticator, byte_count: i64) -> Result<LobInputStream>;

    /**
        Releases a LOB. Client-side modes hold no LOB content, so this can be
        a no-op; it never fails for local-temporary handles.
    */
    fn remove_lob(&self, lob: &LobHandle) -> Result<()>;

    /// Removes every LOB owned by one table. Requires server-side authority.
    fn remove_all_for_table(&self, owner: LobOwner) -> Result<()>;

    /**
        Copies an existing LOB to a new owner, returning the copy's handle.
        Requires server-side authority. `length` bounds the copied content,
        negative meaning "all of it".
    */
    fn copy_lob(&self, lob: &LobHandle, new_owner: LobOwner, length: i64) -> Result<LobHandle>;

    /// `false` for stores that accept ingestion, even ones that cannot mutate existing content.
    fn is_read_only(&self) -> bool;

    /// Prepares process-wide state, where a mode has any.
    fn init(&self) -> Result<()>;

    fn capabilities(&self) -> Capabilities;
}

/**
    The client-side [`LobStore`] of a split deployment.

    Holds a reference to the data handler supplied at construction and no LOB
    content of its own. Ingestion lands in local temporary storage through
    the handler's [`ResourceHandler`](crate::ResourceHandler) half; remote
    content is streamed through its [`RemoteChannel`](crate::RemoteChannel)
    half, bounded and authenticated. Operations that would mutate
    server-side state are unsupported in this mode.

    # Example
    ```
    use lobby::{LobFrontend, LobStore, MemoryRemoteStore};
    use std::io::Read;
    use std::sync::Arc;

    let store = Arc::new(MemoryRemoteStore::new());
    let lob = store.put_blob((0..100u8).collect::<Vec<_>>());
    let auth = lob.authenticator().expect("remote handle").clone();

    let frontend = LobFrontend::new(store);
    let mut content = Vec::new();
    frontend.input_stream(&lob, &auth, -1)?.read_to_end(&mut content)?;
    assert_eq!(content.len(), 100);
    # Ok::<(),Box<dyn std::error::Error>>(())
    ```
*/
#[derive(Clone)]
pub struct LobFrontend {
    handler: Arc<dyn DataHandler>,
    read_buffer_size: usize,
}

impl LobFrontend {
    /// Creates a frontend over the given data handler.
    pub fn new(handler: Arc<dyn DataHandler>) -> Self {
        Self { handler, read_buffer_size: DEFAULT_READ_BUFFER_SIZE }
    }

    /// Capacity of the buffering layer around remote streams. 8 KiB when not set.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }
}

impl LobStore for LobFrontend {
    fn create_blob(&self, source: &mut dyn Read, max_length: i64) -> Result<LobHandle> {
        let spool = self.handler.create_temp_blob(source, max_length)?;
        Ok(LobHandle::local_temporary(LobKind::Blob, spool))
    }

    fn create_clob(&self, source: &mut dyn CharRead, max_length: i64) -> Result<LobHandle> {
        let spool = self.handler.create_temp_clob(source, max_length)?;
        Ok(LobHandle::local_temporary(LobKind::Clob, spool))
    }

    fn input_stream(&self, lob: &LobHandle, authenticator: &Authenticator, byte_count: i64) -> Result<LobInputStream> {
        if byte_count < 0 {
            trace!("byte count unknown, substituting the maximum bound");
        }
        let bound = unbounded_if_negative(byte_count);
        let stream = RemoteLobStream::open(&*self.handler, lob, authenticator, bound)?;
        Ok(BufReader::with_capacity(self.read_buffer_size, stream))
    }

    fn remove_lob(&self, lob: &LobHandle) -> Result<()> {
        // Local-temporary content is reclaimed by the resource handler when
        // the last handle clone drops; remote content belongs to the store.
        trace!("nothing to remove on the client side for {:?} LOB", lob.kind());
        Ok(())
    }

    fn remove_all_for_table(&self, _owner: LobOwner) -> Result<()> {
        Err(Error::Unsupported("bulk LOB removal for a table"))
    }

    fn copy_lob(&self, _lob: &LobHandle, _new_owner: LobOwner, _length: i64) -> Result<LobHandle> {
        Err(Error::Unsupported("server-side LOB copy"))
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { ingest: true, remote_read: true, server_maintenance: false }
    }
}
