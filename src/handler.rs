//! Contracts of the collaborators the frontend delegates to.

use crate::handle::{Authenticator, LobId};
use crate::spool::SpooledLob;
use crate::Result;
use std::io::{self, Read};

/// Bounds travel as signed values where any negative stands for "unknown".
pub(crate) fn unbounded_if_negative(bound: i64) -> u64 {
    if bound < 0 {
        u64::MAX
    } else {
        bound as u64
    }
}

/**
    A source of characters for CLOB ingestion, the character analog of
    [`std::io::Read`]. Decoding wire bytes into characters belongs to the
    transport, not to this crate, so CLOB sources arrive already decoded.
*/
pub trait CharRead {
    /// Reads up to `buf.len()` characters, returning how many were read. Zero means end of content.
    fn read_chars(&mut self, buf: &mut [char]) -> io::Result<usize>;
}

impl CharRead for std::str::Chars<'_> {
    fn read_chars(&mut self, buf: &mut [char]) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            match self.next() {
                Some(ch) => {
                    buf[n] = ch;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

/**
    Local resource handler: allocates client-local temporary storage for
    LOB content ingested by this client.

    Implementations must be safe to call from multiple threads for
    independent ingestions; the frontend adds no locking of its own.
*/
pub trait ResourceHandler: Send + Sync {
    /**
        Copies up to `max_length` bytes from `source` into temporary local
        storage and returns a reference to the stored content. A negative
        `max_length` means "copy until the source is exhausted"; the source is
        never consumed past the bound. The returned content is immediately and
        independently readable and keeps no tie to `source`.
    */
    fn create_temp_blob(&self, source: &mut dyn Read, max_length: i64) -> Result<SpooledLob>;

    /**
        Character analog of `create_temp_blob`: copies up to `max_length`
        characters. The handler owns the character-to-storage encoding; the
        returned spool reports its length in characters.
    */
    fn create_temp_clob(&self, source: &mut dyn CharRead, max_length: i64) -> Result<SpooledLob>;
}

/**
    Remote LOB channel: opens an authenticated byte stream over content held
    by a server-side store.
*/
pub trait RemoteChannel: Send + Sync {
    /**
        Opens a raw byte source over the content stored under `lob`.

        The presented `authenticator` is validated before any content byte is
        produced: a mismatch fails with
        [`AuthenticationFailed`](crate::Error::AuthenticationFailed) and an
        unknown id with [`LobNotFound`](crate::Error::LobNotFound),
        distinguishably from transient I/O failures. The returned source is
        forward-only; dropping it releases the channel.
    */
    fn open_lob(&self, lob: LobId, authenticator: &Authenticator) -> Result<Box<dyn Read + Send>>;
}

/// Everything the frontend needs from its collaborators, behind one object.
pub trait DataHandler: ResourceHandler + RemoteChannel {}

impl<T: ResourceHandler + RemoteChannel + ?Sized> DataHandler for T {}
