//! Local temporary spooling of ingested LOB content.

use crate::handle::{Authenticator, LobId};
use crate::handler::{unbounded_if_negative, CharRead, RemoteChannel, ResourceHandler};
use crate::{Error, Result};
use log::debug;
use once_cell::sync::Lazy;
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Copy block for byte sources.
const SPOOL_BLOCK: usize = 4096;
/// Copy block for character sources.
const CHAR_BLOCK: usize = 1024;

const SPOOL_PREFIX: &str = "lobby-spool-";

/// Read once per process; later changes to the variable have no effect.
static DEFAULT_MEMORY_LIMIT: Lazy<usize> = Lazy::new(|| {
    std::env::var("LOBBY_SPOOL_MEMORY_LIMIT")
        .ok()
        .and_then(|limit| limit.parse().ok())
        .unwrap_or(1024 * 1024)
});

#[derive(Clone)]
enum SpoolData {
    Memory(Arc<[u8]>),
    File(Arc<NamedTempFile>),
}

/**
    A cheaply cloneable reference to LOB content spooled on this client,
    either held in a memory buffer or backed by a temp file.

    The content is fully independent of the source it was copied from and can
    be re-read any number of times via [`open`](SpooledLob::open). When the
    last clone is dropped the backing resource is reclaimed; temp files
    delete themselves.
*/
#[derive(Clone)]
pub struct SpooledLob {
    data: SpoolData,
    length: u64,
}

impl SpooledLob {
    /// Wraps bytes already in memory; the recorded length is the byte count.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let length = bytes.len() as u64;
        Self { data: SpoolData::Memory(bytes.into()), length }
    }

    /// Wraps text already in memory; the recorded length is the character count.
    pub fn from_text(text: &str) -> Self {
        let length = text.chars().count() as u64;
        Self { data: SpoolData::Memory(text.as_bytes().into()), length }
    }

    /**
        Wraps content already written to a temp file. `length` is the content
        length in value units - for text spooled as UTF-8 it is the character
        count, not the file size. The file is deleted when the last clone of
        the returned reference is dropped.
    */
    pub fn from_temp_file(file: NamedTempFile, length: u64) -> Self {
        Self { data: SpoolData::File(Arc::new(file)), length }
    }

    /**
        Opens an independent reader over the spooled content, starting at
        offset 0. Every call yields a fresh reader; the content stays
        readable for as long as any clone of this reference is alive.
    */
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        match &self.data {
            SpoolData::Memory(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            SpoolData::File(file) => {
                let file = file.reopen()?;
                Ok(Box::new(file))
            }
        }
    }

    /// Content length in value units: bytes for byte content, characters for text.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Returns `true` while the content is held in a memory buffer rather than a temp file.
    pub fn in_memory(&self) -> bool {
        matches!(self.data, SpoolData::Memory(_))
    }
}

impl fmt::Debug for SpooledLob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.data {
            SpoolData::Memory(bytes) => {
                write!(f, "SpooledLob({} units, {} bytes in memory)", self.length, bytes.len())
            }
            SpoolData::File(file) => {
                write!(f, "SpooledLob({} units, spooled to {})", self.length, file.path().display())
            }
        }
    }
}

/**
    The bundled [`ResourceHandler`]: copies ingested content into a memory
    buffer, spilling to a temp file once the content outgrows the in-memory
    limit.

    The limit defaults to 1 MiB, can be overridden process-wide through the
    `LOBBY_SPOOL_MEMORY_LIMIT` environment variable (read once, at first
    use), and per handler with [`with_in_memory_limit`](SpoolHandler::with_in_memory_limit).
    For character content the limit counts characters, matching how CLOB
    lengths are accounted everywhere else.

    ```
    use lobby::{ResourceHandler, SpoolHandler};

    let handler = SpoolHandler::new().with_in_memory_limit(64);

    let spool = handler.create_temp_blob(&mut &b"hello"[..], -1)?;
    assert_eq!(spool.length(), 5);
    assert!(spool.in_memory());

    let spool = handler.create_temp_blob(&mut &[0u8; 1000][..], -1)?;
    assert!(!spool.in_memory());
    # Ok::<(),lobby::Error>(())
    ```
*/
#[derive(Debug, Clone)]
pub struct SpoolHandler {
    spool_dir: Option<PathBuf>,
    in_memory_limit: usize,
}

impl SpoolHandler {
    pub fn new() -> Self {
        Self { spool_dir: None, in_memory_limit: *DEFAULT_MEMORY_LIMIT }
    }

    /// Directory for spool files; the OS temp dir when not set.
    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = Some(dir.into());
        self
    }

    /// Content at most this many value units stays in memory.
    pub fn with_in_memory_limit(mut self, limit: usize) -> Self {
        self.in_memory_limit = limit;
        self
    }

    fn temp_file(&self) -> Result<NamedTempFile> {
        let file = match &self.spool_dir {
            Some(dir) => tempfile::Builder::new().prefix(SPOOL_PREFIX).tempfile_in(dir)?,
            None => tempfile::Builder::new().prefix(SPOOL_PREFIX).tempfile()?,
        };
        Ok(file)
    }
}

impl Default for SpoolHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandler for SpoolHandler {
    fn create_temp_blob(&self, source: &mut dyn Read, max_length: i64) -> Result<SpooledLob> {
        let bound = unbounded_if_negative(max_length);
        // One unit past the limit is enough to settle memory vs file.
        let probe = bound.min((self.in_memory_limit as u64).saturating_add(1));
        let mut buf = Vec::new();
        (&mut *source).take(probe).read_to_end(&mut buf)?;
        if buf.len() <= self.in_memory_limit {
            debug!("spooled {} byte BLOB in memory", buf.len());
            let length = buf.len() as u64;
            return Ok(SpooledLob { data: SpoolData::Memory(buf.into()), length });
        }

        let mut file = self.temp_file()?;
        file.write_all(&buf)?;
        let mut length = buf.len() as u64;
        let mut remaining = bound - length;
        let mut chunk = [0u8; SPOOL_BLOCK];
        while remaining > 0 {
            let want = remaining.min(chunk.len() as u64) as usize;
            let n = source.read(&mut chunk[..want])?;
            if n == 0 {
                break;
            }
            file.write_all(&chunk[..n])?;
            length += n as u64;
            remaining -= n as u64;
        }
        file.flush()?;
        debug!("spooled {} byte BLOB to {}", length, file.path().display());
        Ok(SpooledLob { data: SpoolData::File(Arc::new(file)), length })
    }

    fn create_temp_clob(&self, source: &mut dyn CharRead, max_length: i64) -> Result<SpooledLob> {
        let bound = unbounded_if_negative(max_length);
        let probe = bound.min((self.in_memory_limit as u64).saturating_add(1));
        let mut text = String::new();
        let mut count: u64 = 0;
        let mut chunk = ['\0'; CHAR_BLOCK];
        while count < probe {
            let want = (probe - count).min(chunk.len() as u64) as usize;
            let n = source.read_chars(&mut chunk[..want])?;
            if n == 0 {
                break;
            }
            text.extend(&chunk[..n]);
            count += n as u64;
        }
        if count <= self.in_memory_limit as u64 {
            debug!("spooled {} char CLOB in memory", count);
            return Ok(SpooledLob { data: SpoolData::Memory(text.into_bytes().into()), length: count });
        }

        let mut file = self.temp_file()?;
        file.write_all(text.as_bytes())?;
        let mut length = count;
        let mut remaining = bound - count;
        let mut encoded = String::new();
        while remaining > 0 {
            let want = remaining.min(chunk.len() as u64) as usize;
            let n = source.read_chars(&mut chunk[..want])?;
            if n == 0 {
                break;
            }
            encoded.clear();
            encoded.extend(&chunk[..n]);
            file.write_all(encoded.as_bytes())?;
            length += n as u64;
            remaining -= n as u64;
        }
        file.flush()?;
        debug!("spooled {} char CLOB to {}", length, file.path().display());
        Ok(SpooledLob { data: SpoolData::File(Arc::new(file)), length })
    }
}

/// A spool handler is local-only; it cannot reach any remote store.
impl RemoteChannel for SpoolHandler {
    fn open_lob(&self, _lob: LobId, _authenticator: &Authenticator) -> Result<Box<dyn Read + Send>> {
        Err(Error::Unsupported("remote LOB streaming (local-only spool handler)"))
    }
}
