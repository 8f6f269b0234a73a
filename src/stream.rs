//! Bounded, authenticated streaming of remote LOB content.

use crate::handle::{Authenticator, LobHandle};
use crate::handler::RemoteChannel;
use crate::{Error, Result};
use log::trace;
use std::io::{self, Read};

/// Default capacity of the buffering layer in front of a remote stream.
pub(crate) const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/**
    Sequential reader over remote LOB content with a hard upper bound on the
    bytes it will deliver.

    The authenticator is presented to the remote channel once, at open time;
    a rejected token fails the open with
    [`AuthenticationFailed`](crate::Error::AuthenticationFailed) before any
    content byte is produced. Each successful read advances a consumed-byte
    counter, and once the counter reaches the bound the stream reports
    end-of-content regardless of whether more remote bytes exist. The stream
    is forward-only and single-pass; dropping it releases the channel.
*/
pub struct RemoteLobStream {
    source: Box<dyn Read + Send>,
    remaining: u64,
}

impl RemoteLobStream {
    /**
        Opens the remote channel for `lob` and wraps it with the byte bound.
        `bound` is the maximum number of bytes the stream will deliver, with
        `u64::MAX` meaning "until remote end of content". Fails with an
        invalid-argument error when `lob` is local-temporary.
    */
    pub fn open<C>(channel: &C, lob: &LobHandle, authenticator: &Authenticator, bound: u64) -> Result<Self>
    where
        C: RemoteChannel + ?Sized,
    {
        let id = lob
            .id()
            .ok_or_else(|| Error::arg("local-temporary LOB content cannot be streamed from the remote store"))?;
        let source = channel.open_lob(id, authenticator)?;
        trace!("opened remote stream over LOB {}, bound {}", id, bound);
        Ok(Self { source, remaining: bound })
    }

    /// Bytes this stream may still deliver before it reports end-of-content.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Read for RemoteLobStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = self.remaining.min(buf.len() as u64) as usize;
        let n = self.source.read(&mut buf[..want])?;
        self.remaining -= n as u64;
        if self.remaining == 0 {
            trace!("read bound reached");
        }
        Ok(n)
    }
}
