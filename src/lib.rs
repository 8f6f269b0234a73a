#![cfg_attr(not(doctest), doc=include_str!("../README.md"))]

mod err;
mod handle;
mod handler;
mod spool;
mod stream;
mod store;
mod memory;

pub use err::Error;
pub use handle::{Authenticator, LobHandle, LobId, LobKind, LobOrigin, LobOwner};
pub use handle::{RESULT_SET_ID, SESSION_VARIABLE_ID, TEMPORARY_ID};
pub use handler::{CharRead, DataHandler, RemoteChannel, ResourceHandler};
pub use spool::{SpoolHandler, SpooledLob};
pub use stream::RemoteLobStream;
pub use store::{Capabilities, LobFrontend, LobStore};
pub use memory::MemoryRemoteStore;

pub type Result<T>     = std::result::Result<T, Error>;
/// Buffered stream over remote LOB content, as handed out by [`LobStore::input_stream`].
pub type LobInputStream = std::io::BufReader<RemoteLobStream>;

/**
    Creates the client-side LOB store over a data handler.

    Equivalent to [`LobFrontend::new`]; a connection usually builds one
    frontend and shares it:

    ```
    use lobby::{LobStore, MemoryRemoteStore};
    use std::sync::Arc;

    let handler = Arc::new(MemoryRemoteStore::new());
    let lobs = lobby::frontend(handler);

    let lob = lobs.create_blob(&mut &b"spooled locally"[..], -1)?;
    assert_eq!(lob.length(), Some(15));
    # Ok::<(),lobby::Error>(())
    ```
*/
pub fn frontend(handler: std::sync::Arc<dyn DataHandler>) -> LobFrontend {
    LobFrontend::new(handler)
}
