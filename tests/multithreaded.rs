use lobby::*;
use std::io::Read;
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_ingestion_and_streaming_over_one_frontend() -> Result<()> {
    let store = Arc::new(MemoryRemoteStore::new());
    let lobs = LobFrontend::new(store.clone());

    let mut workers = Vec::new();
    for worker in 0..8u8 {
        let lobs = lobs.clone();
        let store = store.clone();
        workers.push(thread::spawn(move || -> Result<()> {
            let content = vec![worker; 4000];

            let local = lobs.create_blob(&mut content.as_slice(), -1)?;
            assert_eq!(local.length(), Some(4000));

            let remote = store.put_blob(content.clone());
            let auth = remote.authenticator().expect("remote handle").clone();
            let mut streamed = Vec::new();
            lobs.input_stream(&remote, &auth, -1)?.read_to_end(&mut streamed)?;
            assert_eq!(streamed, content);
            Ok(())
        }));
    }
    for worker in workers {
        worker.join().expect("worker thread")?;
    }
    assert_eq!(store.len(), 8);
    Ok(())
}

#[test]
fn concurrent_puts_mint_distinct_ids() {
    let store = Arc::new(MemoryRemoteStore::new());

    let mut workers = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        workers.push(thread::spawn(move || -> Vec<LobId> {
            (0..100).map(|_| store.put_blob(b"x".to_vec()).id().expect("remote handle")).collect()
        }));
    }
    let mut ids: Vec<LobId> = workers
        .into_iter()
        .flat_map(|worker| worker.join().expect("worker thread"))
        .collect();

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 400, "every put minted a fresh id");
    assert_eq!(store.len(), 400);
}
