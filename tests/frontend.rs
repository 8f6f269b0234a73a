use lobby::*;
use std::io::Read;
use std::sync::Arc;

fn frontend() -> LobFrontend {
    LobFrontend::new(Arc::new(MemoryRemoteStore::new()))
}

fn spool_content(lob: &LobHandle) -> Vec<u8> {
    let spool = lob.spool().expect("local-temporary handle");
    let mut content = Vec::new();
    spool.open().expect("spool reader").read_to_end(&mut content).expect("spool content is read");
    content
}

struct FailingSource {
    yielded: bool,
}

impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if !self.yielded && !buf.is_empty() {
            self.yielded = true;
            buf[0] = b'x';
            Ok(1)
        } else {
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "source dropped"))
        }
    }
}

#[test]
fn blob_ingestion_copies_all_of_an_unbounded_source() -> Result<()> {
    let lobs = frontend();
    let source: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();

    let lob = lobs.create_blob(&mut source.as_slice(), -1)?;

    assert!(lob.is_local_temporary());
    assert_eq!(lob.kind(), LobKind::Blob);
    assert_eq!(lob.owner(), LobOwner::Temporary);
    assert_eq!(lob.length(), Some(10_000));
    assert_eq!(spool_content(&lob), source);
    Ok(())
}

#[test]
fn blob_ingestion_truncates_at_the_bound() -> Result<()> {
    let lobs = frontend();

    let lob = lobs.create_blob(&mut &b"0123456789"[..], 5)?;

    assert_eq!(lob.length(), Some(5), "ten byte source, bound five");
    assert_eq!(spool_content(&lob), &b"01234"[..]);
    Ok(())
}

#[test]
fn ingestion_never_consumes_the_source_past_the_bound() -> Result<()> {
    let lobs = frontend();
    let mut source = &b"0123456789"[..];

    let lob = lobs.create_blob(&mut source, 4)?;

    assert_eq!(lob.length(), Some(4));
    assert_eq!(source, &b"456789"[..], "unconsumed tail stays in the source");
    Ok(())
}

#[test]
fn zero_bound_produces_an_empty_lob_without_touching_the_source() -> Result<()> {
    let lobs = frontend();
    let mut source = &b"abc"[..];

    let lob = lobs.create_blob(&mut source, 0)?;

    assert_eq!(lob.length(), Some(0));
    assert!(spool_content(&lob).is_empty());
    assert_eq!(source, &b"abc"[..], "source is untouched");
    Ok(())
}

#[test]
fn clob_bounds_count_characters_not_bytes() -> Result<()> {
    let lobs = frontend();

    let lob = lobs.create_clob(&mut "tête-à-tête".chars(), 4)?;

    assert_eq!(lob.kind(), LobKind::Clob);
    assert_eq!(lob.length(), Some(4));
    assert_eq!(spool_content(&lob), "tête".as_bytes());
    Ok(())
}

#[test]
fn clob_ingestion_copies_all_of_an_unbounded_source() -> Result<()> {
    let lobs = frontend();
    let text = "Dès Noël où un zéphyr haï me vêt de glaçons würmiens, \
                je dîne d'exquis rôtis de bœuf au kir à l'aÿ d'âge mûr et cætera !";

    let lob = lobs.create_clob(&mut text.chars(), -1)?;

    assert_eq!(lob.length(), Some(text.chars().count() as u64));
    assert_eq!(String::from_utf8(spool_content(&lob)).expect("UTF-8 spool"), text);
    Ok(())
}

#[test]
fn content_over_the_memory_limit_spills_to_a_temp_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let spool = SpoolHandler::new().with_in_memory_limit(100).with_spool_dir(dir.path());
    let lobs = LobFrontend::new(Arc::new(MemoryRemoteStore::new().with_spool_handler(spool)));

    let small = lobs.create_blob(&mut &[1u8; 100][..], -1)?;
    assert!(small.spool().expect("local handle").in_memory(), "at the limit stays in memory");

    let large = lobs.create_blob(&mut &[2u8; 101][..], -1)?;
    let spool = large.spool().expect("local handle").clone();
    assert!(!spool.in_memory(), "one byte over the limit spills");
    assert_eq!(spool.length(), 101);
    assert_eq!(spool_content(&large), vec![2u8; 101]);
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 1, "one spool file in the spool dir");

    drop(large);
    drop(spool);
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0, "spool file is reclaimed with the last clone");
    Ok(())
}

#[test]
fn clob_spill_threshold_counts_characters() -> Result<()> {
    let spool = SpoolHandler::new().with_in_memory_limit(3);

    let spooled = spool.create_temp_clob(&mut "éééé".chars(), -1)?;
    assert!(!spooled.in_memory(), "four characters outgrow a three-unit limit");
    assert_eq!(spooled.length(), 4);
    let mut content = Vec::new();
    spooled.open()?.read_to_end(&mut content)?;
    assert_eq!(content, "éééé".as_bytes());

    let spooled = spool.create_temp_clob(&mut "ééé".chars(), -1)?;
    assert!(spooled.in_memory(), "three characters fit, whatever their byte count");
    Ok(())
}

#[test]
fn remove_lob_ignores_the_handle_and_succeeds() -> Result<()> {
    let lobs = frontend();
    let lob = lobs.create_blob(&mut &b"keep"[..], -1)?;

    lobs.remove_lob(&lob)?;

    assert_eq!(spool_content(&lob), &b"keep"[..], "handle and content remain usable");
    Ok(())
}

#[test]
fn maintenance_operations_always_fail_as_unsupported() -> Result<()> {
    let lobs = frontend();
    let lob = lobs.create_blob(&mut &b"x"[..], -1)?;

    let res = lobs.remove_all_for_table(LobOwner::Table(42));
    assert!(matches!(res, Err(Error::Unsupported(_))), "bulk removal: {:?}", res);
    let res = lobs.remove_all_for_table(LobOwner::SessionVariable);
    assert!(matches!(res, Err(Error::Unsupported(_))), "bulk removal of session variables: {:?}", res);

    let res = lobs.copy_lob(&lob, LobOwner::Table(1), -1);
    assert!(matches!(res, Err(Error::Unsupported(_))), "copy");
    Ok(())
}

#[test]
fn frontend_reports_its_mode() -> Result<()> {
    let lobs = frontend();

    lobs.init()?;
    assert!(!lobs.is_read_only(), "ingestion is allowed");

    let caps = lobs.capabilities();
    assert!(caps.ingest);
    assert!(caps.remote_read);
    assert!(!caps.server_maintenance);
    Ok(())
}

#[test]
fn failed_ingestion_produces_no_handle() {
    let lobs = frontend();
    let res = lobs.create_blob(&mut FailingSource { yielded: false }, -1);
    assert!(matches!(res, Err(Error::Io(_))), "{:?}", res);
}

#[test]
fn failed_ingestion_leaves_no_spool_file_behind() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let spool = SpoolHandler::new().with_in_memory_limit(0).with_spool_dir(dir.path());

    let res = spool.create_temp_blob(&mut FailingSource { yielded: false }, -1);

    assert!(matches!(res, Err(Error::Io(_))));
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0, "no spool file survives the failure");
    Ok(())
}
