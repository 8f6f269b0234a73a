//! Runs in its own test binary: the spool memory limit is read from the
//! environment once per process, so the variable must be set before the
//! first handler in this process is built.

use lobby::*;

#[test]
fn env_variable_overrides_the_default_spool_memory_limit() -> Result<()> {
    std::env::set_var("LOBBY_SPOOL_MEMORY_LIMIT", "8");
    let handler = SpoolHandler::new();

    let spool = handler.create_temp_blob(&mut &[1u8; 8][..], -1)?;
    assert!(spool.in_memory(), "at the configured limit stays in memory");

    let spool = handler.create_temp_blob(&mut &[2u8; 9][..], -1)?;
    assert!(!spool.in_memory(), "one byte over the configured limit spills");
    assert_eq!(spool.length(), 9);

    let roomy = SpoolHandler::new().with_in_memory_limit(1024);
    let spool = roomy.create_temp_blob(&mut &[3u8; 9][..], -1)?;
    assert!(spool.in_memory(), "a per-handler limit still wins over the environment");
    Ok(())
}
