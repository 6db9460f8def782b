// std
use std::{
	path::PathBuf,
	time::{SystemTime, UNIX_EPOCH},
};
// crates.io
use color_eyre::Result;
// self
use comeet_http::{
	store::{FileMedium, SafeStore, TokenStore},
	token::BearerToken,
};

fn scratch_file(name: &str) -> PathBuf {
	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System clock should be after the epoch.")
		.as_nanos();

	std::env::temp_dir().join(format!("comeet-http-{name}-{}-{nanos}.json", std::process::id()))
}

#[test]
fn file_backed_token_survives_a_restart() -> Result<()> {
	let path = scratch_file("restart");
	let store = SafeStore::new(FileMedium::open(&path)?);

	assert!(store.is_medium_available());
	assert!(store.get().is_none());

	store.set(&BearerToken::new("T1")?)?;

	let reopened = SafeStore::new(FileMedium::open(&path)?);

	assert_eq!(reopened.get().map(|token| token.expose().to_owned()).as_deref(), Some("T1"));

	reopened.remove()?;

	let emptied = SafeStore::new(FileMedium::open(&path)?);

	assert!(emptied.get().is_none());

	std::fs::remove_file(path)?;

	Ok(())
}

#[test]
fn invalid_persisted_token_is_purged() -> Result<()> {
	let path = scratch_file("invalid");

	std::fs::write(&path, "{\"access_token\":\"not a token\"}")?;

	let store = SafeStore::new(FileMedium::open(&path)?);

	assert!(store.get().is_none());

	let reopened = SafeStore::new(FileMedium::open(&path)?);

	assert!(reopened.get().is_none());
	assert!(!std::fs::read_to_string(&path)?.contains("not a token"));

	std::fs::remove_file(path)?;

	Ok(())
}
