//! SHA-256 digests of server binaries, as lowercase hex.

use std::path::Path;

use ring::digest::{Context, SHA256};
use tokio::io::{AsyncBufReadExt, BufReader};
use xmlls_core::{Result, XmlLsError};

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

const READ_CHUNK: usize = 64 * 1024;

/// Digest the binary at `path`, reading it in chunks.
///
/// An unreadable file is [`XmlLsError::Io`]; the verifier treats it as
/// untrusted.
pub async fn digest_file(path: &Path) -> Result<String> {
    let io_err = |e| XmlLsError::io(path, e);
    let file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let mut reader = BufReader::with_capacity(READ_CHUNK, file);
    let mut context = Context::new(&SHA256);

    loop {
        let chunk = reader.fill_buf().await.map_err(io_err)?;
        if chunk.is_empty() {
            break;
        }
        context.update(chunk);
        let consumed = chunk.len();
        reader.consume(consumed);
    }

    Ok(hex::encode(context.finish()))
}

/// Normalized form of `value` if it is a hex SHA-256 digest
#[must_use]
pub fn parse_digest(value: &str) -> Option<String> {
    let value = value.trim();
    (value.len() == DIGEST_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()))
        .then(|| value.to_ascii_lowercase())
}
