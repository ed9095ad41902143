//! xmlls - host for the LemMinX XML language server
//!
//! Installs, verifies and runs the server; `xmlls run` can be used directly
//! as an editor's XML language server command.

use anyhow::Result;

fn main() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(xmlls_cli::run());
    // a pending stdin read must not keep the process alive
    runtime.shutdown_background();
    result
}
