use crate::webui::BundleDigest;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Print the bundle digest of a directory, as published in `md5sum`.
#[derive(Args, Debug)]
pub struct DigestCommand {
    /// Directory to digest.
    path: PathBuf,

    /// Fail unless the digest equals this value.
    #[arg(long)]
    expected: Option<String>,
}

impl DigestCommand {
    pub async fn execute(self) -> Result<()> {
        let label = self.path.display().to_string();
        let digest = match &self.expected {
            Some(expected) => BundleDigest::verify(&self.path, &label, expected).await?,
            None => BundleDigest::compute(&self.path)
                .await
                .with_context(|| format!("Failed to digest {label}"))?,
        };

        println!("{digest}");
        Ok(())
    }
}
