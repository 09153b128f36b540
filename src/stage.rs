use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use url::Url;

/// A remote object stage the loader can fetch files from. `fetch` copies the
/// object named by `stage_path` byte-for-byte into `dest_dir`, under the
/// path's base name. Paths are opaque beyond that; whatever validation exists
/// is the stage's own.
pub trait Stage {
    fn fetch(&self, stage_path: &str, dest_dir: &Path) -> Result<()>;
}

/// Final segment of a stage-qualified path, e.g.
/// `@DB.RAW_STAGE/intro/location.xlsx` -> `location.xlsx`.
pub fn base_name(stage_path: &str) -> Result<&str> {
    stage_path
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow!("stage path `{}` has no file name", stage_path))
}

/// Path portion after the `@<database>.<stage>` qualifier.
fn stage_relative(stage_path: &str) -> Result<&str> {
    stage_path
        .trim_start_matches('@')
        .split_once('/')
        .map(|(_, rel)| rel)
        .filter(|rel| !rel.is_empty())
        .ok_or_else(|| anyhow!("stage path `{}` has no path component", stage_path))
}

/// Stage served over HTTP: the path portion of a stage-qualified name is
/// resolved against a fixed base URL and downloaded with a blocking client.
pub struct HttpStage {
    client: Client,
    base: Url,
}

impl HttpStage {
    pub fn new(base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }
}

impl Stage for HttpStage {
    fn fetch(&self, stage_path: &str, dest_dir: &Path) -> Result<()> {
        let rel = stage_relative(stage_path)?;
        let url = self
            .base
            .join(rel)
            .with_context(|| format!("resolving `{}` against {}", rel, self.base))?;

        let resp = self
            .client
            .get(url.as_str())
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("downloading {}", url))?;
        let bytes = resp.bytes()?;

        let dest = dest_dir.join(base_name(stage_path)?);
        fs::write(&dest, &bytes).with_context(|| format!("writing {}", dest.display()))?;
        Ok(())
    }
}

/// Stage rooted in a local directory; fetch is a plain file copy. Used for
/// local runs and tests.
pub struct DirStage {
    root: PathBuf,
}

impl DirStage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Stage for DirStage {
    fn fetch(&self, stage_path: &str, dest_dir: &Path) -> Result<()> {
        let src = self.root.join(stage_relative(stage_path)?);
        let dest = dest_dir.join(base_name(stage_path)?);
        fs::copy(&src, &dest)
            .with_context(|| format!("copying {} to {}", src.display(), dest.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_takes_final_segment() {
        let path = "@INTEGRATIONS.FROSTBYTE_RAW_STAGE/intro/order_detail.xlsx";
        assert_eq!(base_name(path).unwrap(), "order_detail.xlsx");
        assert!(base_name("@DB.STAGE/intro/").is_err());
    }

    #[test]
    fn stage_relative_strips_qualifier() {
        let path = "@INTEGRATIONS.FROSTBYTE_RAW_STAGE/intro/location.xlsx";
        assert_eq!(stage_relative(path).unwrap(), "intro/location.xlsx");
        assert!(stage_relative("@DB.STAGE").is_err());
    }

    #[test]
    fn dir_stage_copies_under_base_name() -> Result<()> {
        let root = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        fs::create_dir_all(root.path().join("intro"))?;
        fs::write(root.path().join("intro/location.xlsx"), b"bytes")?;

        let stage = DirStage::new(root.path());
        stage.fetch("@DB.RAW_STAGE/intro/location.xlsx", dest.path())?;

        assert_eq!(fs::read(dest.path().join("location.xlsx"))?, b"bytes");
        Ok(())
    }

    #[test]
    fn dir_stage_missing_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let stage = DirStage::new(root.path());
        assert!(stage
            .fetch("@DB.RAW_STAGE/intro/absent.xlsx", dest.path())
            .is_err());
    }
}
