use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;

use crate::formats::MovieRecord;

pub const DOWNLOAD_FILE_NAME: &str = "imdb_top250.json";

pub fn to_json_bytes(records: &[MovieRecord]) -> anyhow::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(records).context("serialize records")?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn write_json(out: &Path, records: &[MovieRecord], force: bool) -> anyhow::Result<()> {
    let bytes = to_json_bytes(records)?;
    write_atomic(out, &bytes, force)
}

pub fn write_value<T: Serialize>(out: &Path, value: &T, force: bool) -> anyhow::Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value).context("serialize json")?;
    bytes.push(b'\n');
    write_atomic(out, &bytes, force)
}

fn write_atomic(out: &Path, bytes: &[u8], force: bool) -> anyhow::Result<()> {
    if out.exists() && !force {
        anyhow::bail!("export output already exists: {}", out.display());
    }
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export output dir: {}", parent.display()))?;
    }

    let tmp_path = out.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&tmp_path)
        .with_context(|| format!("open tmp: {}", tmp_path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    file.flush()
        .with_context(|| format!("flush tmp: {}", tmp_path.display()))?;
    drop(file);

    std::fs::rename(&tmp_path, out)
        .with_context(|| format!("rename tmp to final: {}", out.display()))?;
    Ok(())
}
