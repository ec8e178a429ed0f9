use std::path::Path;

use anyhow::Context as _;

pub fn write_raw_html(path: &Path, html: &str) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("raw html output already exists: {}", path.display());
    }

    if let Some(parent_dir) = path.parent()
        && !parent_dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent_dir)
            .with_context(|| format!("create raw html parent dir: {}", parent_dir.display()))?;
    }

    std::fs::write(path, html).with_context(|| format!("write raw html: {}", path.display()))?;

    Ok(())
}

pub fn read_raw_html(path: &Path) -> anyhow::Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read raw html: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_refuses_to_overwrite() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("nested").join("chart.html");

        write_raw_html(&path, "<html></html>")?;
        assert_eq!(read_raw_html(&path)?, "<html></html>");

        let err = write_raw_html(&path, "again").unwrap_err();
        assert!(err.to_string().contains("already exists"));
        Ok(())
    }

    #[test]
    fn read_reports_missing_file() {
        let err = read_raw_html(Path::new("/definitely/not/here.html")).unwrap_err();
        assert!(format!("{err:#}").contains("read raw html"));
    }
}
