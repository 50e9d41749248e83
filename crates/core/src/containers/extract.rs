use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use flate2::read::GzDecoder;

use crate::containers::ExtractError;

/// Environment variable overriding the `7z` executable.
pub const SEVEN_ZIP_ENV: &str = "CURATOR_7Z_BIN";

pub fn extract_zip(source: &Path, destination: &Path) -> Result<(), ExtractError> {
    let file = fs::File::open(source)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let entry_path = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => continue, // absolute or escaping path
        };
        let output_path = destination.join(&entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
        } else {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&output_path)?;
            io::copy(&mut entry, &mut outfile)?;
        }
    }
    Ok(())
}

pub fn extract_tar(source: &Path, destination: &Path) -> Result<(), ExtractError> {
    let file = fs::File::open(source)?;
    let mut archive = tar::Archive::new(file);
    archive.unpack(destination)?;
    Ok(())
}

pub fn extract_tar_gz(source: &Path, destination: &Path) -> Result<(), ExtractError> {
    let file = fs::File::open(source)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(destination)?;
    Ok(())
}

/// Unpack anything `7z` understands (7z, cab, disk images) by shelling out.
pub fn extract_7z(source: &Path, destination: &Path) -> Result<(), ExtractError> {
    let tool = seven_zip_path();
    let output = Command::new(&tool)
        .arg("x")
        .arg("-y")
        .arg(format!("-o{}", destination.display()))
        .arg(source)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ExtractError::Tool {
            tool: tool.display().to_string(),
            message: format!("failed to spawn: {e}"),
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ExtractError::Tool {
            tool: tool.display().to_string(),
            message: format!("exited with {} {}", output.status, stderr),
        });
    }
    Ok(())
}

fn seven_zip_path() -> PathBuf {
    std::env::var_os(SEVEN_ZIP_ENV).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("7z"))
}
