use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::decoder::{
    DecodeError, FormatDecoder, InstallerInfo, LocalizedNames, Recognition, ResourceInfo,
};
use crate::model::IconBitmap;

/// Environment variable naming the decoder executable.
pub const DECODER_ENV: &str = "CURATOR_DECODER_BIN";

/// Exit status the decoder uses for "not this format".
const EXIT_UNRECOGNIZED: i32 = 2;

/// Decoder that shells out to an external tool speaking JSON on stdout.
///
/// Sub-commands:
/// - `dumpsis --json <file>` → `{"uid", "name": {locale: text}, "version"}`
/// - `dumpsis --extract <file> <dir>`
/// - `dumpaif --json <file>` → `{"uid3", "captions": {locale: text}}`
/// - `icons --json <file> <dir>` → `[{"width", "height", "bpp", "filename"}]`,
///   with each PNG written into `<dir>`
/// - `recognize --json <file>` → `{"era"?, "type"?}`
///
/// Exit status 2 means the input is not in the requested format.
#[derive(Debug, Clone)]
pub struct ToolDecoder {
    program: PathBuf,
}

#[derive(Deserialize)]
struct DumpSis {
    uid: u32,
    name: LocalizedNames,
    version: String,
}

#[derive(Deserialize)]
struct IconEntry {
    width: u32,
    height: u32,
    bpp: u32,
    filename: String,
}

impl ToolDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// Resolve the tool from an explicit path, then `CURATOR_DECODER_BIN`, then
    /// `opolua` on `PATH`.
    pub fn resolve(configured: Option<&Path>) -> Self {
        let program = configured
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(DECODER_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("opolua"));
        Self::new(program)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, args: &[&OsStr]) -> Result<Output, DecodeError> {
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                DecodeError::Tool(format!("failed to spawn {}: {e}", self.program.display()))
            })
    }

    fn run_json<T: DeserializeOwned>(
        &self,
        subcommand: &str,
        path: &Path,
        extra: Option<&Path>,
        what: &'static str,
    ) -> Result<T, DecodeError> {
        let mut args = vec![OsStr::new(subcommand), OsStr::new("--json"), path.as_os_str()];
        if let Some(extra) = extra {
            args.push(extra.as_os_str());
        }
        let output = self.run(&args)?;
        check_status(&output, path, what)?;
        serde_json::from_slice(&output.stdout).map_err(|e| DecodeError::Malformed {
            path: path.to_path_buf(),
            what,
            message: format!("unexpected decoder output: {e}"),
        })
    }
}

fn check_status(output: &Output, path: &Path, what: &'static str) -> Result<(), DecodeError> {
    if output.status.success() {
        return Ok(());
    }
    if output.status.code() == Some(EXIT_UNRECOGNIZED) {
        return Err(DecodeError::Unrecognized { path: path.to_path_buf(), expected: what });
    }
    Err(DecodeError::Malformed {
        path: path.to_path_buf(),
        what,
        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

impl FormatDecoder for ToolDecoder {
    fn decode_installer(&self, path: &Path) -> Result<InstallerInfo, DecodeError> {
        let info: DumpSis = self.run_json("dumpsis", path, None, "installer")?;
        Ok(InstallerInfo { uid: info.uid, names: info.name, version: info.version })
    }

    fn extract_installer(&self, path: &Path, destination: &Path) -> Result<(), DecodeError> {
        let output = self.run(&[
            OsStr::new("dumpsis"),
            OsStr::new("--extract"),
            path.as_os_str(),
            destination.as_os_str(),
        ])?;
        check_status(&output, path, "installer")
    }

    fn decode_resource(&self, path: &Path) -> Result<ResourceInfo, DecodeError> {
        self.run_json("dumpaif", path, None, "resource")
    }

    fn icons(&self, path: &Path) -> Result<Vec<IconBitmap>, DecodeError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| DecodeError::Tool(format!("failed to create icon scratch dir: {e}")))?;
        let entries: Vec<IconEntry> =
            self.run_json("icons", path, Some(scratch.path()), "resource")?;
        entries
            .into_iter()
            .map(|entry| {
                let png = fs::read(scratch.path().join(&entry.filename)).map_err(|e| {
                    DecodeError::Malformed {
                        path: path.to_path_buf(),
                        what: "resource",
                        message: format!("missing icon bitmap {}: {e}", entry.filename),
                    }
                })?;
                Ok(IconBitmap { width: entry.width, height: entry.height, bpp: entry.bpp, png })
            })
            .collect()
    }

    fn recognize(&self, path: &Path) -> Result<Recognition, DecodeError> {
        self.run_json("recognize", path, None, "file")
    }

    fn name(&self) -> &'static str {
        "tool"
    }
}
