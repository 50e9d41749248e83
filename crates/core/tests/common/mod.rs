#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use curator_core::decoder::{
    DecodeError, FormatDecoder, InstallerInfo, LocalizedNames, Recognition, ResourceInfo,
};
use curator_core::model::IconBitmap;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;
use serde_json::json;

/// Decoder reading JSON fixtures instead of real installers.
///
/// - installers: `{"uid", "names", "version", "files": {path: contents}}`
/// - resources: `{"uid3", "captions", "icons": [[w, h, bpp], ...]}`
/// - any JSON file with `era`/`type` keys is recognized accordingly.
pub struct StubDecoder;

#[derive(Deserialize)]
struct StubInstaller {
    uid: u32,
    #[serde(default)]
    names: LocalizedNames,
    version: String,
    #[serde(default)]
    files: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct StubResource {
    uid3: u32,
    #[serde(default)]
    captions: LocalizedNames,
    #[serde(default)]
    icons: Vec<(u32, u32, u32)>,
}

fn read_installer(path: &Path) -> Result<StubInstaller, DecodeError> {
    let raw = fs::read(path).map_err(|e| DecodeError::Tool(e.to_string()))?;
    serde_json::from_slice(&raw).map_err(|e| DecodeError::Malformed {
        path: path.to_path_buf(),
        what: "installer",
        message: e.to_string(),
    })
}

fn read_resource(path: &Path) -> Result<StubResource, DecodeError> {
    let raw = fs::read(path).map_err(|e| DecodeError::Tool(e.to_string()))?;
    serde_json::from_slice(&raw)
        .map_err(|_| DecodeError::Unrecognized { path: path.to_path_buf(), expected: "resource" })
}

impl FormatDecoder for StubDecoder {
    fn decode_installer(&self, path: &Path) -> Result<InstallerInfo, DecodeError> {
        let installer = read_installer(path)?;
        Ok(InstallerInfo { uid: installer.uid, names: installer.names, version: installer.version })
    }

    fn extract_installer(&self, path: &Path, destination: &Path) -> Result<(), DecodeError> {
        for (name, contents) in read_installer(path)?.files {
            let target = destination.join(name);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| DecodeError::Tool(e.to_string()))?;
            }
            fs::write(target, contents).map_err(|e| DecodeError::Tool(e.to_string()))?;
        }
        Ok(())
    }

    fn decode_resource(&self, path: &Path) -> Result<ResourceInfo, DecodeError> {
        let resource = read_resource(path)?;
        Ok(ResourceInfo { uid3: resource.uid3, captions: resource.captions })
    }

    fn icons(&self, path: &Path) -> Result<Vec<IconBitmap>, DecodeError> {
        let resource = read_resource(path)?;
        Ok(resource
            .icons
            .into_iter()
            .map(|(width, height, bpp)| IconBitmap {
                width,
                height,
                bpp,
                png: format!("icon-{:08x}-{width}x{height}x{bpp}", resource.uid3).into_bytes(),
            })
            .collect())
    }

    fn recognize(&self, path: &Path) -> Result<Recognition, DecodeError> {
        let raw = fs::read(path).map_err(|e| DecodeError::Tool(e.to_string()))?;
        Ok(serde_json::from_slice(&raw).unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn installer(uid: u32, name: &str, version: &str) -> String {
    json!({"uid": uid, "names": {"en_GB": name}, "version": version}).to_string()
}

pub fn installer_with_files(
    uid: u32,
    name: &str,
    version: &str,
    files: &[(&str, String)],
) -> String {
    let files: BTreeMap<&str, &String> = files.iter().map(|(k, v)| (*k, v)).collect();
    json!({"uid": uid, "names": {"en_GB": name}, "version": version, "files": files}).to_string()
}

pub fn resource(uid3: u32, caption: &str, icons: &[(u32, u32, u32)]) -> String {
    json!({"uid3": uid3, "captions": {"en_GB": caption}, "icons": icons}).to_string()
}

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = fs::File::create(path).expect("create zip");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in entries {
        zip.start_file(*name, options).expect("start zip entry");
        zip.write_all(data).expect("write zip entry");
    }
    zip.finish().expect("finish zip");
}

pub fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
    let file = fs::File::create(path).expect("create tar.gz");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, *data).expect("append tar entry");
    }
    builder.into_inner().expect("finish tar").finish().expect("finish gzip");
}

/// Minimal archive item metadata.
pub fn write_item_metadata(item_dir: &Path, id: &str, title: &str, description: &str) {
    fs::create_dir_all(item_dir).expect("create item dir");
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata>\n  <identifier>{id}</identifier>\n  \
         <title>{title}</title>\n  <description>{description}</description>\n</metadata>\n"
    );
    fs::write(item_dir.join(format!("{id}_meta.xml")), xml).expect("write meta xml");
}
