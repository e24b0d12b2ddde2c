//! Generates `app_metadata.rs` in `OUT_DIR`: package name and version,
//! `[package.metadata]` entries, and the AES key and IV used for the
//! credential cache.

use dotenv::dotenv;
use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use toml::Value;

const KEY_ENV: &str = "JIRA_KPI_SECRET_KEY";
const IV_ENV: &str = "JIRA_KPI_SECRET_IV";
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

struct MetadataWriter {
    file: File,
}

impl MetadataWriter {
    fn create(out_dir: &str) -> io::Result<Self> {
        let file = File::create(Path::new(out_dir).join("app_metadata.rs"))?;
        Ok(Self { file })
    }

    fn constant_name(key: &str) -> String {
        format!("APP_METADATA_{}", key.to_uppercase().replace('-', "_"))
    }

    fn str_const(&mut self, key: &str, value: &str) -> io::Result<()> {
        writeln!(self.file, "#[allow(unused)]")?;
        writeln!(self.file, "pub const {}: &str = {:?};", Self::constant_name(key), value)
    }

    fn bytes_const(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        let bytes: Vec<String> = value.iter().map(u8::to_string).collect();
        writeln!(self.file, "#[allow(unused)]")?;
        writeln!(
            self.file,
            "pub const {}: &[u8; {}] = &[{}];",
            Self::constant_name(key),
            value.len(),
            bytes.join(", ")
        )
    }
}

/// Pads or truncates `seed` to exactly `len` bytes.
fn fit(seed: &str, len: usize) -> Vec<u8> {
    let mut bytes = seed.as_bytes().to_vec();
    bytes.resize(len, b'!');
    bytes
}

fn exact(name: &str, value: String, len: usize) -> io::Result<Vec<u8>> {
    if value.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} must be exactly {} bytes long, got {}", name, len, value.len()),
        ));
    }
    Ok(value.into_bytes())
}

/// Key and IV from the environment (or `.env`), else package-derived defaults.
fn secret_material(package_name: &str) -> io::Result<(Vec<u8>, Vec<u8>)> {
    match (env::var(KEY_ENV), env::var(IV_ENV)) {
        (Ok(key), Ok(iv)) => Ok((exact(KEY_ENV, key, KEY_LEN)?, exact(IV_ENV, iv, IV_LEN)?)),
        _ => {
            println!("cargo:warning={} or {} not set, using built-in defaults for the credential cache", KEY_ENV, IV_ENV);
            Ok((
                fit(&format!("{}-credential-cache-key", package_name), KEY_LEN),
                fit(&format!("{}-cache-iv", package_name), IV_LEN),
            ))
        }
    }
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed={}", KEY_ENV);
    println!("cargo:rerun-if-env-changed={}", IV_ENV);

    let _ = dotenv();

    let out_dir = env::var("OUT_DIR").map_err(io::Error::other)?;
    let package_name = env::var("CARGO_PKG_NAME").unwrap_or_else(|_| "jira-kpi".to_string());
    let manifest: Value = toml::from_str(&fs::read_to_string("Cargo.toml")?).map_err(io::Error::other)?;

    let mut writer = MetadataWriter::create(&out_dir)?;
    writer.str_const("NAME", &package_name)?;
    writer.str_const("VERSION", &env::var("CARGO_PKG_VERSION").unwrap_or_default())?;

    let extra = manifest
        .get("package")
        .and_then(|pkg| pkg.get("metadata"))
        .and_then(Value::as_table);
    for (key, value) in extra.into_iter().flatten() {
        if let Some(value) = value.as_str() {
            writer.str_const(key, value)?;
        }
    }

    let (key, iv) = secret_material(&package_name)?;
    writer.bytes_const("ENCRYPTION_KEY", &key)?;
    writer.bytes_const("ENCRYPTION_IV", &iv)?;

    Ok(())
}
