//! Archive-and-encrypt pipeline.
//!
//! Compresses a directory tree into a single zip archive at a temporary
//! location, encrypts it in one pass with AES-256-GCM, and writes the
//! ciphertext to `<outdir>/<basename>.zip.enc`. The symmetric key follows a
//! generate-once, persist, reuse-on-subsequent-runs lifecycle: a key file
//! for a given base name is never overwritten, and a freshly generated key
//! is surfaced exactly once so the caller can store it safely.
//!
//! The pipeline owns its temporary archive and removes it on every exit
//! path. All failures map to [`EngineError`] variants distinct from runner
//! failures: a post-processing problem is never mistaken for a copy
//! problem.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::EngineError;

/// Raw symmetric key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// GCM nonce length; the nonce is prepended to the ciphertext.
const NONCE_LEN: usize = 12;

/// Base name used when the source directory has no final path component.
const DEFAULT_BASE_NAME: &str = "backup";

/// The product of one pipeline run.
///
/// `key_path` is populated only when the key was freshly generated on this
/// run; a reused key is not re-surfaced.
#[derive(Debug, Clone)]
pub struct EncryptedBundle {
    /// Path of the ciphertext blob
    pub encrypted_path: PathBuf,

    /// Path of the key file, if it was created by this run
    pub key_path: Option<PathBuf>,
}

/// Compress `folder` and encrypt the archive into `out_dir`.
///
/// Key resolution order: a caller-supplied path that already exists on
/// disk, then a pre-existing derived key file, then a freshly generated key
/// persisted at the supplied or derived path.
pub fn encrypt_dir_to_file(
    folder: &Path,
    out_dir: &Path,
    key_path: Option<&Path>,
) -> Result<EncryptedBundle, EngineError> {
    fs::create_dir_all(out_dir).map_err(|source| EngineError::OutputDirCreation {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let base = base_name(folder);
    let zip_path = std::env::temp_dir().join(format!("{base}.zip"));
    let enc_path = out_dir.join(format!("{base}.zip.enc"));

    // A stale archive from an interrupted run must not leak into this one.
    if zip_path.exists() {
        fs::remove_file(&zip_path).map_err(|source| EngineError::Io {
            path: zip_path.clone(),
            source,
        })?;
    }

    let result = archive_then_encrypt(folder, &zip_path, &enc_path, out_dir, &base, key_path);

    // The temporary archive never outlives the run, success or failure.
    if let Err(error) = fs::remove_file(&zip_path) {
        if error.kind() != io::ErrorKind::NotFound {
            tracing::warn!(
                path = %zip_path.display(),
                %error,
                "failed to remove temporary archive"
            );
        }
    }

    result
}

/// Decrypt a bundle produced by [`encrypt_dir_to_file`] back into a zip
/// archive at `out_path`.
///
/// A wrong key or a tampered bundle fails authentication and returns
/// [`EngineError::Decrypt`]; no partial plaintext is ever written.
pub fn decrypt_file(
    enc_path: &Path,
    key_path: &Path,
    out_path: &Path,
) -> Result<(), EngineError> {
    let key = load_key(key_path)?;
    let payload = fs::read(enc_path).map_err(|source| EngineError::Io {
        path: enc_path.to_path_buf(),
        source,
    })?;
    if payload.len() < NONCE_LEN {
        return Err(EngineError::TruncatedBundle {
            path: enc_path.to_path_buf(),
        });
    }

    let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| EngineError::Decrypt {
        path: enc_path.to_path_buf(),
    })?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| EngineError::Decrypt {
            path: enc_path.to_path_buf(),
        })?;

    fs::write(out_path, plaintext).map_err(|source| EngineError::Io {
        path: out_path.to_path_buf(),
        source,
    })
}

fn archive_then_encrypt(
    folder: &Path,
    zip_path: &Path,
    enc_path: &Path,
    out_dir: &Path,
    base: &str,
    key_path: Option<&Path>,
) -> Result<EncryptedBundle, EngineError> {
    write_archive(folder, zip_path)?;
    let (key, fresh_key_path) = resolve_key(out_dir, base, key_path)?;

    let plaintext = fs::read(zip_path).map_err(|source| EngineError::Io {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| EngineError::Encrypt {
        path: enc_path.to_path_buf(),
    })?;
    let nonce_bytes: [u8; NONCE_LEN] = rand::random();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
        .map_err(|_| EngineError::Encrypt {
            path: enc_path.to_path_buf(),
        })?;

    // The ciphertext hits disk only after the full encryption pass
    // succeeded; a mid-way failure leaves no half-written output.
    let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce_bytes);
    payload.extend_from_slice(&ciphertext);
    fs::write(enc_path, payload).map_err(|source| EngineError::Io {
        path: enc_path.to_path_buf(),
        source,
    })?;

    Ok(EncryptedBundle {
        encrypted_path: enc_path.to_path_buf(),
        key_path: fresh_key_path,
    })
}

/// Zip the full tree under `folder`, empty directories included.
fn write_archive(folder: &Path, zip_path: &Path) -> Result<(), EngineError> {
    let file = File::create(zip_path).map_err(|source| EngineError::Io {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default();

    for entry in WalkDir::new(folder) {
        let entry = entry.map_err(|source| EngineError::Archive {
            path: folder.to_path_buf(),
            source: source.into(),
        })?;
        let path = entry.path();
        if path == folder {
            continue;
        }
        let rel = path.strip_prefix(folder).unwrap_or(path);
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)
                .map_err(|source| EngineError::ArchiveWrite {
                    path: zip_path.to_path_buf(),
                    source,
                })?;
        } else {
            zip.start_file(name, options)
                .map_err(|source| EngineError::ArchiveWrite {
                    path: zip_path.to_path_buf(),
                    source,
                })?;
            let mut src = File::open(path).map_err(|source| EngineError::Archive {
                path: path.to_path_buf(),
                source,
            })?;
            io::copy(&mut src, &mut zip).map_err(|source| EngineError::Archive {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    zip.finish().map_err(|source| EngineError::ArchiveWrite {
        path: zip_path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Load an existing key or generate and persist a new one.
///
/// Returns the key bytes and, only when freshly generated, the path it was
/// written to. An existing key file is never overwritten.
fn resolve_key(
    out_dir: &Path,
    base: &str,
    supplied: Option<&Path>,
) -> Result<(Vec<u8>, Option<PathBuf>), EngineError> {
    let effective = supplied
        .map(Path::to_path_buf)
        .unwrap_or_else(|| out_dir.join(format!("{base}.key")));

    if effective.exists() {
        let key = load_key(&effective)?;
        tracing::debug!(path = %effective.display(), "reusing existing key");
        return Ok((key, None));
    }

    let key: [u8; KEY_LEN] = rand::random();
    fs::write(&effective, key).map_err(|source| EngineError::KeyWrite {
        path: effective.clone(),
        source,
    })?;
    restrict_permissions(&effective);
    Ok((key.to_vec(), Some(effective)))
}

fn load_key(path: &Path) -> Result<Vec<u8>, EngineError> {
    let key = fs::read(path).map_err(|source| EngineError::KeyRead {
        path: path.to_path_buf(),
        source,
    })?;
    if key.len() != KEY_LEN {
        return Err(EngineError::InvalidKeyLength {
            path: path.to_path_buf(),
            len: key.len(),
            expected: KEY_LEN,
        });
    }
    Ok(key)
}

/// Final path component of the normalized directory, or the default name.
fn base_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_BASE_NAME.to_string())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(error) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path = %path.display(), %error, "failed to restrict key file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
