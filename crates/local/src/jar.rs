//! Running DynamoDB Local from its jar.

use std::fs::File;
use std::path::Path;
use std::process::Stdio;

use flate2::read::GzDecoder;
use tar::Archive;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::error::{LocalError, Result};

pub const JAR_NAME: &str = "DynamoDBLocal.jar";

/// Latest DynamoDB Local release archive.
pub const DOWNLOAD_URL: &str =
    "http://dynamodb-local.s3-website-us-west-2.amazonaws.com/dynamodb_local_latest.tar.gz";

const ARCHIVE_NAME: &str = "dynamodb_local_latest.tar.gz";

/// Arguments for `java`, relative to the jar directory.
pub fn java_args(port: u16) -> Vec<String> {
    vec![
        "-Djava.library.path=./DynamoDBLocal_lib".to_string(),
        "-jar".to_string(),
        JAR_NAME.to_string(),
        "-sharedDb".to_string(),
        "-inMemory".to_string(),
        "-port".to_string(),
        port.to_string(),
    ]
}

/// Unpacks a gzipped tarball into `dir`.
pub async fn extract(archive: &Path, dir: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dir = dir.to_path_buf();

    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let file = File::open(&archive)?;
        Archive::new(GzDecoder::new(file)).unpack(&dir)
    })
    .await
    .map_err(|e| LocalError::Extract(e.to_string()))?
    .map_err(|e| LocalError::Extract(e.to_string()))
}

/// Reads `stderr` until it closes, logging each line. Returns the number of
/// lines read.
async fn forward_stderr<R>(stderr: R) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stderr).lines();
    let mut count = 0;
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(target: "dynamodb_local", "{line}");
        count += 1;
    }
    count
}

/// Drains the child's stderr in the background so a chatty JVM never blocks
/// on a full pipe.
fn drain_stderr(child: &mut Child) {
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_stderr(stderr));
    }
}

/// Downloads and unpacks DynamoDB Local into `dir`.
pub async fn download(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        tracing::info!(dir = %dir.display(), "Creating DynamoDB Local directory");
        tokio::fs::create_dir_all(dir).await?;
    }

    let archive = dir.join(ARCHIVE_NAME);
    tracing::info!(url = DOWNLOAD_URL, to = %archive.display(), "Downloading DynamoDB Local");

    let bytes = reqwest::get(DOWNLOAD_URL)
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    tokio::fs::write(&archive, &bytes).await?;

    tracing::info!("Extracting DynamoDB Local");
    let extracted = extract(&archive, dir).await;

    // the archive is useless either way
    let _ = tokio::fs::remove_file(&archive).await;

    extracted
}

/// Spawns `java` from the jar directory, downloading the jar first when
/// allowed and missing.
pub async fn spawn(dir: &Path, port: u16, allow_download: bool) -> Result<Child> {
    if !dir.join(JAR_NAME).exists() {
        if !allow_download {
            return Err(LocalError::JarMissing(dir.display().to_string()));
        }
        download(dir).await?;
    }

    tracing::info!(dir = %dir.display(), port, "Running DynamoDB Local from jar");

    let mut child = Command::new("java")
        .args(java_args(port))
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;
    drain_stderr(&mut child);

    Ok(child)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_java_args() {
        assert_eq!(
            java_args(31337),
            vec![
                "-Djava.library.path=./DynamoDBLocal_lib",
                "-jar",
                "DynamoDBLocal.jar",
                "-sharedDb",
                "-inMemory",
                "-port",
                "31337",
            ]
        );
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_archive(path: &Path, body: &[u8]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, JAR_NAME, body).unwrap();
        builder
            .append_data(&mut header, "DynamoDBLocal_lib/libsqlite4java.so", body)
            .unwrap();

        builder.into_inner().unwrap().finish().unwrap();
    }

    #[tokio::test]
    async fn test_extract_unpacks_archive() {
        let dir = scratch_dir("dynamodel-local-extract");
        let archive = dir.join(ARCHIVE_NAME);
        write_archive(&archive, b"not really a jar");

        extract(&archive, &dir).await.unwrap();

        assert_eq!(
            std::fs::read(dir.join(JAR_NAME)).unwrap(),
            b"not really a jar"
        );
        assert!(dir.join("DynamoDBLocal_lib/libsqlite4java.so").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_extract_rejects_corrupt_archive() {
        let dir = scratch_dir("dynamodel-local-corrupt");
        let archive = dir.join(ARCHIVE_NAME);
        std::fs::write(&archive, b"this is not gzip").unwrap();

        let result = extract(&archive, &dir).await;
        assert!(matches!(result, Err(LocalError::Extract(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_forward_stderr_reads_to_end() {
        let output = b"Initializing DynamoDB Local\nPort: 8000\nInMemory: true\n";
        assert_eq!(forward_stderr(&output[..]).await, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_drained_child_does_not_block_on_stderr() {
        // well past the default pipe buffer
        let mut child = Command::new("sh")
            .args(["-c", "yes 'DynamoDB Local log line' | head -n 20000 >&2"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        drain_stderr(&mut child);

        let status = tokio::time::timeout(std::time::Duration::from_secs(10), child.wait())
            .await
            .expect("child blocked writing stderr")
            .unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_spawn_without_jar_or_download() {
        let dir = std::env::temp_dir().join("dynamodel-local-missing-jar");
        let result = spawn(&dir, 31337, false).await;
        assert!(matches!(result, Err(LocalError::JarMissing(_))));
    }
}
