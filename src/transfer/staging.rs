//! Request-owned temporary files: reserved snapshot targets, staged uploads, and
//! read streams that delete their file once dropped.

use std::io;
use std::path::Path;

use axum::body::Bytes;
use futures::{Stream, StreamExt};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::LoopError;

pub const EXPORT_PREFIX: &str = "loop_export_";
pub const UPLOAD_PREFIX: &str = "loop_upload_";

const READ_CHUNK: usize = 64 * 1024;

/// A uniquely named file in the system temp dir, removed when the value is dropped.
#[derive(Debug)]
pub struct StagedFile {
    pub path: TempPath,
    pub len: u64,
}

/// Reserve a fresh path that does not exist yet (`VACUUM INTO` refuses existing targets).
pub fn reserve_path(prefix: &str) -> io::Result<TempPath> {
    let path = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".db")
        .tempfile()?
        .into_temp_path();
    std::fs::remove_file(&path)?;
    Ok(path)
}

/// Write every chunk of `body` into a new temporary file.
pub async fn stage_stream<S, E>(prefix: &str, body: S) -> Result<StagedFile, LoopError>
where
    S: Stream<Item = Result<Bytes, E>>,
    LoopError: From<E>,
{
    let (file, path) = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".db")
        .tempfile()?
        .into_parts();
    let mut file = File::from_std(file);

    let mut body = std::pin::pin!(body);
    let mut len = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        len += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;

    Ok(StagedFile { path, len })
}

/// Copy an existing file into a private temporary file.
pub async fn stage_copy(prefix: &str, source: &Path) -> Result<StagedFile, LoopError> {
    let path = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".db")
        .tempfile()?
        .into_temp_path();
    let len = tokio::fs::copy(source, &path).await?;
    Ok(StagedFile { path, len })
}

/// Stream the file's bytes; the file is deleted when the stream finishes, fails or
/// is dropped early (e.g. the client disconnects mid-download).
pub async fn delete_on_close_stream(
    path: TempPath,
) -> io::Result<impl Stream<Item = io::Result<Bytes>> + Send + 'static> {
    let file = File::open(&path).await?;
    Ok(futures::stream::try_unfold((file, path), |(file, path)| {
        read_chunk(file, path)
    }))
}

// Tuple order matters: the handle is closed before the path is removed.
async fn read_chunk(
    mut file: File,
    path: TempPath,
) -> io::Result<Option<(Bytes, (File, TempPath))>> {
    let mut buf = vec![0u8; READ_CHUNK];
    let n = file.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some((Bytes::from(buf), (file, path))))
}
