use crate::{
    errors::{AppError, AppResult},
    resolver::Resolution,
};
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::Stream;
use std::{io, path::PathBuf};
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt},
};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const NO_STORE: &str = "no-store";

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Forbidden,
    Stream {
        path: PathBuf,
        content_type: &'static str,
        cache_control: &'static str,
    },
    PassThrough,
}

/// Decide what to do with a resolved request.
///
/// Unauthorized always maps to `Forbidden`. Only regular files are streamed;
/// directories, missing paths and paths the OS refuses to stat pass through.
pub async fn respond(resolution: &Resolution) -> Action {
    if !resolution.authorized {
        return Action::Forbidden;
    }
    match tokio::fs::metadata(&resolution.candidate_path).await {
        Ok(meta) if meta.is_file() => Action::Stream {
            path: resolution.candidate_path.clone(),
            content_type: JSON_CONTENT_TYPE,
            cache_control: NO_STORE,
        },
        _ => Action::PassThrough,
    }
}

/// Build a `200` response whose body streams the file at `path`.
///
/// The open handle moves into the body stream and is closed when the stream
/// finishes, fails, or is dropped because the client went away. No
/// `Content-Length` is sent: the producer may rewrite the file mid-response,
/// so the body goes out chunked and ends wherever the read ends.
pub async fn stream_file(
    path: PathBuf,
    content_type: &'static str,
    cache_control: &'static str,
) -> AppResult<Response> {
    let file = File::open(&path)
        .await
        .map_err(|e| AppError::Internal(format!("open {}: {e}", path.display())))?;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from_stream(file_chunks(file)))
        .map_err(|e| AppError::Internal(e.to_string()))
}

// A read error is yielded rather than swallowed so hyper aborts the response
// instead of sending a short body that looks complete.
pub(crate) fn file_chunks<R>(mut reader: R) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async_stream::try_stream! {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            yield Bytes::copy_from_slice(&buf[..n]);
        }
    }
}
