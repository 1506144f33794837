//! HTTP handlers for binary uploads and downloads.
//! Request bodies are streamed straight into the object store.

use crate::{
    auth::Session,
    errors::AppError,
    models::upload::StoredObject,
    services::upload::{UploadRequest, upload_validated},
    state::AppState,
    validation::FileKind,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Deserialize;
use std::io;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original file name; omitted for in-browser recordings.
    pub filename: Option<String>,
}

/// `PUT /uploads/{kind}?filename=`: validate, then store the body.
pub async fn upload(
    State(state): State<AppState>,
    session: Session,
    Path(kind): Path<FileKind>,
    Query(q): Query<UploadQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, AppError> {
    let total_bytes = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| AppError::new(StatusCode::LENGTH_REQUIRED, "Content-Length is required"))?;

    let stream = body
        .into_data_stream()
        .map(|chunk| chunk.map_err(io::Error::other))
        .boxed();

    let req = UploadRequest {
        user_id: session.user_id,
        category: kind.category(),
        original_name: q.filename,
        total_bytes,
        body: stream,
    };

    let stored: StoredObject =
        upload_validated(state.blobs.as_ref(), &kind.rules(), req, None).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `GET /objects/{*path}`: stream an object back to its owner.
pub async fn get_object(
    State(state): State<AppState>,
    session: Session,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    // `{category}s/{userId}/...`
    let owner = path.split('/').nth(1).unwrap_or_default();
    if owner != session.user_id {
        return Err(AppError::not_found(format!("object `{}` not found", path)));
    }

    let reader = state.blobs.open(&path).await?;
    let mut response = Response::new(Body::from_stream(reader.stream));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(reader.size_bytes));
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, services::blobs::ByteStream};
    use bytes::Bytes;
    use futures::stream;
    use std::sync::Arc;

    async fn state(dir: &tempfile::TempDir) -> AppState {
        let pool = db::connect_in_memory().await.unwrap();
        AppState::new(
            Arc::new(pool),
            dir.path().to_path_buf(),
            "http://localhost:3000".into(),
        )
    }

    #[tokio::test]
    async fn objects_are_served_only_to_their_owner() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        let payload: ByteStream<'static> =
            stream::iter(vec![Ok(Bytes::from_static(b"bob"))]).boxed();
        state.blobs.put("audios/bob/1-a.mp3", payload).await.unwrap();

        let own = get_object(
            State(state.clone()),
            Session::new("bob"),
            Path("audios/bob/1-a.mp3".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(own.status(), StatusCode::OK);

        for (user, path) in [
            ("alice", "audios/bob/1-a.mp3"),
            (".", "audios/./bob/1-a.mp3"),
        ] {
            let Err(err) = get_object(
                State(state.clone()),
                Session::new(user),
                Path(path.to_string()),
            )
            .await
            else {
                panic!("{user} read {path}");
            };
            assert!(err.status.is_client_error(), "{user} {path}: {}", err.status);
        }
    }
}
