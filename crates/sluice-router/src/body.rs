//! Capped, restorable request body reads.
//!
//! The body is read into memory only as far as the cap allows. Whatever the
//! outcome, the request is left holding a body that yields the same bytes
//! the client sent, so it can still be forwarded.

use axum::body::{Body, Bytes};
use futures::{StreamExt, stream};

/// Outcome of [`read_restorable`].
#[derive(Debug)]
pub enum BodyRead {
    /// Entire body, at most `limit` bytes.
    Complete(Bytes),
    /// Body exceeds the cap; it was re-assembled for forwarding unread.
    TooLarge { limit: usize },
    /// The body stream failed part way.
    Unreadable(String),
}

/// Read up to `limit` bytes of `body`, leaving an equivalent body in place.
pub async fn read_restorable(body: &mut Body, limit: usize) -> BodyRead {
    let mut stream = std::mem::take(body).into_data_stream();
    let mut buf: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                buf.extend_from_slice(&chunk);
                if buf.len() > limit {
                    let prefix = Bytes::from(buf);
                    *body = Body::from_stream(
                        stream::once(async move { Ok::<_, axum::Error>(prefix) }).chain(stream),
                    );
                    return BodyRead::TooLarge { limit };
                }
            }
            Err(e) => {
                let message = e.to_string();
                // Downstream sees the same prefix followed by the same failure.
                *body = Body::from_stream(stream::iter([Ok(Bytes::from(buf)), Err(e)]));
                return BodyRead::Unreadable(message);
            }
        }
    }

    let bytes = Bytes::from(buf);
    *body = Body::from(bytes.clone());
    BodyRead::Complete(bytes)
}
