//! Splits a chunked HTTP body into text lines.
//!
//! Both streaming protocols we consume are line oriented (Gemini SSE
//! `data:` lines, Ollama NDJSON). Network chunks do not respect line or
//! UTF-8 boundaries, so bytes are buffered until a `\n` arrives and only
//! complete lines are decoded.

use futures::{Stream, StreamExt, stream};

struct LineState<S> {
    body: S,
    buffer: Vec<u8>,
    finished: bool,
}

/// Turns a stream of byte chunks into a stream of trimmed, non-empty lines.
///
/// A trailing line without `\n` is flushed when the body ends. After an
/// upstream error is yielded the stream ends.
pub(crate) fn split_lines<S, B, E>(body: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]> + Send,
    E: Send,
{
    let state = LineState {
        body,
        buffer: Vec::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(pos) = st.buffer.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = st.buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&raw).trim().to_string();
                if line.is_empty() {
                    continue;
                }
                return Some((Ok(line), st));
            }

            if st.finished {
                if st.buffer.is_empty() {
                    return None;
                }
                let raw = std::mem::take(&mut st.buffer);
                let line = String::from_utf8_lossy(&raw).trim().to_string();
                if line.is_empty() {
                    return None;
                }
                return Some((Ok(line), st));
            }

            match st.body.next().await {
                Some(Ok(chunk)) => st.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    st.finished = true;
                    st.buffer.clear();
                    return Some((Err(e), st));
                }
                None => st.finished = true,
            }
        }
    })
}
