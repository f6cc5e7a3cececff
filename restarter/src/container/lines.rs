//! Re-splitting raw log chunks into lines

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use std::io;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::io::StreamReader;

use super::LogLineStream;
use crate::errors::ContainerError;

fn line_codec() -> AnyDelimiterCodec {
    AnyDelimiterCodec::new(b"\n".to_vec(), b"\n".to_vec())
}

/// Turn a stream of arbitrary chunks into a stream of `\n`-separated lines.
///
/// A trailing `\r` is dropped and an unterminated last line is still emitted.
/// The first error ends the stream.
pub fn split_lines(
    name: &str,
    chunks: BoxStream<'static, Result<Bytes, ContainerError>>,
) -> LogLineStream {
    let name = name.to_string();
    let reader = StreamReader::new(chunks.map(|chunk| chunk.map_err(io::Error::other)));

    FramedRead::new(reader, line_codec())
        .map(move |line| match line {
            Ok(line) => Ok(line.strip_suffix(b"\r").unwrap_or(&line[..]).to_vec()),
            Err(e) => Err(ContainerError::LogStream {
                name: name.clone(),
                reason: e.to_string(),
            }),
        })
        .boxed()
}
