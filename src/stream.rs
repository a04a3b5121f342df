//! Parsing values read from an async stream
//!
//! The value is read up to a delimiter and then parsed by the synchronous
//! path, so the read is the only suspension point.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::{GrammarError, Result};
use crate::grammar::GrammarContext;
use crate::types::GrammarType;
use crate::value::Value;

/// Read the stream up to (and including) the delimiter and parse what
/// precedes it, prefixed by `start`
pub async fn parse_from_stream<R>(
    ty: &dyn GrammarType,
    reader: &mut R,
    up_to: &str,
    start: Option<&str>,
) -> Result<Value>
where
    R: AsyncBufRead + Unpin,
{
    parse_from_stream_with(ty, reader, up_to, start, &GrammarContext::default(), true).await
}

pub async fn parse_from_stream_with<R>(
    ty: &dyn GrammarType,
    reader: &mut R,
    up_to: &str,
    start: Option<&str>,
    ctx: &GrammarContext,
    whole_string: bool,
) -> Result<Value>
where
    R: AsyncBufRead + Unpin,
{
    let text = read_until_delimiter(reader, up_to).await?;
    let text = match start {
        Some(start) => format!("{}{}", start, text),
        None => text,
    };
    ty.parse_with(&text, ctx, whole_string)
}

async fn read_until_delimiter<R>(reader: &mut R, up_to: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let delimiter = up_to.as_bytes();
    let Some(&last) = delimiter.last() else {
        return Err(GrammarError::Option("The delimiter can not be empty".to_string()));
    };
    let mut buffer = Vec::new();
    loop {
        if reader.read_until(last, &mut buffer).await? == 0 {
            return Err(GrammarError::UnexpectedEof(up_to.to_string()));
        }
        if buffer.ends_with(delimiter) {
            break;
        }
    }
    buffer.truncate(buffer.len() - delimiter.len());
    log::trace!("Read {} bytes up to {:?}", buffer.len(), up_to);
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}
