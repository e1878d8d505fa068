//! Index log line codec.

use crate::alloc::BlockSpan;

/// Serialize one record as a log line, including the trailing newline.
pub(crate) fn encode_line(id: &str, span: &BlockSpan) -> String {
    format!("{}:{}:{}:{}\n", id, span.block, span.start, span.end)
}

/// Parse one log line into `(id, span)`.
///
/// Returns `None` for anything that is not exactly four colon-separated
/// fields with a non-empty id and numeric offsets. Callers treat such lines
/// as soft corruption and skip them.
pub(crate) fn parse_line(line: &str) -> Option<(String, BlockSpan)> {
    let mut fields = line.split(':');

    let id = fields.next()?;
    let block = fields.next()?.parse().ok()?;
    let start = fields.next()?.parse().ok()?;
    let end = fields.next()?.parse().ok()?;

    if fields.next().is_some() || id.is_empty() {
        return None;
    }

    Some((id.to_string(), BlockSpan { block, start, end }))
}
