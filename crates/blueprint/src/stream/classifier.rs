use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DATA_PREFIX: Regex = Regex::new(r"^data:\s*").unwrap();
}

/// Classification of one decoded line of the streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Blank lines, bare `data:` prefixes and keep-alives.
    Noise,
    /// The `data: STREAM_END` marker.
    EndOfStream,
    /// Text that may hold a serialized agent result.
    Data(String),
}

/// Classify one line. The wire format is SSE-flavored but not conformant,
/// so classification stays permissive: stray prefixes and keep-alives are
/// dropped instead of failing the session. Pure function; classifying the
/// same line twice yields the same result.
pub fn classify(line: &str) -> Frame {
    let trimmed = line.trim();

    if trimmed.is_empty()
        || trimmed == "data:"
        || trimmed == "data"
        || trimmed == "ping"
        || trimmed.starts_with(": ping")
    {
        return Frame::Noise;
    }

    if trimmed == "data: STREAM_END" {
        return Frame::EndOfStream;
    }

    let payload = DATA_PREFIX.replace(trimmed, "");
    if !payload.trim_start().starts_with('{') {
        return Frame::Noise;
    }

    Frame::Data(payload.into_owned())
}
