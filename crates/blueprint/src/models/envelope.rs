use serde::{Deserialize, Serialize};

/// Output of one named analysis stage, the atomic unit of incremental
/// rendering. Decoded from a single data frame and stored as one assistant
/// message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEnvelope {
    pub agent_name: String,
    pub output: String,
}

impl AgentEnvelope {
    pub fn new<S: Into<String>, T: Into<String>>(agent_name: S, output: T) -> Self {
        AgentEnvelope {
            agent_name: agent_name.into(),
            output: output.into(),
        }
    }

    /// Serialized form stored as an assistant message's content.
    pub fn to_message_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::new())
    }

    /// Re-extract an envelope from a stored assistant message, so callers
    /// can tell envelope messages apart from plain notices. Tolerates a
    /// stray `data:` prefix left over from the wire.
    pub fn from_message_content(content: &str) -> Option<Self> {
        let mut line = content.trim();
        if let Some(rest) = line.strip_prefix("data:") {
            line = rest.trim();
        }
        let envelope: AgentEnvelope = serde_json::from_str(line).ok()?;
        if envelope.agent_name.trim().is_empty() || envelope.output.trim().is_empty() {
            return None;
        }
        Some(envelope)
    }
}

/// Pull the `output` field out of a serialized envelope; anything else is
/// returned as-is (minus a stray `data:` prefix).
pub fn extract_output(content: &str) -> String {
    let mut line = content.trim();
    if let Some(rest) = line.strip_prefix("data:") {
        line = rest.trim();
    }
    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(value) => match value.get("output").and_then(|v| v.as_str()) {
            Some(output) if !output.is_empty() => output.to_string(),
            _ => line.to_string(),
        },
        Err(_) => line.to_string(),
    }
}

/// Decode JSON-style `\uXXXX` escapes left behind in agent output,
/// including surrogate pairs. Invalid escapes pass through unchanged.
pub fn decode_unicode_escapes(input: &str) -> String {
    fn hex4(s: &str) -> Option<u16> {
        if !s.starts_with("\\u") {
            return None;
        }
        u16::from_str_radix(s.get(2..6)?, 16).ok()
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find("\\u") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match hex4(tail) {
            Some(unit) if (0xD800..=0xDBFF).contains(&unit) => {
                // High surrogate; only meaningful with a low surrogate
                // escaped right behind it.
                if let Some(low) = hex4(&tail[6..]) {
                    if (0xDC00..=0xDFFF).contains(&low) {
                        let combined =
                            0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                        if let Some(c) = char::from_u32(combined) {
                            out.push(c);
                            rest = &tail[12..];
                            continue;
                        }
                    }
                }
                out.push_str(&tail[..6]);
                rest = &tail[6..];
            }
            Some(unit) => match char::from_u32(u32::from(unit)) {
                Some(c) => {
                    out.push(c);
                    rest = &tail[6..];
                }
                None => {
                    out.push_str(&tail[..6]);
                    rest = &tail[6..];
                }
            },
            None => {
                out.push_str("\\u");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}
