use serde::Deserialize;

use crate::models::envelope::AgentEnvelope;

#[derive(Deserialize)]
struct RawEnvelope {
    agent_name: String,
    output: String,
}

/// Attempt to decode a data payload into an agent result.
///
/// Both fields must be non-empty strings after trimming. Malformed JSON and
/// missing or empty fields drop the frame; the stream carries on. Pure
/// function; parsing the same payload twice yields the same result.
pub fn parse_envelope(payload: &str) -> Option<AgentEnvelope> {
    let raw: RawEnvelope = match serde_json::from_str(payload) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::debug!(%err, "failed to parse data frame");
            return None;
        }
    };

    let agent_name = raw.agent_name.trim();
    let output = raw.output.trim();
    if agent_name.is_empty() || output.is_empty() {
        tracing::debug!("dropping envelope with empty fields");
        return None;
    }

    Some(AgentEnvelope::new(agent_name, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_envelope() {
        let envelope =
            parse_envelope("{\"agent_name\": \"Planner\", \"output\": \"Use microservices\"}")
                .unwrap();
        assert_eq!(envelope.agent_name, "Planner");
        assert_eq!(envelope.output, "Use microservices");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let envelope =
            parse_envelope("{\"agent_name\": \"  Planner \", \"output\": \" plan \"}").unwrap();
        assert_eq!(envelope.agent_name, "Planner");
        assert_eq!(envelope.output, "plan");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let envelope =
            parse_envelope("{\"agent_name\": \"A\", \"output\": \"o\", \"step\": 3}").unwrap();
        assert_eq!(envelope.agent_name, "A");
    }

    #[test]
    fn test_malformed_json_is_dropped() {
        assert_eq!(parse_envelope("{not json}"), None);
        assert_eq!(parse_envelope("[1, 2]"), None);
        assert_eq!(parse_envelope(""), None);
    }

    #[test]
    fn test_missing_or_empty_fields_are_dropped() {
        assert_eq!(parse_envelope("{\"agent_name\": \"Planner\"}"), None);
        assert_eq!(parse_envelope("{\"output\": \"x\"}"), None);
        assert_eq!(
            parse_envelope("{\"agent_name\": \"  \", \"output\": \"x\"}"),
            None
        );
        assert_eq!(
            parse_envelope("{\"agent_name\": \"A\", \"output\": \"\"}"),
            None
        );
    }

    #[test]
    fn test_non_string_fields_are_dropped() {
        assert_eq!(parse_envelope("{\"agent_name\": 1, \"output\": \"x\"}"), None);
        assert_eq!(
            parse_envelope("{\"agent_name\": \"A\", \"output\": null}"),
            None
        );
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let payload = "{\"agent_name\": \"A\", \"output\": \"o\"}";
        assert_eq!(parse_envelope(payload), parse_envelope(payload));
    }
}
