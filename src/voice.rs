/// Spoken output half of the host bridge. Absent when the page runs without
/// the native host.
pub trait VoiceOutput {
    fn speak(&self, text: &str);
}

/// A command the host bridge recognised (or failed to). Mirrors the bridge's
/// signal set: set source, set destination, get path, route start/stop, and
/// the unrecognised fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceCommand {
    SetSource {
        building: Option<String>,
        query: String,
    },
    SetDestination {
        building: Option<String>,
        query: String,
    },
    GetPath,
    RouteStart,
    RouteStop,
    Unrecognized {
        message: String,
    },
}

/// Parse one spoken-style line into a command. Used by the console bridge;
/// a native host posts [`VoiceCommand`]s directly.
pub fn parse_command(line: &str) -> VoiceCommand {
    let trimmed = line.trim();
    let lowered = trimmed.to_ascii_lowercase();

    if let Some(rest) = strip_phrase(&lowered, trimmed, "set source") {
        if !rest.is_empty() {
            return VoiceCommand::SetSource {
                building: Some(rest.to_string()),
                query: rest.to_string(),
            };
        }
    }
    if let Some(rest) = strip_phrase(&lowered, trimmed, "set destination") {
        if !rest.is_empty() {
            return VoiceCommand::SetDestination {
                building: Some(rest.to_string()),
                query: rest.to_string(),
            };
        }
    }
    match lowered.as_str() {
        "get path" => VoiceCommand::GetPath,
        "start route" | "route start" => VoiceCommand::RouteStart,
        "end route" | "stop route" | "route stop" => VoiceCommand::RouteStop,
        _ => VoiceCommand::Unrecognized {
            message: trimmed.to_string(),
        },
    }
}

/// Case-insensitive prefix match that hands back the original-cased remainder.
fn strip_phrase<'a>(lowered: &str, original: &'a str, phrase: &str) -> Option<&'a str> {
    if !lowered.starts_with(phrase) {
        return None;
    }
    let tail = &original[phrase.len()..];
    if !tail.is_empty() && !tail.starts_with(char::is_whitespace) {
        return None;
    }
    Some(tail.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set_source_with_query() {
        assert_eq!(
            parse_command("set source Cathedral of Learning"),
            VoiceCommand::SetSource {
                building: Some("Cathedral of Learning".to_string()),
                query: "Cathedral of Learning".to_string(),
            }
        );
    }

    #[test]
    fn parses_set_destination_case_insensitively() {
        assert_eq!(
            parse_command("Set Destination Hillman Library"),
            VoiceCommand::SetDestination {
                building: Some("Hillman Library".to_string()),
                query: "Hillman Library".to_string(),
            }
        );
    }

    #[test]
    fn parses_lifecycle_commands() {
        assert_eq!(parse_command("get path"), VoiceCommand::GetPath);
        assert_eq!(parse_command("Start Route"), VoiceCommand::RouteStart);
        assert_eq!(parse_command("end route"), VoiceCommand::RouteStop);
        assert_eq!(parse_command("stop route"), VoiceCommand::RouteStop);
    }

    #[test]
    fn unknown_input_is_unrecognized() {
        assert_eq!(
            parse_command("order a pizza"),
            VoiceCommand::Unrecognized {
                message: "order a pizza".to_string(),
            }
        );
    }

    #[test]
    fn bare_set_source_is_unrecognized() {
        assert!(matches!(
            parse_command("set source"),
            VoiceCommand::Unrecognized { .. }
        ));
    }
}
