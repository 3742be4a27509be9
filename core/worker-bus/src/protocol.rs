//! Wire format for the worker message channel
//!
//! Requests travel as `"<command>(<arg>)"`, replies as `"<topic>:<payload>"`.
//! Both directions are plain text with no escaping; topic and command names
//! are exact and case-sensitive.
//!
//! The legacy format had no way to signal a failure back to the caller, so a
//! malformed request simply vanished. The `Methods.EstimatePI.Error` topic is
//! an extension that closes that gap.

use thiserror::Error;

/// Command name for the estimation request
pub const CMD_ESTIMATE_PI: &str = "EstimatePI";

/// Topic for incremental progress events
pub const TOPIC_PROGRESS: &str = "Events.Pi";

/// Topic for the final result message
pub const TOPIC_RESULT: &str = "Methods.EstimatePI.Result";

/// Topic for error replies (extension over the legacy format)
pub const TOPIC_ERROR: &str = "Methods.EstimatePI.Error";

/// Parse or decode failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("malformed request: {0:?}")]
    MalformedRequest(String),

    #[error("bad argument {arg:?}: {reason}")]
    BadArgument { arg: String, reason: String },

    #[error("unknown topic: {0:?}")]
    UnknownTopic(String),

    #[error("bad payload {payload:?} for topic {topic}")]
    BadPayload { topic: &'static str, payload: String },
}

/// Request sent from the caller side to the worker side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    EstimatePi { iterations: u32 },
}

impl Request {
    /// Serialize to the exact wire string, e.g. `EstimatePI(5000)`
    pub fn encode(&self) -> String {
        match self {
            Request::EstimatePi { iterations } => format!("{CMD_ESTIMATE_PI}({iterations})"),
        }
    }

    /// Strictly parse a raw request string
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let Some((command, rest)) = raw.split_once('(') else {
            return Err(ProtocolError::MalformedRequest(raw.to_string()));
        };
        let command = command.trim();
        if command != CMD_ESTIMATE_PI {
            return Err(ProtocolError::UnknownCommand(command.to_string()));
        }
        let Some(argument) = rest.trim_end().strip_suffix(')') else {
            return Err(ProtocolError::MalformedRequest(raw.to_string()));
        };
        let argument = argument.trim();
        let iterations = argument.parse::<u32>().map_err(|err| ProtocolError::BadArgument {
            arg: argument.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Request::EstimatePi { iterations })
    }
}

/// Reply sent from the worker side back to the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Throttled progress notification carrying the current term index
    Progress { index: u32 },

    /// Final estimate
    Result { value: f64 },

    /// Request rejected on the worker side
    Error { reason: String },
}

impl Reply {
    /// Serialize to the exact wire string, e.g. `Events.Pi:150`
    pub fn encode(&self) -> String {
        match self {
            Reply::Progress { index } => format!("{TOPIC_PROGRESS}:{index}"),
            Reply::Result { value } => format!("{TOPIC_RESULT}:{value}"),
            Reply::Error { reason } => format!("{TOPIC_ERROR}:{reason}"),
        }
    }

    /// Strictly parse a raw reply string
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if let Some(payload) = strip_topic(raw, TOPIC_PROGRESS) {
            let index = payload.parse::<u32>().map_err(|_| ProtocolError::BadPayload {
                topic: TOPIC_PROGRESS,
                payload: payload.to_string(),
            })?;
            return Ok(Reply::Progress { index });
        }
        if let Some(payload) = strip_topic(raw, TOPIC_RESULT) {
            let value = payload.parse::<f64>().map_err(|_| ProtocolError::BadPayload {
                topic: TOPIC_RESULT,
                payload: payload.to_string(),
            })?;
            return Ok(Reply::Result { value });
        }
        if let Some(payload) = strip_topic(raw, TOPIC_ERROR) {
            return Ok(Reply::Error { reason: payload.to_string() });
        }
        Err(ProtocolError::UnknownTopic(raw.to_string()))
    }
}

fn strip_topic<'a>(raw: &'a str, topic: &str) -> Option<&'a str> {
    raw.strip_prefix(topic)?.strip_prefix(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encodes_exact_wire_string() {
        let request = Request::EstimatePi { iterations: 5000 };
        assert_eq!(request.encode(), "EstimatePI(5000)");
    }

    #[test]
    fn test_request_parse_round_trip() {
        let request = Request::EstimatePi { iterations: 1000 };
        assert_eq!(Request::parse(&request.encode()), Ok(request));
    }

    #[test]
    fn test_request_parse_tolerates_whitespace() {
        assert_eq!(
            Request::parse("EstimatePI( 42 )"),
            Ok(Request::EstimatePi { iterations: 42 })
        );
    }

    #[test]
    fn test_request_rejects_unknown_command() {
        assert_eq!(
            Request::parse("Foo(1)"),
            Err(ProtocolError::UnknownCommand("Foo".to_string()))
        );
    }

    #[test]
    fn test_request_rejects_missing_parentheses() {
        assert!(matches!(
            Request::parse("EstimatePI"),
            Err(ProtocolError::MalformedRequest(_))
        ));
        assert!(matches!(
            Request::parse("EstimatePI(5"),
            Err(ProtocolError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_request_rejects_non_integer_argument() {
        assert!(matches!(
            Request::parse("EstimatePI(abc)"),
            Err(ProtocolError::BadArgument { .. })
        ));
        // The argument must be non-negative as well
        assert!(matches!(
            Request::parse("EstimatePI(-3)"),
            Err(ProtocolError::BadArgument { .. })
        ));
    }

    #[test]
    fn test_reply_encodes_exact_wire_strings() {
        assert_eq!(Reply::Progress { index: 150 }.encode(), "Events.Pi:150");
        assert_eq!(
            Reply::Result { value: 3.5 }.encode(),
            "Methods.EstimatePI.Result:3.5"
        );
        assert_eq!(
            Reply::Error { reason: "bad argument".to_string() }.encode(),
            "Methods.EstimatePI.Error:bad argument"
        );
    }

    #[test]
    fn test_reply_parse_round_trip() {
        for reply in [
            Reply::Progress { index: 0 },
            Reply::Result { value: 3.1413926535917938 },
            Reply::Error { reason: "nope".to_string() },
        ] {
            assert_eq!(Reply::parse(&reply.encode()), Ok(reply));
        }
    }

    #[test]
    fn test_reply_rejects_unknown_topic() {
        assert!(matches!(
            Reply::parse("Events.Unknown:1"),
            Err(ProtocolError::UnknownTopic(_))
        ));
        assert!(matches!(
            Reply::parse("Events.Pi"),
            Err(ProtocolError::UnknownTopic(_))
        ));
    }

    #[test]
    fn test_reply_rejects_bad_payload() {
        assert!(matches!(
            Reply::parse("Events.Pi:soon"),
            Err(ProtocolError::BadPayload { .. })
        ));
        assert!(matches!(
            Reply::parse("Methods.EstimatePI.Result:none"),
            Err(ProtocolError::BadPayload { .. })
        ));
    }
}
