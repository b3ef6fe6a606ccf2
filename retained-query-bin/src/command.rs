use retained_query::{Payload, TopicName};

/// One line of the stdin protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PUB <topic> [payload]`, an absent payload clears the topic
    Publish(TopicName, Payload),
    /// `CLEAR <topic>`
    Clear(TopicName),
    /// `QUERY <json body>`
    Query(String),
    /// `FLUSH`
    Flush,
    /// `STATS`
    Stats,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim_start();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim_start()),
            None => (line, ""),
        };
        match cmd.to_ascii_uppercase().as_str() {
            "PUB" => {
                let (topic, payload) = rest.split_once(' ').unwrap_or((rest, ""));
                if topic.is_empty() {
                    return Err("usage: PUB <topic> [payload]".into());
                }
                Ok(Command::Publish(TopicName::from(topic), Payload::copy_from_slice(payload.as_bytes())))
            }
            "CLEAR" => {
                let topic = rest.trim_end();
                if topic.is_empty() {
                    return Err("usage: CLEAR <topic>".into());
                }
                Ok(Command::Clear(TopicName::from(topic)))
            }
            "QUERY" => Ok(Command::Query(rest.to_owned())),
            "FLUSH" => Ok(Command::Flush),
            "STATS" => Ok(Command::Stats),
            _ => Err(format!("unknown command: {cmd}")),
        }
    }
}
