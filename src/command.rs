//! Chat command parsing.
//!
//! Turns an inbound chat message into a typed [`Command`]. Nothing here does
//! I/O; the responder decides what to do with the result.

use crate::protocol::models::Vendor;

/// An inbound chat message, as the connector sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboundMessage<'a> {
    /// Raw message text.
    pub content: &'a str,
    /// The bot itself sent this message.
    pub from_self: bool,
    /// The bot was mentioned.
    pub mentions_bot: bool,
    /// The message mentions everyone (which also counts as mentioning the bot).
    pub mentions_everyone: bool,
}

impl<'a> InboundMessage<'a> {
    /// A plain message from another user.
    pub fn text(content: &'a str) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }
}

/// What a message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The bot was mentioned directly; reply with a short greeting.
    Greet,
    /// `!<command> help`.
    Help,
    /// A known command with the wrong number of arguments.
    Usage,
    /// `!license` / `!licence`: try WHMCS, then Blesta.
    CheckBoth(String),
    /// `!whmcs`: WHMCS only.
    CheckWhmcs(String),
    /// `!blesta`: Blesta only.
    CheckBlesta(String),
    /// Not for us.
    Ignore,
}

#[derive(Clone, Copy)]
enum Scope {
    Both,
    Single(Vendor),
}

fn scope_for(keyword: &str) -> Option<Scope> {
    match keyword {
        "!license" | "!licence" => Some(Scope::Both),
        "!whmcs" => Some(Scope::Single(Vendor::Whmcs)),
        "!blesta" => Some(Scope::Single(Vendor::Blesta)),
        _ => None,
    }
}

/// Parse a chat message into a command.
pub fn parse(message: &InboundMessage<'_>) -> Command {
    if message.from_self {
        return Command::Ignore;
    }
    if message.mentions_bot && !message.mentions_everyone {
        return Command::Greet;
    }

    let mut words = message.content.split_whitespace();
    let Some(scope) = words.next().and_then(scope_for) else {
        return Command::Ignore;
    };

    let args: Vec<&str> = words.collect();
    let [arg] = args.as_slice() else {
        return Command::Usage;
    };
    if *arg == "help" {
        return Command::Help;
    }

    let domain = normalize_domain(arg);
    match scope {
        Scope::Both => Command::CheckBoth(domain),
        Scope::Single(Vendor::Whmcs) => Command::CheckWhmcs(domain),
        Scope::Single(Vendor::Blesta) => Command::CheckBlesta(domain),
    }
}

/// Reduce user input to a bare hostname.
///
/// Strips a leading `http://` or `https://`, then a leading `www.`, then
/// everything from the first `/`. Idempotent.
pub fn normalize_domain(input: &str) -> String {
    let input = input.trim();
    let without_scheme = input
        .strip_prefix("http://")
        .or_else(|| input.strip_prefix("https://"))
        .unwrap_or(input);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
