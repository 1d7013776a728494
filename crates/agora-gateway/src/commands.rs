//! Classification of inbound chat text into plain messages and bot commands.
//!
//! Commands are matched case-insensitively against a fixed vocabulary in
//! priority order; the first match wins, so an argument is never
//! reinterpreted as another command.

/// Prompt used when an image command carries no description.
pub const DEFAULT_IMAGE_PROMPT: &str = "a beautiful sunset over the mountains";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Free-form question for the chat-completion service
    Ask { question: String },
    /// Find a song and fetch its audio
    Play { song: String },
    /// Find a video and fetch it
    Video { query: String },
    /// Generate an image from a prompt
    Image { prompt: String },
    /// Look up song lyrics
    Lyrics { title: String },
}

impl BotCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ask { .. } => "ai",
            Self::Play { .. } => "play",
            Self::Video { .. } => "video",
            Self::Image { .. } => "image",
            Self::Lyrics { .. } => "lyrics",
        }
    }

    pub fn argument(&self) -> &str {
        match self {
            Self::Ask { question } => question,
            Self::Play { song } => song,
            Self::Video { query } => query,
            Self::Image { prompt } => prompt,
            Self::Lyrics { title } => title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please provide {what} after {command}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Ordinary chat text, passed through unmodified
    Chat,
    Bot(BotCommand),
    /// A command with a missing argument; no service is called
    Invalid(ValidationError),
}

#[derive(Debug, Clone, Copy)]
enum Directive {
    Ask,
    Play,
    Video,
    Image,
    Lyrics,
}

/// Vocabulary in priority order.
const VOCABULARY: &[(Directive, &[&str])] = &[
    (Directive::Ask, &[".ai", "/ai"]),
    (Directive::Play, &[".play"]),
    (Directive::Video, &[".video"]),
    (Directive::Image, &[".image", "generate image", "create image"]),
    (Directive::Lyrics, &[".lyrics"]),
];

pub fn classify(text: &str) -> Classified {
    let text = text.trim_start();
    for (directive, prefixes) in VOCABULARY {
        for prefix in *prefixes {
            if let Some(rest) = strip_command(text, prefix) {
                return directive.build(rest.trim());
            }
        }
    }
    Classified::Chat
}

impl Directive {
    fn build(self, argument: &str) -> Classified {
        let missing = |command, what| {
            Classified::Invalid(ValidationError::MissingArgument { command, what })
        };
        let arg = argument.to_string();

        match self {
            Self::Ask if arg.is_empty() => missing(".ai", "a question"),
            Self::Ask => Classified::Bot(BotCommand::Ask { question: arg }),
            Self::Play if arg.is_empty() => missing(".play", "a song name"),
            Self::Play => Classified::Bot(BotCommand::Play { song: arg }),
            Self::Video if arg.is_empty() => missing(".video", "a search query"),
            Self::Video => Classified::Bot(BotCommand::Video { query: arg }),
            Self::Lyrics if arg.is_empty() => missing(".lyrics", "a song title"),
            Self::Lyrics => Classified::Bot(BotCommand::Lyrics { title: arg }),
            Self::Image => {
                // "create image of a cat" -> "a cat"
                let prompt = strip_command(argument, "of").map_or(argument, str::trim);
                let prompt = if prompt.is_empty() {
                    DEFAULT_IMAGE_PROMPT.to_string()
                } else {
                    prompt.to_string()
                };
                Classified::Bot(BotCommand::Image { prompt })
            }
        }
    }
}

/// Strip `prefix` (ASCII case-insensitive) when it forms a whole word at the
/// start of `text`.
fn strip_command<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &text[prefix.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        Some(_) => None,
    }
}
