use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::application::errors::HelpParseError;

static HELP_PARSER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ims)^\*(?P<name>\w+)\*:\s+(?P<short>.*?)(?:[.?!]\s?)(?P<long>.*)?$")
        .expect("help parser pattern is valid")
});

/// Help metadata parsed from a command's help text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub name: String,
    pub short: String,
    pub long: String,
}

impl HelpEntry {
    /// Parse `*name*: Short sentence. Long text`.
    ///
    /// A missing final terminator is tolerated and never leaks into `long`;
    /// `short` excludes its terminator. Name and short description are
    /// required.
    pub fn parse(text: &str) -> Result<Self, HelpParseError> {
        let mut source = text.to_string();
        let appended = !source.ends_with('.');
        if appended {
            source.push('.');
        }

        let captures = HELP_PARSER.captures(&source);
        let group = |name: &str| {
            captures
                .as_ref()
                .and_then(|c| c.name(name))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        };

        let mut long = group("long");
        if appended && long.ends_with('.') {
            long.pop();
            long.truncate(long.trim_end().len());
        }

        let entry = Self {
            name: group("name"),
            short: group("short"),
            long,
        };

        if entry.name.is_empty() {
            return Err(HelpParseError::MissingName(text.to_string()));
        }
        if entry.short.is_empty() {
            return Err(HelpParseError::MissingShort(text.to_string()));
        }

        Ok(entry)
    }

    /// `*name*: short`, one line of the command list
    pub fn summary_line(&self) -> String {
        format!("*{}*: {}", self.name, self.short)
    }

    /// Detailed help for `help <name>`
    pub fn detail(&self) -> String {
        format!("_{}_\n\n{}\n{}", self.name.to_uppercase(), self.short, self.long)
    }
}
