use regex_lite::Regex;
use reqwest::Url;
use std::fmt;

use crate::application::errors::BotError;

/// Identity of the connected bot, fixed by the handshake
#[derive(Debug, Clone)]
pub struct Session {
    pub self_name: String,
    pub self_id: String,
    pub team_name: String,
    pub endpoint: Url,
    mention: Regex,
}

impl Session {
    pub fn new(
        self_name: impl Into<String>,
        self_id: impl Into<String>,
        team_name: impl Into<String>,
        endpoint: Url,
    ) -> Result<Self, BotError> {
        let self_id = self_id.into();
        let pattern = format!(r"^<@{}>:?\s?", regex_lite::escape(&self_id));
        let mention = Regex::new(&pattern)
            .map_err(|e| BotError::Internal(format!("Unable to compile mention pattern {}: {}", pattern, e)))?;

        Ok(Self {
            self_name: self_name.into(),
            self_id,
            team_name: team_name.into(),
            endpoint,
            mention,
        })
    }

    /// Text with the leading `<@SELFID>:` mention removed, or `None` when
    /// the message is not addressed to the bot.
    pub fn strip_mention<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.mention.find(text).map(|m| &text[m.end()..])
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session{{team: {}, name: {}, id: {}}}",
            self.team_name, self.self_name, self.self_id
        )
    }
}
