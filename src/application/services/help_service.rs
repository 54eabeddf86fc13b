use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashMap;

use crate::domain::entities::{CommandRegistry, HelpEntry};

static HELP_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^help(?:\s(?P<cmd_name>.*))?$").expect("help trigger pattern is valid")
});

const LIST_HEADER: &str = "_List Of Commands_";
const HELP_SELF_LINE: &str = "*help*:  Displays this help message.";

/// A `help` request addressed to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpRequest {
    List,
    Topic(String),
}

impl HelpRequest {
    /// Recognise `help` or `help <name>`
    pub fn parse(text: &str) -> Option<Self> {
        let captures = HELP_TRIGGER.captures(text)?;
        match captures.name("cmd_name").map(|m| m.as_str().trim()) {
            Some(name) if !name.is_empty() => Some(HelpRequest::Topic(name.to_string())),
            _ => Some(HelpRequest::List),
        }
    }
}

/// Help entries parsed from the registry at startup
#[derive(Debug, Clone, Default)]
pub struct HelpService {
    entries: Vec<HelpEntry>,
    index: HashMap<String, usize>,
}

impl HelpService {
    /// Parse every command's help text. Commands whose help cannot be
    /// parsed are logged and left out; they still match normally.
    pub fn from_registry(registry: &CommandRegistry) -> Self {
        let mut service = Self::default();
        for command in registry.all() {
            match HelpEntry::parse(&command.help()) {
                Ok(entry) => service.insert(entry),
                Err(e) => tracing::warn!("Help unavailable for {}: {}", command.label(), e),
            }
        }
        service
    }

    fn insert(&mut self, entry: HelpEntry) {
        if let Some(&existing) = self.index.get(&entry.name) {
            tracing::warn!("Duplicate help entry for {}, keeping the latest", entry.name);
            self.entries[existing] = entry;
            return;
        }
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&HelpEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reply text for a help request
    pub fn respond(&self, request: &HelpRequest) -> String {
        match request {
            HelpRequest::List => self.render_list(),
            HelpRequest::Topic(name) => self.render_topic(name),
        }
    }

    pub fn render_list(&self) -> String {
        let mut lines = vec![LIST_HEADER.to_string(), HELP_SELF_LINE.to_string()];
        lines.extend(self.entries.iter().map(HelpEntry::summary_line));
        lines.join("\n")
    }

    pub fn render_topic(&self, name: &str) -> String {
        match self.get(name) {
            Some(entry) => entry.detail(),
            None => format!("Sorry, there's no command called {}.", name),
        }
    }
}
