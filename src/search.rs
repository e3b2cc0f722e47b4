use tracing::debug;

use crate::error::SearchError;
use crate::model::Player;
use crate::remote::PlayerDirectory;

pub const DEFAULT_PROFILE_DOMAIN: &str = "transfermarkt";
const DOMAIN_SUFFIXES: &[&str] = &["com.tr", "com"];
const PROFILE_MARKER: &str = "/profil/spieler/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Player id taken from a profile URL.
    Profile(String),
    Name(String),
}

/// Accepts `http(s)://[www.]<domain>.(com|com.tr)/<slug>/profil/spieler/<digits>`.
#[derive(Debug, Clone)]
pub struct ProfileUrlPattern {
    domain: String,
}

impl Default for ProfileUrlPattern {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE_DOMAIN)
    }
}

impl ProfileUrlPattern {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into().to_ascii_lowercase(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Player id when `url` is a well-formed profile link.
    pub fn player_id(&self, url: &str) -> Option<String> {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        let (host, path) = rest.split_at(rest.find('/')?);

        let host = host.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        let suffix = host
            .strip_prefix(self.domain.as_str())?
            .strip_prefix('.')?;
        if !DOMAIN_SUFFIXES.contains(&suffix) {
            return None;
        }

        let marker = path.rfind(PROFILE_MARKER)?;
        // Slug between the host and the marker must be present: "/<slug>/profil/...".
        if path.get(1..marker).is_none_or(str::is_empty) {
            return None;
        }
        let id = &path[marker + PROFILE_MARKER.len()..];
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(id.to_string())
    }
}

pub struct SearchResolver<'a> {
    directory: &'a dyn PlayerDirectory,
    pattern: ProfileUrlPattern,
}

impl<'a> SearchResolver<'a> {
    pub fn new(directory: &'a dyn PlayerDirectory, pattern: ProfileUrlPattern) -> Self {
        Self { directory, pattern }
    }

    pub fn pattern(&self) -> &ProfileUrlPattern {
        &self.pattern
    }

    pub fn classify(&self, query: &str) -> Result<Query, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery(
                "Enter a player name or profile link".to_string(),
            ));
        }
        if !query.starts_with("http") {
            return Ok(Query::Name(query.to_string()));
        }
        self.pattern
            .player_id(query)
            .map(Query::Profile)
            .ok_or_else(|| {
                SearchError::InvalidQuery(format!(
                    "Invalid {} profile URL",
                    capitalize(self.pattern.domain())
                ))
            })
    }

    /// Always a list: a profile lookup is wrapped into a single-element vector.
    pub fn search(&self, query: &str) -> Result<Vec<Player>, SearchError> {
        match self.classify(query)? {
            Query::Profile(id) => {
                debug!(id, "resolving profile link");
                Ok(vec![self.directory.player(&id)?])
            }
            Query::Name(text) => Ok(self.directory.search(&text)?),
        }
    }

    pub fn similar(&self, player_id: &str) -> Result<Vec<Player>, SearchError> {
        Ok(self.directory.similar(player_id)?)
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
