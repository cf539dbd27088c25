//! Static resource pools — message templates and GIF urls, read-only
//! after load.
//!
//! File layout matches the data directory convention:
//! `birthday_messages.json` holds `{"BIRTHDAY_MESSAGES": [...]}` and
//! `gifs.json` holds `{"GIFS": [...]}`. Built-in French defaults cover a
//! missing or empty file so an announcement can always be composed.

use rand::seq::SliceRandom;
use serde::Deserialize;
use std::path::Path;

use fetebot_store::JsonStore;

/// Substitution placeholder every template carries exactly once.
pub const USER_PLACEHOLDER: &str = "{user}";

const MESSAGES_FILE: &str = "birthday_messages.json";
const GIFS_FILE: &str = "gifs.json";

const DEFAULT_MESSAGES: &[&str] = &[
    "🎂 Joyeux anniversaire {user} ! Passe une excellente journée ! 🎉",
    "🎉 C'est l'anniversaire de {user} aujourd'hui ! Tous nos vœux !",
    "🥳 Tout le serveur souhaite un très joyeux anniversaire à {user} !",
];

const DEFAULT_GIFS: &[&str] =
    &["https://media.giphy.com/media/g5R9dok94mrIvplmZd/giphy.gif"];

#[derive(Debug, Default, Deserialize)]
struct MessagesFile {
    #[serde(default, rename = "BIRTHDAY_MESSAGES")]
    birthday_messages: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GifsFile {
    #[serde(default, rename = "GIFS")]
    gifs: Vec<String>,
}

/// Message and GIF pools; picks are uniform and independent across calls.
pub struct ResourcePools {
    messages: Vec<String>,
    gifs: Vec<String>,
}

impl ResourcePools {
    /// Load both pools from the resources directory.
    pub fn load(dir: &Path) -> Self {
        let store = JsonStore::new(dir);
        let messages: MessagesFile = store.load(MESSAGES_FILE);
        let gifs: GifsFile = store.load(GIFS_FILE);
        let pools = Self::from_parts(messages.birthday_messages, gifs.gifs);
        tracing::info!(
            "🎁 Resource pools ready: {} messages, {} gifs",
            pools.messages.len(),
            pools.gifs.len()
        );
        pools
    }

    /// Build pools from in-memory lists. Templates missing the `{user}`
    /// placeholder are dropped; empty lists fall back to the defaults.
    pub fn from_parts(messages: Vec<String>, gifs: Vec<String>) -> Self {
        let messages: Vec<String> = messages
            .into_iter()
            .filter(|m| {
                let ok = m.contains(USER_PLACEHOLDER);
                if !ok {
                    tracing::warn!("⚠️ Dropping template without {USER_PLACEHOLDER}: {m}");
                }
                ok
            })
            .collect();
        let messages = if messages.is_empty() {
            DEFAULT_MESSAGES.iter().map(|s| s.to_string()).collect()
        } else {
            messages
        };
        let gifs = if gifs.is_empty() {
            DEFAULT_GIFS.iter().map(|s| s.to_string()).collect()
        } else {
            gifs
        };
        Self { messages, gifs }
    }

    /// Built-in defaults only.
    pub fn builtin() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    pub fn pick_message(&self) -> &str {
        self.messages
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_MESSAGES[0])
    }

    pub fn pick_gif(&self) -> &str {
        self.gifs
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_GIFS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let pools = ResourcePools::load(dir.path());
        assert!(pools.pick_message().contains(USER_PLACEHOLDER));
        assert!(pools.pick_gif().starts_with("https://"));
    }

    #[test]
    fn loads_pools_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("birthday_messages.json"),
            r#"{"BIRTHDAY_MESSAGES": ["Bravo {user} !"]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("gifs.json"),
            r#"{"GIFS": ["https://example.com/party.gif"]}"#,
        )
        .unwrap();
        let pools = ResourcePools::load(dir.path());
        assert_eq!(pools.pick_message(), "Bravo {user} !");
        assert_eq!(pools.pick_gif(), "https://example.com/party.gif");
    }

    #[test]
    fn templates_without_placeholder_are_dropped() {
        let pools = ResourcePools::from_parts(
            vec!["no placeholder here".into(), "Salut {user} !".into()],
            vec!["https://example.com/a.gif".into()],
        );
        for _ in 0..20 {
            assert_eq!(pools.pick_message(), "Salut {user} !");
        }
    }
}
