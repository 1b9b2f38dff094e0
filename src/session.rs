// Copyright 2026 Lectern Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::sync::Mutex;

/// One question/answer pair in a session
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

/// Keyed, append-only exchange history. Sessions are created lazily on the
/// first exchange for an unseen key and never expire. Concurrent sessions
/// under distinct keys are safe; a single writer per key is assumed.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Vec<Exchange>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an exchange, creating the session if needed
    pub fn add_exchange(&self, key: &str, user_text: &str, assistant_text: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(key.to_string())
            .or_default()
            .push(Exchange {
                user: user_text.to_string(),
                assistant: assistant_text.to_string(),
            });
    }

    /// Rendered transcript of all exchanges for a key, oldest first, or None
    /// for an unseen key. The exact "User: ..." / "Assistant: ..." form
    /// matters: it is injected verbatim into the system prompt.
    pub fn history(&self, key: &str) -> Option<String> {
        let sessions = self.sessions.lock().unwrap();
        let exchanges = sessions.get(key)?;
        if exchanges.is_empty() {
            return None;
        }

        let lines: Vec<String> = exchanges
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.user, e.assistant))
            .collect();
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_unseen_key_is_none() {
        let store = SessionStore::new();
        assert!(store.history("missing").is_none());
    }

    #[test]
    fn test_exchange_round_trip() {
        let store = SessionStore::new();
        store.add_exchange("s1", "Q", "A");

        let history = store.history("s1").unwrap();
        assert!(history.contains("Q"));
        assert!(history.contains("A"));
    }

    #[test]
    fn test_history_rendering_format() {
        let store = SessionStore::new();
        store.add_exchange("s1", "Hello", "Hi there!");
        store.add_exchange("s1", "How are you?", "Fine.");

        assert_eq!(
            store.history("s1").unwrap(),
            "User: Hello\nAssistant: Hi there!\nUser: How are you?\nAssistant: Fine."
        );
    }

    #[test]
    fn test_sessions_do_not_interfere() {
        let store = SessionStore::new();
        store.add_exchange("a", "question a", "answer a");
        store.add_exchange("b", "question b", "answer b");

        assert!(!store.history("a").unwrap().contains("question b"));
        assert!(!store.history("b").unwrap().contains("question a"));
    }
}
