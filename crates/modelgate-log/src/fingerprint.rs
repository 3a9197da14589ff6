// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt fingerprints. The log never stores prompt text.

use modelgate_core::{last_user_message, ChatMessage};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `text`.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Fingerprint of the last user turn; an empty string hashes when there is none.
pub fn fingerprint_messages(messages: &[ChatMessage]) -> String {
    fingerprint(last_user_message(messages).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn uses_last_user_turn_only() {
        let a = vec![ChatMessage::user("first"), ChatMessage::assistant("x"), ChatMessage::user("hi")];
        let b = vec![ChatMessage::system("other"), ChatMessage::user("hi")];
        assert_eq!(fingerprint_messages(&a), fingerprint_messages(&b));
        assert_eq!(fingerprint_messages(&a).len(), 64);
        assert_eq!(fingerprint_messages(&[]), fingerprint(""));
    }
}
