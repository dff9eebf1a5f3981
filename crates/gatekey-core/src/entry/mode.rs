//! Entry-mode selector parsing.
//!
//! Callers name their target with a single selector string. The selector is
//! decided into an [`EntryMode`] exactly once at the boundary so the
//! orchestrator dispatches on an exhaustive enum instead of re-sniffing
//! string prefixes.

use crate::error::Error;

/// Selector prefix for public lobby rooms
pub const LOBBY_PREFIX: &str = "LobbyGame:";
/// Selector prefix for lobby rooms entered through a PC client
pub const PC_LOBBY_PREFIX: &str = "PCLobbyGame:";
/// Selector prefix for network-hosted games
pub const NETWORK_PREFIX: &str = "NetworkGame:";
/// Literal selector for the default main city
pub const MAIN_CITY_SELECTOR: &str = "MainCity";

/// Parsed entry mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryMode {
    /// Public lobby room
    Lobby {
        /// Room identifier: canonical id or search keyword
        room: String,
    },
    /// Lobby room through a re-authenticated PC client
    PcLobby {
        /// Room identifier: canonical id or search keyword
        room: String,
    },
    /// Network-hosted game
    Network {
        /// Game code
        code: String,
    },
    /// Default main city
    MainCity,
    /// Rented dedicated server, addressed by name
    Rental {
        /// Server name
        name: String,
    },
}

impl EntryMode {
    /// Decide the mode for a selector string.
    ///
    /// Prefixes are matched in precedence order; a recognized prefix with an
    /// empty remainder does not match and the selector falls through to the
    /// next candidate, ultimately landing in the rental branch verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] for an empty selector.
    pub fn parse(selector: &str) -> Result<Self, Error> {
        if selector.is_empty() {
            return Err(Error::Precondition("server selector is empty".to_string()));
        }

        if let Some(room) = nonempty_suffix(selector, LOBBY_PREFIX) {
            return Ok(Self::Lobby { room });
        }
        if let Some(room) = nonempty_suffix(selector, PC_LOBBY_PREFIX) {
            return Ok(Self::PcLobby { room });
        }
        if let Some(code) = nonempty_suffix(selector, NETWORK_PREFIX) {
            return Ok(Self::Network { code });
        }
        if selector == MAIN_CITY_SELECTOR {
            return Ok(Self::MainCity);
        }
        Ok(Self::Rental {
            name: selector.to_string(),
        })
    }
}

fn nonempty_suffix(selector: &str, prefix: &str) -> Option<String> {
    selector
        .strip_prefix(prefix)
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

/// Strip the protocol's "no password" placeholder from a password.
///
/// A literal run of six zero characters is the wire convention for "default
/// password"; every such run is removed before the password is sent. The
/// transformation is idempotent.
#[must_use]
pub fn normalize_password(password: &str) -> String {
    password.replace("000000", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_precedence() {
        assert_eq!(
            EntryMode::parse("LobbyGame:RM123").unwrap(),
            EntryMode::Lobby {
                room: "RM123".to_string()
            }
        );
        assert_eq!(
            EntryMode::parse("PCLobbyGame:RM123").unwrap(),
            EntryMode::PcLobby {
                room: "RM123".to_string()
            }
        );
        assert_eq!(
            EntryMode::parse("NetworkGame:G42").unwrap(),
            EntryMode::Network {
                code: "G42".to_string()
            }
        );
        assert_eq!(EntryMode::parse("MainCity").unwrap(), EntryMode::MainCity);
        assert_eq!(
            EntryMode::parse("SurvivalTogether").unwrap(),
            EntryMode::Rental {
                name: "SurvivalTogether".to_string()
            }
        );
    }

    #[test]
    fn test_empty_selector_is_rejected() {
        assert!(matches!(
            EntryMode::parse(""),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn test_bare_prefix_falls_through_to_rental() {
        // A prefix with nothing after it names no room; the selector is
        // treated as a rental-server name verbatim.
        assert_eq!(
            EntryMode::parse("LobbyGame:").unwrap(),
            EntryMode::Rental {
                name: "LobbyGame:".to_string()
            }
        );
        assert_eq!(
            EntryMode::parse("NetworkGame:").unwrap(),
            EntryMode::Rental {
                name: "NetworkGame:".to_string()
            }
        );
    }

    #[test]
    fn test_main_city_must_match_exactly() {
        assert_eq!(
            EntryMode::parse("MainCity2").unwrap(),
            EntryMode::Rental {
                name: "MainCity2".to_string()
            }
        );
    }

    #[test]
    fn test_normalize_password() {
        assert_eq!(normalize_password("000000"), "");
        assert_eq!(normalize_password("ab000000cd"), "abcd");
        assert_eq!(normalize_password("0000000"), "0");
        assert_eq!(normalize_password("secret"), "secret");
    }

    #[test]
    fn test_normalize_password_is_idempotent() {
        for pw in ["000000", "000000000000", "00000", "a000000b000000", "0000000000"] {
            let once = normalize_password(pw);
            assert_eq!(normalize_password(&once), once);
        }
    }
}
