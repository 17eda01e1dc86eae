//! Invite links and sharing.
//!
//! An invite is the page URL with a `room=<CODE>` query parameter; the
//! joining client reads it back to pre-fill the join form. It is a
//! convenience, not a credential: the code alone is enough to join.

use imposter_protocol::RoomCode;

/// Query parameter carrying the room code.
pub const ROOM_PARAM: &str = "room";

/// Builds an invite link from `base_url`, replacing any existing `room`
/// parameter and dropping the fragment.
pub fn invite_link(base_url: &str, code: &RoomCode) -> String {
    let without_fragment = base_url.split('#').next().unwrap_or_default();
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let room = format!("{ROOM_PARAM}={code}");
    let mut params: Vec<&str> = query
        .split('&')
        .filter(|p| !p.is_empty() && param_key(p) != ROOM_PARAM)
        .collect();
    params.push(&room);

    format!("{path}?{}", params.join("&"))
}

/// Extracts a valid room code from a URL's `room` parameter.
pub fn room_code_from_url(url: &str) -> Option<RoomCode> {
    let without_fragment = url.split('#').next()?;
    let (_, query) = without_fragment.split_once('?')?;
    query
        .split('&')
        .filter(|p| param_key(p) == ROOM_PARAM)
        .find_map(|p| p.split_once('=').and_then(|(_, v)| RoomCode::parse(v).ok()))
}

fn param_key(param: &str) -> &str {
    param.split('=').next().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Sharing
// ---------------------------------------------------------------------------

/// Why a share channel couldn't be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ShareUnavailable(pub String);

/// Platform hooks for sharing an invite.
pub trait ShareTarget {
    /// Native share sheet.
    fn native_share(&self, title: &str, url: &str) -> Result<(), ShareUnavailable>;

    fn copy_to_clipboard(&self, text: &str) -> Result<(), ShareUnavailable>;
}

/// Which channel ended up carrying the invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Copied,
    /// Neither works here; show the link and ask the user to copy it.
    Unsupported,
}

/// Tries the native share sheet, then the clipboard. Never fails.
pub fn share_invite(target: &impl ShareTarget, title: &str, link: &str) -> ShareOutcome {
    match target.native_share(title, link) {
        Ok(()) => return ShareOutcome::Shared,
        Err(e) => tracing::debug!(error = %e, "native share unavailable"),
    }
    match target.copy_to_clipboard(link) {
        Ok(()) => ShareOutcome::Copied,
        Err(e) => {
            tracing::debug!(error = %e, "clipboard unavailable");
            ShareOutcome::Unsupported
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn code() -> RoomCode {
        RoomCode::parse("K7QX2M").unwrap()
    }

    #[test]
    fn test_invite_link_plain_url() {
        assert_eq!(
            invite_link("https://play.example/imposter", &code()),
            "https://play.example/imposter?room=K7QX2M"
        );
    }

    #[test]
    fn test_invite_link_keeps_other_params_and_replaces_room() {
        assert_eq!(
            invite_link("https://play.example/?lang=es&room=OLD123#top", &code()),
            "https://play.example/?lang=es&room=K7QX2M"
        );
    }

    #[test]
    fn test_room_code_from_url() {
        let link = invite_link("https://play.example/?lang=es", &code());
        assert_eq!(room_code_from_url(&link), Some(code()));
        assert_eq!(room_code_from_url("https://x/?room=k7qx2m"), Some(code()));
    }

    #[test]
    fn test_room_code_from_url_missing_or_bad() {
        assert_eq!(room_code_from_url("https://x/"), None);
        assert_eq!(room_code_from_url("https://x/?lang=en"), None);
        assert_eq!(room_code_from_url("https://x/?room=??"), None);
        assert_eq!(room_code_from_url("https://x/#?room=K7QX2M"), None);
    }

    struct FakeTarget {
        share: bool,
        clipboard: bool,
        copied: RefCell<Option<String>>,
    }

    impl ShareTarget for FakeTarget {
        fn native_share(&self, _title: &str, _url: &str) -> Result<(), ShareUnavailable> {
            if self.share {
                Ok(())
            } else {
                Err(ShareUnavailable("no share sheet".into()))
            }
        }

        fn copy_to_clipboard(&self, text: &str) -> Result<(), ShareUnavailable> {
            if self.clipboard {
                *self.copied.borrow_mut() = Some(text.to_string());
                Ok(())
            } else {
                Err(ShareUnavailable("clipboard blocked".into()))
            }
        }
    }

    fn target(share: bool, clipboard: bool) -> FakeTarget {
        FakeTarget {
            share,
            clipboard,
            copied: RefCell::new(None),
        }
    }

    #[test]
    fn test_share_prefers_native() {
        let t = target(true, true);
        assert_eq!(share_invite(&t, "Join", "link"), ShareOutcome::Shared);
        assert!(t.copied.borrow().is_none());
    }

    #[test]
    fn test_share_falls_back_to_clipboard() {
        let t = target(false, true);
        assert_eq!(share_invite(&t, "Join", "link"), ShareOutcome::Copied);
        assert_eq!(t.copied.borrow().as_deref(), Some("link"));
    }

    #[test]
    fn test_share_unsupported_is_not_an_error() {
        assert_eq!(share_invite(&target(false, false), "Join", "link"), ShareOutcome::Unsupported);
    }
}
