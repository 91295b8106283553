use crate::media::config::{HTTP_TOO_MANY_REQUESTS, TOO_MANY_REQUESTS_REASON};
use crate::media::engine::MediaErrorCode;
use crate::media::types::{MediaErrorKind, PlaybackPhase};

/// Sticky circuit breaker for rate-limited media hosts.
///
/// Once tripped it stays tripped until the session is dropped; there is no
/// reset.
#[derive(Debug, Clone, Default)]
pub struct RateLimitGuard {
    tripped: bool,
    reason: Option<String>,
}

impl RateLimitGuard {
    pub fn new() -> Self {
        RateLimitGuard::default()
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Returns `true` only for the call that actually trips the guard.
    pub fn trip(&mut self, reason: impl Into<String>) -> bool {
        if self.tripped {
            return false;
        }
        self.tripped = true;
        self.reason = Some(reason.into());
        true
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// A network failure whose transport status (or, lacking one, whose message)
/// says "too many requests".
pub fn is_rate_limit_signal(http_status: Option<u16>, message: &str) -> bool {
    match http_status {
        Some(status) => status == HTTP_TOO_MANY_REQUESTS,
        None => message.to_ascii_lowercase().contains(TOO_MANY_REQUESTS_REASON),
    }
}

pub fn classify_engine_error(
    code: MediaErrorCode,
    http_status: Option<u16>,
    message: &str,
    phase: PlaybackPhase,
) -> MediaErrorKind {
    if is_rate_limit_signal(http_status, message) {
        return MediaErrorKind::NetworkRateLimited;
    }
    match code {
        MediaErrorCode::SrcNotSupported => MediaErrorKind::LoadError,
        _ if phase == PlaybackPhase::Loading => MediaErrorKind::LoadError,
        MediaErrorCode::Unknown => MediaErrorKind::UnknownMediaError,
        MediaErrorCode::Aborted | MediaErrorCode::Network | MediaErrorCode::Decode => {
            MediaErrorKind::PlaybackError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_sticky() {
        let mut guard = RateLimitGuard::new();
        assert!(!guard.is_tripped());
        assert!(guard.trip("HTTP 429"));
        assert!(!guard.trip("second 429"));
        assert!(guard.is_tripped());
        assert_eq!(guard.reason(), Some("HTTP 429"));
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limit_signal(Some(429), ""));
        assert!(!is_rate_limit_signal(Some(503), "Too Many Requests"));
        assert!(is_rate_limit_signal(None, "HTTP error: Too Many Requests"));
        assert!(!is_rate_limit_signal(None, "connection reset"));
    }

    #[test]
    fn test_classification() {
        let cases = [
            (MediaErrorCode::Network, Some(429), PlaybackPhase::Playing, MediaErrorKind::NetworkRateLimited),
            (MediaErrorCode::Network, Some(500), PlaybackPhase::Loading, MediaErrorKind::LoadError),
            (MediaErrorCode::SrcNotSupported, None, PlaybackPhase::Playing, MediaErrorKind::LoadError),
            (MediaErrorCode::Decode, None, PlaybackPhase::Playing, MediaErrorKind::PlaybackError),
            (MediaErrorCode::Unknown, None, PlaybackPhase::Paused, MediaErrorKind::UnknownMediaError),
        ];
        for (code, status, phase, expected) in cases {
            assert_eq!(
                classify_engine_error(code, status, "", phase),
                expected,
                "{:?} / {:?} / {}",
                code,
                status,
                phase
            );
        }
    }
}
