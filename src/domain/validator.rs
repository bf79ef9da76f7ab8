//! Response validation
//!
//! Gate run before anything is written to either store. Error and timeout
//! text coming back from the LLM backend must never become a cached
//! response, otherwise a transient outage gets replayed to every similar
//! query until the TTL clears it.

/// Substrings that mark a failed generation rather than a real answer
///
/// Backend error strings observed from the Ollama chat path, plus the
/// HTTP status markers its client library embeds in failure text.
const ERROR_MARKERS: &[&str] = &[
    "Timeout na requisição",
    "Erro na chamada do Ollama",
    "Erro ao conectar com Ollama",
    "HTTPConnectionPool",
    "Connection refused",
    "Read timed out",
    "404",
    "500",
    "502",
    "503",
];

/// Minimum trimmed length for a cacheable response
///
/// Anything shorter is presumed to be a truncated or failed generation,
/// not a legitimate short answer.
pub const MIN_RESPONSE_LEN: usize = 10;

/// Decide whether response text is eligible for caching
///
/// Pure predicate; all rules must pass.
pub fn is_cacheable(text: &str) -> bool {
    if ERROR_MARKERS.iter().any(|marker| text.contains(marker)) {
        return false;
    }

    text.trim().len() >= MIN_RESPONSE_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_timeout_marker() {
        assert!(!is_cacheable("Timeout na requisição após 30 segundos"));
    }

    #[test]
    fn test_rejects_connection_failure_markers() {
        assert!(!is_cacheable(
            "Erro ao conectar com Ollama: Connection refused"
        ));
        assert!(!is_cacheable(
            "HTTPConnectionPool(host='localhost', port=11434): Read timed out"
        ));
    }

    #[test]
    fn test_rejects_http_status_markers() {
        assert!(!is_cacheable("Erro na chamada do Ollama: 404 Not Found"));
        assert!(!is_cacheable("The backend returned a 502 Bad Gateway"));
        assert!(!is_cacheable("Service unavailable, got a 503 response"));
    }

    #[test]
    fn test_rejects_short_text() {
        assert!(!is_cacheable("ok"));
        assert!(!is_cacheable(""));
        assert!(!is_cacheable("   padded   "));
    }

    #[test]
    fn test_accepts_text_at_minimum_length() {
        assert!(is_cacheable(&"A".repeat(MIN_RESPONSE_LEN)));
    }

    #[test]
    fn test_accepts_legitimate_response() {
        assert!(is_cacheable(
            "Brasília é a capital do Brasil desde 1960."
        ));
    }

    #[test]
    fn test_rejects_marker_buried_in_long_text() {
        let text = format!(
            "{} Connection refused {}",
            "A".repeat(50),
            "B".repeat(50)
        );

        assert!(!is_cacheable(&text));
    }
}
