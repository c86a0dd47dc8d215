//! Diagnostic strings for HTTP statuses the TNS API is documented to return.

/// Statuses the TNS endpoints are known to emit, with the explanation the
/// operator should see. Anything else gets [`UNDOCUMENTED_ERROR`].
const HTTP_ERRORS: &[(u16, &str)] = &[
    (304, "Error 304: Not Modified: There was no new data to return."),
    (400, "Error 400: Bad Request: The request was invalid."),
    (401, "Error 401: Unauthorized: Double check your TNS credentials"),
    (403, "Error 403: Forbidden: Request understood, but refused."),
    (
        404,
        "Error 404: Not Found: Request invalid or resource does not exist.",
    ),
    (500, "Error 500: Internal Server Error: Contact TNS developers."),
    (503, "Error 503: Unavailable: TNS is unavailable."),
];

/// Diagnostic for a non-200 status outside the documented set.
pub const UNDOCUMENTED_ERROR: &str = "Undocumented error. Retain the report ID to contact the TNS.";

/// Looks up the diagnostic string for a documented HTTP status.
pub fn http_error_text(status: u16) -> Option<&'static str> {
    HTTP_ERRORS
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, text)| *text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_statuses_resolve() {
        for status in [304, 400, 401, 403, 404, 500, 503] {
            assert!(http_error_text(status).is_some(), "status {status}");
        }
    }

    #[test]
    fn catalog_text_is_exact() {
        assert_eq!(
            http_error_text(401),
            Some("Error 401: Unauthorized: Double check your TNS credentials")
        );
        assert_eq!(
            http_error_text(500),
            Some("Error 500: Internal Server Error: Contact TNS developers.")
        );
    }

    #[test]
    fn undocumented_statuses_do_not_resolve() {
        assert_eq!(http_error_text(200), None);
        assert_eq!(http_error_text(418), None);
        assert_eq!(http_error_text(502), None);
    }
}
