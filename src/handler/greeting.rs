//! Static greeting responder
//!
//! Emits the same fixed HTML document on every invocation. Nothing is read
//! from the request and nothing is kept between invocations.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::http;

/// The greeting page, emitted byte-for-byte on every request.
/// The trailing newline matches the original line-by-line emission.
pub const GREETING_PAGE: &str = "<html>
<head><title>Simple Legacy App</title></head>
<body>
<h1>Hello from a simple legacy Java servlet!</h1>
<p>This app is a demo version for PE.</p>
</body>
</html>
";

/// Build the greeting response: 200, `text/html`, the fixed page.
///
/// HEAD requests get the same status and headers with an empty body.
pub fn serve_greeting(is_head: bool) -> Response<Full<Bytes>> {
    http::build_html_response(GREETING_PAGE, is_head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_is_the_fixed_document() {
        assert!(GREETING_PAGE.starts_with("<html>\n"));
        assert!(GREETING_PAGE.contains("<head><title>Simple Legacy App</title></head>"));
        assert!(GREETING_PAGE.contains("<h1>Hello from a simple legacy Java servlet!</h1>"));
        assert!(GREETING_PAGE.contains("<p>This app is a demo version for PE.</p>"));
        assert!(GREETING_PAGE.ends_with("</html>\n"));
        assert_eq!(GREETING_PAGE.lines().count(), 7);
    }

    #[test]
    fn test_serve_greeting_status_and_headers() {
        let resp = serve_greeting(false);
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("Content-Type").unwrap(), "text/html");
        assert_eq!(
            resp.headers().get("Content-Length").unwrap(),
            &GREETING_PAGE.len().to_string()
        );
    }

    #[test]
    fn test_serve_greeting_is_stateless() {
        let first = serve_greeting(false);
        let second = serve_greeting(false);
        assert_eq!(first.status(), second.status());
        assert_eq!(
            first.headers().get("Content-Type"),
            second.headers().get("Content-Type")
        );
    }
}
