//! Request command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;
use tracing::info;

use concierge_core::error::InvalidInputError;
use concierge_core::{ApiRequest, Method};

use crate::output;
use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Path relative to the API base URL (e.g. /offers)
    pub path: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: Method,

    /// JSON request body
    #[arg(short, long)]
    pub body: Option<String>,

    /// Extra header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Pretty-print the response
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(api: Option<&str>, args: RequestArgs) -> Result<()> {
    let request = build_request(&args)?;
    let ctx = CliContext::open(api)?;

    let result = ctx.client().request(&request).await;

    // The client may have refreshed or ended the session on the way.
    ctx.persist().context("Failed to save session")?;

    match result {
        Ok(response) => {
            info!(status = response.status, "Request succeeded");
            output::body(&response.data, args.pretty)
        }
        Err(e) => {
            output::api_error(&e);
            if ctx.navigator().redirected() {
                bail!("Session ended: {}", e);
            }
            Err(e).context(format!("{} {} failed", request.method, request.path))
        }
    }
}

fn build_request(args: &RequestArgs) -> Result<ApiRequest> {
    let mut request = ApiRequest::new(args.method, args.path.as_str());

    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        request.set_header(name, value);
    }

    if let Some(body) = &args.body {
        let body: Value = serde_json::from_str(body).map_err(|e| InvalidInputError::Body {
            reason: e.to_string(),
        })?;
        request = request.json(body);
    }

    Ok(request)
}

fn parse_header(header: &str) -> Result<(&str, &str), InvalidInputError> {
    let (name, value) = header.split_once(':').ok_or_else(|| InvalidInputError::Header {
        name: header.to_string(),
        reason: "expected 'Name: value'".to_string(),
    })?;

    let name = name.trim();
    if name.is_empty() || name.chars().any(|c| c.is_whitespace()) {
        return Err(InvalidInputError::Header {
            name: name.to_string(),
            reason: "invalid header name".to_string(),
        });
    }
    if name.eq_ignore_ascii_case("authorization") {
        return Err(InvalidInputError::Header {
            name: name.to_string(),
            reason: "set by the client from the saved session".to_string(),
        });
    }

    Ok((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RequestArgs,
    }

    fn parse(argv: &[&str]) -> RequestArgs {
        let mut full = vec!["request"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).args
    }

    #[test]
    fn builds_request_with_body_and_headers() {
        let args = parse(&[
            "/offers",
            "-X",
            "post",
            "--body",
            r#"{"title":"Spa weekend"}"#,
            "-H",
            "X-Request-Source: admin",
        ]);
        let request = build_request(&args).unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body, Some(json!({"title": "Spa weekend"})));
        assert_eq!(request.header_value("x-request-source"), Some("admin"));
    }

    #[test]
    fn defaults_to_get_without_body() {
        let request = build_request(&parse(&["/gallery"])).unwrap();
        assert_eq!(request.method, Method::Get);
        assert!(request.body.is_none());
    }

    #[test]
    fn rejects_malformed_body() {
        let err = build_request(&parse(&["/offers", "--body", "{oops"])).unwrap_err();
        assert!(err.to_string().contains("invalid request body"));
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
        assert!(parse_header("Authorization: Bearer stolen").is_err());
        assert_eq!(parse_header("Accept: text/plain").unwrap(), ("Accept", "text/plain"));
    }

    #[test]
    fn rejects_unknown_method() {
        let result = TestCli::try_parse_from(["request", "/offers", "-X", "FETCH"]);
        assert!(result.is_err());
    }
}
