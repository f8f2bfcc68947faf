//! Raw authenticated requests.
//!
//! # Usage
//!
//! ```bash
//! ecom get /brands -q page=1 -q size=20
//! ecom upload ./front.png ./back.jpg
//! ```

use std::path::PathBuf;

use ecom_client::services::{UploadService, file_part};

use super::{CliError, Context, print_json};

/// Parse a `key=value` query argument.
///
/// # Errors
///
/// Returns a message for clap if the argument has no `=` or an empty key.
pub fn parse_query_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

/// GET `path` through the pipeline and print the JSON body.
pub async fn get(ctx: &Context, path: &str, query: &[(String, String)]) -> Result<(), CliError> {
    let client = ctx.client()?;
    let body: serde_json::Value = client.get_with_query(path, query).await?;
    print_json(&body)
}

/// Upload `files` and print the returned URLs, one per line.
pub async fn upload(ctx: &Context, files: &[PathBuf]) -> Result<(), CliError> {
    let mut parts = Vec::with_capacity(files.len());
    for path in files {
        parts.push(file_part(path).await?);
    }

    let uploads = UploadService::new(ctx.client()?);
    let urls = uploads.upload_images(parts).await?;
    tracing::info!("Uploaded {} file(s)", urls.len());
    print_json(&urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_pair() {
        assert_eq!(
            parse_query_pair("page=2"),
            Ok(("page".to_owned(), "2".to_owned()))
        );
        assert_eq!(
            parse_query_pair("search=a=b"),
            Ok(("search".to_owned(), "a=b".to_owned()))
        );
        assert_eq!(
            parse_query_pair("empty="),
            Ok(("empty".to_owned(), String::new()))
        );
    }

    #[test]
    fn test_parse_query_pair_rejects_malformed() {
        assert!(parse_query_pair("page").is_err());
        assert!(parse_query_pair("=2").is_err());
    }
}
