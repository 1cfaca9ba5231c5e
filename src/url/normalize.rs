use crate::UrlError;
use url::Url;

/// Cleans a URL into the crawler's identity form
///
/// # Cleaning Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only http:// and https://
/// 3. Require a host (the url crate lowercases it)
/// 4. Remove fragment (everything after #)
/// 5. Remove the whole query string
///
/// The path is left as the url crate resolves it, so two links differing only
/// in fragment or query collapse into the same identity.
///
/// # Arguments
///
/// * `url_str` - The URL string to clean
///
/// # Returns
///
/// * `Ok(Url)` - Cleaned URL
/// * `Err(UrlError)` - The URL cannot serve as a crawl identity
///
/// # Examples
///
/// ```
/// use normativa_crawler::url::clean_url;
///
/// let url = clean_url("https://WWW.Example.test/ley?page=2#art-5").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.test/ley");
/// ```
pub fn clean_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    url.set_fragment(None);
    url.set_query(None);

    Ok(url)
}
