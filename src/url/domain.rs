use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL, lowercased, followed by
/// `:port` when the URL names a non-default port. `example.test:8080` and
/// `example.test` are therefore different domains, each with its own quota.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase host, with its explicit port if any
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use normativa_crawler::url::extract_domain;
///
/// let url = Url::parse("https://www.gob.pe/busquedas").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.gob.pe".to_string()));
///
/// let url = Url::parse("https://EXAMPLE.TEST/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.test".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns true when both URLs resolve to the same domain
pub fn same_domain(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
