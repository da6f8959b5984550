use url::Url;

/// Turns stored image references into absolute URLs under a base.
///
/// References that already are absolute URLs pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrls {
    base: Url,
}

impl MediaUrls {
    #[must_use]
    pub fn new(mut base: Url) -> Self {
        // without a trailing slash `join` would replace the last segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base }
    }

    /// Resolve a stored reference; blank or unresolvable references yield `None`.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if let Ok(absolute) = Url::parse(reference) {
            return Some(absolute.into());
        }
        match self.base.join(reference.trim_start_matches('/')) {
            Ok(url) => Some(url.into()),
            Err(err) => {
                tracing::debug!(reference, error = %err, "media reference not resolvable");
                None
            }
        }
    }
}
