use url::Url;

const IMAGE_EXTENSIONS: [&str; 5] = ["gif", "jpeg", "jpg", "png", "webp"];

/// Public side of the media store: uploaded images live under `base_url`
/// keyed by their relative path, e.g. `posts/cat.gif`.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    base_url: Url,
}

impl MediaStorage {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// A key must be a relative path to an image file. Upload and content
    /// validation happen in the media store itself.
    pub fn is_valid_key(key: &str) -> bool {
        if key.is_empty() || key.starts_with('/') || key.contains('\\') {
            return false;
        }
        if key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return false;
        }

        key.rsplit_once('.')
            .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    pub fn public_url(&self, key: &str) -> Option<String> {
        if !Self::is_valid_key(key) {
            return None;
        }
        self.base_url.join(key).ok().map(String::from)
    }
}
