//! Resource URL construction.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::HarborConfig;

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Joins URL parts with single slashes.
///
/// Surrounding slashes are stripped from every part after the first and
/// empty parts are dropped. The first part only loses trailing slashes, so
/// its scheme survives. The result has no trailing slash.
pub fn join_url(base: &str, parts: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for part in parts {
        let part = part.trim_matches('/');
        if !part.is_empty() {
            url.push('/');
            url.push_str(part);
        }
    }
    url
}

/// Percent-encodes every segment of a `/`-separated path.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn with_trailing_slash(mut url: String) -> String {
    url.push('/');
    url
}

/// API base URLs derived from a [`HarborConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_version_url: String,
    obj_base: String,
    dir_base: String,
    bucket_base: String,
    metadata_base: String,
    move_base: String,
}

impl Endpoints {
    pub fn new(config: &HarborConfig) -> Self {
        let api_version_url = join_url(&config.domain_name, &["api", config.version.as_str()]);
        Self {
            obj_base: join_url(&api_version_url, &[config.obj_api_prefix.as_str()]),
            dir_base: join_url(&api_version_url, &[config.dir_api_prefix.as_str()]),
            bucket_base: join_url(&api_version_url, &[config.bucket_api_prefix.as_str()]),
            metadata_base: join_url(&api_version_url, &["metadata"]),
            move_base: join_url(&api_version_url, &["move"]),
            api_version_url,
        }
    }

    pub fn api_version_url(&self) -> &str {
        &self.api_version_url
    }

    /// `{obj}/{bucket}/{dir_path}/{name}/`
    pub fn object_url(&self, bucket: &str, dir_path: &str, name: &str) -> String {
        self.resource_url(&self.obj_base, bucket, dir_path, name)
    }

    /// `{dir}/{bucket}/{dir_path}/{name}/`
    pub fn dir_url(&self, bucket: &str, dir_path: &str, name: &str) -> String {
        self.resource_url(&self.dir_base, bucket, dir_path, name)
    }

    pub fn bucket_list_url(&self) -> String {
        with_trailing_slash(self.bucket_base.clone())
    }

    pub fn bucket_url(&self, id: u64) -> String {
        with_trailing_slash(join_url(&self.bucket_base, &[id.to_string().as_str()]))
    }

    /// Metadata of an object or directory given by its full path.
    pub fn metadata_url(&self, bucket: &str, path: &str) -> String {
        self.resource_url(&self.metadata_base, bucket, path, "")
    }

    pub fn move_url(&self, bucket: &str, dir_path: &str, name: &str) -> String {
        self.resource_url(&self.move_base, bucket, dir_path, name)
    }

    fn resource_url(&self, base: &str, bucket: &str, dir_path: &str, name: &str) -> String {
        let parts = [encode_path(bucket), encode_path(dir_path), encode_path(name)];
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        with_trailing_slash(join_url(base, &parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new(&HarborConfig::default())
    }

    #[test]
    fn join_strips_and_skips_empty_parts() {
        assert_eq!(join_url("http://h/", &["/a/", "", "b"]), "http://h/a/b");
        assert_eq!(join_url("http://h", &[]), "http://h");
        assert_eq!(join_url("http://h//", &["/"]), "http://h");
    }

    #[test]
    fn api_bases_follow_config() {
        let ep = endpoints();
        assert_eq!(ep.api_version_url(), "http://obs.casearth.cn/api/v1");
        assert_eq!(ep.bucket_list_url(), "http://obs.casearth.cn/api/v1/buckets/");
        assert_eq!(ep.bucket_url(7), "http://obs.casearth.cn/api/v1/buckets/7/");
    }

    #[test]
    fn custom_prefixes() {
        let config = HarborConfig {
            domain_name: "https://harbor.local:8000".into(),
            version: "v2".into(),
            obj_api_prefix: "/objects/".into(),
            ..HarborConfig::default()
        };
        let ep = Endpoints::new(&config);
        assert_eq!(
            ep.object_url("b", "", "f"),
            "https://harbor.local:8000/api/v2/objects/b/f/"
        );
    }

    #[test]
    fn object_url_with_nested_dir() {
        assert_eq!(
            endpoints().object_url("bucket", "/a/b/", "file.bin"),
            "http://obs.casearth.cn/api/v1/obj/bucket/a/b/file.bin/"
        );
    }

    #[test]
    fn object_url_at_bucket_root() {
        assert_eq!(
            endpoints().object_url("bucket", "", "file.bin"),
            "http://obs.casearth.cn/api/v1/obj/bucket/file.bin/"
        );
    }

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(
            endpoints().object_url("bucket", "my dir/sub", "a#b?.txt"),
            "http://obs.casearth.cn/api/v1/obj/bucket/my%20dir/sub/a%23b%3F.txt/"
        );
        assert_eq!(encode_path("数据/x"), "%E6%95%B0%E6%8D%AE/x");
    }

    #[test]
    fn dir_metadata_and_move_urls() {
        let ep = endpoints();
        assert_eq!(
            ep.dir_url("bucket", "a", "b"),
            "http://obs.casearth.cn/api/v1/dir/bucket/a/b/"
        );
        assert_eq!(
            ep.metadata_url("bucket", "a/b/c.txt"),
            "http://obs.casearth.cn/api/v1/metadata/bucket/a/b/c.txt/"
        );
        assert_eq!(
            ep.move_url("bucket", "a", "c.txt"),
            "http://obs.casearth.cn/api/v1/move/bucket/a/c.txt/"
        );
    }
}
