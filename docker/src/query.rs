//! Layer search-query construction.
//!
//! One query locates the physical files behind every digest of a
//! manifest in a single round trip. The filter shape is fixed:
//!
//! ```text
//! items.find({"repo":"<repo>","$or":[<clause>,...]})
//!     .include("name","repo","path","actual_sha1")
//! ```
//!
//! Checksum-style (sha1) digests match the repository's checksum column
//! directly; content-addressed digests only embed their value in the
//! stored file name, so they match on a name prefix. The `virtual_repos`
//! projection field is requested only when the server is new enough to
//! share layers across virtual repositories.

use crate::digest::Digest;

/// Builds the layer search filter for an ordered digest list.
#[derive(Debug)]
pub struct LayerQueryBuilder<'a> {
    repo: &'a str,
    digests: Vec<&'a Digest>,
    include_virtual_repos: bool,
}

impl<'a> LayerQueryBuilder<'a> {
    pub fn new(repo: &'a str, digests: Vec<&'a Digest>) -> Self {
        Self {
            repo,
            digests,
            include_virtual_repos: false,
        }
    }

    /// Request the `virtual_repos` projection field.
    pub fn include_virtual_repos(mut self, include: bool) -> Self {
        self.include_virtual_repos = include;
        self
    }

    /// Render the filter expression.
    pub fn build(&self) -> String {
        let clauses: Vec<String> = self.digests.iter().map(|d| Self::clause(d)).collect();
        let mut query = format!(
            "items.find({{\"repo\":\"{}\",\"$or\":[{}]}})",
            self.repo,
            clauses.join(",")
        );
        if self.include_virtual_repos {
            query.push_str(".include(\"name\",\"repo\",\"path\",\"actual_sha1\",\"virtual_repos\")");
        } else {
            query.push_str(".include(\"name\",\"repo\",\"path\",\"actual_sha1\")");
        }
        query
    }

    fn clause(digest: &Digest) -> String {
        if digest.is_checksum() {
            format!("{{\"actual_sha1\": \"{}\"}}", digest.hex())
        } else {
            format!("{{\"name\":{{\"$match\": \"{}*\"}}}}", digest.to_file_name())
        }
    }
}
