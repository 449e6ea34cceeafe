//! Resolves Maven coordinates like `org.apache.solr:solr:war:3.5.0` against a Maven repository
//!  and downloads the artifact, skipping the transfer if an identical file is already present.

pub mod config;
pub mod maven;
pub mod util;
