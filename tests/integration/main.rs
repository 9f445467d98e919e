//! Integration tests for LinkAtlas
//!
//! These tests run the crawler, queue, and background maintenance against
//! wiremock HTTP servers and scratch graph directories.


mod crawl_tests;
mod manager_tests;
