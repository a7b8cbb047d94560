//! Integration tests for snapcache.
//!
//! End-to-end cases for the cache lifecycle, the refresh schedule and the
//! HTTP exposure on top of scripted and real upstream data sources.

mod cases_http_test;

pub mod support;
