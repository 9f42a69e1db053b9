//! Pipeline tests against a mock HTTP server.
