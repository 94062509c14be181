//! Integration-style tests for the public broker contract

mod concurrent;
