//! Unit test suite

mod validator_test;
