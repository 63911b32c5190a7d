//! Reporter module tests.

mod ledger_test;
