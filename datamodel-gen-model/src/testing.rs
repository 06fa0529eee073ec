use crate::error::{CompileError, CompileResult, LexErrorKind};
use std::fmt::Debug;

/// A wrapper around [`CompileResult`] for writing fluent assertions in tests.
pub struct TestResult<T> {
    inner: CompileResult<T>,
}

impl<T: Debug> TestResult<T> {
    pub fn new(result: CompileResult<T>) -> Self {
        Self { inner: result }
    }

    /// Asserts success and returns the value.
    pub fn assert_success(self) -> T {
        match self.inner {
            Ok(val) => val,
            Err(e) => {
                panic!(
                    "\n🔴 TEST FAILED (Expected Success, but got Error):\nMessage:  {}\nLocation: {:?}\n",
                    e,
                    e.location()
                );
            }
        }
    }

    /// Asserts success and compares the value.
    pub fn assert_success_is<E>(self, expected: E) -> T
    where
        T: PartialEq<E>,
        E: Debug,
    {
        let val = self.assert_success();
        if val != expected {
            panic!(
                "\n🔴 TEST FAILED (Value Mismatch):\nExpected: {:?}\nGot:      {:?}\n",
                expected, val
            );
        }
        val
    }

    /// Asserts failure and returns the error.
    pub fn assert_failure(self) -> CompileError {
        match self.inner {
            Ok(val) => {
                panic!(
                    "\n🔴 TEST FAILED (Expected Failure, but got Success):\nValue: {:?}\n",
                    val
                );
            }
            Err(e) => e,
        }
    }

    /// Asserts failure and checks that the message contains `expected_msg_part`.
    pub fn assert_failure_contains(self, expected_msg_part: &str) -> CompileError {
        let err = self.assert_failure();
        let actual_msg = err.to_string();
        if !actual_msg.contains(expected_msg_part) {
            panic!(
                "\n🔴 TEST FAILED (Error Message Mismatch):\nExpected part: {:?}\nActual msg:    {:?}\nLocation:      {:?}\n",
                expected_msg_part,
                actual_msg,
                err.location()
            );
        }
        err
    }

    /// Asserts that tokenizing failed with `expected`.
    pub fn assert_lexical_failure(self, expected: LexErrorKind) -> CompileError {
        let err = self.assert_failure();
        match &err {
            CompileError::Lexical { kind, .. } if *kind == expected => err,
            other => panic!(
                "\n🔴 TEST FAILED (Expected Lexical Error {:?}):\nGot: {}\n",
                expected, other
            ),
        }
    }

    /// Asserts a syntax failure whose message contains `expected_msg_part`.
    pub fn assert_syntax_failure(self, expected_msg_part: &str) -> CompileError {
        let err = self.assert_failure_contains(expected_msg_part);
        if !err.is_syntax() {
            panic!("\n🔴 TEST FAILED (Expected Syntax Error):\nGot: {}\n", err);
        }
        err
    }

    /// Asserts failure at a 1-based line and column of the grammar text.
    pub fn assert_failure_at(self, line: usize, column: usize) -> CompileError {
        let err = self.assert_failure();
        let location = err.location();
        if (location.line, location.column) != (line, column) {
            panic!(
                "\n🔴 TEST FAILED (Error Location Mismatch):\nExpected: {}:{}\nGot:      {}:{}\nMessage:  {}\n",
                line, column, location.line, location.column, err
            );
        }
        err
    }

    /// Asserts a semantic failure (as opposed to a lexical or syntax one).
    pub fn assert_semantic_failure(self) -> CompileError {
        let err = self.assert_failure();
        if !err.is_semantic() {
            panic!(
                "\n🔴 TEST FAILED (Expected Semantic Error):\nGot: {}\n",
                err
            );
        }
        err
    }
}

pub trait Testable<T> {
    fn test(self) -> TestResult<T>;
}

impl<T: Debug> Testable<T> for CompileResult<T> {
    fn test(self) -> TestResult<T> {
        TestResult::new(self)
    }
}
