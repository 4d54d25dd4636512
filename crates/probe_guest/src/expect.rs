//! Assertions.
//!
//! Every matcher reports the actual and expected values to the host *before* deciding the outcome. On success the
//! reported values are cleared again; on failure the guest aborts with a message and the host keeps the values for
//! the failing test's diagnostics.

use probe_core::Trap;

use crate::env::Env;

/// A value that can be reported to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum GuestValue {
    Null,
    Number(f64),
    Str(String),
    /// An opaque byte range, reported by address and length.
    Bytes(Vec<u8>),
}

impl GuestValue {
    fn is_truthy(&self) -> bool {
        match self {
            GuestValue::Null => false,
            GuestValue::Number(n) => *n != 0.0 && !n.is_nan(),
            GuestValue::Str(s) => !s.is_empty(),
            GuestValue::Bytes(_) => true,
        }
    }
}

impl From<f64> for GuestValue {
    fn from(value: f64) -> Self {
        GuestValue::Number(value)
    }
}

impl From<f32> for GuestValue {
    fn from(value: f32) -> Self {
        GuestValue::Number(f64::from(value))
    }
}

impl From<i32> for GuestValue {
    fn from(value: i32) -> Self {
        GuestValue::Number(f64::from(value))
    }
}

impl From<u32> for GuestValue {
    fn from(value: u32) -> Self {
        GuestValue::Number(f64::from(value))
    }
}

impl From<bool> for GuestValue {
    fn from(value: bool) -> Self {
        GuestValue::Number(if value { 1.0 } else { 0.0 })
    }
}

impl From<&str> for GuestValue {
    fn from(value: &str) -> Self {
        GuestValue::Str(value.to_string())
    }
}

impl From<String> for GuestValue {
    fn from(value: String) -> Self {
        GuestValue::Str(value)
    }
}

impl From<&[u8]> for GuestValue {
    fn from(value: &[u8]) -> Self {
        GuestValue::Bytes(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for GuestValue {
    fn from(value: &[u8; N]) -> Self {
        GuestValue::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for GuestValue {
    fn from(value: Vec<u8>) -> Self {
        GuestValue::Bytes(value)
    }
}

impl<T: Into<GuestValue>> From<Option<T>> for GuestValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(GuestValue::Null, Into::into)
    }
}

/// A pending assertion on one actual value. Created by [`Env::expect`].
#[must_use = "an expectation does nothing until a matcher is called"]
pub struct Expectation<'e, 'a> {
    env: &'e mut Env<'a>,
    actual: GuestValue,
    negated: bool,
}

impl<'e, 'a> Expectation<'e, 'a> {
    pub(crate) fn new(env: &'e mut Env<'a>, actual: GuestValue) -> Self {
        Self {
            env,
            actual,
            negated: false,
        }
    }

    /// Invert the next matcher.
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    #[track_caller]
    pub fn to_be(self, expected: impl Into<GuestValue>) -> Result<(), Trap> {
        let expected = expected.into();
        self.env.report_actual(&self.actual)?;
        self.env.report_expected(&expected, self.negated)?;
        let equal = self.actual == expected;
        let message = if self.negated {
            "Expected values not to be equal."
        } else {
            "Expected values to be equal."
        };
        self.settle(equal, message)
    }

    #[track_caller]
    pub fn to_be_null(self) -> Result<(), Trap> {
        let negated = self.negated;
        self.env.report_actual(&self.actual)?;
        self.env.report_expected(&GuestValue::Null, negated)?;
        let is_null = self.actual == GuestValue::Null;
        self.settle(is_null, "Expected value to be null.")
    }

    #[track_caller]
    pub fn to_be_truthy(self) -> Result<(), Trap> {
        let negated = self.negated;
        self.env.report_actual(&self.actual)?;
        self.env
            .with_caller(|host, caller| host.report_expected_truthy(caller, negated));
        let truthy = self.actual.is_truthy();
        self.settle(truthy, "Expected value to be truthy.")
    }

    #[track_caller]
    pub fn to_be_falsy(self) -> Result<(), Trap> {
        let negated = self.negated;
        self.env.report_actual(&self.actual)?;
        self.env
            .with_caller(|host, caller| host.report_expected_falsy(caller, negated));
        let falsy = !self.actual.is_truthy();
        self.settle(falsy, "Expected value to be falsy.")
    }

    #[track_caller]
    pub fn to_be_finite(self) -> Result<(), Trap> {
        let negated = self.negated;
        self.env.report_actual(&self.actual)?;
        self.env
            .with_caller(|host, caller| host.report_expected_finite(caller, negated));
        let finite = matches!(self.actual, GuestValue::Number(n) if n.is_finite());
        self.settle(finite, "Expected value to be finite.")
    }

    #[track_caller]
    pub fn to_be_greater_than(self, bound: f64) -> Result<(), Trap> {
        self.env.report_actual(&self.actual)?;
        self.env.report_expected(&GuestValue::Number(bound), self.negated)?;
        let greater = matches!(self.actual, GuestValue::Number(n) if n > bound);
        self.settle(greater, "Expected value to be greater than the bound.")
    }

    #[track_caller]
    pub fn to_be_less_than(self, bound: f64) -> Result<(), Trap> {
        self.env.report_actual(&self.actual)?;
        self.env.report_expected(&GuestValue::Number(bound), self.negated)?;
        let less = matches!(self.actual, GuestValue::Number(n) if n < bound);
        self.settle(less, "Expected value to be less than the bound.")
    }

    #[track_caller]
    fn settle(self, outcome: bool, message: &str) -> Result<(), Trap> {
        if outcome != self.negated {
            self.env.with_caller(|host, _| host.clear_expected());
            Ok(())
        } else {
            Err(self.env.abort(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(GuestValue::from(3), GuestValue::Number(3.0));
        assert_eq!(GuestValue::from(true), GuestValue::Number(1.0));
        assert_eq!(GuestValue::from("x"), GuestValue::Str("x".to_string()));
        assert_eq!(GuestValue::from(&[1u8, 2]), GuestValue::Bytes(vec![1, 2]));
        assert_eq!(GuestValue::from(None::<i32>), GuestValue::Null);
        assert_eq!(GuestValue::from(Some(2.5)), GuestValue::Number(2.5));
    }

    #[test]
    fn test_truthiness() {
        assert!(!GuestValue::Null.is_truthy());
        assert!(!GuestValue::Number(0.0).is_truthy());
        assert!(!GuestValue::Number(f64::NAN).is_truthy());
        assert!(GuestValue::Number(-1.0).is_truthy());
        assert!(!GuestValue::Str(String::new()).is_truthy());
        assert!(GuestValue::Bytes(Vec::new()).is_truthy());
    }
}
