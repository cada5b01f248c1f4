//! Common utility for number formatting
//!
//! These are left public for convenience.
//!
//! Scientific notation is used for log output of large fluence values, and
//! plain decimal output is needed for any file read by source-sampling tools
//! that do not accept exponents.

// standard library
use std::fmt::{Display, LowerExp};

// Alias for the format! macro out of laziness
pub use std::format as f;

/// Extends primitives with more specific formatting options
pub trait NumFormat {
    /// Better scientific number formatting
    ///
    /// The default is not very consistent for scientific in particular, so this
    /// allows easy definition.
    ///
    /// ```rust
    /// # use ptools_format::NumFormat;
    /// assert_eq!((-1.0_f64).sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!(5.52e5_f64.sci(3, 2), "5.520e+05".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;

    /// Plain decimal formatting with trailing zeros removed
    ///
    /// The value is written with `precision` fractional digits and then
    /// trimmed, so there is never an exponent in the output.
    ///
    /// ```rust
    /// # use ptools_format::NumFormat;
    /// assert_eq!(1.25_f64.plain(15), "1.25".to_string());
    /// assert_eq!(2.0_f64.plain(15), "2".to_string());
    /// assert_eq!(1.0e-4_f64.plain(6), "0.0001".to_string());
    /// assert_eq!(1.0e-9_f64.plain(6), "0".to_string());
    /// ```
    fn plain(&self, precision: usize) -> String;
}

impl<T: LowerExp + Display> NumFormat for T {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let mut num = f!("{:.precision$e}", &self, precision = precision);
        // Safe to `unwrap` as `num` is guaranteed to contain `'e'`
        let exp = num.split_off(num.find('e').unwrap());
        // Make sure the exponent is signed
        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', &exp[1..]),
        };
        // Pad the exponent with zeros if needed and put it back on the number
        num.push_str(&f!("e{}{:0>pad$}", sign, exp, pad = exp_pad));
        num
    }

    fn plain(&self, precision: usize) -> String {
        let num = f!("{:.precision$}", &self, precision = precision);
        if !num.contains('.') {
            return num;
        }

        let trimmed = num.trim_end_matches('0').trim_end_matches('.');
        match trimmed {
            "-0" | "" => "0".to_string(),
            s => s.to_string(),
        }
    }
}
