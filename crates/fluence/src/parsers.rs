//! Parsers for energy band labels
//!
//! Fluence tables use a bare `<low>-<high>` label, while measurement files
//! carry channel labels such as `T1P1: 1.0-1.9 MeV`.

// nom parser combinators
use nom::bytes::complete::{tag, tag_no_case, take_until};
use nom::character::complete::space0;
use nom::combinator::{all_consuming, opt};
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, separated_pair, terminated, tuple};
use nom::IResult;

type ParseResult<'a, T> = core::result::Result<T, nom::Err<nom::error::Error<&'a str>>>;

/// Complete `<low>-<high>` label with nothing else on it
pub(crate) fn band_label(i: &str) -> ParseResult<(f64, f64)> {
    all_consuming(energy_range)(i).map(|(_, range)| range)
}

/// Complete channel label, ignoring any `<name>:` prefix and `MeV` suffix
pub(crate) fn channel_label(i: &str) -> ParseResult<(f64, f64)> {
    let i = i.trim_matches(char::from(0)).trim();
    all_consuming(channel)(i).map(|(_, range)| range)
}

/// Pair of doubles separated by `-`, allowing whitespace around the separator
fn energy_range(i: &str) -> IResult<&str, (f64, f64)> {
    separated_pair(
        preceded(space0, double),
        delimited(space0, tag("-"), space0),
        double,
    )(i)
}

fn channel(i: &str) -> IResult<&str, (f64, f64)> {
    let (i, _) = opt(terminated(take_until(":"), tag(":")))(i)?;
    terminated(energy_range, tuple((space0, opt(tag_no_case("MeV")))))(i)
}
