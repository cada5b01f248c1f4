//! Parsers for measurement file names
//!
//! Daily files carry their date as a `_dYYYYMMDD` token, for example
//! `ops_seis-l1b-sgps_g16_d20200101_v0-0-0.json`.

// nom parser combinators
use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::satisfy;
use nom::combinator::{map_res, not};
use nom::sequence::{preceded, terminated, tuple};
use nom::IResult;

/// Calendar date found in a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// First valid `_dYYYYMMDD` token in a file name, if any
pub(crate) fn file_date(name: &str) -> Option<FileDate> {
    name.match_indices("_d")
        .find_map(|(i, _)| date_token(&name[i..]).ok().map(|(_, date)| date))
        .filter(|date| (1..=12).contains(&date.month) && (1..=31).contains(&date.day))
}

/// `_dYYYYMMDD` not followed by another digit
fn date_token(i: &str) -> IResult<&str, FileDate> {
    let (i, (year, month, day)) = preceded(
        tag("_d"),
        terminated(
            tuple((digits::<u16>(4), digits::<u8>(2), digits::<u8>(2))),
            not(satisfy(|c| c.is_ascii_digit())),
        ),
    )(i)?;
    Ok((i, FileDate { year, month, day }))
}

/// Exactly `n` ascii digits as an integer
fn digits<'a, T: std::str::FromStr>(n: usize) -> impl FnMut(&'a str) -> IResult<&'a str, T> {
    map_res(take_while_m_n(n, n, |c: char| c.is_ascii_digit()), str::parse::<T>)
}
