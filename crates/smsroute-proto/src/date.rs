//! Calendar dates in strftime-style templates.

use crate::error::{no_match, DateFormatError, GrammarError, PResult};
use crate::text::one_of_strings;
use chrono::NaiveDate;
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{char, digit1};
use nom::error::ErrorKind;
use std::fmt;
use std::str::FromStr;

/// Template used by [`date`] when the caller has no preference.
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%m/%d/%Y"];

/// A broad list of templates: ISO, US numeric, and month-name forms.
pub const DATE_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2006-10-25
    "%m/%d/%Y", // 10/25/2006
    "%m/%d/%y", // 10/25/06
    "%b %d %Y", // Oct 25 2006
    "%b %d, %Y",
    "%d %b %Y", // 25 Oct 2006
    "%d %b, %Y",
    "%B %d %Y", // October 25 2006
    "%B %d, %Y",
    "%d %B %Y", // 25 October 2006
    "%d %B, %Y",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Years below this two-digit value land in the 2000s.
const CENTURY_PIVOT: i32 = 69;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Year,
    ShortYear,
    Month,
    Day,
    MonthAbbreviation,
    MonthName,
    Literal(char),
}

/// A compiled date template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
    tokens: Vec<Token>,
}

impl DateFormat {
    /// Compile `pattern`, rejecting directives and literals the date parser
    /// cannot match.
    pub fn new(pattern: &str) -> Result<Self, DateFormatError> {
        let mut tokens = Vec::new();
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            let token = match c {
                '%' => match chars.next() {
                    Some('Y') => Token::Year,
                    Some('y') => Token::ShortYear,
                    Some('m') => Token::Month,
                    Some('d') => Token::Day,
                    Some('b') => Token::MonthAbbreviation,
                    Some('B') => Token::MonthName,
                    Some(other) => return Err(DateFormatError::UnsupportedDirective(other)),
                    None => return Err(DateFormatError::DanglingPercent),
                },
                '-' | ',' | '.' | ' ' | '/' => Token::Literal(c),
                other => return Err(DateFormatError::UnsupportedLiteral(other)),
            };
            tokens.push(token);
        }

        if tokens.is_empty() {
            return Err(DateFormatError::Empty);
        }
        Ok(Self {
            pattern: pattern.to_owned(),
            tokens,
        })
    }

    /// Compile every pattern in `patterns`, in order.
    pub fn compile_all(patterns: &[&str]) -> Result<Vec<Self>, DateFormatError> {
        patterns.iter().map(|pattern| Self::new(pattern)).collect()
    }

    /// The template this format was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match the whole template at the start of `input`.
    ///
    /// A match that doesn't name a real calendar day is a miss.
    pub fn parse<'a>(&self, input: &'a str) -> PResult<'a, NaiveDate> {
        let mut year = 1900;
        let mut month = 1;
        let mut day = 1;
        let mut rest = input;

        for token in &self.tokens {
            rest = match *token {
                Token::Literal(c) => char::<_, GrammarError<'a>>(c)(rest)?.0,
                Token::Year => {
                    let (next, digits) = fixed_digits(4)(rest)?;
                    year = number(input, digits)?;
                    next
                }
                Token::ShortYear => {
                    let (next, digits) = fixed_digits(2)(rest)?;
                    let short: i32 = number(input, digits)?;
                    year = if short < CENTURY_PIVOT {
                        2000 + short
                    } else {
                        1900 + short
                    };
                    next
                }
                Token::Month => {
                    let (next, digits) = digits1(rest)?;
                    month = number(input, digits)?;
                    next
                }
                Token::Day => {
                    let (next, digits) = digits1(rest)?;
                    day = number(input, digits)?;
                    next
                }
                Token::MonthAbbreviation => {
                    let (next, found) = one_of_strings(&MONTH_ABBREVIATIONS)(rest)?;
                    month = month_number(&MONTH_ABBREVIATIONS, found);
                    next
                }
                Token::MonthName => {
                    let (next, found) = one_of_strings(&MONTH_NAMES)(rest)?;
                    month = month_number(&MONTH_NAMES, found);
                    next
                }
            };
        }

        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) => Ok((rest, date)),
            None => no_match(input),
        }
    }
}

impl FromStr for DateFormat {
    type Err = DateFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn fixed_digits<'a>(n: usize) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    take_while_m_n(n, n, |c: char| c.is_ascii_digit())
}

fn digits1(input: &str) -> PResult<'_, &str> {
    digit1(input)
}

fn number<'a, N: FromStr>(input: &'a str, digits: &str) -> Result<N, nom::Err<GrammarError<'a>>> {
    digits
        .parse()
        .map_err(|_| nom::Err::Error(GrammarError::syntax(input, ErrorKind::Digit)))
}

fn month_number(names: &[&str; 12], found: &str) -> u32 {
    names
        .iter()
        .position(|name| *name == found)
        .map_or(1, |index| index as u32 + 1)
}

/// Try each format in order; the first that matches a valid date wins.
pub fn date<'f, 'a>(
    formats: &'f [DateFormat],
) -> impl FnMut(&'a str) -> PResult<'a, NaiveDate> + 'f {
    move |input: &'a str| {
        for format in formats {
            match format.parse(input) {
                Err(nom::Err::Error(_)) => continue,
                result => return result,
            }
        }
        no_match(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_format() {
        let formats = DateFormat::compile_all(DEFAULT_DATE_FORMATS).unwrap();
        assert_eq!(date(&formats)("12/31/1999"), Ok(("", ymd(1999, 12, 31))));
        assert!(date(&formats)("1999-12-31").is_err());
    }

    #[test]
    fn test_input_formats() {
        let formats = DateFormat::compile_all(DATE_INPUT_FORMATS).unwrap();
        let mut parse = date(&formats);
        assert_eq!(parse("December 31, 1999"), Ok(("", ymd(1999, 12, 31))));
        assert_eq!(parse("12/31/99"), Ok(("", ymd(1999, 12, 31))));
        assert_eq!(parse("2006-10-25"), Ok(("", ymd(2006, 10, 25))));
        assert_eq!(parse("25 oct 2006"), Ok(("", ymd(2006, 10, 25))));
        assert_eq!(parse("Oct 25, 2006 rest"), Ok((" rest", ymd(2006, 10, 25))));
    }

    #[test]
    fn test_short_year_pivot() {
        let format = DateFormat::new("%m/%d/%y").unwrap();
        assert_eq!(format.parse("01/01/68"), Ok(("", ymd(2068, 1, 1))));
        assert_eq!(format.parse("01/01/69"), Ok(("", ymd(1969, 1, 1))));
        assert_eq!(format.parse("01/01/00"), Ok(("", ymd(2000, 1, 1))));
    }

    #[test]
    fn test_invalid_calendar_day_falls_through() {
        let formats = DateFormat::compile_all(&["%b %d %Y", "%b %d %y"]).unwrap();
        assert!(date(&formats)("Feb 30 2001").is_err());
        assert_eq!(date(&formats[..1])("Feb 28 2001"), Ok(("", ymd(2001, 2, 28))));
    }

    #[test]
    fn test_unsupported_formats() {
        assert_eq!(
            DateFormat::new("%H:%M"),
            Err(DateFormatError::UnsupportedDirective('H'))
        );
        assert_eq!(
            DateFormat::new("%Y:%m"),
            Err(DateFormatError::UnsupportedLiteral(':'))
        );
        assert_eq!(DateFormat::new("%Y%"), Err(DateFormatError::DanglingPercent));
        assert_eq!(DateFormat::new(""), Err(DateFormatError::Empty));
        assert!("%d.%m.%Y".parse::<DateFormat>().is_ok());
    }
}
