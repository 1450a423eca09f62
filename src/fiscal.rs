use chrono::NaiveDate;

use crate::error::{PipelineError, Result, MAX_YEAR, MIN_YEAR};

/// A UK fiscal year: 1 April of the starting calendar year through 31 March
/// of the following one, labelled with the two-digit `YY_YY+1` token used by
/// the expense store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancialYear {
    pub token: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FinancialYear {
    /// Resolve the fiscal year beginning in calendar year `year`.
    ///
    /// Pure function of `year`; the CLI constrains its input range but the
    /// bound is validated here independently.
    pub fn starting(year: i32) -> Result<FinancialYear> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(PipelineError::InvalidYear(year));
        }
        let start =
            NaiveDate::from_ymd_opt(year, 4, 1).ok_or(PipelineError::InvalidYear(year))?;
        let end =
            NaiveDate::from_ymd_opt(year + 1, 3, 31).ok_or(PipelineError::InvalidYear(year))?;
        Ok(FinancialYear {
            token: format!("{:02}_{:02}", year % 100, (year + 1) % 100),
            start,
            end,
        })
    }

    /// Parse a `YY_YY+1` store label back into a fiscal year. The two-digit
    /// years are taken to lie in the 2000s, matching the token bound.
    pub fn from_token(token: &str) -> Result<FinancialYear> {
        let malformed = || PipelineError::MalformedYearToken(token.to_string());
        let (first, second) = token.split_once('_').ok_or_else(malformed)?;
        if first.len() != 2 || second.len() != 2 {
            return Err(malformed());
        }
        let first: i32 = first.parse().map_err(|_| malformed())?;
        let second: i32 = second.parse().map_err(|_| malformed())?;
        if (first + 1) % 100 != second {
            return Err(malformed());
        }
        FinancialYear::starting(2000 + first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_token_and_range() {
        let fy = FinancialYear::starting(2022).unwrap();
        assert_eq!(fy.token, "22_23");
        assert_eq!(fy.start, NaiveDate::from_ymd_opt(2022, 4, 1).unwrap());
        assert_eq!(fy.end, NaiveDate::from_ymd_opt(2023, 3, 31).unwrap());
    }

    #[test]
    fn token_wraps_at_century_end() {
        let fy = FinancialYear::starting(2099).unwrap();
        assert_eq!(fy.token, "99_00");
    }

    #[test]
    fn rejects_years_outside_bound() {
        assert!(matches!(
            FinancialYear::starting(1999),
            Err(PipelineError::InvalidYear(1999))
        ));
        assert!(matches!(
            FinancialYear::starting(2100),
            Err(PipelineError::InvalidYear(2100))
        ));
    }

    #[test]
    fn parses_valid_token() {
        let fy = FinancialYear::from_token("22_23").unwrap();
        assert_eq!(fy, FinancialYear::starting(2022).unwrap());
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in ["2223", "22-23", "22_25", "2_3", "ab_cd", ""] {
            assert!(
                matches!(
                    FinancialYear::from_token(token),
                    Err(PipelineError::MalformedYearToken(_))
                ),
                "token {token:?} should be rejected"
            );
        }
    }
}
