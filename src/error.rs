use thiserror::Error;

/// Recoverable pipeline failures. The CLI decides which of these abort the
/// run and which surface as a warning; none of them should panic.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("year {0} is outside the supported range {MIN_YEAR}-{MAX_YEAR}")]
    InvalidYear(i32),

    #[error("malformed financial year token '{0}': expected YY_YY+1, e.g. 22_23")]
    MalformedYearToken(String),

    #[error("no cost categories selected")]
    EmptyCategorySelection,

    #[error("no expense data matched the selection; every constituency totalled zero")]
    NoDataForSelection,

    #[error("constituency {constituency} has overlapping representation periods starting {start}")]
    AmbiguousRepresentation {
        constituency: String,
        start: chrono::NaiveDate,
    },

    #[error("constituency {constituency} has zero distance to the capital")]
    DivisionGuard { constituency: String },

    #[error("no colour ramp for scheme '{scheme}' with {bins} bins")]
    UnknownColourScheme { scheme: String, bins: usize },
}

/// Bounds of the supported fiscal-year range; the two-digit token format
/// only spans one century.
pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2099;

pub type Result<T> = std::result::Result<T, PipelineError>;
