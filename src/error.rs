use thiserror::Error;

pub type OchreResult<T> = Result<T, OchreError>;

#[derive(Debug, Error)]
pub enum OchreError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors in the input table: schema, ordering, and DataFrame operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Missing required column: '{0}'")]
    MissingColumn(String),

    #[error("Column '{col}' has dtype {actual}, expected {expected}")]
    ColumnDtype {
        col: String,
        expected: String,
        actual: String,
    },

    #[error("Input table is empty")]
    EmptyTable,

    #[error("Duplicate timestamp in '{col}' at row {row}")]
    DuplicateTimestamp { col: String, row: usize },

    #[error("Non-monotonic timestamp in '{col}' at row {row}")]
    NonMonotonicTimestamp { col: String, row: usize },

    #[error("Null timestamp in '{col}' at row {row}")]
    NullTimestamp { col: String, row: usize },

    #[error("Data frame error: {0}")]
    DataFrame(String),
}

/// Errors in feature computation and labeling.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Series too short: {rows} rows, largest lookback window is {window}")]
    SeriesTooShort { rows: usize, window: usize },

    #[error("Degenerate distribution fit: {0}")]
    DegenerateFit(String),

    #[error("Invalid quantile configuration (lower: {lower}, upper: {upper})")]
    InvalidQuantiles { lower: f64, upper: f64 },

    #[error("Invalid window size: {0}")]
    InvalidWindow(String),
}

/// Errors related to file I/O and artifact rendering.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Failed to write data: {0}")]
    WriteFailed(String),

    #[error("Failed to read data: {0}")]
    ReadFailed(String),

    #[error("Failed to render plot: {0}")]
    PlotRender(String),
}
