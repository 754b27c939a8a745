//! Shared limits and format strings.

/// Maximum number of rows shown in the tabular report view.
pub const TABLE_ROW_LIMIT: usize = 30;

/// Maximum number of points in a chart series; older points are dropped.
pub const CHART_POINT_LIMIT: usize = 20;

/// A pressure chart needs at least this many readings to be meaningful.
pub const MIN_PRESSURE_POINTS: usize = 2;

/// Label that marks an embedded blood-pressure reading inside a note.
pub const PRESSURE_LABEL: &str = "Pressure:";

/// Timestamp format used in storage and in backup artifacts.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
