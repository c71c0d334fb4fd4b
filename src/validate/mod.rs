//! Input checks that guard the pipeline's invariants.

mod names;
mod numeric;
mod shape;

pub use names::{
    check_column_names, RESERVED_FEATURE_COLUMNS, RESERVED_SAMPLE_COLUMNS,
};
pub use numeric::{check_json_safe, MAX_SAFE_MAGNITUDE};
pub use shape::validate_shape;
