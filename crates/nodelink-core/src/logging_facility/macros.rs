//! Boundary logging macros

/// Log the start of an operation
///
/// ```
/// # use nodelink_core::log_op_start;
/// log_op_start!("delete_tree");
/// log_op_start!("delete_tree", collection = "learning_objects", uuid = "lo-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::nodelink_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::nodelink_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use nodelink_core::log_op_end;
/// log_op_end!("delete_tree", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::nodelink_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::nodelink_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error with its stable kind and code
///
/// ```
/// # use nodelink_core::{log_op_error, errors::NodeLinkError};
/// let err = NodeLinkError::not_found("skills", "s1");
/// log_op_error!("load_child_nodes_data", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::nodelink_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::nodelink_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($field)*
        );
    }};
}

/// Wrap an expression returning `Result` in start/end/end_error events
///
/// The trailing fields are attached to all three events. The error arm
/// clones the error for logging and returns the original result untouched.
///
/// ```
/// # use nodelink_core::log_op_boundary;
/// # use nodelink_core::errors::{NodeLinkError, Result};
/// let uuid = "lo-1";
/// let result: Result<usize> = log_op_boundary!("get_child_node_count", Ok::<_, NodeLinkError>(2), uuid = uuid);
/// assert_eq!(result.unwrap(), 2);
/// ```
#[macro_export]
macro_rules! log_op_boundary {
    ($op:expr, $body:expr, $($field:tt)*) => {{
        $crate::log_op_start!($op, $($field)*);
        let start = std::time::Instant::now();
        let result = $body;
        match &result {
            Ok(_) => {
                $crate::log_op_end!(
                    $op,
                    duration_ms = start.elapsed().as_millis() as u64,
                    $($field)*
                );
            }
            Err(err) => {
                $crate::log_op_error!(
                    $op,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    $($field)*
                );
            }
        }
        result
    }};
}
