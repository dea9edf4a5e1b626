//! Logging macros accepting `"key" => value` context pairs
//!
//! Values only need `Display`; they are formatted before being handed to
//! the emitters in `crate::logging`.

/// Log error with a `Code`
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::log_error_with_context($code, $message, &[])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_error_with_context($code, $message, &context)
        }
    };
}

/// Log success with a `Code`
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::log_success_with_context($code, $message, &[])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_success_with_context($code, $message, &context)
        }
    };
}

/// Log warning message
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        $crate::logging::log_warning_with_context($message, &[])
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_warning_with_context($message, &context)
        }
    };
}

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::logging::log_info_with_context($message, &[])
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_info_with_context($message, &context)
        }
    };
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        $crate::logging::log_debug_with_context($message, &[])
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_debug_with_context($message, &context)
        }
    };
}
