//! ---
//! dgr_section: "03-logging"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Structured logging adapters and sinks."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
/// Emit an event at `$level` enriched with a [`LogContext`](crate::LogContext).
#[doc(hidden)]
#[macro_export]
macro_rules! dgr_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            customer = ctx.customer.unwrap_or(""),
            report_date = ctx.report_date.unwrap_or(""),
            cycle = ctx.cycle.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with report context.
#[macro_export]
macro_rules! dgr_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::dgr_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::dgr_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with report context.
#[macro_export]
macro_rules! dgr_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::dgr_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::dgr_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with report context.
#[macro_export]
macro_rules! dgr_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::dgr_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::dgr_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
