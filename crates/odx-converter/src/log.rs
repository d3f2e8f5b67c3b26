// crates/odx-converter/src/log.rs

//! Logging helpers that prefix messages with structured context.

/// Types that can describe where a log message comes from.
pub trait LogMetadata {
    fn meta(&self) -> String;
}

/// Context of one conversion run.
pub struct RunContext<'a> {
    pub archive: &'a str,
}

impl LogMetadata for RunContext<'_> {
    fn meta(&self) -> String {
        format!("archive={}", self.archive)
    }
}

/// Context of a single document inside the archive.
pub struct DocContext<'a> {
    pub document: &'a str,
}

impl LogMetadata for DocContext<'_> {
    fn meta(&self) -> String {
        format!("document={}", self.document)
    }
}

// =============================================
// Logging Macros (namespaced under crate::log)
// =============================================

// ===== odx_info! =====
macro_rules! odx_info {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::info!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== odx_warn! =====
macro_rules! odx_warn {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::warn!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== odx_error! =====
macro_rules! odx_error {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::error!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== odx_debug! =====
macro_rules! odx_debug {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::debug!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// Re-export macros for use in other files
pub(crate) use odx_debug;
pub(crate) use odx_error;
pub(crate) use odx_info;
pub(crate) use odx_warn;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_meta() {
        assert_eq!(RunContext { archive: "ecu" }.meta(), "archive=ecu");
        assert_eq!(DocContext { document: "a.odx-d" }.meta(), "document=a.odx-d");
    }
}
