//! Routes `tracing` output to the browser console.
//!
//! Each formatted event becomes one console call at the matching level, so
//! warnings show up as warnings in devtools.

#![cfg_attr(not(feature = "web"), allow(dead_code))]

use tracing::Level;

/// Console method an event is written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConsoleLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl From<Level> for ConsoleLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::ERROR => ConsoleLevel::Error,
            Level::WARN => ConsoleLevel::Warn,
            Level::INFO => ConsoleLevel::Info,
            _ => ConsoleLevel::Debug,
        }
    }
}

/// One formatted event as console text, without the trailing newline.
pub(crate) fn console_line(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).trim_end_matches(['\r', '\n']).to_string()
}

#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use std::io;

    use tracing::Metadata;
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::fmt::MakeWriter;
    use tracing_subscriber::prelude::*;
    use wasm_bindgen::JsValue;
    use web_sys::console;

    /// Buffers one event and writes it to the console when dropped.
    pub struct ConsoleWriter {
        level: ConsoleLevel,
        buf: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let line = console_line(&self.buf);
            if line.is_empty() {
                return;
            }
            let line = JsValue::from_str(&line);
            match self.level {
                ConsoleLevel::Error => console::error_1(&line),
                ConsoleLevel::Warn => console::warn_1(&line),
                ConsoleLevel::Info => console::info_1(&line),
                ConsoleLevel::Debug => console::debug_1(&line),
            }
        }
    }

    #[derive(Clone, Copy, Debug, Default)]
    pub struct MakeConsoleWriter;

    impl<'a> MakeWriter<'a> for MakeConsoleWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: ConsoleLevel::Info,
                buf: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: ConsoleLevel::from(*meta.level()),
                buf: Vec::new(),
            }
        }
    }

    /// Install the console subscriber at `INFO`. Later calls, or a
    /// subscriber installed by the host page, win.
    pub fn init_console_logging() {
        // No clock on wasm32-unknown-unknown
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(MakeConsoleWriter)
            .without_time()
            .with_target(false);
        if tracing_subscriber::registry()
            .with(LevelFilter::INFO)
            .with(layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("global subscriber already installed");
        }
    }
}
