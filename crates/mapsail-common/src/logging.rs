use std::io::Write;
use std::sync::Mutex;

use log::debug;

use crate::config::LoggingConfig;
use crate::error::{CommonError, CommonResult};

enum LoggerStatus {
    Uninitialized,
    Initialized,
    Failed,
}

static LOGGER_STATUS: Mutex<LoggerStatus> = Mutex::new(LoggerStatus::Uninitialized);

/// Installs the global logger.
///
/// The filter in the configuration is used unless `RUST_LOG` is set.
/// Calling this function again after a successful initialization is a no-op,
/// so that embedding applications and tests can call it unconditionally.
pub fn init_logger(config: &LoggingConfig) -> CommonResult<()> {
    let mut status = LOGGER_STATUS
        .lock()
        .map_err(|e| CommonError::internal(e.to_string()))?;

    match *status {
        LoggerStatus::Uninitialized => {
            let logger = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(config.filter.as_str()),
            )
            .format(move |buf, record| {
                let level = record.level();
                let target = record.target();
                let style = buf.default_level_style(level);
                let timestamp = buf.timestamp();
                let args = record.args();
                writeln!(buf, "[{timestamp} {style}{level}{style:#} {target}] {args}")
            })
            .build();
            let max_level = logger.filter();
            match log::set_boxed_logger(Box::new(logger)) {
                Ok(()) => {
                    log::set_max_level(max_level);
                    *status = LoggerStatus::Initialized;
                    debug!("logger initialized");
                    Ok(())
                }
                Err(e) => {
                    *status = LoggerStatus::Failed;
                    Err(CommonError::internal(e.to_string()))
                }
            }
        }
        LoggerStatus::Initialized => Ok(()),
        LoggerStatus::Failed => Err(CommonError::internal(
            "logger failed to initialize previously",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_idempotent() {
        let config = LoggingConfig {
            filter: "debug".to_string(),
        };
        assert!(init_logger(&config).is_ok());
        assert!(init_logger(&config).is_ok());
    }
}
