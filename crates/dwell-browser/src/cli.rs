//! Command Line
//!
//! `dwell <session.json> [--realtime] [--config <config.json>]`

use crate::SessionError;

pub const USAGE: &str = "usage: dwell <session.json> [--realtime] [--config <config.json>]";

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub session_path: String,
    pub config_path: Option<String>,
    pub realtime: bool,
}

impl CliArgs {
    /// Parse arguments, program name excluded
    pub fn parse<I>(args: I) -> Result<Self, SessionError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut session_path = None;
        let mut config_path = None;
        let mut realtime = false;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--realtime" => realtime = true,
                "--config" => match args.next() {
                    Some(path) if !path.starts_with("--") => config_path = Some(path),
                    _ => return Err(SessionError::Usage("--config needs a file".into())),
                },
                flag if flag.starts_with("--") => {
                    return Err(SessionError::Usage(format!("unknown option {flag}")));
                }
                _ if session_path.is_some() => {
                    return Err(SessionError::Usage(format!("unexpected argument {arg}")));
                }
                _ => session_path = Some(arg),
            }
        }

        let Some(session_path) = session_path else {
            return Err(SessionError::Usage("missing session file".into()));
        };
        Ok(Self { session_path, config_path, realtime })
    }
}
