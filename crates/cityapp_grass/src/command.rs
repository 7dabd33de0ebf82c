//! Structured GRASS command lines.
//!
//! Values go to the engine as single argv entries, so a predicate like
//! `area_m2 > 100 AND name = 'x'` needs no quoting and cannot break out
//! into a shell.

use std::fmt;

/// One GRASS tool invocation: `tool [-flags] key=value ... [--overwrite]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrassCommand {
    tool: String,
    flags: Vec<String>,
    params: Vec<(String, String)>,
    overwrite: bool,
}

impl GrassCommand {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            flags: Vec::new(),
            params: Vec::new(),
            overwrite: false,
        }
    }

    /// Add a single-dash flag such as `-f` or `-cg`.
    pub fn flag(mut self, flag: &str) -> Self {
        let flag = flag.trim_start_matches('-');
        self.flags.push(format!("-{}", flag));
        self
    }

    pub fn param(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        let wanted = format!("-{}", flag.trim_start_matches('-'));
        self.flags.iter().any(|f| *f == wanted)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Argument vector passed after `--exec`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(2 + self.flags.len() + self.params.len());
        args.push(self.tool.clone());
        args.extend(self.flags.iter().cloned());
        args.extend(self.params.iter().map(|(k, v)| format!("{}={}", k, v)));
        if self.overwrite {
            args.push("--overwrite".to_string());
        }
        args
    }
}

/// Log-friendly rendering; values with spaces are shown quoted.
impl fmt::Display for GrassCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tool)?;
        for flag in &self.flags {
            write!(f, " {}", flag)?;
        }
        for (key, value) in &self.params {
            if value.contains(char::is_whitespace) {
                write!(f, " {}=\"{}\"", key, value)?;
            } else {
                write!(f, " {}={}", key, value)?;
            }
        }
        if self.overwrite {
            f.write_str(" --overwrite")?;
        }
        Ok(())
    }
}
