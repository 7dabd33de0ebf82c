//! An [`Engine`] that answers from a script instead of running GRASS.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use cityapp_grass::{Engine, GrassCommand, Result, ToolInvocationError};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub mapset: String,
    pub command: GrassCommand,
}

#[derive(Debug, Clone)]
enum Outcome {
    Output(String),
    Failure(String),
}

#[derive(Debug, Clone)]
struct Rule {
    tool: String,
    flags: Vec<String>,
    params: Vec<(String, String)>,
    mapset: Option<String>,
    outcome: Outcome,
}

impl Rule {
    fn matches(&self, mapset: &str, command: &GrassCommand) -> bool {
        self.tool == command.tool()
            && self.flags.iter().all(|f| command.has_flag(f))
            && self
                .params
                .iter()
                .all(|(k, v)| command.get(k) == Some(v.as_str()))
            && self.mapset.as_deref().map_or(true, |m| m == mapset)
    }

    fn specificity(&self) -> usize {
        self.flags.len() + self.params.len() + usize::from(self.mapset.is_some())
    }
}

/// Scripted stand-in for the GRASS command line.
///
/// Unscripted commands succeed with empty output. The most specific
/// matching rule wins; among equally specific rules the latest one does.
///
/// With [`with_gis_root`](Self::with_gis_root) set, commands that produce
/// files leave a placeholder behind: `ps.map` and `v.out.ogr` write their
/// `output`, and `create_location` writes the new mapset's `WIND`.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    gis_root: Option<PathBuf>,
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<EngineCall>>,
    locations: Mutex<Vec<(String, PathBuf)>>,
}

/// Builder returned by [`ScriptedEngine::on`].
#[must_use = "finish the rule with returns() or fails()"]
pub struct RuleBuilder<'a> {
    engine: &'a ScriptedEngine,
    rule: Rule,
}

impl RuleBuilder<'_> {
    pub fn flag(mut self, flag: &str) -> Self {
        self.rule.flags.push(flag.to_string());
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.rule.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn in_mapset(mut self, mapset: &str) -> Self {
        self.rule.mapset = Some(mapset.to_string());
        self
    }

    pub fn returns(mut self, stdout: &str) {
        self.rule.outcome = Outcome::Output(stdout.to_string());
        lock(&self.engine.rules).push(self.rule);
    }

    /// Exit 1 with `stderr` (a GRASS banner is prepended).
    pub fn fails(mut self, stderr: &str) {
        self.rule.outcome = Outcome::Failure(format!("Starting GRASS GIS...\n{}", stderr));
        lock(&self.engine.rules).push(self.rule);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gis_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.gis_root = Some(root.into());
        self
    }

    pub fn on(&self, tool: &str) -> RuleBuilder<'_> {
        RuleBuilder {
            engine: self,
            rule: Rule {
                tool: tool.to_string(),
                flags: Vec::new(),
                params: Vec::new(),
                mapset: None,
                outcome: Outcome::Output(String::new()),
            },
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.calls).clone()
    }

    /// Tool names in call order.
    pub fn tools(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .map(|c| c.command.tool().to_string())
            .collect()
    }

    pub fn calls_to(&self, tool: &str) -> Vec<EngineCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.command.tool() == tool)
            .cloned()
            .collect()
    }

    /// `(mapset, georef)` of every `create_location` call.
    pub fn locations_created(&self) -> Vec<(String, PathBuf)> {
        lock(&self.locations).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn leave_output_file(&self, command: &GrassCommand) {
        if self.gis_root.is_none() {
            return;
        }
        let placeholder = match command.tool() {
            "ps.map" => "%!PS-Adobe-3.0\n% ps.map query map\n",
            "v.out.ogr" => "GPKG\n",
            _ => return,
        };
        if let Some(output) = command.get("output") {
            let output = Path::new(output);
            if output.parent().is_some_and(Path::is_dir) {
                let _ = fs::write(output, placeholder);
            }
        }
    }
}

impl Engine for ScriptedEngine {
    fn run(&self, mapset: &str, command: &GrassCommand) -> Result<String> {
        debug!(mapset, "scripted {}", command);
        lock(&self.calls).push(EngineCall {
            mapset: mapset.to_string(),
            command: command.clone(),
        });

        let outcome = {
            let rules = lock(&self.rules);
            rules
                .iter()
                .enumerate()
                .filter(|(_, rule)| rule.matches(mapset, command))
                .max_by_key(|(index, rule)| (rule.specificity(), *index))
                .map(|(_, rule)| rule.outcome.clone())
        };

        match outcome {
            Some(Outcome::Failure(stderr)) => Err(ToolInvocationError {
                tool: command.tool().to_string(),
                mapset: mapset.to_string(),
                exit_code: Some(1),
                stderr,
            }
            .into()),
            Some(Outcome::Output(stdout)) => {
                self.leave_output_file(command);
                Ok(stdout)
            }
            None => {
                self.leave_output_file(command);
                Ok(String::new())
            }
        }
    }

    fn create_location(&self, mapset: &str, georef: &Path) -> Result<()> {
        lock(&self.locations).push((mapset.to_string(), georef.to_path_buf()));
        if let Some(root) = &self.gis_root {
            let dir = root.join("global").join(mapset);
            let _ = fs::create_dir_all(&dir);
            let _ = fs::write(dir.join("WIND"), "proj: 3\nzone: 0\n");
        }
        Ok(())
    }
}
