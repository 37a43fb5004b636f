//! Name → command lookup.

use std::collections::BTreeMap;

use crate::engine::commands;
use crate::engine::{AutomationEngine, EngineError, OperationContext};

/// A single named automation.
pub trait AutomationCommand: Send + Sync {
    fn name(&self) -> &'static str;

    fn execute(&self, ctx: &mut OperationContext, args: &[String]) -> Result<i32, EngineError>;
}

/// Engine dispatching to registered [`AutomationCommand`]s by name.
#[derive(Default)]
pub struct AutomationRegistry {
    commands: BTreeMap<&'static str, Box<dyn AutomationCommand>>,
}

impl AutomationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(commands::Noop);
        registry.register(commands::Echo);
        registry.register(commands::CatStdin);
        registry.register(commands::Sleep);
        registry.register(commands::ConfigSummary);
        registry
    }

    /// Add a command, replacing any previous one with the same name.
    pub fn register<C: AutomationCommand + 'static>(&mut self, command: C) {
        self.commands.insert(command.name(), Box::new(command));
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }
}

impl AutomationEngine for AutomationRegistry {
    fn execute(
        &self,
        ctx: &mut OperationContext,
        name: &str,
        args: &[String],
    ) -> Result<i32, EngineError> {
        match self.commands.get(name) {
            Some(command) => command.execute(ctx, args),
            None => Err(EngineError::UnknownAutomation(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Stamp;
    use crate::dispatch::capture::{CaptureBuffer, OperationIo};
    use crate::reload::{ConfigSnapshot, MonitoringConfig};
    use std::io::Cursor;
    use std::sync::Arc;

    fn context() -> OperationContext {
        let output = CaptureBuffer::new();
        let io = OperationIo {
            stdin: Cursor::new(Vec::new()),
            stdout: output.clone(),
            stderr: output,
        };
        let snapshot = Arc::new(ConfigSnapshot::new(MonitoringConfig::default(), Stamp::ZERO, 1));
        OperationContext::new(snapshot, io)
    }

    #[test]
    fn builtins_are_registered_by_name() {
        let registry = AutomationRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["cat-stdin", "config-summary", "echo", "noop", "sleep"]);
    }

    #[test]
    fn unknown_name_is_reported() {
        let registry = AutomationRegistry::with_builtins();
        let err = registry.execute(&mut context(), "discover", &[]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown automation: discover");
        assert_eq!(registry.execute(&mut context(), "noop", &[]).unwrap(), 0);
    }
}
