use crate::context::ExecContext;
use crate::error::ExecError;
use anyhow::Result;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The callable implementing a command's behavior. Streams, cwd and
/// environment come in through the context; completion is signalled by
/// returning an exit code, never by terminating the process.
pub trait EntryPoint: Send + Sync {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32>;
}

/// Plain closures work as entry points, so implementations can be
/// substituted at runtime without a wrapper type.
impl<F> EntryPoint for F
where
    F: Fn(&[String], &mut ExecContext) -> Result<i32> + Send + Sync,
{
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        self(argv, ctx)
    }
}

/// Immutable registry entry. Replacement swaps whole descriptors, never
/// mutates one in place, so a lookup racing a replace is never torn.
#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub entry: Arc<dyn EntryPoint>,
    /// Commands sharing one implementation that dispatches on `argv[0]`
    /// carry the same group id.
    pub group: Option<String>,
}

/// Name -> descriptor table. Read-mostly; registration and replacement go
/// through the single writer lock.
#[derive(Default)]
pub struct Registry {
    table: RwLock<HashMap<String, Arc<CommandDescriptor>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: &str,
        entry: Arc<dyn EntryPoint>,
        group: Option<&str>,
    ) -> Result<(), ExecError> {
        let mut table = self.table.write().unwrap();
        if table.contains_key(name) {
            return Err(ExecError::RegistrationConflict(name.to_string()));
        }
        table.insert(
            name.to_string(),
            Arc::new(CommandDescriptor {
                name: name.to_string(),
                entry,
                group: group.map(str::to_string),
            }),
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<CommandDescriptor>, ExecError> {
        self.table
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ExecError::CommandNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.read().unwrap().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Swaps in a new implementation. With `all_occurrences` the whole
    /// shared group of the target is rewritten; otherwise only the named
    /// entry, which detaches it from its former group. Concurrent calls
    /// serialize on the writer lock; last writer wins.
    pub fn replace(
        &self,
        name: &str,
        entry: Arc<dyn EntryPoint>,
        all_occurrences: bool,
    ) -> Result<(), ExecError> {
        let mut table = self.table.write().unwrap();
        let target = table
            .get(name)
            .cloned()
            .ok_or_else(|| ExecError::CommandNotFound(name.to_string()))?;

        if all_occurrences {
            if let Some(group) = &target.group {
                let members: Vec<String> = table
                    .values()
                    .filter(|d| d.group.as_deref() == Some(group))
                    .map(|d| d.name.clone())
                    .collect();
                debug!("replacing group '{group}': {members:?}");
                for member in members {
                    table.insert(
                        member.clone(),
                        Arc::new(CommandDescriptor {
                            name: member,
                            entry: entry.clone(),
                            group: Some(group.clone()),
                        }),
                    );
                }
                return Ok(());
            }
        }

        debug!("replacing command '{name}'");
        table.insert(
            name.to_string(),
            Arc::new(CommandDescriptor {
                name: name.to_string(),
                entry,
                group: None,
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit_with(code: i32) -> Arc<dyn EntryPoint> {
        Arc::new(move |_argv: &[String], _ctx: &mut ExecContext| -> Result<i32> { Ok(code) })
    }

    #[test]
    fn lookup_returns_registered_descriptor() {
        let reg = Registry::new();
        reg.register("noop", exit_with(0), None).unwrap();

        let desc = reg.lookup("noop").unwrap();
        assert_eq!(desc.name, "noop");
        assert!(desc.group.is_none());
    }

    #[test]
    fn unknown_name_is_typed_not_found() {
        let reg = Registry::new();
        assert!(matches!(
            reg.lookup("missing"),
            Err(ExecError::CommandNotFound(_))
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let reg = Registry::new();
        reg.register("dup", exit_with(0), None).unwrap();
        let err = reg.register("dup", exit_with(1), None).unwrap_err();
        assert!(matches!(err, ExecError::RegistrationConflict(_)));

        // Registry unchanged: original still resolves.
        assert!(reg.contains("dup"));
    }

    #[test]
    fn names_are_sorted() {
        let reg = Registry::new();
        reg.register("zeta", exit_with(0), None).unwrap();
        reg.register("alpha", exit_with(0), None).unwrap();
        assert_eq!(reg.names(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn single_replace_detaches_from_group() {
        let reg = Registry::new();
        let shared = exit_with(7);
        reg.register("ls", shared.clone(), Some("ls")).unwrap();
        reg.register("dir", shared, Some("ls")).unwrap();

        reg.replace("ls", exit_with(42), false).unwrap();

        let ls = reg.lookup("ls").unwrap();
        let dir = reg.lookup("dir").unwrap();
        assert!(ls.group.is_none());
        assert_eq!(dir.group.as_deref(), Some("ls"));

        let mut ctx = test_ctx();
        assert_eq!(ls.entry.run(&[], &mut ctx).unwrap(), 42);
        assert_eq!(dir.entry.run(&[], &mut ctx).unwrap(), 7);
    }

    #[test]
    fn group_replace_rewrites_all_members() {
        let reg = Registry::new();
        let shared = exit_with(7);
        reg.register("env", shared.clone(), Some("env")).unwrap();
        reg.register("printenv", shared, Some("env")).unwrap();
        reg.register("other", exit_with(9), None).unwrap();

        reg.replace("printenv", exit_with(42), true).unwrap();

        let mut ctx = test_ctx();
        for name in ["env", "printenv"] {
            let desc = reg.lookup(name).unwrap();
            assert_eq!(desc.group.as_deref(), Some("env"));
            assert_eq!(desc.entry.run(&[], &mut ctx).unwrap(), 42);
        }
        // Ungrouped bystander untouched.
        let other = reg.lookup("other").unwrap();
        assert_eq!(other.entry.run(&[], &mut ctx).unwrap(), 9);
    }

    #[test]
    fn group_replace_on_ungrouped_name_behaves_like_single() {
        let reg = Registry::new();
        reg.register("solo", exit_with(1), None).unwrap();
        reg.replace("solo", exit_with(2), true).unwrap();

        let mut ctx = test_ctx();
        let desc = reg.lookup("solo").unwrap();
        assert_eq!(desc.entry.run(&[], &mut ctx).unwrap(), 2);
    }

    fn test_ctx() -> ExecContext {
        use crate::cancel::CancelToken;
        use crate::sandbox::Sandbox;
        use std::sync::Arc;
        ExecContext::new(Arc::new(Sandbox::new()), CancelToken::new())
    }
}
