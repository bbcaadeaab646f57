//! Command handler registry.
//!
//! Populated once at startup, then shared behind an `Arc` by the secure and
//! public workers. Workers only ever see `&HandlerRegistry`, so a running
//! worker cannot observe a partially built table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ports::QueryHandler;

/// Maps command names to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn QueryHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an ordered list of bindings.
    ///
    /// Later bindings for the same command replace earlier ones.
    #[must_use]
    pub fn from_bindings<I, S>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (S, Arc<dyn QueryHandler>)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        registry.load(bindings);
        registry
    }

    /// Insert or replace the handler for `command`.
    ///
    /// Returns the replaced handler, if any.
    pub fn attach(
        &mut self,
        command: impl Into<String>,
        handler: Arc<dyn QueryHandler>,
    ) -> Option<Arc<dyn QueryHandler>> {
        self.handlers.insert(command.into(), handler)
    }

    /// Attach every binding in order.
    pub fn load<I, S>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (S, Arc<dyn QueryHandler>)>,
        S: Into<String>,
    {
        for (command, handler) in bindings {
            self.attach(command, handler);
        }
    }

    pub fn lookup(&self, command: &str) -> Option<&Arc<dyn QueryHandler>> {
        self.handlers.get(command)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut commands: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        commands.sort_unstable();
        commands
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("commands", &self.commands())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Request;
    use crate::service::Responder;
    use proptest::prelude::*;

    fn tagged(tag: usize) -> Arc<dyn QueryHandler> {
        Arc::new(move |_request: Request, _responder: Responder| {
            let _ = tag;
        })
    }

    fn same(a: &Arc<dyn QueryHandler>, b: &Arc<dyn QueryHandler>) -> bool {
        std::ptr::eq(Arc::as_ptr(a) as *const u8, Arc::as_ptr(b) as *const u8)
    }

    #[test]
    fn test_lookup_after_attach() {
        let mut registry = HandlerRegistry::new();
        let handler = tagged(1);
        assert!(registry.attach("echo.ping", Arc::clone(&handler)).is_none());

        let found = registry.lookup("echo.ping").unwrap();
        assert!(same(found, &handler));
        assert!(registry.lookup("echo.pong").is_none());
    }

    #[test]
    fn test_attach_replaces_and_returns_previous() {
        let mut registry = HandlerRegistry::new();
        let first = tagged(1);
        let second = tagged(2);

        registry.attach("echo.ping", Arc::clone(&first));
        let replaced = registry.attach("echo.ping", Arc::clone(&second)).unwrap();

        assert!(same(&replaced, &first));
        assert!(same(registry.lookup("echo.ping").unwrap(), &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let registry = HandlerRegistry::from_bindings([("echo.ping", tagged(1))]);
        assert!(registry.lookup("ECHO.PING").is_none());
        assert!(registry.lookup("echo.ping ").is_none());
        assert!(registry.lookup("echo").is_none());
    }

    #[test]
    fn test_commands_sorted() {
        let registry = HandlerRegistry::from_bindings([
            ("protocol.total_connections", tagged(1)),
            ("address.subscribe2", tagged(2)),
        ]);
        assert_eq!(
            registry.commands(),
            vec!["address.subscribe2", "protocol.total_connections"]
        );
        assert!(!registry.is_empty());
    }

    proptest! {
        #[test]
        fn prop_last_attach_wins(
            commands in proptest::collection::vec("[a-c]\\.[a-c]", 1..24)
        ) {
            let handlers: Vec<_> = (0..commands.len()).map(tagged).collect();
            let registry = HandlerRegistry::from_bindings(
                commands.iter().cloned().zip(handlers.iter().cloned()),
            );

            for command in &commands {
                let last = commands.iter().rposition(|c| c == command).unwrap();
                let found = registry.lookup(command).unwrap();
                prop_assert!(same(found, &handlers[last]));
            }
        }
    }
}
