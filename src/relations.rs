//! Structural relations between blocks: sibling methods and call targets.
//!
//! Both lookups are name based. Nothing here checks that a call really
//! reaches the matched code; unresolved names simply match nothing.

use crate::models::FunctionBlock;
use crate::store::BlockStore;

/// How a single call string is matched against candidate blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallTarget<'c> {
    /// `Prefix.name`: a method `name` on a class literally called `Prefix`.
    Member { class: &'c str, name: &'c str },
    /// A call without a dot: a free function, or a function reached through
    /// an import whose first and last dotted segments are `module`/`symbol`.
    Bare {
        name: &'c str,
        module: &'c str,
        symbol: &'c str,
    },
}

impl<'c> CallTarget<'c> {
    fn parse(call: &'c str) -> Self {
        match call.split_once('.') {
            Some((class, name)) => CallTarget::Member { class, name },
            None => CallTarget::Bare {
                name: call,
                module: call.split('.').next().unwrap_or(call),
                symbol: call.rsplit('.').next().unwrap_or(call),
            },
        }
    }

    fn matches(&self, candidate: &FunctionBlock) -> bool {
        match *self {
            CallTarget::Member { class, name } => {
                candidate.belonging_class.as_deref() == Some(class) && candidate.name == name
            }
            CallTarget::Bare {
                name,
                module,
                symbol,
            } => {
                (candidate.name == name && candidate.belonging_class.is_none())
                    || (candidate.name == symbol && candidate.imports.contains(module))
            }
        }
    }
}

/// Resolves sibling methods and callees of a block against a [`BlockStore`].
#[derive(Debug, Clone, Copy)]
pub struct RelationResolver<'a> {
    store: &'a BlockStore,
}

impl<'a> RelationResolver<'a> {
    pub fn new(store: &'a BlockStore) -> Self {
        Self { store }
    }

    /// Methods declared on the block's class in the block's own file.
    ///
    /// Ordered by the class's declared method list, then store order. Empty
    /// for free functions and for classes missing from the method index.
    pub fn related_methods(&self, block: &FunctionBlock) -> Vec<&'a FunctionBlock> {
        let Some(class) = block.belonging_class.as_deref() else {
            return Vec::new();
        };
        let Some(methods) = self.store.declared_methods(&block.file_path, class) else {
            tracing::debug!(
                "Class {class} not indexed for {}; no sibling methods",
                block.file_path
            );
            return Vec::new();
        };

        methods
            .iter()
            .flat_map(|method| self.store.class_members(&block.file_path, class, method))
            .collect()
    }

    /// Blocks matched by any of the block's call strings, in store order.
    ///
    /// A candidate is appended once per call string it matches; there is no
    /// deduplication.
    pub fn related_calls(&self, block: &FunctionBlock) -> Vec<&'a FunctionBlock> {
        if block.calls.is_empty() {
            return Vec::new();
        }
        let targets: Vec<CallTarget<'_>> =
            block.calls.iter().map(|c| CallTarget::parse(c)).collect();

        let mut related = Vec::new();
        for candidate in self.store.blocks() {
            for target in &targets {
                if target.matches(candidate) {
                    related.push(candidate);
                }
            }
        }
        related
    }
}
