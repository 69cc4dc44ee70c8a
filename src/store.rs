//! In-memory block store built once per session from the parsed index.
//!
//! Blocks live in a single vector in index order; lookups go through
//! position indices rather than references between blocks.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::models::{ClassMethodIndex, FunctionBlock, ParsedIndex};

/// Read-only collection of function blocks plus the per-file class method index.
#[derive(Debug, Default)]
pub struct BlockStore {
    blocks: Vec<FunctionBlock>,
    class_methods: ClassMethodIndex,
    // Key: (file_path, class_name, method_name) -> positions in `blocks`, ascending
    members: HashMap<(String, String, String), Vec<usize>>,
}

impl BlockStore {
    /// Load and build a store from a parsed-index JSON file.
    pub fn load(index_path: &Path) -> Result<Self> {
        let index = ParsedIndex::from_path(index_path)?;
        let store = Self::from_index(index);
        tracing::info!(
            "Loaded {} function blocks from {}",
            store.len(),
            index_path.display()
        );
        Ok(store)
    }

    pub fn from_index(index: ParsedIndex) -> Self {
        let mut blocks = Vec::new();
        let mut class_methods = ClassMethodIndex::new();

        for (file_path, contents) in index.files {
            let classes = class_methods.entry(file_path.clone()).or_default();
            for cls in contents.classes {
                classes.insert(cls.class_name, cls.methods);
            }

            for func in contents.functions {
                let block = FunctionBlock::from_parsed(&file_path, func);
                if block.start_line > block.end_line {
                    tracing::warn!(
                        "Block {} in {} has start line {} after end line {}",
                        block.name,
                        block.file_path,
                        block.start_line,
                        block.end_line
                    );
                }
                blocks.push(block);
            }
        }

        Self::from_parts(blocks, class_methods)
    }

    /// Build a store from already-constructed blocks and class index.
    pub fn from_parts(blocks: Vec<FunctionBlock>, class_methods: ClassMethodIndex) -> Self {
        let mut members: HashMap<(String, String, String), Vec<usize>> = HashMap::new();
        for (pos, block) in blocks.iter().enumerate() {
            if let Some(class) = &block.belonging_class {
                members
                    .entry((block.file_path.clone(), class.clone(), block.name.clone()))
                    .or_default()
                    .push(pos);
            }
        }

        Self {
            blocks,
            class_methods,
            members,
        }
    }

    pub fn blocks(&self) -> &[FunctionBlock] {
        &self.blocks
    }

    pub fn get(&self, pos: usize) -> Option<&FunctionBlock> {
        self.blocks.get(pos)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Method names declared for `class_name` in `file_path`, if indexed.
    pub fn declared_methods(&self, file_path: &str, class_name: &str) -> Option<&[String]> {
        self.class_methods
            .get(file_path)
            .and_then(|classes| classes.get(class_name))
            .map(Vec::as_slice)
    }

    /// Blocks named `name` belonging to `class_name` in `file_path`, in store order.
    pub fn class_members<'a>(
        &'a self,
        file_path: &str,
        class_name: &str,
        name: &str,
    ) -> impl Iterator<Item = &'a FunctionBlock> + 'a {
        let key = (
            file_path.to_string(),
            class_name.to_string(),
            name.to_string(),
        );
        self.members
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(move |&pos| self.blocks.get(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"{
        "pkg/shapes.py": {
            "Functions": [
                {"name": "area", "class": "Square", "lineno": 3, "end_lineno": 4, "calls": [], "import": ["math"]},
                {"name": "helper", "class": null, "lineno": 6, "end_lineno": 7, "calls": [], "import": ["math"]},
                {"name": "perimeter", "class": "Square", "lineno": 9, "end_lineno": 10, "calls": [], "import": ["math"]}
            ],
            "Classes": [{"class_name": "Square", "methods": ["area", "perimeter"]}]
        },
        "pkg/other.py": {
            "Functions": [
                {"name": "area", "class": "Square", "lineno": 1, "end_lineno": 2}
            ],
            "Classes": []
        }
    }"#;

    fn store() -> BlockStore {
        BlockStore::from_index(ParsedIndex::from_json_str(INDEX).unwrap())
    }

    #[test]
    fn test_blocks_in_index_order() {
        let store = store();
        let names: Vec<String> = store.blocks().iter().map(|b| b.qualified_name()).collect();
        assert_eq!(
            names,
            vec!["Square.area", "helper", "Square.perimeter", "Square.area"]
        );
        assert_eq!(store.get(3).unwrap().file_path, "pkg/other.py");
    }

    #[test]
    fn test_declared_methods_lookup() {
        let store = store();
        assert_eq!(
            store.declared_methods("pkg/shapes.py", "Square").unwrap(),
            &["area".to_string(), "perimeter".to_string()]
        );
        // File is indexed but declares no classes
        assert!(store.declared_methods("pkg/other.py", "Square").is_none());
        assert!(store.declared_methods("missing.py", "Square").is_none());
    }

    #[test]
    fn test_class_members_scoped_to_file() {
        let store = store();
        let hits: Vec<&FunctionBlock> = store.class_members("pkg/shapes.py", "Square", "area").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start_line, 3);

        assert_eq!(store.class_members("pkg/other.py", "Square", "area").count(), 1);
        assert_eq!(store.class_members("pkg/shapes.py", "Circle", "area").count(), 0);
    }
}
