use implementor_common::SourceFile;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};
use tree_sitter::Node;

use crate::ast::{CxxMethodDecl, CxxRecordDecl, FunctionDecl, RecordId};
use crate::error::{FrontendError, Result};
use crate::lower::{lower, Lowered};
use crate::parser;
use crate::source_manager::SourceManager;

/// A parsed C++ source file together with its declaration model.
#[derive(Debug)]
pub struct TranslationUnit {
    source_manager: SourceManager,
    records: Vec<CxxRecordDecl>,
    functions: Vec<FunctionDecl>,
    has_syntax_errors: bool,
}

impl TranslationUnit {
    /// Parse and lower an in-memory buffer.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        Self::from_file(SourceFile::new(source))
    }

    #[tracing::instrument(skip_all, fields(path = ?file.path(), len = file.len()))]
    pub fn from_file(file: SourceFile) -> Result<Self> {
        let tree = parser::parse(file.content())?;
        let root = tree.root_node();
        let has_syntax_errors = root.has_error();
        if has_syntax_errors {
            let line = first_error(root).map(|node| node.start_position().row + 1);
            warn!(line = ?line, "source has syntax errors, continuing with a partial model");
        }

        let source_manager = SourceManager::new(file, &tree);
        let Lowered { records, functions } = lower(&tree, &source_manager);
        debug!(
            records = records.len(),
            functions = functions.len(),
            "built translation unit"
        );

        Ok(Self {
            source_manager,
            records,
            functions,
            has_syntax_errors,
        })
    }

    pub fn source_manager(&self) -> &SourceManager {
        &self.source_manager
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.has_syntax_errors
    }

    /// Class and struct definitions in source order, outer before nested.
    pub fn records(&self) -> impl Iterator<Item = &CxxRecordDecl> {
        self.records.iter()
    }

    pub fn record(&self, id: RecordId) -> &CxxRecordDecl {
        &self.records[id.index()]
    }

    /// Functions declared or defined at namespace scope.
    pub fn functions(&self) -> &[FunctionDecl] {
        &self.functions
    }

    /// First namespace-scope function with the given name or qualified name.
    pub fn find_function(&self, name: &str) -> Option<&FunctionDecl> {
        let name = name.strip_prefix("::").unwrap_or(name);
        self.functions
            .iter()
            .find(|f| f.qualified_name_as_string() == name)
            .or_else(|| self.functions.iter().find(|f| f.name() == name))
    }

    /// Look up a record definition by qualified name, or by a trailing part of
    /// its qualified name when that is unique.
    pub fn find_record(&self, name: &str) -> Result<&CxxRecordDecl> {
        let name = name.strip_prefix("::").unwrap_or(name);
        if let Some(record) = self
            .records
            .iter()
            .find(|record| record.qualified_name_as_string() == name)
        {
            return Ok(record);
        }

        let suffix = format!("::{name}");
        let candidates: Vec<&CxxRecordDecl> = self
            .records
            .iter()
            .filter(|record| record.qualified_name_as_string().ends_with(&suffix))
            .collect();
        let mut names: Vec<String> = candidates
            .iter()
            .map(|record| record.qualified_name_as_string().to_string())
            .collect();
        names.sort();
        names.dedup();

        match (candidates.first(), names.len()) {
            (Some(record), 1) => Ok(record),
            (None, _) => Err(FrontendError::RecordNotFound {
                name: name.to_string(),
            }),
            _ => Err(FrontendError::AmbiguousRecord {
                name: name.to_string(),
                candidates: names,
            }),
        }
    }

    /// The class a method is a member of.
    pub fn parent_of(&self, method: &CxxMethodDecl) -> &CxxRecordDecl {
        self.record(method.parent())
    }

    /// Visit every transitive base of `record` once.
    ///
    /// Direct bases are visited in declaration order and pushed on a stack;
    /// then the most recently pushed base is popped and its bases are visited
    /// the same way. Returns `false` as soon as the visitor does.
    pub fn forall_bases<'a>(
        &'a self,
        record: &CxxRecordDecl,
        mut visitor: impl FnMut(&'a CxxRecordDecl) -> bool,
    ) -> bool {
        let mut seen = FxHashSet::default();
        let mut pending: Vec<RecordId> = Vec::new();
        let mut current = record;
        loop {
            for base in current.bases() {
                let Some(id) = base.record() else {
                    warn!(
                        record = %current.qualified_name_as_string(),
                        base = %base.written_name(),
                        "skipping base that is not defined in the translation unit"
                    );
                    continue;
                };
                if !seen.insert(id) {
                    continue;
                }
                if !visitor(self.record(id)) {
                    return false;
                }
                pending.push(id);
            }
            match pending.pop() {
                Some(id) => current = self.record(id),
                None => return true,
            }
        }
    }

    /// Whether `base` is a direct or indirect base of `derived`.
    pub fn is_derived_from(&self, derived: &CxxRecordDecl, base: &CxxRecordDecl) -> bool {
        !self.forall_bases(derived, |candidate| candidate.id() != base.id())
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
