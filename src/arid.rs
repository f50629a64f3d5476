use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use crate::syntax::{self, GoFile};

/// Identifiers whose statements are diagnostic noise: a mutation inside
/// them cannot be observed by a well-written test.
pub const DEFAULT_LOGGER_IDENTIFIERS: &[&str] = &["log", "fmt", "slogger", "logger", "serrormonitor"];

pub fn default_logger_identifiers() -> HashSet<String> {
    DEFAULT_LOGGER_IDENTIFIERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Classifies syntax subtrees as arid. An arid subtree is one where no
/// mutation would ever be distinguishable by a test: empty bodies,
/// logger-only statements, and composites made only of those.
pub struct AridAnalyzer<'f> {
    file: &'f GoFile,
    loggers: &'f HashSet<String>,
    functions: HashMap<String, Node<'f>>,
}

impl<'f> AridAnalyzer<'f> {
    pub fn new(file: &'f GoFile, loggers: &'f HashSet<String>) -> AridAnalyzer<'f> {
        AridAnalyzer {
            file,
            loggers,
            functions: syntax::function_index(file),
        }
    }

    pub fn is_arid(&self, node: Node) -> bool {
        let mut visiting = HashSet::new();
        self.arid(Some(node), &mut visiting)
    }

    fn arid(&self, node: Option<Node>, visiting: &mut HashSet<usize>) -> bool {
        let node = match node {
            Some(n) => n,
            None => return true,
        };

        match node.kind() {
            "expression_statement" => {
                if self.is_logger_stmt(node) {
                    return true;
                }
                self.arid(node.named_child(0), visiting)
            }
            "block" => syntax::statement_list(node)
                .into_iter()
                .all(|stmt| self.arid(Some(stmt), visiting)),
            "expression_case" | "default_case" | "type_case" | "communication_case" => {
                syntax::statement_list(node)
                    .into_iter()
                    .all(|stmt| self.arid(Some(stmt), visiting))
            }
            "if_statement" => {
                self.arid(node.child_by_field_name("initializer"), visiting)
                    && self.arid(node.child_by_field_name("consequence"), visiting)
                    && self.arid(node.child_by_field_name("alternative"), visiting)
            }
            "call_expression" => self.arid(node.child_by_field_name("function"), visiting),
            "identifier" => {
                let name = self.file.node_text(node);
                match self.functions.get(name) {
                    // Resolves to a function in this file: as arid as its body.
                    Some(decl) => {
                        if !visiting.insert(decl.id()) {
                            // Recursive function, already on the walk.
                            return false;
                        }
                        let result = self.arid(Some(*decl), visiting);
                        visiting.remove(&decl.id());
                        result
                    }
                    // Unresolved identifiers carry no behaviour of their own.
                    None => true,
                }
            }
            "function_declaration" => self.arid(node.child_by_field_name("body"), visiting),
            _ => false,
        }
    }

    /// An expression statement is a logger statement when the first
    /// identifier of its depth-first walk names a configured logger.
    fn is_logger_stmt(&self, stmt: Node) -> bool {
        match syntax::first_identifier(self.file, stmt) {
            Some(ident) => self.loggers.contains(ident),
            None => false,
        }
    }
}
