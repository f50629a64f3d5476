//! Two-pass discovery over a parsed file. Pass 1 finds token mutations
//! through the catalogue's reverse map; pass 2 finds statement removals
//! in blocks and case clauses. Arid subtrees are pruned whole: the walker
//! neither descends into nor emits from them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tree_sitter::Node;

use crate::arid::AridAnalyzer;
use crate::changes::Changes;
use crate::coverage::Profile;
use crate::mutants::{Mutant, Status};
use crate::operators::{self, MutatorKind};
use crate::syntax::{self, GoFile, Position};

/// Assigns the initial status of a freshly discovered mutant from the
/// coverage and change providers. The change-set check overrides
/// coverage: a mutant on an unchanged line is skipped even when covered.
pub struct Eligibility<'a> {
    pub coverage: &'a Profile,
    pub changes: &'a Changes,
}

impl Eligibility<'_> {
    pub fn status_for(&self, pos: &Position) -> Status {
        let mut status = Status::default();
        if self.coverage.is_covered(pos) {
            status = Status::Runnable;
        }
        if !self.changes.is_changed(&pos.file, pos.line) {
            status = Status::Skipped;
        }

        status
    }
}

pub struct Discovery<'a> {
    pub module_name: &'a str,
    pub calling_dir: &'a str,
    pub disabled: &'a HashSet<MutatorKind>,
    pub loggers: &'a HashSet<String>,
    pub gate: Eligibility<'a>,
}

impl Discovery<'_> {
    /// Walks a file twice and returns its mutants in discovery order.
    pub fn discover_file(&self, file: &GoFile) -> Vec<Mutant> {
        let shared = Arc::new(Mutex::new(file.text.clone()));
        let package = package_path(
            self.module_name,
            self.calling_dir,
            &file.name,
            &file.package,
        );
        let arid = AridAnalyzer::new(file, self.loggers);

        let mut mutants = Vec::new();
        self.walk_tokens(file, &arid, file.root(), &package, &shared, &mut mutants);
        self.walk_statements(file, &arid, file.root(), &package, &shared, &mut mutants);

        mutants
    }

    fn walk_tokens(
        &self,
        file: &GoFile,
        arid: &AridAnalyzer,
        node: Node,
        package: &str,
        shared: &Arc<Mutex<String>>,
        out: &mut Vec<Mutant>,
    ) {
        if arid.is_arid(node) {
            return;
        }

        if let Some(tn) = syntax::token_node(node, &file.text) {
            for kind in operators::kinds_for_token(tn.kind) {
                if self.disabled.contains(kind) {
                    continue;
                }
                for mutation in operators::mutations_for(*kind, file, &tn) {
                    let status = self.gate.status_for(&mutation.position);
                    let mut mutant =
                        Mutant::new(*kind, package.to_string(), mutation, shared.clone());
                    mutant.status = status;
                    out.push(mutant);
                }
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.walk_tokens(file, arid, child, package, shared, out);
        }
    }

    fn walk_statements(
        &self,
        file: &GoFile,
        arid: &AridAnalyzer,
        node: Node,
        package: &str,
        shared: &Arc<Mutex<String>>,
        out: &mut Vec<Mutant>,
    ) {
        if arid.is_arid(node) {
            return;
        }

        if !self.disabled.contains(&MutatorKind::RemoveStatement)
            && (node.kind() == "block" || syntax::is_case_clause(node))
        {
            for mutation in operators::remove_statement_mutations(file, node, arid) {
                let status = self.gate.status_for(&mutation.position);
                let mut mutant = Mutant::new(
                    MutatorKind::RemoveStatement,
                    package.to_string(),
                    mutation,
                    shared.clone(),
                );
                mutant.status = status;
                out.push(mutant);
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.walk_statements(file, arid, child, package, shared, out);
        }
    }
}

/// The import path of the package a file belongs to: walk the directory
/// of `calling_dir/file` upward until a path suffix matches the file's
/// package name, then prepend the module name. With no matching suffix
/// the package is the module itself. Separators are normalised to `/`.
pub fn package_path(
    module_name: &str,
    calling_dir: &str,
    file_name: &str,
    file_package: &str,
) -> String {
    let joined = format!("{}/{}", calling_dir, file_name).replace('\\', "/");
    let mut parts: Vec<&str> = joined
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    parts.pop();

    loop {
        if parts.is_empty() {
            return module_name.to_string();
        }
        let dir = parts.join("/");
        if dir.ends_with(file_package) {
            return format!("{}/{}", module_name, dir);
        }
        parts.pop();
    }
}
