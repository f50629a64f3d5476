use std::path::Path;

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser, Tree};

use crate::error::{GomutError, Result};

/// A parsed Go source file. The tree is a concrete syntax tree over
/// `text`; every node carries byte spans into the unmodified source, so
/// re-emitting a file is just writing `text` back out.
pub struct GoFile {
    /// Path relative to the calling directory, `/`-separated.
    pub name: String,
    /// Package name from the package clause.
    pub package: String,
    pub text: String,
    tree: Tree,
}

impl GoFile {
    pub fn parse(name: &str, text: String) -> Result<GoFile> {
        let mut parser = Parser::new();
        let language = tree_sitter_go::LANGUAGE;
        parser.set_language(&language.into())?;

        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| GomutError::Parse(Path::new(name).to_path_buf()))?;
        if tree.root_node().has_error() {
            return Err(GomutError::Parse(Path::new(name).to_path_buf()));
        }

        let package = package_name(tree.root_node(), &text).unwrap_or_else(|| "main".to_string());

        Ok(GoFile {
            name: name.replace('\\', "/"),
            package,
            text,
            tree,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn node_text(&self, node: Node) -> &str {
        &self.text[node.byte_range()]
    }

    pub fn position_of(&self, node: Node) -> Position {
        let point = node.start_position();
        Position {
            file: self.name.clone(),
            line: point.row + 1,
            column: point.column + 1,
            offset: node.start_byte(),
        }
    }
}

fn package_name(root: Node, text: &str) -> Option<String> {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "package_clause" {
            let mut inner = child.walk();
            for c in child.children(&mut inner) {
                if c.kind() == "package_identifier" {
                    return Some(text[c.byte_range()].to_string());
                }
            }
        }
    }
    None
}

/// A byte range in the canonical source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn of(node: Node) -> Span {
        Span {
            start: node.start_byte(),
            end: node.end_byte(),
        }
    }
}

/// Source position of a token: 1-based line and column plus byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// The operator alphabet the engine recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    Eql,
    Neq,
    Lss,
    Leq,
    Gtr,
    Geq,
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,
    LAnd,
    LOr,
    AddAssign,
    SubAssign,
    MulAssign,
    QuoAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    AndNotAssign,
    ShlAssign,
    ShrAssign,
    Assign,
    Define,
    Inc,
    Dec,
    Break,
    Continue,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Add => "+",
            TokenKind::Sub => "-",
            TokenKind::Mul => "*",
            TokenKind::Quo => "/",
            TokenKind::Rem => "%",
            TokenKind::Eql => "==",
            TokenKind::Neq => "!=",
            TokenKind::Lss => "<",
            TokenKind::Leq => "<=",
            TokenKind::Gtr => ">",
            TokenKind::Geq => ">=",
            TokenKind::And => "&",
            TokenKind::Or => "|",
            TokenKind::Xor => "^",
            TokenKind::AndNot => "&^",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::LAnd => "&&",
            TokenKind::LOr => "||",
            TokenKind::AddAssign => "+=",
            TokenKind::SubAssign => "-=",
            TokenKind::MulAssign => "*=",
            TokenKind::QuoAssign => "/=",
            TokenKind::RemAssign => "%=",
            TokenKind::AndAssign => "&=",
            TokenKind::OrAssign => "|=",
            TokenKind::XorAssign => "^=",
            TokenKind::AndNotAssign => "&^=",
            TokenKind::ShlAssign => "<<=",
            TokenKind::ShrAssign => ">>=",
            TokenKind::Assign => "=",
            TokenKind::Define => ":=",
            TokenKind::Inc => "++",
            TokenKind::Dec => "--",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
        }
    }

    pub fn from_str(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "+" => TokenKind::Add,
            "-" => TokenKind::Sub,
            "*" => TokenKind::Mul,
            "/" => TokenKind::Quo,
            "%" => TokenKind::Rem,
            "==" => TokenKind::Eql,
            "!=" => TokenKind::Neq,
            "<" => TokenKind::Lss,
            "<=" => TokenKind::Leq,
            ">" => TokenKind::Gtr,
            ">=" => TokenKind::Geq,
            "&" => TokenKind::And,
            "|" => TokenKind::Or,
            "^" => TokenKind::Xor,
            "&^" => TokenKind::AndNot,
            "<<" => TokenKind::Shl,
            ">>" => TokenKind::Shr,
            "&&" => TokenKind::LAnd,
            "||" => TokenKind::LOr,
            "+=" => TokenKind::AddAssign,
            "-=" => TokenKind::SubAssign,
            "*=" => TokenKind::MulAssign,
            "/=" => TokenKind::QuoAssign,
            "%=" => TokenKind::RemAssign,
            "&=" => TokenKind::AndAssign,
            "|=" => TokenKind::OrAssign,
            "^=" => TokenKind::XorAssign,
            "&^=" => TokenKind::AndNotAssign,
            "<<=" => TokenKind::ShlAssign,
            ">>=" => TokenKind::ShrAssign,
            "=" => TokenKind::Assign,
            ":=" => TokenKind::Define,
            "++" => TokenKind::Inc,
            "--" => TokenKind::Dec,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            _ => return None,
        };
        Some(kind)
    }
}

/// A node that exposes an operator token: the owner node, the concrete
/// token node whose span a mutation would rewrite, and the token kind.
pub struct TokenNode<'a> {
    pub node: Node<'a>,
    pub token: Node<'a>,
    pub kind: TokenKind,
}

/// Projects a syntax node onto its operator token, when it has one.
pub fn token_node<'a>(node: Node<'a>, text: &str) -> Option<TokenNode<'a>> {
    let token = match node.kind() {
        "binary_expression" | "unary_expression" | "assignment_statement" => {
            node.child_by_field_name("operator")?
        }
        "short_var_declaration" => child_of_kind(node, ":=")?,
        "inc_statement" => child_of_kind(node, "++")?,
        "dec_statement" => child_of_kind(node, "--")?,
        "break_statement" => child_of_kind(node, "break")?,
        "continue_statement" => child_of_kind(node, "continue")?,
        _ => return None,
    };
    let kind = TokenKind::from_str(&text[token.byte_range()])?;

    Some(TokenNode { node, token, kind })
}

fn child_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

pub fn is_case_clause(node: Node) -> bool {
    matches!(
        node.kind(),
        "expression_case" | "default_case" | "type_case" | "communication_case"
    )
}

/// The statements contained in a block or case clause, in source order.
pub fn statement_list(node: Node) -> Vec<Node> {
    let mut out = Vec::new();
    match node.kind() {
        "block" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.is_named() && child.kind() != "comment" {
                    out.push(child);
                }
            }
        }
        // Case clauses lead with their case values; the body starts
        // after the colon.
        "expression_case" | "default_case" | "type_case" | "communication_case" => {
            let mut past_colon = false;
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if !past_colon {
                    past_colon = child.kind() == ":";
                    continue;
                }
                if child.is_named() && child.kind() != "comment" {
                    out.push(child);
                }
            }
        }
        _ => {}
    }
    out
}

/// Whether removing this statement still leaves compiling code. Plain and
/// compound assignments qualify (`:=` parses as a short_var_declaration,
/// which does not), as do expression and inc/dec statements. Declarations,
/// returns, defers and control flow do not.
pub fn is_removable(stmt: Node) -> bool {
    matches!(
        stmt.kind(),
        "assignment_statement" | "expression_statement" | "inc_statement" | "dec_statement"
    )
}

/// Builds the replacement text a removed statement leaves behind. The
/// identifiers the statement touches stay referenced through a blank
/// assignment so the surrounding function still compiles.
pub fn noop_of(file: &GoFile, stmt: Node) -> String {
    let idents = identifiers_in_statement(file, stmt);
    if idents.is_empty() {
        return "{}".to_string();
    }
    let blanks = vec!["_"; idents.len()].join(", ");

    format!("{} = {}", blanks, idents.join(", "))
}

/// The identifiers a statement reads or writes: assignment targets, plain
/// identifier call arguments, and inc/dec targets.
pub fn identifiers_in_statement<'f>(file: &'f GoFile, stmt: Node) -> Vec<&'f str> {
    let mut idents = Vec::new();
    match stmt.kind() {
        "assignment_statement" => {
            if let Some(lhs) = stmt.child_by_field_name("left") {
                collect_identifiers(lhs, file, &mut idents);
            }
        }
        "expression_statement" => {
            if let Some(expr) = stmt.named_child(0) {
                if expr.kind() == "call_expression" {
                    if let Some(args) = expr.child_by_field_name("arguments") {
                        collect_identifiers(args, file, &mut idents);
                    }
                }
            }
        }
        "inc_statement" | "dec_statement" => {
            if let Some(target) = stmt.named_child(0) {
                if target.kind() == "identifier" {
                    idents.push(file.node_text(target));
                }
            }
        }
        _ => {}
    }
    idents
}

fn collect_identifiers<'f>(list: Node, file: &'f GoFile, out: &mut Vec<&'f str>) {
    let mut cursor = list.walk();
    for child in list.children(&mut cursor) {
        if child.kind() == "identifier" {
            out.push(file.node_text(child));
        }
    }
}

/// First identifier in a depth-first walk, stopping at the first hit.
pub fn first_identifier<'f>(file: &'f GoFile, node: Node) -> Option<&'f str> {
    if node.kind() == "identifier" {
        return Some(file.node_text(node));
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children {
        if let Some(ident) = first_identifier(file, child) {
            return Some(ident);
        }
    }
    None
}

/// Per-file table of function declarations, standing in for the
/// resolver's decl links: identifiers are resolved by name within the
/// file only.
pub fn function_index(file: &GoFile) -> std::collections::HashMap<String, Node<'_>> {
    let mut index = std::collections::HashMap::new();
    collect_functions(file.root(), file, &mut index);
    index
}

fn collect_functions<'t>(
    node: Node<'t>,
    file: &GoFile,
    index: &mut std::collections::HashMap<String, Node<'t>>,
) {
    if node.kind() == "function_declaration" {
        if let Some(name) = node.child_by_field_name("name") {
            index.insert(file.node_text(name).to_string(), node);
        }
        return;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children {
        collect_functions(child, file, index);
    }
}
