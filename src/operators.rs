//! The mutation catalogue: a static table from operator classes to the
//! candidate edits they produce for a syntax node. Operators are pure
//! functions of the node; a shape that does not match yields no
//! mutations.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::arid::AridAnalyzer;
use crate::mutants::Mutation;
use crate::syntax::{self, GoFile, Span, TokenKind, TokenNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutatorKind {
    ArithmeticBase,
    ConditionalsBoundary,
    ConditionalsNegation,
    IncrementDecrement,
    InvertAssignments,
    InvertBitwise,
    InvertBitwiseAssignments,
    InvertLogical,
    InvertLoopCtrl,
    RemoveBinaryExpression,
    RemoveSelfAssignments,
    RemoveStatement,
}

pub const ALL_KINDS: &[MutatorKind] = &[
    MutatorKind::ArithmeticBase,
    MutatorKind::ConditionalsBoundary,
    MutatorKind::ConditionalsNegation,
    MutatorKind::IncrementDecrement,
    MutatorKind::InvertAssignments,
    MutatorKind::InvertBitwise,
    MutatorKind::InvertBitwiseAssignments,
    MutatorKind::InvertLogical,
    MutatorKind::InvertLoopCtrl,
    MutatorKind::RemoveBinaryExpression,
    MutatorKind::RemoveSelfAssignments,
    MutatorKind::RemoveStatement,
];

impl MutatorKind {
    pub fn name(self) -> &'static str {
        match self {
            MutatorKind::ArithmeticBase => "ARITHMETIC_BASE",
            MutatorKind::ConditionalsBoundary => "CONDITIONALS_BOUNDARY",
            MutatorKind::ConditionalsNegation => "CONDITIONALS_NEGATION",
            MutatorKind::IncrementDecrement => "INCREMENT_DECREMENT",
            MutatorKind::InvertAssignments => "INVERT_ASSIGNMENTS",
            MutatorKind::InvertBitwise => "INVERT_BITWISE",
            MutatorKind::InvertBitwiseAssignments => "INVERT_BITWISE_ASSIGNMENTS",
            MutatorKind::InvertLogical => "INVERT_LOGICAL",
            MutatorKind::InvertLoopCtrl => "INVERT_LOOP_CTRL",
            MutatorKind::RemoveBinaryExpression => "REMOVE_BINARY_EXPRESSION",
            MutatorKind::RemoveSelfAssignments => "REMOVE_SELF_ASSIGNMENTS",
            MutatorKind::RemoveStatement => "REMOVE_STATEMENT",
        }
    }

    /// Accepts kebab-case or snake_case, any case.
    pub fn from_name(name: &str) -> Option<MutatorKind> {
        let normalized = name.replace('-', "_").to_uppercase();
        ALL_KINDS
            .iter()
            .copied()
            .find(|kind| kind.name() == normalized)
    }
}

impl std::fmt::Display for MutatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reverse lookup from an operator token to the mutator kinds that can
/// rewrite it; consulted by pass 1 of discovery to skip irrelevant
/// operators.
pub fn kinds_for_token(token: TokenKind) -> &'static [MutatorKind] {
    use MutatorKind::*;
    use TokenKind::*;
    match token {
        Add | Sub | Mul | Quo | Rem => &[ArithmeticBase],
        AddAssign | SubAssign | MulAssign | QuoAssign | RemAssign => {
            &[InvertAssignments, RemoveSelfAssignments]
        }
        And | Or | Xor | AndNot | Shl | Shr => &[InvertBitwise],
        AndAssign | OrAssign | XorAssign | AndNotAssign | ShlAssign | ShrAssign => {
            &[RemoveSelfAssignments, InvertBitwiseAssignments]
        }
        Eql | Neq => &[ConditionalsNegation],
        Gtr | Geq | Lss | Leq => &[ConditionalsBoundary, ConditionalsNegation],
        LAnd | LOr => &[InvertLogical, RemoveBinaryExpression],
        Inc | Dec => &[IncrementDecrement],
        Break | Continue => &[InvertLoopCtrl],
        Assign | Define => &[],
    }
}

/// The token substitution table per mutator kind.
fn substitution(kind: MutatorKind, token: TokenKind) -> Option<TokenKind> {
    use TokenKind::*;
    let replacement = match kind {
        MutatorKind::ArithmeticBase => match token {
            Add => Sub,
            Sub => Add,
            Mul => Quo,
            Quo => Mul,
            Rem => Mul,
            _ => return None,
        },
        MutatorKind::InvertAssignments => match token {
            AddAssign => SubAssign,
            SubAssign => AddAssign,
            MulAssign => QuoAssign,
            QuoAssign => MulAssign,
            // Identity entry, kept as the table defines it.
            RemAssign => RemAssign,
            _ => return None,
        },
        MutatorKind::InvertBitwise => match token {
            And => Or,
            Or => And,
            Xor => And,
            AndNot => And,
            Shl => Shr,
            Shr => Shl,
            _ => return None,
        },
        MutatorKind::InvertBitwiseAssignments => match token {
            AndAssign => OrAssign,
            OrAssign => AndAssign,
            XorAssign => AndAssign,
            AndNotAssign => AndAssign,
            ShlAssign => ShrAssign,
            ShrAssign => ShlAssign,
            _ => return None,
        },
        MutatorKind::RemoveSelfAssignments => match token {
            AddAssign | SubAssign | MulAssign | QuoAssign | RemAssign | AndAssign | OrAssign
            | XorAssign | AndNotAssign | ShlAssign | ShrAssign => Assign,
            _ => return None,
        },
        MutatorKind::ConditionalsBoundary => match token {
            Geq => Gtr,
            Gtr => Geq,
            Leq => Lss,
            Lss => Leq,
            _ => return None,
        },
        MutatorKind::ConditionalsNegation => match token {
            Gtr => Leq,
            Lss => Geq,
            Geq => Lss,
            Leq => Gtr,
            Eql => Neq,
            Neq => Eql,
            _ => return None,
        },
        MutatorKind::InvertLogical => match token {
            LAnd => LOr,
            LOr => LAnd,
            _ => return None,
        },
        MutatorKind::IncrementDecrement => match token {
            Inc => Dec,
            Dec => Inc,
            _ => return None,
        },
        MutatorKind::InvertLoopCtrl => match token {
            Break => Continue,
            Continue => Break,
            _ => return None,
        },
        MutatorKind::RemoveBinaryExpression | MutatorKind::RemoveStatement => return None,
    };
    Some(replacement)
}

fn shape_matches(kind: MutatorKind, node: Node) -> bool {
    match kind {
        MutatorKind::ArithmeticBase
        | MutatorKind::InvertBitwise
        | MutatorKind::ConditionalsBoundary
        | MutatorKind::ConditionalsNegation
        | MutatorKind::InvertLogical
        | MutatorKind::RemoveBinaryExpression => node.kind() == "binary_expression",
        MutatorKind::InvertAssignments
        | MutatorKind::InvertBitwiseAssignments
        | MutatorKind::RemoveSelfAssignments => node.kind() == "assignment_statement",
        MutatorKind::IncrementDecrement => {
            matches!(node.kind(), "inc_statement" | "dec_statement")
        }
        MutatorKind::InvertLoopCtrl => {
            matches!(node.kind(), "break_statement" | "continue_statement")
        }
        MutatorKind::RemoveStatement => node.kind() == "block" || syntax::is_case_clause(node),
    }
}

/// The candidate mutations a kind produces for a token-bearing node.
pub fn mutations_for(kind: MutatorKind, file: &GoFile, tn: &TokenNode) -> Vec<Mutation> {
    if !shape_matches(kind, tn.node) {
        return Vec::new();
    }
    match kind {
        MutatorKind::RemoveBinaryExpression => remove_binary_expression(file, tn),
        MutatorKind::RemoveStatement => Vec::new(),
        _ => token_substitution(kind, file, tn),
    }
}

fn token_substitution(kind: MutatorKind, file: &GoFile, tn: &TokenNode) -> Vec<Mutation> {
    let replacement = match substitution(kind, tn.kind) {
        Some(r) => r,
        None => return Vec::new(),
    };

    vec![Mutation {
        span: Span::of(tn.token),
        original: file.node_text(tn.token).to_string(),
        replacement: replacement.as_str().to_string(),
        position: file.position_of(tn.token),
    }]
}

/// Replaces one side of a `&&`/`||` at a time with the short-circuit
/// neutral literal: `true` for `&&`, `false` for `||`. Both mutations are
/// positioned at the operator token.
fn remove_binary_expression(file: &GoFile, tn: &TokenNode) -> Vec<Mutation> {
    let literal = match tn.kind {
        TokenKind::LAnd => "true",
        TokenKind::LOr => "false",
        _ => return Vec::new(),
    };

    let left = match tn.node.child_by_field_name("left") {
        Some(n) => n,
        None => return Vec::new(),
    };
    let right = match tn.node.child_by_field_name("right") {
        Some(n) => n,
        None => return Vec::new(),
    };

    let position = file.position_of(tn.token);
    [left, right]
        .into_iter()
        .map(|operand| Mutation {
            span: Span::of(operand),
            original: file.node_text(operand).to_string(),
            replacement: literal.to_string(),
            position: position.clone(),
        })
        .collect()
}

/// One mutation per removable, non-arid child of a block or case clause,
/// swapping the statement for its noop form.
pub fn remove_statement_mutations(file: &GoFile, node: Node, arid: &AridAnalyzer) -> Vec<Mutation> {
    if !shape_matches(MutatorKind::RemoveStatement, node) {
        return Vec::new();
    }

    syntax::statement_list(node)
        .into_iter()
        .filter(|stmt| syntax::is_removable(*stmt) && !arid.is_arid(*stmt))
        .map(|stmt| Mutation {
            span: Span::of(stmt),
            original: file.node_text(stmt).to_string(),
            replacement: syntax::noop_of(file, stmt),
            position: file.position_of(stmt),
        })
        .collect()
}
