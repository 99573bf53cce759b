//! Binary and unary operators.
//!
//! Every operator resolves through the function table under its quoted
//! builtin name (`'+'`, `'..'`, `'/\'`), exactly as if the user had written
//! the call form.

/// Binary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinOpKind {
    Plus,
    Minus,
    Mult,
    Div,
    IDiv,
    Mod,
    Pow,
    Le,
    Lq,
    Gr,
    Gq,
    Eq,
    Nq,
    In,
    Subset,
    Superset,
    Union,
    Diff,
    SymDiff,
    Intersect,
    PlusPlus,
    Equiv,
    Impl,
    RImpl,
    Or,
    And,
    Xor,
    DotDot,
}

impl BinOpKind {
    /// Name of the builtin implementing this operator.
    pub const fn builtin_name(self) -> &'static str {
        match self {
            BinOpKind::Plus => "'+'",
            BinOpKind::Minus => "'-'",
            BinOpKind::Mult => "'*'",
            BinOpKind::Div => "'/'",
            BinOpKind::IDiv => "'div'",
            BinOpKind::Mod => "'mod'",
            BinOpKind::Pow => "'^'",
            BinOpKind::Le => "'<'",
            BinOpKind::Lq => "'<='",
            BinOpKind::Gr => "'>'",
            BinOpKind::Gq => "'>='",
            BinOpKind::Eq => "'='",
            BinOpKind::Nq => "'!='",
            BinOpKind::In => "'in'",
            BinOpKind::Subset => "'subset'",
            BinOpKind::Superset => "'superset'",
            BinOpKind::Union => "'union'",
            BinOpKind::Diff => "'diff'",
            BinOpKind::SymDiff => "'symdiff'",
            BinOpKind::Intersect => "'intersect'",
            BinOpKind::PlusPlus => "'++'",
            BinOpKind::Equiv => "'<->'",
            BinOpKind::Impl => "'->'",
            BinOpKind::RImpl => "'<-'",
            BinOpKind::Or => "'\\/'",
            BinOpKind::And => "'/\\'",
            BinOpKind::Xor => "'xor'",
            BinOpKind::DotDot => "'..'",
        }
    }

    /// Source spelling of the operator.
    pub fn symbol(self) -> &'static str {
        let name = self.builtin_name();
        &name[1..name.len() - 1]
    }

    /// Integer comparisons eligible for the counting rewrite.
    pub const fn is_int_comparison(self) -> bool {
        matches!(
            self,
            BinOpKind::Eq
                | BinOpKind::Nq
                | BinOpKind::Le
                | BinOpKind::Lq
                | BinOpKind::Gr
                | BinOpKind::Gq
        )
    }

    /// The comparison with operands swapped (`a < b` is `b > a`).
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            BinOpKind::Lq => BinOpKind::Gq,
            BinOpKind::Le => BinOpKind::Gr,
            BinOpKind::Gq => BinOpKind::Lq,
            BinOpKind::Gr => BinOpKind::Le,
            other => other,
        }
    }
}

/// Unary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnOpKind {
    Not,
    Plus,
    Minus,
}

impl UnOpKind {
    pub const fn builtin_name(self) -> &'static str {
        match self {
            UnOpKind::Not => "'not'",
            UnOpKind::Plus => "'+'",
            UnOpKind::Minus => "'-'",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert_eq!(BinOpKind::DotDot.builtin_name(), "'..'");
        assert_eq!(BinOpKind::And.builtin_name(), "'/\\'");
        assert_eq!(BinOpKind::And.symbol(), "/\\");
        assert_eq!(UnOpKind::Not.builtin_name(), "'not'");
    }

    #[test]
    fn test_flipped() {
        assert_eq!(BinOpKind::Lq.flipped(), BinOpKind::Gq);
        assert_eq!(BinOpKind::Gr.flipped(), BinOpKind::Le);
        assert_eq!(BinOpKind::Eq.flipped(), BinOpKind::Eq);
        assert!(!BinOpKind::Plus.is_int_comparison());
    }
}
