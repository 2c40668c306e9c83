//! Per-type-kind operation tables (§4.3 "Operation tables"): which unary,
//! binary, and assignment operators a type kind supports, dispatched by
//! `(TypeKind, operator)` match rather than a class hierarchy.

use crate::ast::{AssignOperator, BinaryOperator, UnaryOperator};

use super::registry::TypeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedOperator;

fn is_integral(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::Int(_))
}

fn is_float(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::Float(_))
}

fn is_numeric(kind: &TypeKind) -> bool {
    is_integral(kind) || is_float(kind)
}

fn is_character_like(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::Char | TypeKind::BChar)
}

/// Binary-operator support (§4.3 "Operation tables"). `Dot` and
/// `Instanceof` are parsed for precedence fidelity only (no struct/class
/// system exists to give them meaning) and are rejected for every kind —
/// callers should report that distinctly from a plain unsupported-op error.
///
/// - Integral: arithmetic `+ - * / % rem`, comparisons. `^` (pow) is
///   grouped with arithmetic here even though the spec's operation-table
///   prose only lists `+ - * / % rem` by name, since it has no other
///   defined meaning and shares arithmetic's precedence tier.
/// - Float: "same as integral", arithmetic and comparisons alike — the
///   spec does not carve out `%`/`rem` for floats despite it being an
///   unusual float operation.
/// - Bool: `&& ||`, equality only, no arithmetic.
/// - Character / byte-character (`char`, `bchar`): equality only, no
///   ordering, no arithmetic ("Only `= == !=`").
/// - String / c-string: no binary operators at all ("Only simple
///   assignment").
/// - Function: no binary operators ("Only the arbitrary-arity `call`
///   operator").
/// - Byte and void: equality only for byte ("where applicable"); nothing
///   at all for void.
pub fn binary_operator_allowed(kind: &TypeKind, op: BinaryOperator) -> Result<(), UnsupportedOperator> {
    use BinaryOperator::*;

    if matches!(op, Dot | Instanceof) {
        return Err(UnsupportedOperator);
    }

    let ok = match kind {
        TypeKind::Void => false,
        k if is_integral(k) || is_float(k) => matches!(op, Add | Sub | Mul | Div | Mod | Rem | Pow | Eq | NotEq | Lt | LtEq | Gt | GtEq),
        TypeKind::Bool => matches!(op, And | Or | Eq | NotEq),
        k if is_character_like(k) => matches!(op, Eq | NotEq),
        TypeKind::Byte => matches!(op, Eq | NotEq),
        TypeKind::String | TypeKind::CString | TypeKind::Function { .. } | TypeKind::Alias { .. } => false,
    };

    if ok {
        Ok(())
    } else {
        Err(UnsupportedOperator)
    }
}

/// Unary-operator support (§4.3):
/// - `sizeof`/`typeof`/`addressof` are defined for every type.
/// - `+`/`-` only for integral/float.
/// - `!`: bitwise complement for integral, logical not for bool; not
///   defined for float ("no bitwise complement") or anything else.
pub fn unary_operator_allowed(kind: &TypeKind, op: UnaryOperator) -> Result<(), UnsupportedOperator> {
    use UnaryOperator::*;

    let ok = match op {
        Sizeof | Typeof | Addressof => true,
        Plus | Minus => is_numeric(kind),
        Not => is_integral(kind) || matches!(kind, TypeKind::Bool),
    };

    if ok {
        Ok(())
    } else {
        Err(UnsupportedOperator)
    }
}

/// Assignment-operator support: plain `=` legality is governed by the cast
/// lattice (see [`super::cast`]), not here. Compound assignment (`+= -= *=
/// /= %=`) additionally requires the decomposed binary operator to be
/// supported on `kind`.
pub fn assign_operator_allowed(kind: &TypeKind, op: AssignOperator) -> Result<(), UnsupportedOperator> {
    match op.underlying_binary() {
        None => Ok(()),
        Some(binary) => binary_operator_allowed(kind, binary),
    }
}

/// Arbitrary-arity call support (§4.3 "Function"): only `Function` kinds
/// can be called; arity is checked by the caller against the callee's
/// parameter list, not here.
pub fn is_callable(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::Function { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::IntWidth;

    #[test]
    fn integers_support_modulo_bools_do_not() {
        let int_kind = TypeKind::Int(IntWidth::W32);
        assert!(binary_operator_allowed(&int_kind, BinaryOperator::Mod).is_ok());
        assert!(binary_operator_allowed(&TypeKind::Bool, BinaryOperator::Mod).is_err());
    }

    #[test]
    fn floats_support_modulo_same_as_integral() {
        let float_kind = TypeKind::Float(crate::lexer::FloatWidth::W32);
        assert!(binary_operator_allowed(&float_kind, BinaryOperator::Mod).is_ok());
    }

    #[test]
    fn strings_support_no_binary_operators() {
        assert!(binary_operator_allowed(&TypeKind::String, BinaryOperator::Add).is_err());
        assert!(binary_operator_allowed(&TypeKind::String, BinaryOperator::Eq).is_err());
    }

    #[test]
    fn characters_reject_ordering() {
        assert!(binary_operator_allowed(&TypeKind::Char, BinaryOperator::Eq).is_ok());
        assert!(binary_operator_allowed(&TypeKind::Char, BinaryOperator::Lt).is_err());
    }

    #[test]
    fn dot_and_instanceof_are_never_supported() {
        assert!(binary_operator_allowed(&TypeKind::Int(IntWidth::W32), BinaryOperator::Dot).is_err());
        assert!(binary_operator_allowed(&TypeKind::Int(IntWidth::W32), BinaryOperator::Instanceof).is_err());
    }

    #[test]
    fn logical_not_is_integral_and_bool_but_not_float() {
        assert!(unary_operator_allowed(&TypeKind::Bool, UnaryOperator::Not).is_ok());
        assert!(unary_operator_allowed(&TypeKind::Int(IntWidth::W32), UnaryOperator::Not).is_ok());
        assert!(unary_operator_allowed(&TypeKind::Float(crate::lexer::FloatWidth::W32), UnaryOperator::Not).is_err());
    }

    #[test]
    fn sizeof_is_universal() {
        assert!(unary_operator_allowed(&TypeKind::String, UnaryOperator::Sizeof).is_ok());
        assert!(unary_operator_allowed(&TypeKind::Void, UnaryOperator::Sizeof).is_ok());
    }

    #[test]
    fn compound_assign_requires_underlying_binary_support() {
        assert!(assign_operator_allowed(&TypeKind::Bool, AssignOperator::AddAssign).is_err());
        assert!(assign_operator_allowed(&TypeKind::Int(IntWidth::W32), AssignOperator::AddAssign).is_ok());
    }
}
