//! The cast lattice (§4.3 "Cast lattice"): which `(from, to)` type-kind
//! pairs are castable, and under which of the three modes.

use super::registry::TypeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastMode {
    /// Identical kind; always implicit.
    Identity,
    /// Integer widen/truncate or float widen/truncate; implicit only when
    /// widening within the same family (§4.3 "Implicit casts are permitted
    /// only on `=` rows or on widenings within the same family").
    Widen,
    Truncate,
    IntToFloat,
    FloatToInt,
    ZeroExtend,
    ZeroExtendThenFloat,
    TruncateToBool,
    /// Same storage width required; only ever explicit (§4.3 bit-reinterpret mode).
    BitReinterpret,
    Disallowed,
}

/// The row/column family a `TypeKind` belongs to in the lattice table.
/// `Int` collapses every width into one family; widen-vs-truncate between
/// two `Int`s is decided by comparing widths, not by the family itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Void,
    SignedInt,
    Float,
    Bool,
    Char,
    BChar,
    Byte,
    String,
    CString,
    Function,
}

fn family(kind: &TypeKind) -> Option<Family> {
    Some(match kind {
        TypeKind::Void => Family::Void,
        TypeKind::Int(_) => Family::SignedInt,
        TypeKind::Float(_) => Family::Float,
        TypeKind::Bool => Family::Bool,
        TypeKind::Char => Family::Char,
        TypeKind::BChar => Family::BChar,
        TypeKind::Byte => Family::Byte,
        TypeKind::String => Family::String,
        TypeKind::CString => Family::CString,
        TypeKind::Function { .. } => Family::Function,
        // Aliases must be resolved by the caller before classifying.
        TypeKind::Alias { .. } => return None,
    })
}

/// Classify the transition `from -> to`. Callers must pass already-resolved
/// (non-alias) kinds, e.g. via `TypeRegistry::resolve`.
pub fn classify(from: &TypeKind, to: &TypeKind) -> CastMode {
    use CastMode::*;
    use Family::*;

    let (Some(from_fam), Some(to_fam)) = (family(from), family(to)) else {
        return Disallowed;
    };

    match (from_fam, to_fam) {
        (Void, Void) => Identity,
        (Void, _) | (_, Void) => Disallowed,

        (SignedInt, SignedInt) => match (from, to) {
            (TypeKind::Int(from_w), TypeKind::Int(to_w)) => {
                if from_w == to_w {
                    Identity
                } else if width_rank(*to_w) > width_rank(*from_w) {
                    Widen
                } else {
                    Truncate
                }
            }
            _ => unreachable!("SignedInt family is always TypeKind::Int"),
        },
        (SignedInt, Float) => IntToFloat,
        (SignedInt, Bool) => TruncateToBool,
        (SignedInt, Char | BChar | Byte | String | CString | Function) => BitReinterpret,

        (Float, SignedInt) => FloatToInt,
        (Float, Float) => match (from, to) {
            (TypeKind::Float(from_w), TypeKind::Float(to_w)) => {
                if from_w == to_w {
                    Identity
                } else if float_rank(*to_w) > float_rank(*from_w) {
                    Widen
                } else {
                    Truncate
                }
            }
            _ => unreachable!("Float family is always TypeKind::Float"),
        },
        (Float, Bool) => Disallowed,
        (Float, Char | BChar | Byte | Function) => BitReinterpret,
        (Float, String | CString) => Disallowed,

        (Bool, SignedInt) => ZeroExtend,
        (Bool, Float) => ZeroExtendThenFloat,
        (Bool, Bool) => Identity,
        (Bool, Char | BChar | Byte | Function) => BitReinterpret,
        (Bool, String | CString) => Disallowed,

        (Char, SignedInt) => Truncate,
        (Char, Float) => Disallowed,
        (Char, Bool) => ZeroExtend,
        (Char, Char) => Identity,
        (Char, BChar | Byte | Function) => BitReinterpret,
        (Char, String | CString) => Disallowed,

        (BChar, SignedInt) => Identity, // "= (as i8)"
        (BChar, Float) => Disallowed,
        (BChar, Bool) => ZeroExtend,
        (BChar, Char) => BitReinterpret,
        (BChar, BChar) => Identity,
        (BChar, Byte | Function) => BitReinterpret,
        (BChar, String | CString) => Disallowed,

        (Byte, SignedInt) => ZeroExtend,
        (Byte, Float) => Disallowed,
        (Byte, Bool) => ZeroExtend,
        (Byte, Char | BChar | Function) => BitReinterpret,
        (Byte, Byte) => Identity,
        (Byte, String | CString) => Disallowed,

        (String, String) => Identity,
        (String, _) => Disallowed,

        (CString, CString) => Identity,
        (CString, _) => Disallowed,

        (Function, Function) => Identity,
        (Function, _) => Disallowed,
    }
}

fn width_rank(width: crate::lexer::IntWidth) -> u8 {
    use crate::lexer::IntWidth::*;
    match width {
        W8 => 0,
        W16 => 1,
        W32 => 2,
        W64 => 3,
    }
}

fn float_rank(width: crate::lexer::FloatWidth) -> u8 {
    use crate::lexer::FloatWidth::*;
    match width {
        W32 => 0,
        W64 => 1,
    }
}

/// Whether `mode` is permitted in implicit position (assignment, argument
/// passing, return) rather than requiring an explicit `cast`/`as` (§4.3:
/// "Implicit casts are permitted only on `=` rows or on widenings within
/// the same family").
pub fn is_implicit(mode: CastMode) -> bool {
    matches!(mode, CastMode::Identity | CastMode::Widen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{FloatWidth, IntWidth};

    #[test]
    fn int_widening_is_implicit() {
        let mode = classify(&TypeKind::Int(IntWidth::W32), &TypeKind::Int(IntWidth::W64));
        assert_eq!(mode, CastMode::Widen);
        assert!(is_implicit(mode));
    }

    #[test]
    fn int_truncation_is_explicit_only() {
        let mode = classify(&TypeKind::Int(IntWidth::W64), &TypeKind::Int(IntWidth::W32));
        assert_eq!(mode, CastMode::Truncate);
        assert!(!is_implicit(mode));
    }

    #[test]
    fn int_to_string_is_bit_reinterpret_not_disallowed() {
        assert_eq!(classify(&TypeKind::Int(IntWidth::W32), &TypeKind::String), CastMode::BitReinterpret);
    }

    #[test]
    fn string_to_int_is_disallowed() {
        assert_eq!(classify(&TypeKind::String, &TypeKind::Int(IntWidth::W32)), CastMode::Disallowed);
    }

    #[test]
    fn float_widen_is_implicit() {
        let mode = classify(&TypeKind::Float(FloatWidth::W32), &TypeKind::Float(FloatWidth::W64));
        assert!(is_implicit(mode));
    }

    #[test]
    fn bool_to_bool_is_identity() {
        assert_eq!(classify(&TypeKind::Bool, &TypeKind::Bool), CastMode::Identity);
    }
}
