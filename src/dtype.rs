//! Scalar type system
//!
//! Defines the closed set of supported element types ([`ScalarKind`]), the
//! canonical on-disk type tag ([`TypeInfo`]), the sealed [`Scalar`] trait that
//! ties native Rust types to the table, and the handle-backed
//! [`TypeDescriptor`] returned by dataset/attribute type queries.
//!
//! The type table is the single place that knows the class/size/signedness of
//! every supported scalar: adding a type means adding one `ScalarKind` entry
//! and one macro line, not touching every call site.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::handle::ObjectHandle;

/// Broad class of a stored element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    None,
    Integer,
    Float,
    String,
}

/// Byte order of a stored element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
    Vax,
    Mixed,
    None,
}

/// The closed set of supported element types.
///
/// Every dataset and attribute stores exactly one of these kinds, fixed at
/// creation. All kinds are encoded little-endian on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ScalarKind {
    /// All supported kinds, in table order.
    pub const ALL: [ScalarKind; 10] = [
        ScalarKind::I8,
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::U8,
        ScalarKind::U16,
        ScalarKind::U32,
        ScalarKind::U64,
        ScalarKind::F32,
        ScalarKind::F64,
    ];

    /// Type class of this kind.
    pub const fn class(self) -> TypeClass {
        match self {
            ScalarKind::F32 | ScalarKind::F64 => TypeClass::Float,
            _ => TypeClass::Integer,
        }
    }

    /// Element width in bytes.
    pub const fn size_bytes(self) -> usize {
        match self {
            ScalarKind::I8 | ScalarKind::U8 => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 4,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => 8,
        }
    }

    /// Whether the kind is a signed integer. False for floats.
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64
        )
    }

    /// Significant bits. All supported kinds use the full width.
    pub const fn precision_bits(self) -> usize {
        self.size_bytes() * 8
    }

    /// Canonical on-disk tag for this kind.
    pub fn type_info(self) -> TypeInfo {
        TypeInfo {
            class: self.class(),
            order: ByteOrder::LittleEndian,
            size_bytes: self.size_bytes(),
            precision_bits: self.precision_bits(),
            signed: self.is_signed(),
        }
    }

    /// Decode one element from its little-endian on-disk bytes.
    ///
    /// `bytes` must hold exactly `size_bytes()` bytes.
    pub(crate) fn read_repr(self, bytes: &[u8]) -> ScalarRepr {
        debug_assert_eq!(bytes.len(), self.size_bytes());
        match self {
            ScalarKind::I8 => ScalarRepr::Int(bytes[0] as i8 as i128),
            ScalarKind::I16 => {
                ScalarRepr::Int(i16::from_le_bytes(bytes.try_into().unwrap()) as i128)
            }
            ScalarKind::I32 => {
                ScalarRepr::Int(i32::from_le_bytes(bytes.try_into().unwrap()) as i128)
            }
            ScalarKind::I64 => {
                ScalarRepr::Int(i64::from_le_bytes(bytes.try_into().unwrap()) as i128)
            }
            ScalarKind::U8 => ScalarRepr::Int(bytes[0] as i128),
            ScalarKind::U16 => {
                ScalarRepr::Int(u16::from_le_bytes(bytes.try_into().unwrap()) as i128)
            }
            ScalarKind::U32 => {
                ScalarRepr::Int(u32::from_le_bytes(bytes.try_into().unwrap()) as i128)
            }
            ScalarKind::U64 => {
                ScalarRepr::Int(u64::from_le_bytes(bytes.try_into().unwrap()) as i128)
            }
            ScalarKind::F32 => {
                ScalarRepr::Float(f32::from_le_bytes(bytes.try_into().unwrap()) as f64)
            }
            ScalarKind::F64 => {
                ScalarRepr::Float(f64::from_le_bytes(bytes.try_into().unwrap()))
            }
        }
    }

    /// Encode one element into its little-endian on-disk bytes.
    pub(crate) fn write_repr(self, repr: ScalarRepr, out: &mut Vec<u8>) {
        match self {
            ScalarKind::I8 => out.extend_from_slice(&i8::from_repr(repr).to_le_bytes()),
            ScalarKind::I16 => out.extend_from_slice(&i16::from_repr(repr).to_le_bytes()),
            ScalarKind::I32 => out.extend_from_slice(&i32::from_repr(repr).to_le_bytes()),
            ScalarKind::I64 => out.extend_from_slice(&i64::from_repr(repr).to_le_bytes()),
            ScalarKind::U8 => out.extend_from_slice(&u8::from_repr(repr).to_le_bytes()),
            ScalarKind::U16 => out.extend_from_slice(&u16::from_repr(repr).to_le_bytes()),
            ScalarKind::U32 => out.extend_from_slice(&u32::from_repr(repr).to_le_bytes()),
            ScalarKind::U64 => out.extend_from_slice(&u64::from_repr(repr).to_le_bytes()),
            ScalarKind::F32 => out.extend_from_slice(&f32::from_repr(repr).to_le_bytes()),
            ScalarKind::F64 => out.extend_from_slice(&f64::from_repr(repr).to_le_bytes()),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Canonical description of an on-disk element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub class: TypeClass,
    pub order: ByteOrder,
    pub size_bytes: usize,
    pub precision_bits: usize,
    /// Meaningful only when `class == Integer`.
    pub signed: bool,
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            TypeClass::Integer => write!(
                f,
                "{}-bit {} integer",
                self.precision_bits,
                if self.signed { "signed" } else { "unsigned" }
            ),
            TypeClass::Float => write!(f, "{}-bit float", self.precision_bits),
            TypeClass::String => write!(f, "string"),
            TypeClass::None => write!(f, "untyped"),
        }
    }
}

/// Widened intermediate used for cross-type element conversion.
///
/// Integers travel through `i128` (covers the full `i64` and `u64` ranges),
/// floats through `f64`. The final step to the destination type is an `as`
/// cast, giving Rust's standard numeric conversion semantics: widening exact,
/// integer narrowing two's-complement truncating, float-to-integer
/// saturating, float narrowing round-to-nearest.
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
pub enum ScalarRepr {
    Int(i128),
    Float(f64),
}

mod sealed {
    pub trait Sealed {}
}

/// A native Rust type in the supported scalar set.
///
/// The trait is sealed: exactly `i8 i16 i32 i64 u8 u16 u32 u64 f32 f64`
/// implement it, so requesting an unsupported element type is a compile-time
/// error, never a runtime false.
pub trait Scalar: sealed::Sealed + Copy + Default + 'static {
    /// The table entry for this type.
    const KIND: ScalarKind;

    #[doc(hidden)]
    fn to_repr(self) -> ScalarRepr;

    #[doc(hidden)]
    fn from_repr(repr: ScalarRepr) -> Self;
}

macro_rules! impl_int_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn to_repr(self) -> ScalarRepr {
                ScalarRepr::Int(self as i128)
            }

            fn from_repr(repr: ScalarRepr) -> Self {
                match repr {
                    ScalarRepr::Int(v) => v as $ty,
                    ScalarRepr::Float(v) => v as $ty,
                }
            }
        }
    )*};
}

macro_rules! impl_float_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn to_repr(self) -> ScalarRepr {
                ScalarRepr::Float(self as f64)
            }

            fn from_repr(repr: ScalarRepr) -> Self {
                match repr {
                    ScalarRepr::Int(v) => v as $ty,
                    ScalarRepr::Float(v) => v as $ty,
                }
            }
        }
    )*};
}

impl_int_scalar! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl_float_scalar! {
    f32 => F32,
    f64 => F64,
}

/// Encode a slice of native values into on-disk bytes of `kind`.
pub(crate) fn encode_slice<T: Scalar>(kind: ScalarKind, values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * kind.size_bytes());
    for value in values {
        kind.write_repr(value.to_repr(), &mut out);
    }
    out
}

/// Decode on-disk bytes of `kind` into native values.
///
/// `bytes` must hold exactly `out.len()` elements of `kind`.
pub(crate) fn decode_slice<T: Scalar>(kind: ScalarKind, bytes: &[u8], out: &mut [T]) {
    let size = kind.size_bytes();
    debug_assert_eq!(bytes.len(), out.len() * size);
    for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(size)) {
        *slot = T::from_repr(kind.read_repr(chunk));
    }
}

/// Handle-backed description of a stored element's on-disk representation.
///
/// Obtained only by querying an existing dataset or attribute via
/// `get_type()`; the descriptor holds its own engine handle, released exactly
/// once when the descriptor is dropped. The description is decoupled from
/// whatever type the caller later reads with.
pub struct TypeDescriptor {
    #[allow(dead_code)]
    handle: ObjectHandle,
    info: TypeInfo,
}

impl TypeDescriptor {
    pub(crate) fn new(handle: ObjectHandle, info: TypeInfo) -> Self {
        Self { handle, info }
    }

    pub fn get_class(&self) -> TypeClass {
        self.info.class
    }

    pub fn get_order(&self) -> ByteOrder {
        self.info.order
    }

    /// Element width in bytes.
    pub fn get_size(&self) -> usize {
        self.info.size_bytes
    }

    /// Significant bits. Invariant: `get_size() * 8 >= get_precision()`.
    pub fn get_precision(&self) -> usize {
        self.info.precision_bits
    }

    /// Whether the stored integer type is signed. Defined only for the
    /// Integer class; false for everything else.
    pub fn is_signed(&self) -> bool {
        self.info.class == TypeClass::Integer && self.info.signed
    }

    /// Whether this descriptor matches the canonical mapping for `T`.
    pub fn matches<T: Scalar>(&self) -> bool {
        let want = T::KIND.type_info();
        self.info.class == want.class
            && self.info.size_bytes == want.size_bytes
            && (self.info.class != TypeClass::Integer || self.info.signed == want.signed)
    }

    /// Like [`matches`](Self::matches), but returns the mismatch as an error
    /// for callers that want to gate a read explicitly.
    pub fn ensure_matches<T: Scalar>(&self) -> Result<()> {
        if self.matches::<T>() {
            Ok(())
        } else {
            Err(VaultError::TypeMismatch {
                requested: T::KIND.to_string(),
                stored: self.info.to_string(),
            })
        }
    }
}
