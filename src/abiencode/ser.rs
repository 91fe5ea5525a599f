//! Static-only Solidity ABI serializer.
//!
//! Every value occupies one or more 32-byte slots, written in field order:
//! unsigned integers and addresses right-aligned, `bytes32` values raw. This
//! is the subset of `abi.encode` needed for settlement digests, where all
//! fields have a fixed width. Dynamic types (and their head/tail offset
//! machinery) are intentionally unsupported: a fixed-order, fixed-width
//! encoding leaves no ambiguity between what was signed and what is checked.

use super::error::{Error, Result};
use serde::{
    ser::{
        self, SerializeStruct, SerializeTuple, SerializeTupleStruct,
    },
    Serialize,
};

/// Size of every encoded value slot, in bytes.
pub const SLOT_SIZE: usize = 32;

/// Receiver for encoded slots. Implemented by the keccak hasher behind
/// [to_hash][super::to_hash] and by plain buffers in tests.
pub trait Writer {
    fn write(&mut self, slot: &[u8]);
}

pub struct Serializer<'a, W: Writer> {
    writer: &'a mut W,
}

/// Encode `value` into 32-byte slots, writing each slot to `writer`.
pub fn to_writer<T, W>(value: &T, writer: &mut W) -> Result<()>
where
    T: Serialize,
    W: Writer,
{
    let mut serializer = Serializer { writer };
    value.serialize(&mut serializer)
}

impl<W: Writer> Serializer<'_, W> {
    fn write_right_aligned<const N: usize>(&mut self, bytes: [u8; N]) {
        // Uints and addresses are right-aligned within their slot.
        debug_assert!(N <= SLOT_SIZE);
        let mut slot = [0u8; SLOT_SIZE];
        slot[SLOT_SIZE - N..].copy_from_slice(&bytes);
        self.writer.write(&slot);
    }
}

macro_rules! unrepresentable {
    ($method:ident, $T:ty, $name:literal) => {
        fn $method(self, _: $T) -> Result<()> {
            Err(Error::TypeNotRepresentable($name))
        }
    };
}

impl<'a, W: Writer> ser::Serializer for &'a mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = ser::Impossible<(), Error>;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.write_right_aligned([v as u8]);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }
    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }
    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }
    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }
    fn serialize_u128(self, v: u128) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }

    // Signed integers could be encoded as `intN` (two's complement over the
    // full slot), but nothing in a channel digest is signed and not
    // implementing them keeps the encoding surface auditable.
    unrepresentable!(serialize_i8, i8, "i8");
    unrepresentable!(serialize_i16, i16, "i16");
    unrepresentable!(serialize_i32, i32, "i32");
    unrepresentable!(serialize_i64, i64, "i64");
    unrepresentable!(serialize_i128, i128, "i128");
    unrepresentable!(serialize_f32, f32, "f32");
    unrepresentable!(serialize_f64, f64, "f64");
    unrepresentable!(serialize_char, char, "char");
    unrepresentable!(serialize_str, &str, "str");

    /// Write one pre-built 32-byte slot.
    ///
    /// Only used by the [types][super::types] in this module, which all
    /// produce exactly one slot themselves (raw for `bytes32`, right-aligned
    /// for `address` and `U256`). Anything else is a bug in the caller.
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        if v.len() != SLOT_SIZE {
            return Err(Error::InvalidSlotLength(v.len()));
        }
        self.writer.write(v);
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::TypeNotRepresentable("Option"))
    }
    fn serialize_some<T>(self, _: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        Err(Error::TypeNotRepresentable("Option"))
    }
    fn serialize_unit(self) -> Result<()> {
        Err(Error::TypeNotRepresentable("unit"))
    }
    fn serialize_unit_struct(self, name: &'static str) -> Result<()> {
        Err(Error::TypeNotRepresentable(name))
    }
    fn serialize_unit_variant(
        self,
        name: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<()> {
        Err(Error::TypeNotRepresentable(name))
    }

    fn serialize_newtype_struct<T>(self, _: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        Err(Error::TypeNotRepresentable(name))
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::TypeNotRepresentable("sequence"))
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple> {
        Ok(self)
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(self)
    }
    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::TypeNotRepresentable(name))
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::TypeNotRepresentable("map"))
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }
    fn serialize_struct_variant(
        self,
        name: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::TypeNotRepresentable(name))
    }
}

// Structs, tuples and tuple structs are all encoded the same way: the
// concatenation of their fields' slots, in declaration order.

impl<'a, W: Writer> SerializeStruct for &'a mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, _: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, W: Writer> SerializeTuple for &'a mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, W: Writer> SerializeTupleStruct for &'a mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }
    fn end(self) -> Result<()> {
        Ok(())
    }
}
