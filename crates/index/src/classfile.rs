// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal class-file header parser.
//!
//! Reads the constant pool, access flags, class name and the field/method
//! declaration tables. Bytecode bodies and attributes are skipped; the
//! indexer only needs the symbolic surface.

use thiserror::Error;

/// Errors from class-file parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("not a class file (bad magic)")]
    BadMagic,

    #[error("truncated class file at offset {0}")]
    Truncated(usize),

    #[error("unknown constant pool tag {0}")]
    UnknownTag(u8),

    #[error("bad constant pool index {0}")]
    BadPoolIndex(u16),
}

/// `ACC_PUBLIC` on classes and members.
pub const ACC_PUBLIC: u16 = 0x0001;
/// `ACC_INTERFACE` on classes.
pub const ACC_INTERFACE: u16 = 0x0200;

/// A field or method declaration row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
}

impl MemberInfo {
    pub fn is_public(&self) -> bool {
        self.access_flags & ACC_PUBLIC != 0
    }
}

/// The symbolic header of one class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    /// Dotted binary name, e.g. `com.example.Foo$Bar`.
    pub name: String,
    pub access_flags: u16,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
}

impl ClassHeader {
    pub fn is_public(&self) -> bool {
        self.access_flags & ACC_PUBLIC != 0
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }
}

/// One constant pool slot we care about; everything else is `Other`.
enum PoolEntry {
    Utf8(String),
    Class(u16),
    Other,
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ClassFileError> {
        if self.pos + n > self.buf.len() {
            return Err(ClassFileError::Truncated(self.pos));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassFileError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassFileError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, n: usize) -> Result<(), ClassFileError> {
        self.take(n).map(|_| ())
    }
}

/// Parse the symbolic header of a class file.
pub fn parse_class_header(bytes: &[u8]) -> Result<ClassHeader, ClassFileError> {
    let mut c = Cursor { buf: bytes, pos: 0 };
    if c.u32()? != 0xCAFE_BABE {
        return Err(ClassFileError::BadMagic);
    }
    let _minor = c.u16()?;
    let _major = c.u16()?;

    // Constant pool: indexed 1..count, longs/doubles occupy two slots.
    let pool_count = c.u16()?;
    let mut pool: Vec<PoolEntry> = Vec::with_capacity(pool_count as usize);
    pool.push(PoolEntry::Other); // slot 0 is unused
    let mut slot = 1;
    while slot < pool_count {
        let tag = c.u8()?;
        let entry = match tag {
            1 => {
                let len = c.u16()? as usize;
                let raw = c.take(len)?;
                // Modified UTF-8; names the indexer keeps are ASCII-clean,
                // so lossy decoding is fine for the rest.
                PoolEntry::Utf8(String::from_utf8_lossy(raw).into_owned())
            }
            7 => PoolEntry::Class(c.u16()?),
            8 | 16 | 19 | 20 => {
                c.skip(2)?;
                PoolEntry::Other
            }
            15 => {
                c.skip(3)?;
                PoolEntry::Other
            }
            3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                c.skip(4)?;
                PoolEntry::Other
            }
            5 | 6 => {
                c.skip(8)?;
                pool.push(PoolEntry::Other);
                slot += 1;
                PoolEntry::Other
            }
            other => return Err(ClassFileError::UnknownTag(other)),
        };
        pool.push(entry);
        slot += 1;
    }

    let access_flags = c.u16()?;
    let this_class = c.u16()?;
    let _super_class = c.u16()?;

    let interface_count = c.u16()? as usize;
    c.skip(interface_count * 2)?;

    let fields = parse_members(&mut c, &pool)?;
    let methods = parse_members(&mut c, &pool)?;

    let name = class_name(&pool, this_class)?.replace('/', ".");
    Ok(ClassHeader {
        name,
        access_flags,
        fields,
        methods,
    })
}

fn parse_members(c: &mut Cursor, pool: &[PoolEntry]) -> Result<Vec<MemberInfo>, ClassFileError> {
    let count = c.u16()? as usize;
    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        let access_flags = c.u16()?;
        let name_index = c.u16()?;
        let descriptor_index = c.u16()?;
        skip_attributes(c)?;
        members.push(MemberInfo {
            access_flags,
            name: utf8(pool, name_index)?,
            descriptor: utf8(pool, descriptor_index)?,
        });
    }
    Ok(members)
}

fn skip_attributes(c: &mut Cursor) -> Result<(), ClassFileError> {
    let count = c.u16()? as usize;
    for _ in 0..count {
        let _name_index = c.u16()?;
        let length = c.u32()? as usize;
        c.skip(length)?;
    }
    Ok(())
}

fn utf8(pool: &[PoolEntry], index: u16) -> Result<String, ClassFileError> {
    match pool.get(index as usize) {
        Some(PoolEntry::Utf8(s)) => Ok(s.clone()),
        _ => Err(ClassFileError::BadPoolIndex(index)),
    }
}

fn class_name(pool: &[PoolEntry], index: u16) -> Result<String, ClassFileError> {
    match pool.get(index as usize) {
        Some(PoolEntry::Class(utf8_index)) => utf8(pool, *utf8_index),
        _ => Err(ClassFileError::BadPoolIndex(index)),
    }
}

#[cfg(test)]
#[path = "classfile_tests.rs"]
mod tests;
