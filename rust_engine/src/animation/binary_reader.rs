//! 小端二进制读取游标

use byteorder::{ByteOrder, LittleEndian};

use crate::{MmdError, Result};

/// 字节切片上的只读游标
///
/// 所有读取都先检查剩余长度，越界时返回 [`MmdError::Truncated`]，游标位置保持不变。
#[derive(Clone, Debug)]
pub struct BinaryReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// 当前读取位置
    pub fn position(&self) -> usize {
        self.position
    }

    /// 剩余可读字节数
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    /// 确保还能读取 `needed` 字节
    pub fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if available < needed {
            return Err(MmdError::Truncated {
                offset: self.position,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// 读取定长字节块
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.bytes[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    /// 读取定长数组
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// 跳过字节
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_endian() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-2i32).to_le_bytes());
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.push(0xAB);

        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_i32().unwrap(), -2);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.read_array::<1>().unwrap(), [0xAB]);
        assert_eq!(reader.position(), 9);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_out_of_bounds_keeps_position() {
        let bytes = [1u8, 2, 3];
        let mut reader = BinaryReader::new(&bytes);
        reader.skip(1).unwrap();

        match reader.read_i32() {
            Err(MmdError::Truncated { offset, needed, available }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.read_array::<2>().unwrap(), [2, 3]);
    }
}
