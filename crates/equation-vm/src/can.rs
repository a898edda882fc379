//! CAN frame context for the CAN builtins

/// Snapshot of one CAN object handed to an execution
///
/// `data` and `old_data` hold the current and the previously transmitted
/// payload. Multi-byte accessors read little-endian.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanFrame {
    pub id: u32,
    pub data: Vec<u8>,
    pub old_data: Vec<u8>,
    pub cycles: u32,
    pub should_be_sent: bool,
}

impl CanFrame {
    pub fn new(id: u32, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            id,
            old_data: data.clone(),
            data,
            cycles: 0,
            should_be_sent: false,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Byte at `index`, clamped to the last byte
    pub fn byte(&self, index: u64) -> u8 {
        if self.data.len() <= 1 {
            return self.data.first().copied().unwrap_or(0);
        }
        let idx = (index as usize).min(self.data.len() - 1);
        self.data[idx]
    }

    /// 16-bit word `index`, clamped to the last complete word
    pub fn word(&self, index: u64) -> u16 {
        let words = self.data.len() / 2;
        if words == 0 {
            return 0;
        }
        let idx = (index as usize).min(words - 1) * 2;
        u16::from_le_bytes([self.data[idx], self.data[idx + 1]])
    }

    /// 32-bit word `index`, clamped to the last complete double word
    pub fn dword(&self, index: u64) -> u32 {
        let dwords = self.data.len() / 4;
        if dwords == 0 {
            return 0;
        }
        let idx = (index as usize).min(dwords - 1) * 4;
        u32::from_le_bytes([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    /// Whether any byte in `start..start + size` differs from the previous payload
    ///
    /// A non-positive size or negative start compares the whole frame. A range
    /// beginning past the end never reports a change.
    pub fn data_changed(&self, start: i64, size: i64) -> bool {
        let len = self.data.len();
        let (from, to) = if size <= 0 || start < 0 {
            (0, len)
        } else if (start as usize) < len {
            let start = start as usize;
            (start, (start + size as usize).min(len))
        } else {
            return false;
        };
        self.data[from..to]
            .iter()
            .zip(self.old_data.iter().skip(from))
            .any(|(a, b)| a != b)
            || self.old_data.len() < to
    }
}
