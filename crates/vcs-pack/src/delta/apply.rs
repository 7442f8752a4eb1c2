//! Apply delta instructions to reconstruct objects.

use crate::PackError;
use super::read_varint;

/// Apply a delta instruction stream to a base object, producing the target.
///
/// The delta format is:
/// ```text
/// [source_size: varint] [target_size: varint] [instructions...]
/// ```
///
/// This function validates sizes and performs bounds checking on all
/// copy operations to prevent out-of-bounds reads.
pub fn apply_delta(base: &[u8], delta: &[u8]) -> Result<Vec<u8>, PackError> {
    let mut pos = 0;

    // Read source size
    let (source_size, consumed) = read_varint(&delta[pos..]).ok_or_else(|| {
        PackError::BadDeltaChain(format!("at offset {pos}: truncated source size"))
    })?;
    pos += consumed;

    // Read target size
    let (target_size, consumed) = read_varint(&delta[pos..]).ok_or_else(|| {
        PackError::BadDeltaChain(format!("at offset {pos}: truncated target size"))
    })?;
    pos += consumed;

    // Validate source size
    if source_size != base.len() {
        return Err(PackError::BadDeltaChain(format!(
            "at offset {pos}: source size mismatch: delta says {source_size}, base is {}",
            base.len()
        )));
    }

    let mut output = Vec::with_capacity(target_size);

    while pos < delta.len() {
        let cmd = delta[pos];
        pos += 1;

        if cmd & 0x80 != 0 {
            // Copy instruction
            let mut offset: usize = 0;
            let mut size: usize = 0;

            if cmd & 0x01 != 0 {
                if pos >= delta.len() {
                    return Err(PackError::BadDeltaChain(format!(
                        "at offset {pos}: truncated copy offset"
                    )));
                }
                offset |= delta[pos] as usize;
                pos += 1;
            }
            if cmd & 0x02 != 0 {
                if pos >= delta.len() {
                    return Err(PackError::BadDeltaChain(format!(
                        "at offset {pos}: truncated copy offset"
                    )));
                }
                offset |= (delta[pos] as usize) << 8;
                pos += 1;
            }
            if cmd & 0x04 != 0 {
                if pos >= delta.len() {
                    return Err(PackError::BadDeltaChain(format!(
                        "at offset {pos}: truncated copy offset"
                    )));
                }
                offset |= (delta[pos] as usize) << 16;
                pos += 1;
            }
            if cmd & 0x08 != 0 {
                if pos >= delta.len() {
                    return Err(PackError::BadDeltaChain(format!(
                        "at offset {pos}: truncated copy offset"
                    )));
                }
                offset |= (delta[pos] as usize) << 24;
                pos += 1;
            }

            if cmd & 0x10 != 0 {
                if pos >= delta.len() {
                    return Err(PackError::BadDeltaChain(format!(
                        "at offset {pos}: truncated copy size"
                    )));
                }
                size |= delta[pos] as usize;
                pos += 1;
            }
            if cmd & 0x20 != 0 {
                if pos >= delta.len() {
                    return Err(PackError::BadDeltaChain(format!(
                        "at offset {pos}: truncated copy size"
                    )));
                }
                size |= (delta[pos] as usize) << 8;
                pos += 1;
            }
            if cmd & 0x40 != 0 {
                if pos >= delta.len() {
                    return Err(PackError::BadDeltaChain(format!(
                        "at offset {pos}: truncated copy size"
                    )));
                }
                size |= (delta[pos] as usize) << 16;
                pos += 1;
            }

            // Size of 0 means 0x10000 (65536)
            if size == 0 {
                size = 0x10000;
            }

            // Bounds check
            if offset + size > base.len() {
                return Err(PackError::BadDeltaChain(format!(
                    "at offset {pos}: copy out of bounds: offset={offset}, size={size}, base_len={}",
                    base.len()
                )));
            }

            output.extend_from_slice(&base[offset..offset + size]);
        } else if cmd != 0 {
            // Insert instruction
            let n = cmd as usize;
            if pos + n > delta.len() {
                return Err(PackError::BadDeltaChain(format!(
                    "at offset {pos}: truncated insert data"
                )));
            }
            output.extend_from_slice(&delta[pos..pos + n]);
            pos += n;
        } else {
            return Err(PackError::BadDeltaChain(format!(
                "at offset {}: unexpected delta opcode 0",
                pos - 1
            )));
        }
    }

    // Validate target size
    if output.len() != target_size {
        return Err(PackError::BadDeltaChain(format!(
            "at offset {pos}: target size mismatch: delta says {target_size}, got {}",
            output.len()
        )));
    }

    Ok(output)
}
