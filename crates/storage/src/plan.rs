//! Part planning for multipart uploads.
//!
//! Pure logic mapping a file size and chunk size onto 1-based parts.
//! No I/O operations - just byte-range arithmetic.

/// Byte range of one part of a multipart upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartPlan {
    /// 1-based part number.
    pub part_number: u32,
    /// Byte offset within the file.
    pub offset: u64,
    /// Length of this part in bytes.
    pub length: u64,
}

/// Split a file into parts.
///
/// Every part is `chunk_size` bytes except the last, which may be shorter.
/// An empty file still gets one zero-length part, since a multipart upload
/// cannot be completed without any part.
///
/// # Arguments
/// * `file_size` - Total file size in bytes
/// * `chunk_size` - Size of each part, must be non-zero
///
/// # Returns
/// Parts in part-number order. Empty if `chunk_size` is 0. Callers check
/// `expected_part_count` against `MAX_PART_NUMBER` before planning.
pub fn plan_parts(file_size: u64, chunk_size: u64) -> Vec<PartPlan> {
    if chunk_size == 0 {
        return Vec::new();
    }
    if file_size == 0 {
        return vec![PartPlan {
            part_number: 1,
            offset: 0,
            length: 0,
        }];
    }

    // Part numbers beyond u32 cannot be addressed; callers reject such
    // layouts against MAX_PART_NUMBER first.
    (1..=expected_part_count(file_size, chunk_size))
        .map_while(|index| u32::try_from(index).ok())
        .map(|part_number| {
            let offset = (u64::from(part_number) - 1) * chunk_size;
            PartPlan {
                part_number,
                offset,
                length: std::cmp::min(chunk_size, file_size - offset),
            }
        })
        .collect()
}

/// Calculate the number of parts a file splits into.
pub fn expected_part_count(file_size: u64, chunk_size: u64) -> u64 {
    if chunk_size == 0 {
        return 0;
    }
    if file_size == 0 {
        return 1;
    }
    file_size.div_ceil(chunk_size)
}

/// Expected length of `part_number` under the uniform chunk layout.
///
/// Returns `None` if the part lies beyond the end of the file.
pub fn expected_part_length(file_size: u64, chunk_size: u64, part_number: u32) -> Option<u64> {
    let count = expected_part_count(file_size, chunk_size);
    let index = u64::from(part_number);
    if index == 0 || index > count {
        return None;
    }
    let offset = (index - 1) * chunk_size;
    Some(std::cmp::min(chunk_size, file_size - offset))
}
