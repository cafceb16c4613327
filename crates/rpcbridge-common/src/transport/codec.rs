use crate::protocol::error::{BridgeError, Result};

/// Positional call arguments, each an opaque byte array.
pub type ArgumentFrame = Vec<Vec<u8>>;

/// Size of every integer field in the frame header.
const INT_SIZE: usize = 4;

/// Codec for the multi-parameter argument buffer.
///
/// # Wire Format
///
/// All integers are big-endian `i32`:
///
/// ```text
/// [count] [len_0] .. [len_{count-1}] [payload_0] .. [payload_{count-1}]
/// ```
///
/// Payloads are concatenated with no padding. The header plus the sum of the
/// declared lengths must equal the buffer length exactly.
///
/// # Example
///
/// ```
/// use rpcbridge_common::transport::FrameCodec;
///
/// let frames = vec![b"hello".to_vec(), Vec::new(), vec![0xAA]];
///
/// let encoded = FrameCodec::encode(&frames).unwrap();
/// let decoded = FrameCodec::decode(&encoded).unwrap();
///
/// assert_eq!(frames, decoded);
/// ```
pub struct FrameCodec;

impl FrameCodec {
    /// Encode an ordered list of frames into a single buffer
    ///
    /// # Arguments
    ///
    /// * `frames` - The positional arguments to pack
    ///
    /// # Returns
    ///
    /// The framed buffer
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedFrame`] if the frame count or any frame
    /// length does not fit in an `i32`.
    pub fn encode<T: AsRef<[u8]>>(frames: &[T]) -> Result<Vec<u8>> {
        let count = to_i32(frames.len(), "frame count")?;

        let payload_len: usize = frames.iter().map(|f| f.as_ref().len()).sum();
        let mut buf = Vec::with_capacity(INT_SIZE * (1 + frames.len()) + payload_len);

        buf.extend_from_slice(&count.to_be_bytes());
        for frame in frames {
            let len = to_i32(frame.as_ref().len(), "frame length")?;
            buf.extend_from_slice(&len.to_be_bytes());
        }
        for frame in frames {
            buf.extend_from_slice(frame.as_ref());
        }

        Ok(buf)
    }

    /// Decode a framed buffer into its positional arguments
    ///
    /// A buffer holding only a zero count decodes to an empty list.
    ///
    /// # Arguments
    ///
    /// * `data` - The framed buffer
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedFrame`] if the header is truncated,
    /// declares negative sizes, or the declared lengths do not add up to the
    /// buffer length. Nothing is returned for a malformed buffer.
    pub fn decode(data: &[u8]) -> Result<ArgumentFrame> {
        let count = read_i32(data, 0).ok_or_else(|| {
            BridgeError::MalformedFrame(format!(
                "buffer of {} bytes is shorter than the frame count",
                data.len()
            ))
        })?;

        if count == 0 {
            if data.len() != INT_SIZE {
                return Err(BridgeError::MalformedFrame(format!(
                    "zero frames declared but buffer has {} bytes",
                    data.len()
                )));
            }
            return Ok(Vec::new());
        }
        if count < 0 {
            return Err(BridgeError::MalformedFrame(format!(
                "negative frame count {}",
                count
            )));
        }

        let count = count as usize;
        let header_len = count
            .checked_mul(INT_SIZE)
            .and_then(|n| n.checked_add(INT_SIZE))
            .filter(|&n| n <= data.len())
            .ok_or_else(|| {
                BridgeError::MalformedFrame(format!(
                    "{} frames need a longer header than the {} byte buffer",
                    count,
                    data.len()
                ))
            })?;

        let mut lens = Vec::with_capacity(count);
        let mut total_len = header_len;
        for i in 0..count {
            let len = read_i32(data, INT_SIZE * (i + 1)).unwrap_or_default();
            if len < 0 {
                return Err(BridgeError::MalformedFrame(format!(
                    "frame {} has negative length {}",
                    i, len
                )));
            }
            let len = len as usize;
            total_len = total_len.checked_add(len).ok_or_else(|| {
                BridgeError::MalformedFrame("total frame length overflows".to_string())
            })?;
            lens.push(len);
        }

        if total_len != data.len() {
            return Err(BridgeError::MalformedFrame(format!(
                "declared length {} does not match buffer length {}",
                total_len,
                data.len()
            )));
        }

        let mut frames = Vec::with_capacity(count);
        let mut offset = header_len;
        for len in lens {
            frames.push(data[offset..offset + len].to_vec());
            offset += len;
        }

        Ok(frames)
    }
}

fn to_i32(n: usize, what: &str) -> Result<i32> {
    i32::try_from(n).map_err(|_| BridgeError::MalformedFrame(format!("{} {} exceeds i32", what, n)))
}

fn read_i32(data: &[u8], offset: usize) -> Option<i32> {
    let bytes = data.get(offset..offset + INT_SIZE)?;
    Some(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
