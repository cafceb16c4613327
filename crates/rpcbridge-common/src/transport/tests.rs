//! Integration tests for the transport layer
//!
//! These tests feed codec output into type resolution the way the proxy
//! invoker does.

#[cfg(test)]
mod tests {
    use crate::protocol::{resolve_types, ArgValue, BridgeError};
    use crate::transport::FrameCodec;

    #[test]
    fn test_decoded_frames_resolve_as_byte_arrays() {
        let encoded = FrameCodec::encode(&[b"a".to_vec(), b"bc".to_vec()]).unwrap();
        let frames = FrameCodec::decode(&encoded).unwrap();

        let args: Vec<ArgValue> = frames.into_iter().map(ArgValue::from).collect();
        let types = resolve_types(&args, &[], false).unwrap();

        assert_eq!(types.len(), 2);
        assert!(types.iter().all(|t| t.as_str() == "[byte;"));
    }

    #[test]
    fn test_round_trip_many_shapes() {
        let cases: Vec<Vec<Vec<u8>>> = vec![
            vec![],
            vec![vec![]],
            vec![vec![], vec![]],
            vec![vec![0u8; 1024]],
            (0..64).map(|i| vec![i as u8; i]).collect(),
        ];

        for frames in cases {
            let encoded = FrameCodec::encode(&frames).unwrap();
            let decoded = FrameCodec::decode(&encoded).unwrap();
            assert_eq!(frames, decoded);
        }
    }

    #[test]
    fn test_zero_count_rejects_trailing_bytes() {
        let data = [0, 0, 0, 0, 0xFF, 0xEE];
        let result = FrameCodec::decode(&data);
        assert!(matches!(result, Err(BridgeError::MalformedFrame(_))));

        assert!(FrameCodec::decode(&[0, 0, 0, 0]).unwrap().is_empty());
    }

    #[test]
    fn test_every_truncation_is_rejected() {
        let encoded = FrameCodec::encode(&[b"hello".to_vec(), b"world".to_vec()]).unwrap();

        for cut in 0..encoded.len() {
            let result = FrameCodec::decode(&encoded[..cut]);
            assert!(
                matches!(result, Err(BridgeError::MalformedFrame(_))),
                "truncation at {} should fail",
                cut
            );
        }
    }
}
