//! Compact binary image of a [`Bytecode`] sequence.
//!
//! The image is the postcard encoding of the cell list. It carries no header
//! and no version; it is meant for handing a compiled program to a VM in
//! another process, not for storage.

use thiserror::Error;

use crate::bytecode::Bytecode;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image error: cannot encode bytecode: {0}")]
    Encode(#[source] postcard::Error),

    #[error("image error: malformed image: {0}")]
    Decode(#[source] postcard::Error),

    #[error("image error: {0} trailing bytes after bytecode")]
    TrailingBytes(usize),
}

pub fn encode(bc: &Bytecode) -> Result<Vec<u8>, ImageError> {
    postcard::to_allocvec(bc).map_err(ImageError::Encode)
}

pub fn decode(bytes: &[u8]) -> Result<Bytecode, ImageError> {
    let (bc, rest) = postcard::take_from_bytes::<Bytecode>(bytes).map_err(ImageError::Decode)?;
    if !rest.is_empty() {
        return Err(ImageError::TrailingBytes(rest.len()));
    }
    Ok(bc)
}

/// Hex dump, 16 bytes per row, prefixed with the byte offset.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut output = String::new();

    for (row, chunk) in bytes.chunks(16).enumerate() {
        output.push_str(&format!("{:04x}:", row * 16));
        for byte in chunk {
            output.push_str(&format!(" {:02x}", byte));
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile::compile;

    #[test]
    fn test_compiled_program_survives_image() {
        let bc = compile("x = 40 + 2\nprint x").unwrap();
        let bytes = encode(&bc).unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(decode(&bytes).unwrap(), bc);
    }

    #[test]
    fn test_truncated_image() {
        let bc = compile("x = 1 + 2").unwrap();
        let bytes = encode(&bc).unwrap();

        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode(&Bytecode::new()).unwrap();
        bytes.extend_from_slice(&[0xff, 0xff]);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, ImageError::TrailingBytes(2)));
    }

    #[test]
    fn test_hex_dump_rows() {
        let bytes: Vec<u8> = (0..20).collect();
        let dump = hex_dump(&bytes);
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0000: 00 01 02"));
        assert_eq!(lines[1], "0010: 10 11 12 13");
    }
}
