//! Dense `.npy` array persistence.
//!
//! NPY v1.0, C order, little endian:
//!   [0..6]   Magic: "\x93NUMPY"
//!   [6]      Major version: 1
//!   [7]      Minor version: 0
//!   [8..10]  Header length: u16 (LE)
//!   [10..]   Python dict literal, space padded, '\n' terminated so the
//!            data section starts on a 64-byte boundary
//!
//! Body: raw samples. Only `<f4` and `<i4` are written or read.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{HologramError, HologramResult};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;
const PREAMBLE_LEN: usize = MAGIC.len() + 2 + 2;

const DESCR_F32: &str = "<f4";
const DESCR_I32: &str = "<i4";

/// Write a float32 array.
pub fn write_f32(path: impl AsRef<Path>, shape: &[usize], data: &[f32]) -> HologramResult<()> {
    write_array(path.as_ref(), DESCR_F32, shape, data.len(), |w| {
        for v in data {
            w.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    })
}

/// Write an int32 array.
pub fn write_i32(path: impl AsRef<Path>, shape: &[usize], data: &[i32]) -> HologramResult<()> {
    write_array(path.as_ref(), DESCR_I32, shape, data.len(), |w| {
        for v in data {
            w.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    })
}

/// Read a float32 array: `(shape, samples)`.
pub fn read_f32(path: impl AsRef<Path>) -> HologramResult<(Vec<usize>, Vec<f32>)> {
    let (shape, body) = read_array(path.as_ref(), DESCR_F32)?;
    let samples = body
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok((shape, samples))
}

/// Read an int32 array: `(shape, samples)`.
pub fn read_i32(path: impl AsRef<Path>) -> HologramResult<(Vec<usize>, Vec<i32>)> {
    let (shape, body) = read_array(path.as_ref(), DESCR_I32)?;
    let samples = body
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok((shape, samples))
}

// ---- Header ----

fn shape_literal(shape: &[usize]) -> String {
    match shape {
        [single] => format!("({},)", single),
        dims => {
            let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("({})", parts.join(", "))
        }
    }
}

fn encode_header(descr: &str, shape: &[usize]) -> HologramResult<Vec<u8>> {
    let mut dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        descr,
        shape_literal(shape)
    );
    let unpadded = PREAMBLE_LEN + dict.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
    dict.extend(std::iter::repeat(' ').take(padding));
    dict.push('\n');

    let header_len = u16::try_from(dict.len())
        .map_err(|_| HologramError::Format(format!("header too long for shape {:?}", shape)))?;

    let mut out = Vec::with_capacity(PREAMBLE_LEN + dict.len());
    out.extend_from_slice(MAGIC);
    out.push(1);
    out.push(0);
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    Ok(out)
}

/// Value text following `'key':` in the header dict.
fn header_field<'a>(header: &'a str, key: &str) -> HologramResult<&'a str> {
    let needle = format!("'{}':", key);
    let start = header
        .find(&needle)
        .map(|i| i + needle.len())
        .ok_or_else(|| HologramError::Format(format!("header missing '{}'", key)))?;
    Ok(header[start..].trim_start())
}

fn parse_shape(header: &str) -> HologramResult<Vec<usize>> {
    let rest = header_field(header, "shape")?;
    let close = rest
        .find(')')
        .ok_or_else(|| HologramError::Format("unterminated shape tuple".into()))?;
    rest[..close]
        .trim_start_matches('(')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| HologramError::Format(format!("bad shape dimension '{}'", s)))
        })
        .collect()
}

fn parse_header(header: &str, expected_descr: &str) -> HologramResult<Vec<usize>> {
    let descr = header_field(header, "descr")?;
    if !descr.starts_with(&format!("'{}'", expected_descr)) {
        return Err(HologramError::Format(format!(
            "expected dtype {}, found {}",
            expected_descr,
            descr.split(',').next().unwrap_or(descr)
        )));
    }
    if !header_field(header, "fortran_order")?.starts_with("False") {
        return Err(HologramError::Format("fortran-ordered arrays are not supported".into()));
    }
    parse_shape(header)
}

// ---- File IO ----

fn write_array(
    path: &Path,
    descr: &str,
    shape: &[usize],
    len: usize,
    body: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> HologramResult<()> {
    let expected: usize = shape.iter().product();
    if expected != len {
        return Err(HologramError::shape("array sample count", expected, len));
    }

    let header = encode_header(descr, shape)?;
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(&header)?;
    body(&mut w)?;
    w.flush()?;

    log::debug!("[NPY] wrote {} {:?} to {}", descr, shape, path.display());
    Ok(())
}

fn read_array(path: &Path, descr: &str) -> HologramResult<(Vec<usize>, Vec<u8>)> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;

    if bytes.len() < PREAMBLE_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(HologramError::Format("missing NPY magic".into()));
    }
    if bytes[6] != 1 {
        return Err(HologramError::Format(format!("unsupported NPY version {}", bytes[6])));
    }
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let body_start = PREAMBLE_LEN + header_len;
    if bytes.len() < body_start {
        return Err(HologramError::Format("truncated header".into()));
    }

    let header = std::str::from_utf8(&bytes[PREAMBLE_LEN..body_start])
        .map_err(|_| HologramError::Format("header is not valid text".into()))?;
    let shape = parse_header(header, descr)?;

    let expected = shape
        .iter()
        .try_fold(4usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| HologramError::Format("shape too large".into()))?;
    let body = bytes.split_off(body_start);
    if body.len() != expected {
        return Err(HologramError::shape("array body bytes", expected, body.len()));
    }
    Ok((shape, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_aligned() {
        for shape in [vec![3usize], vec![40, 40, 40, 40], vec![64, 3]] {
            let header = encode_header(DESCR_F32, &shape).unwrap();
            assert_eq!(header.len() % ALIGN, 0);
            assert_eq!(*header.last().unwrap(), b'\n');
        }
    }

    #[test]
    fn test_shape_literal() {
        assert_eq!(shape_literal(&[5]), "(5,)");
        assert_eq!(shape_literal(&[2, 3, 4]), "(2, 3, 4)");
        assert_eq!(shape_literal(&[]), "()");
    }

    #[test]
    fn test_float_file_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.npy");
        write_f32(&path, &[2, 2], &[0.0, -1.5, 2.25, f32::MAX]).unwrap();

        let (shape, data) = read_f32(&path).unwrap();
        assert_eq!(shape, vec![2, 2]);
        assert_eq!(data, vec![0.0, -1.5, 2.25, f32::MAX]);
    }

    #[test]
    fn test_dtype_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.npy");
        write_i32(&path, &[1, 3], &[1, 2, 3]).unwrap();

        assert!(matches!(read_f32(&path), Err(HologramError::Format(_))));
        assert_eq!(read_i32(&path).unwrap().1, vec![1, 2, 3]);
    }

    #[test]
    fn test_sample_count_checked() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_f32(dir.path().join("bad.npy"), &[2, 2], &[1.0; 3]);
        assert!(matches!(result, Err(HologramError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_oversized_shape_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.npy");
        let header = encode_header(DESCR_F32, &[usize::MAX, 2]).unwrap();
        std::fs::write(&path, header).unwrap();

        match read_f32(&path) {
            Err(HologramError::Format(msg)) => assert_eq!(msg, "shape too large"),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.npy");
        std::fs::write(&path, b"not an array at all").unwrap();
        assert!(matches!(read_f32(&path), Err(HologramError::Format(_))));
    }
}
